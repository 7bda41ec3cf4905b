/// 領収書機能モジュール
///
/// このモジュールは領収書に関する機能を提供します：
/// - 生成モデルが出力した領収書テキストの解析（正規化）
/// - 領収書の保存と取得
/// - ユーザーごとの直近の領収書テキストの取得（推奨生成の入力）
pub mod models;
pub mod normalizer;
pub mod repository;

pub use models::{DateSource, PurchasedItem, Receipt, DEFAULT_CURRENCY, UNKNOWN_STORE};
pub use normalizer::{normalize_receipt, parse_receipt_text, NormalizeError};
pub use repository::{
    add_receipt, get_receipt, get_receipt_texts_by_user, get_receipts_for_user,
};
