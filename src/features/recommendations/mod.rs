/// 補充推奨機能モジュール
///
/// 直近の領収書テキストを生成モデルに渡し、補充すべき商品と要約を
/// ユーザーごとに1件保持します。
pub mod models;
pub mod repository;
pub mod service;
pub mod summarizer;

pub use models::{AIResult, Recommendation};
pub use repository::{add_ai_result, get_ai_result_by_user_id, upsert_ai_result_by_user_id};
pub use service::{RecommendationService, RECENT_RECEIPT_LIMIT};
pub use summarizer::{summarize_recommendation, RESTOCK_RATIONALE};
