/// 領収書スキャン機能モジュール
///
/// 撮影した画像から保存前の領収書を作成し、確認後に保存します。
pub mod service;
pub mod state;

pub use service::ScanService;
pub use state::{ScanAction, ScanState};
