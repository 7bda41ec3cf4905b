/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するコード（モデル、データベース操作、サービス、画面状態）
/// を含む自己完結型のユニットです。
// 機能モジュールの宣言
pub mod dashboard;
pub mod gemini;
pub mod items;
pub mod receipts;
pub mod recognition;
pub mod recommendations;
pub mod scan;
pub mod users;
