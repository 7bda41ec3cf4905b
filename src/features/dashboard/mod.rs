/// ダッシュボード機能モジュール
///
/// このモジュールは売上ダッシュボードに関する機能を提供します：
/// - 週別・月別・年別の売上集計
/// - ダッシュボード画面の状態と操作
/// - 領収書と推奨結果の読み込み
pub mod aggregator;
pub mod service;
pub mod state;

pub use aggregator::{
    aggregate_revenue, aggregate_revenue_now, Period, RevenueBucket, RevenueSeries,
    WeekNumbering,
};
pub use service::DashboardService;
pub use state::{DashboardAction, DashboardState};
