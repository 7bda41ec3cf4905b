use crate::features::dashboard::aggregator::{
    aggregate_revenue, Period, RevenueSeries, WeekNumbering,
};
use crate::features::receipts::Receipt;
use crate::features::recommendations::AIResult;
use chrono::NaiveDate;

/// ダッシュボード画面の状態
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub receipts: Vec<Receipt>,
    pub recommendation: Option<AIResult>,
    pub period: Period,
    /// 集計の基準日
    pub reference_date: NaiveDate,
    pub week_numbering: WeekNumbering,
    pub revenue: RevenueSeries,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

/// ダッシュボード画面の操作
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    LoadStarted,
    ReceiptsLoaded(Vec<Receipt>),
    RecommendationLoaded(Option<AIResult>),
    PeriodSelected(Period),
    Failed(String),
}

impl DashboardState {
    /// 空の状態を作成する
    pub fn new(reference_date: NaiveDate, week_numbering: WeekNumbering) -> Self {
        let period = Period::default();
        Self {
            receipts: Vec::new(),
            recommendation: None,
            period,
            reference_date,
            week_numbering,
            revenue: aggregate_revenue(&[], period, reference_date, week_numbering),
            is_loading: false,
            error_message: None,
        }
    }

    /// 操作を適用した新しい状態を返す
    pub fn reduce(&self, action: DashboardAction) -> Self {
        let mut next = self.clone();
        match action {
            DashboardAction::LoadStarted => {
                next.is_loading = true;
            }
            DashboardAction::ReceiptsLoaded(receipts) => {
                next.receipts = receipts;
                next.is_loading = false;
                next.error_message = None;
                next.revenue = next.aggregate();
            }
            DashboardAction::RecommendationLoaded(recommendation) => {
                next.recommendation = recommendation;
            }
            DashboardAction::PeriodSelected(period) => {
                next.period = period;
                next.revenue = next.aggregate();
            }
            DashboardAction::Failed(message) => {
                next.is_loading = false;
                next.error_message = Some(message);
            }
        }
        next
    }

    fn aggregate(&self) -> RevenueSeries {
        aggregate_revenue(
            &self.receipts,
            self.period,
            self.reference_date,
            self.week_numbering,
        )
    }
}
