use crate::features::dashboard::aggregator::{Period, WeekNumbering};
use crate::features::dashboard::state::{DashboardAction, DashboardState};
use crate::features::receipts::{get_receipts_for_user, Receipt};
use crate::features::recommendations::{get_ai_result_by_user_id, AIResult};
use crate::shared::config::environment::app_timezone;
use crate::shared::database::lock_database;
use crate::shared::errors::AppResult;
use crate::shared::utils::today;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::Mutex;

/// ダッシュボード画面の読み込み
pub struct DashboardService {
    week_numbering: WeekNumbering,
}

impl Default for DashboardService {
    fn default() -> Self {
        Self::new(WeekNumbering::default())
    }
}

impl DashboardService {
    pub fn new(week_numbering: WeekNumbering) -> Self {
        Self { week_numbering }
    }

    /// 領収書と保存済みの推奨結果を読み込み、画面状態を作成する
    ///
    /// 読み込みに失敗した場合はエラーメッセージを持つ状態を返す
    pub fn load(&self, db: &Mutex<Connection>, user_id: &str, period: Period) -> DashboardState {
        self.load_on(db, user_id, period, today(app_timezone()))
    }

    /// 基準日を指定して読み込む
    pub fn load_on(
        &self,
        db: &Mutex<Connection>,
        user_id: &str,
        period: Period,
        reference_date: NaiveDate,
    ) -> DashboardState {
        let state = DashboardState::new(reference_date, self.week_numbering)
            .reduce(DashboardAction::PeriodSelected(period))
            .reduce(DashboardAction::LoadStarted);

        match fetch(db, user_id) {
            Ok((receipts, recommendation)) => state
                .reduce(DashboardAction::ReceiptsLoaded(receipts))
                .reduce(DashboardAction::RecommendationLoaded(recommendation)),
            Err(e) => {
                log::error!("ダッシュボードの読み込みに失敗しました: {e}");
                state.reduce(DashboardAction::Failed(e.into()))
            }
        }
    }
}

type DashboardData = (Vec<Receipt>, Option<AIResult>);

fn fetch(db: &Mutex<Connection>, user_id: &str) -> AppResult<DashboardData> {
    let conn = lock_database(db)?;
    let receipts = get_receipts_for_user(&conn, user_id)?;
    let recommendation = get_ai_result_by_user_id(&conn, user_id)?;
    log::debug!(
        "ダッシュボードを読み込みました: receipts={}, recommendation={}",
        receipts.len(),
        recommendation.is_some()
    );
    Ok((receipts, recommendation))
}
