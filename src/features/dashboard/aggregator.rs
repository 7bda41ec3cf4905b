//! 売上を期間ごとのバケットに集計する
//!
//! 集計は入力の領収書と基準日のみに依存する純粋関数で、期間を切り替えるたびに呼び直す。

use crate::features::receipts::Receipt;
use crate::shared::config::environment::app_timezone;
use crate::shared::utils::today;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// 月内の週バケット数
pub const WEEKS_PER_MONTH: usize = 5;

/// 集計期間
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// 今週（月曜〜日曜）を日別に
    #[default]
    Weekly,
    /// 今月を週別に
    Monthly,
    /// 今年を月別に
    Yearly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Weekly, Period::Monthly, Period::Yearly];

    /// バケットのラベル
    pub fn labels(&self) -> Vec<String> {
        match self {
            Period::Weekly => WEEKDAY_LABELS.iter().map(|l| l.to_string()).collect(),
            Period::Monthly => (1..=WEEKS_PER_MONTH).map(|w| format!("Week {w}")).collect(),
            Period::Yearly => MONTH_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// 月内の週番号の数え方（週の始まりの曜日と、第1週に必要な最小日数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekNumbering {
    pub first_day: Weekday,
    pub minimal_days: u32,
}

impl Default for WeekNumbering {
    fn default() -> Self {
        Self {
            first_day: Weekday::Sun,
            minimal_days: 1,
        }
    }
}

impl WeekNumbering {
    /// ISO 8601（月曜始まり、第1週は4日以上）
    pub const ISO: WeekNumbering = WeekNumbering {
        first_day: Weekday::Mon,
        minimal_days: 4,
    };

    /// 月内の週番号
    ///
    /// 第1週に満たない月初の日は0、6週にまたがる月の末尾は6になりうる
    pub fn week_of_month(&self, date: NaiveDate) -> u32 {
        let day = date.day() as i64;
        let minimal_days = i64::from(self.minimal_days.clamp(1, 7));

        // 週の始まりを1とした曜日
        let day_of_week = (date.weekday().num_days_from_monday() as i64
            - self.first_day.num_days_from_monday() as i64)
            .rem_euclid(7)
            + 1;

        // 月初から最初の週の始まりまでの位置
        let week_start = (day - day_of_week).rem_euclid(7);
        let offset = if week_start + 1 > minimal_days {
            7 - week_start
        } else {
            -week_start
        };

        ((7 + offset + (day - 1)) / 7) as u32
    }
}

/// 1バケット分の売上
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBucket {
    pub label: String,
    pub amount: f64,
}

/// 期間の売上系列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSeries {
    pub period: Period,
    pub buckets: Vec<RevenueBucket>,
    /// バケットの合計
    pub total: f64,
}

impl RevenueSeries {
    pub fn amounts(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.amount).collect()
    }
}

/// 領収書を期間ごとのバケットに集計する
///
/// # 引数
/// * `receipts` - 集計対象の領収書
/// * `period` - 集計期間
/// * `today` - 基準日
/// * `numbering` - 月内の週番号の数え方（月別集計でのみ使用）
///
/// # 戻り値
/// ラベル付きのバケットと合計
pub fn aggregate_revenue(
    receipts: &[Receipt],
    period: Period,
    today: NaiveDate,
    numbering: WeekNumbering,
) -> RevenueSeries {
    let labels = period.labels();
    let mut amounts = vec![0.0; labels.len()];

    for receipt in receipts {
        if let Some(index) = bucket_index(receipt.date, period, today, numbering) {
            amounts[index] += receipt.total_amount;
        }
    }

    let total = amounts.iter().sum();
    let buckets = labels
        .into_iter()
        .zip(amounts)
        .map(|(label, amount)| RevenueBucket { label, amount })
        .collect();

    RevenueSeries {
        period,
        buckets,
        total,
    }
}

/// アプリのタイムゾーンでの今日を基準に集計する
pub fn aggregate_revenue_now(receipts: &[Receipt], period: Period) -> RevenueSeries {
    aggregate_revenue(
        receipts,
        period,
        today(app_timezone()),
        WeekNumbering::default(),
    )
}

/// 取引日が入るバケットの位置（期間外はNone）
fn bucket_index(
    date: NaiveDate,
    period: Period,
    today: NaiveDate,
    numbering: WeekNumbering,
) -> Option<usize> {
    match period {
        Period::Weekly => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            let offset = (date - monday).num_days();
            (0..7).contains(&offset).then_some(offset as usize)
        }
        Period::Monthly => {
            if date.year() != today.year() || date.month() != today.month() {
                return None;
            }
            let week = numbering.week_of_month(date).clamp(1, WEEKS_PER_MONTH as u32);
            Some(week as usize - 1)
        }
        Period::Yearly => (date.year() == today.year()).then_some(date.month0() as usize),
    }
}
