/// ID生成
pub mod nanoid;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

pub use self::nanoid::{ensure_id, generate_id, is_valid_nanoid};

/// 指定タイムゾーンの現在時刻をRFC3339形式で取得
pub fn current_timestamp(tz: Tz) -> String {
    Utc::now().with_timezone(&tz).to_rfc3339()
}

/// 指定タイムゾーンでの今日の日付を取得
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// 金額を文字列形式でフォーマット
///
/// 小数点以下が0の場合は整数として表示する
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

/// 数値を非負に丸める（負数・NaN・無限大は0）
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp_is_rfc3339() {
        let timestamp = current_timestamp(chrono_tz::Asia::Jakarta);
        assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
        assert!(timestamp.ends_with("+07:00"));
    }

    #[test]
    fn test_today_matches_timezone() {
        let expected = Utc::now().with_timezone(&chrono_tz::Asia::Tokyo).date_naive();
        let actual = today(chrono_tz::Asia::Tokyo);
        // 日付の境界をまたいだ場合でも1日以内
        assert!((actual - expected).num_days().abs() <= 1);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1000.0), "1000");
        assert_eq!(format_amount(1000.5), "1000.50");
        assert_eq!(format_amount(0.01), "0.01");
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(10.0), 10.0);
        assert_eq!(non_negative(0.0), 0.0);
        assert_eq!(non_negative(-1.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
    }
}
