use crate::features::receipts::models::Receipt;
use crate::shared::config::environment::app_timezone;
use crate::shared::database::documents;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{current_timestamp, ensure_id};
use rusqlite::Connection;

/// 領収書を保存する
///
/// IDが空の場合は新しいIDを採番する
///
/// # 引数
/// * `conn` - データベース接続
/// * `receipt` - 保存する領収書
///
/// # 戻り値
/// 保存された領収書、または失敗時はエラー
pub fn add_receipt(conn: &Connection, mut receipt: Receipt) -> AppResult<Receipt> {
    if receipt.user_id.trim().is_empty() {
        return Err(AppError::validation("ユーザーIDが指定されていません"));
    }

    receipt.id = ensure_id(&receipt.id);
    receipt.recompute_total();
    if receipt.created_at.is_empty() {
        receipt.created_at = current_timestamp(app_timezone());
    }
    receipt.updated_at = current_timestamp(app_timezone());

    documents::upsert(conn, &receipt)?;

    log::info!(
        "領収書を保存しました: id={}, user_id={}, total={}",
        receipt.id,
        receipt.user_id,
        receipt.total_amount
    );

    Ok(receipt)
}

/// IDで領収書を取得する
pub fn get_receipt(conn: &Connection, id: &str) -> AppResult<Receipt> {
    documents::find_by_id::<Receipt>(conn, id)?.ok_or_else(|| AppError::not_found("領収書"))
}

/// ユーザーの領収書を新しい順に取得する
pub fn get_receipts_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Receipt>> {
    let receipts: Vec<Receipt> = documents::find_by_user(conn, user_id, None)?;
    log::debug!(
        "領収書を取得しました: user_id={user_id}, count={}",
        receipts.len()
    );
    Ok(receipts)
}

/// ユーザーの直近の領収書テキストを新しい順に取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `limit` - 取得件数の上限
pub fn get_receipt_texts_by_user(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> AppResult<Vec<String>> {
    let receipts: Vec<Receipt> = documents::find_by_user(conn, user_id, Some(limit))?;
    Ok(receipts
        .into_iter()
        .map(|r| r.full_text)
        .filter(|text| !text.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::receipts::models::test_support::receipt_on;
    use crate::shared::database::open_in_memory;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn with_text(mut receipt: Receipt, text: &str) -> Receipt {
        receipt.full_text = text.to_string();
        receipt
    }

    #[test]
    fn test_add_and_get_receipt() {
        let conn = open_in_memory().unwrap();
        let mut receipt = receipt_on(day(1), 15000.0);
        receipt.id = String::new();

        let saved = add_receipt(&conn, receipt).unwrap();
        assert_eq!(saved.id.len(), 21);
        assert_eq!(saved.total_amount, 15000.0);

        let loaded = get_receipt(&conn, &saved.id).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_get_receipt_not_found() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            get_receipt(&conn, "missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_receipt_requires_user() {
        let conn = open_in_memory().unwrap();
        let mut receipt = receipt_on(day(1), 100.0);
        receipt.user_id = " ".to_string();
        assert!(matches!(
            add_receipt(&conn, receipt),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_receipts_are_scoped_to_user() {
        let conn = open_in_memory().unwrap();
        add_receipt(&conn, receipt_on(day(1), 100.0)).unwrap();
        add_receipt(&conn, receipt_on(day(2), 200.0)).unwrap();

        let mut other = receipt_on(day(3), 300.0);
        other.user_id = "user-2".to_string();
        add_receipt(&conn, other).unwrap();

        let receipts = get_receipts_for_user(&conn, "user-1").unwrap();
        assert_eq!(receipts.len(), 2);
        // 作成日時の新しい順
        assert_eq!(receipts[0].date, day(2));
        assert!(get_receipts_for_user(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_receipt_texts_are_latest_first_and_limited() {
        let conn = open_in_memory().unwrap();
        for d in 1..=7 {
            add_receipt(&conn, with_text(receipt_on(day(d), 100.0), &format!("text {d}")))
                .unwrap();
        }
        add_receipt(&conn, with_text(receipt_on(day(8), 100.0), "  ")).unwrap();

        let texts = get_receipt_texts_by_user(&conn, "user-1", 5).unwrap();
        // 空テキストは除外される
        assert_eq!(texts, vec!["text 7", "text 6", "text 5", "text 4"]);
    }
}
