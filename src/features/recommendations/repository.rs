use crate::features::recommendations::models::AIResult;
use crate::shared::database::documents;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::ensure_id;
use rusqlite::Connection;

/// 推奨結果を新規に保存する
pub fn add_ai_result(conn: &Connection, mut result: AIResult) -> AppResult<AIResult> {
    if result.user_id.trim().is_empty() {
        return Err(AppError::validation("ユーザーIDが指定されていません"));
    }

    result.id = ensure_id(&result.id);
    documents::upsert(conn, &result)?;

    log::info!(
        "推奨結果を保存しました: id={}, user_id={}",
        result.id,
        result.user_id
    );

    Ok(result)
}

/// ユーザーの最新の推奨結果を取得する
///
/// # 戻り値
/// 推奨結果（存在しない場合はNone）
pub fn get_ai_result_by_user_id(conn: &Connection, user_id: &str) -> AppResult<Option<AIResult>> {
    let mut results: Vec<AIResult> = documents::find_by_user(conn, user_id, Some(1))?;
    Ok(results.pop())
}

/// ユーザーの推奨結果を置き換える（存在しなければ新規保存）
///
/// 既存の結果がある場合はそのIDを引き継ぎ、内容を丸ごと置き換える
pub fn upsert_ai_result_by_user_id(conn: &Connection, mut result: AIResult) -> AppResult<AIResult> {
    match get_ai_result_by_user_id(conn, &result.user_id)? {
        Some(existing) => {
            log::debug!(
                "既存の推奨結果を置き換えます: id={}, user_id={}",
                existing.id,
                existing.user_id
            );
            result.id = existing.id;
            documents::upsert(conn, &result)?;
            Ok(result)
        }
        None => add_ai_result(conn, result),
    }
}
