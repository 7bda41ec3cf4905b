use crate::shared::database::Collection;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// ドキュメントストアに保存できるエンティティ
pub trait Document: Serialize + DeserializeOwned {
    /// 保存先のコレクション
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    /// 所有ユーザーID（ユーザー単位の検索に使用）
    fn user_id(&self) -> Option<&str> {
        None
    }

    fn created_at(&self) -> &str;

    fn updated_at(&self) -> &str;
}

/// ドキュメントを丸ごと書き込む（存在すれば置き換え）
///
/// # 引数
/// * `conn` - データベース接続
/// * `document` - 保存するドキュメント
pub fn upsert<D: Document>(conn: &Connection, document: &D) -> AppResult<()> {
    if document.id().trim().is_empty() {
        return Err(AppError::validation("IDが空のドキュメントは保存できません"));
    }

    let body = serde_json::to_string(document)?;
    let table = D::COLLECTION.table_name();

    conn.execute(
        &format!(
            "INSERT INTO {table} (id, user_id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                body = excluded.body,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at"
        ),
        params![
            document.id(),
            document.user_id(),
            body,
            document.created_at(),
            document.updated_at()
        ],
    )?;

    log::debug!("ドキュメントを保存しました: {table}/{}", document.id());

    Ok(())
}

/// IDでドキュメントを取得する
///
/// # 戻り値
/// ドキュメント（存在しない場合はNone）
pub fn find_by_id<D: Document>(conn: &Connection, id: &str) -> AppResult<Option<D>> {
    let table = D::COLLECTION.table_name();

    let body: Option<String> = conn
        .query_row(
            &format!("SELECT body FROM {table} WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    body.map(|b| serde_json::from_str(&b).map_err(AppError::from))
        .transpose()
}

/// ユーザーIDが一致するドキュメントを新しい順に取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
/// * `limit` - 取得件数の上限（Noneの場合は無制限）
pub fn find_by_user<D: Document>(
    conn: &Connection,
    user_id: &str,
    limit: Option<usize>,
) -> AppResult<Vec<D>> {
    let table = D::COLLECTION.table_name();
    // SQLiteでは LIMIT -1 が無制限
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let mut stmt = conn.prepare(&format!(
        "SELECT body FROM {table} WHERE user_id = ?1 ORDER BY created_at DESC, id LIMIT ?2"
    ))?;

    let bodies = stmt
        .query_map(params![user_id, limit], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    decode_all(bodies)
}

/// コレクション内のすべてのドキュメントを取得する
pub fn find_all<D: Document>(conn: &Connection) -> AppResult<Vec<D>> {
    let table = D::COLLECTION.table_name();

    let mut stmt = conn.prepare(&format!(
        "SELECT body FROM {table} ORDER BY created_at DESC, id"
    ))?;

    let bodies = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    decode_all(bodies)
}

/// ドキュメントを削除する
///
/// # 戻り値
/// 削除された場合はtrue、存在しなかった場合はfalse
pub fn delete<D: Document>(conn: &Connection, id: &str) -> AppResult<bool> {
    let table = D::COLLECTION.table_name();
    let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
    Ok(affected > 0)
}

fn decode_all<D: Document>(bodies: Vec<String>) -> AppResult<Vec<D>> {
    bodies
        .iter()
        .map(|b| serde_json::from_str(b).map_err(AppError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::open_in_memory;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        owner: String,
        text: String,
        created_at: String,
    }

    impl Document for Note {
        const COLLECTION: Collection = Collection::Items;

        fn id(&self) -> &str {
            &self.id
        }

        fn user_id(&self) -> Option<&str> {
            Some(&self.owner)
        }

        fn created_at(&self) -> &str {
            &self.created_at
        }

        fn updated_at(&self) -> &str {
            &self.created_at
        }
    }

    fn note(id: &str, owner: &str, created_at: &str) -> Note {
        Note {
            id: id.to_string(),
            owner: owner.to_string(),
            text: format!("note {id}"),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_upsert_and_find() {
        let conn = open_in_memory().unwrap();
        let doc = note("n1", "u1", "2024-01-01T00:00:00+07:00");

        upsert(&conn, &doc).unwrap();
        let found: Option<Note> = find_by_id(&conn, "n1").unwrap();
        assert_eq!(found, Some(doc.clone()));

        // 同じIDで書き込むと置き換えられる
        let mut replaced = doc.clone();
        replaced.text = "replaced".to_string();
        upsert(&conn, &replaced).unwrap();

        let all: Vec<Note> = find_all(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "replaced");
    }

    #[test]
    fn test_find_by_user_orders_newest_first_and_limits() {
        let conn = open_in_memory().unwrap();
        upsert(&conn, &note("a", "u1", "2024-01-01T00:00:00+07:00")).unwrap();
        upsert(&conn, &note("b", "u1", "2024-03-01T00:00:00+07:00")).unwrap();
        upsert(&conn, &note("c", "u2", "2024-02-01T00:00:00+07:00")).unwrap();

        let notes: Vec<Note> = find_by_user(&conn, "u1", None).unwrap();
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let limited: Vec<Note> = find_by_user(&conn, "u1", Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, "b");
    }

    #[test]
    fn test_empty_id_is_validation_error() {
        let conn = open_in_memory().unwrap();
        let result = upsert(&conn, &note("", "u1", "2024-01-01T00:00:00+07:00"));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete() {
        let conn = open_in_memory().unwrap();
        upsert(&conn, &note("n1", "u1", "2024-01-01T00:00:00+07:00")).unwrap();

        assert!(delete::<Note>(&conn, "n1").unwrap());
        assert!(!delete::<Note>(&conn, "n1").unwrap());
        assert!(find_by_id::<Note>(&conn, "n1").unwrap().is_none());
    }
}
