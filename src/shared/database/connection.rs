use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// ドキュメントストアのコレクション
///
/// 各コレクションは独立したテーブルで、コレクション間の整合性は保証しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Items,
    Receipts,
    AiResults,
    Users,
}

impl Collection {
    /// すべてのコレクション
    pub const ALL: [Collection; 4] = [
        Collection::Items,
        Collection::Receipts,
        Collection::AiResults,
        Collection::Users,
    ];

    /// テーブル名を取得
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Receipts => "receipts",
            Collection::AiResults => "ai_results",
            Collection::Users => "users",
        }
    }
}

/// データベース接続を初期化し、テーブルを作成する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(database_path)?;

    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {database_path:?}");

    Ok(conn)
}

/// メモリ上のデータベースを作成する（テスト・一時利用向け）
pub fn open_in_memory() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

/// 共有データベース接続のロックを取得する
///
/// ガードを保持したまま await しないこと
pub fn lock_database(db: &Mutex<Connection>) -> AppResult<MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|e| AppError::concurrency(format!("データベースロック取得失敗: {e}")))
}

/// データベーステーブルを作成する
///
/// 既存のテーブルはそのまま残す
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    for collection in Collection::ALL {
        create_collection_table(conn, collection)?;
    }
    Ok(())
}

fn create_collection_table(conn: &Connection, collection: Collection) -> AppResult<()> {
    let table = collection.table_name();

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL CHECK(length(id) > 0),
                user_id TEXT,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        [],
    )?;

    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_user_id ON {table}(user_id)"),
        [],
    )?;

    log::debug!("コレクションテーブルを確認しました: {table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_create_tables_in_memory() {
        let conn = open_in_memory().unwrap();

        for collection in Collection::ALL {
            assert!(table_exists(&conn, collection.table_name()));
        }
    }

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = open_in_memory().unwrap();
        assert!(create_tables(&conn).is_ok());
    }

    #[test]
    fn test_initialize_database_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dev_ecoceipt.db");

        {
            let conn = initialize_database(&path).unwrap();
            assert!(table_exists(&conn, "receipts"));
        }

        assert!(path.exists());
        // 再オープンしても問題ないこと
        let conn = initialize_database(&path).unwrap();
        assert!(table_exists(&conn, "ai_results"));
    }

    #[test]
    fn test_lock_database() {
        let db = Mutex::new(open_in_memory().unwrap());
        let conn = lock_database(&db).unwrap();
        assert!(table_exists(&conn, "users"));
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let conn = open_in_memory().unwrap();
        let result = conn.execute(
            "INSERT INTO items (id, user_id, body, created_at, updated_at) VALUES ('', NULL, '{}', 'a', 'a')",
            [],
        );
        assert!(result.is_err());
    }
}
