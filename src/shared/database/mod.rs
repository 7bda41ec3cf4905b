/// データベース接続とテーブル作成
pub mod connection;

/// ドキュメント（JSON本文）単位の読み書き
pub mod documents;

pub use connection::{create_tables, initialize_database, lock_database, open_in_memory, Collection};
pub use documents::Document;
