pub mod features;
pub mod shared;

use log::{error, info};
use rusqlite::Connection;
use shared::config::{
    initialize_application, initialize_logging_system, load_environment_variables,
    log_initialization_complete, InitializationResult,
};
use shared::database::initialize_database;
use shared::errors::AppResult;
use std::path::PathBuf;
use std::sync::Mutex;

/// アプリケーション状態（データベース接続を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
    pub initialization: InitializationResult,
}

/// 環境変数・ログ・データディレクトリ・データベースを初期化する
///
/// # 引数
/// * `data_dir` - データディレクトリ（Noneの場合は環境変数または既定の場所）
///
/// # 戻り値
/// アプリケーション状態、または失敗時はエラー
pub fn run(data_dir: Option<PathBuf>) -> AppResult<AppState> {
    // 環境変数を読み込み（.envファイルがある場合）
    load_environment_variables();

    // ログシステムを初期化
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    let initialization = initialize_application(data_dir).map_err(|e| {
        error!("データディレクトリの初期化に失敗しました: {e}");
        e
    })?;

    info!("データベースを初期化しています...");
    let db_conn = initialize_database(&initialization.database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {e}");
        e
    })?;

    log_initialization_complete(&initialization);

    Ok(AppState {
        db: Mutex::new(db_conn),
        initialization,
    })
}
