/// 環境設定（.env読み込み・ログ初期化・生成モデル設定）
pub mod environment;

/// アプリケーションデータディレクトリの初期化
pub mod initialization;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system,
    load_environment_variables, Environment, EnvironmentConfig, GeminiConfig,
};
pub use initialization::{initialize_application, log_initialization_complete, InitializationResult};
