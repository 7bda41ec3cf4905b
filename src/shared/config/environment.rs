use crate::shared::errors::{AppError, AppResult};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 既定のタイムゾーン（通貨IDRに合わせてジャカルタ時間）
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;

/// 既定の生成モデル名
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// 既定の生成モデルAPIベースURL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// プロセス全体で共有するタイムゾーン（初回参照時に環境変数から決定）
static APP_TIMEZONE: Lazy<Tz> = Lazy::new(|| EnvironmentConfig::from_env().timezone);

/// アプリケーションのタイムゾーンを取得
pub fn app_timezone() -> Tz {
    *APP_TIMEZONE
}

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
    /// 日付計算に使うタイムゾーン
    pub timezone: Tz,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        let timezone_name = option_env!("EMBEDDED_APP_TIMEZONE")
            .map(|s| s.to_string())
            .or_else(|| std::env::var("APP_TIMEZONE").ok());

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
            timezone: parse_timezone(timezone_name.as_deref()),
        }
    }

    /// プロダクション環境かどうかを判定
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 開発環境かどうかを判定
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// タイムゾーン名を解釈する
///
/// 未設定または不正な名前の場合は既定のタイムゾーンを返す
pub fn parse_timezone(name: Option<&str>) -> Tz {
    match name {
        Some(name) => name.trim().parse::<Tz>().unwrap_or_else(|_| {
            log::warn!("不正なAPP_TIMEZONEです: {name}。既定値 {DEFAULT_TIMEZONE} を使用します");
            DEFAULT_TIMEZONE
        }),
        None => DEFAULT_TIMEZONE,
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は Development
/// 4. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        let env = match embedded_env {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: コンパイル時埋め込み値を使用 -> {embedded_env} -> {env:?}");
        return env;
    }

    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_ecoceipt.db"
/// - プロダクション環境: "ecoceipt.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_ecoceipt.db",
        Environment::Production => "ecoceipt.db",
    }
}

/// 環境に応じた.envファイルを読み込む
pub fn load_environment_variables() {
    if let Some(env) = option_env!("EMBEDDED_ENVIRONMENT") {
        log::info!("コンパイル時埋め込み環境設定を使用: {env}");
        return;
    }

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// 二重初期化はエラーにせず無視する
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    let initialized = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if initialized.is_err() {
        log::debug!("ログシステムは既に初期化されています");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}, timezone={}",
        env_config.log_level,
        env_config.environment,
        env_config.timezone
    );
}

/// 生成モデル（Gemini）APIの設定を管理する構造体
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// APIキー（x-goog-api-key ヘッダーで送信）
    pub api_key: String,
    /// モデル名
    pub model: String,
    /// APIのベースURL
    pub base_url: String,
    /// リクエストタイムアウト（秒）
    pub timeout_seconds: u64,
    /// 接続失敗時のリトライ回数（既定は0＝リトライなし）
    pub max_retries: u32,
}

impl GeminiConfig {
    /// 環境変数から生成モデル設定を読み込む
    ///
    /// # 戻り値
    /// 生成モデル設定、またはAPIキーが見つからない場合はNone
    pub fn from_env() -> Option<Self> {
        log::debug!("GeminiConfig::from_env() - 環境変数の読み込みを開始");

        Self::from_lookup(|key| {
            let embedded = match key {
                "GEMINI_API_KEY" => option_env!("EMBEDDED_GEMINI_API_KEY"),
                "GEMINI_MODEL" => option_env!("EMBEDDED_GEMINI_MODEL"),
                _ => None,
            };
            embedded
                .map(|s| s.to_string())
                .or_else(|| std::env::var(key).ok())
        })
    }

    /// 任意のキー参照関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            Some(val) => {
                log::debug!("GEMINI_API_KEY が見つかりました: {}****", mask(&val, 4));
                val
            }
            None => {
                log::error!("GEMINI_API_KEY が見つかりません（コンパイル時埋め込み値・実行時環境変数ともに）");
                return None;
            }
        };

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| {
            log::debug!("GEMINI_MODEL が設定されていないため、デフォルト値を使用");
            DEFAULT_GEMINI_MODEL.to_string()
        });

        let base_url = lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        let timeout_seconds = lookup("GEMINI_TIMEOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let max_retries = lookup("GEMINI_MAX_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Some(Self {
            api_key,
            model,
            base_url,
            timeout_seconds,
            max_retries,
        })
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::configuration("GEMINI_API_KEY が空です"));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::configuration("GEMINI_MODEL が空です"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(AppError::configuration(format!(
                "GEMINI_BASE_URL の形式が不正です: {}",
                self.base_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "GEMINI_TIMEOUT_SECONDS は1以上である必要があります",
            ));
        }
        Ok(())
    }

    /// デバッグ情報を取得（APIキーはマスクする）
    pub fn get_debug_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        info.insert(
            "api_key".to_string(),
            format!("{}****", mask(&self.api_key, 4)),
        );
        info.insert("model".to_string(), self.model.clone());
        info.insert("base_url".to_string(), self.base_url.clone());
        info.insert(
            "timeout_seconds".to_string(),
            self.timeout_seconds.to_string(),
        );
        info.insert("max_retries".to_string(), self.max_retries.to_string());
        info
    }
}

fn mask(value: &str, visible: usize) -> &str {
    let end = value
        .char_indices()
        .nth(visible)
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_database_filename() {
        assert_eq!(
            get_database_filename(Environment::Development),
            "dev_ecoceipt.db"
        );
        assert_eq!(get_database_filename(Environment::Production), "ecoceipt.db");
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone(Some("Asia/Tokyo")), chrono_tz::Asia::Tokyo);
        assert_eq!(parse_timezone(Some("Not/AZone")), DEFAULT_TIMEZONE);
        assert_eq!(parse_timezone(None), DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_gemini_config_defaults() {
        let config = GeminiConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret-key")]))
            .unwrap();

        assert_eq!(config.api_key, "secret-key");
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gemini_config_missing_key() {
        assert!(GeminiConfig::from_lookup(lookup_from(&[])).is_none());
        assert!(GeminiConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).is_none());
    }

    #[test]
    fn test_gemini_config_overrides_and_validation() {
        let config = GeminiConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("GEMINI_BASE_URL", "ftp://example.com"),
            ("GEMINI_TIMEOUT_SECONDS", "5"),
            ("GEMINI_MAX_RETRIES", "2"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.max_retries, 2);
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_info_masks_api_key() {
        let config = GeminiConfig::from_lookup(lookup_from(&[(
            "GEMINI_API_KEY",
            "AIzaSecretValue",
        )]))
        .unwrap();

        let info = config.get_debug_info();
        assert_eq!(info.get("api_key").unwrap(), "AIza****");
        assert!(!info.values().any(|v| v.contains("SecretValue")));
    }
}
