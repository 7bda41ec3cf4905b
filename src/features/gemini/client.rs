use crate::features::gemini::models::{GeminiRequest, GeminiResponse};
use crate::features::gemini::GenerativeModel;
use crate::shared::config::GeminiConfig;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Gemini APIのエラーレスポンス
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Gemini generateContent APIクライアント
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    endpoint: Url,
}

impl GeminiClient {
    /// 環境変数の設定からクライアントを作成
    pub fn from_env() -> AppResult<Self> {
        let config = GeminiConfig::from_env()
            .ok_or_else(|| AppError::configuration("GEMINI_API_KEY が設定されていません"))?;
        Self::new_with_config(config)
    }

    /// 設定を指定してクライアントを作成
    pub fn new_with_config(config: GeminiConfig) -> AppResult<Self> {
        config.validate()?;

        let endpoint = build_endpoint(&config.base_url, &config.model)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        info!(
            "Geminiクライアントを初期化しました: model={}, endpoint={endpoint}",
            config.model
        );

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// リクエスト先のURL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 接続失敗時のみリトライしてリクエストを送信する
    async fn send_with_retry(&self, request: &GeminiRequest) -> AppResult<GeminiResponse> {
        let builder = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(request);

        let mut attempts = 0;
        loop {
            let Some(cloned) = builder.try_clone() else {
                return Err(AppError::external_service(
                    "Gemini",
                    "リクエストのクローンに失敗しました",
                ));
            };

            match cloned.send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<GeminiResponse>().await.map_err(|e| {
                        AppError::external_service("Gemini", format!("レスポンス解析エラー: {e}"))
                    });
                }
                Ok(response) => return Err(self.handle_error_response(response).await),
                Err(e) => {
                    if attempts < self.config.max_retries {
                        attempts += 1;
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "Gemini APIへの接続に失敗、リトライします: attempt={attempts}/{}, delay={delay:?}",
                            self.config.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(AppError::external_service(
                        "Gemini",
                        format!("APIへの接続に失敗しました: {e}"),
                    ));
                }
            }
        }
    }

    /// エラーレスポンスを AppError に変換する
    async fn handle_error_response(&self, response: Response) -> AppError {
        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&body) {
            debug!(
                "Gemini APIから構造化エラーレスポンスを受信: code={}, status={}, message={}",
                parsed.error.code, parsed.error.status, parsed.error.message
            );
            return AppError::external_service(
                "Gemini",
                format!(
                    "{} ({status_code} {})",
                    parsed.error.message, parsed.error.status
                ),
            );
        }

        let message = match status_code {
            400 => "リクエストの形式が正しくありません",
            401 | 403 => "APIキーが無効か、権限がありません",
            404 => "指定されたモデルが見つかりません",
            413 => "画像サイズが制限を超えています",
            429 => "リクエストが多すぎます。しばらく待ってから再試行してください",
            500..=599 => "Gemini APIが一時的に利用できません",
            _ => "不明なエラーが発生しました",
        };

        warn!("Gemini APIから非構造化エラーレスポンス: status={status_code}, body={body}");

        AppError::external_service("Gemini", format!("{message} (status={status_code})"))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GeminiRequest) -> AppResult<Option<String>> {
        info!("Gemini APIにリクエストを送信します: model={}", self.config.model);

        let response = self.send_with_retry(request).await?;
        let text = response.first_text().map(str::to_string);

        match &text {
            Some(t) if !t.trim().is_empty() => debug!("Gemini APIの応答: {t}"),
            _ => warn!("Gemini APIの応答にテキストが含まれていません"),
        }

        Ok(text)
    }
}

/// `{base_url}v1beta/models/{model}:generateContent` を組み立てる
fn build_endpoint(base_url: &str, model: &str) -> AppResult<Url> {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };

    Url::parse(&base)
        .and_then(|u| u.join(&format!("v1beta/models/{model}:generateContent")))
        .map_err(|e| AppError::configuration(format!("GEMINI_BASE_URL の形式が不正です: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-2.5-flash".to_string(),
            base_url: base_url.to_string(),
            timeout_seconds: 5,
            max_retries: 0,
        }
    }

    #[test]
    fn test_build_endpoint() {
        let expected =
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

        let with_slash =
            build_endpoint("https://generativelanguage.googleapis.com/", "gemini-2.5-flash").unwrap();
        assert_eq!(with_slash.as_str(), expected);

        let without_slash =
            build_endpoint("https://generativelanguage.googleapis.com", "gemini-2.5-flash").unwrap();
        assert_eq!(without_slash.as_str(), expected);

        let proxied = build_endpoint("http://localhost:8080/proxy", "m").unwrap();
        assert_eq!(
            proxied.as_str(),
            "http://localhost:8080/proxy/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_new_with_invalid_config() {
        let mut invalid = config("https://generativelanguage.googleapis.com/");
        invalid.api_key = String::new();
        assert!(matches!(
            GeminiClient::new_with_config(invalid),
            Err(AppError::Configuration(_))
        ));

        assert!(matches!(
            GeminiClient::new_with_config(config("ftp://example.com/")),
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_external_service_error() {
        // 待ち受けのないローカルポート
        let client = GeminiClient::new_with_config(config("http://127.0.0.1:9/")).unwrap();
        let result = client.generate(&GeminiRequest::text("hello")).await;

        let error = result.unwrap_err();
        assert!(matches!(error, AppError::ExternalService(_)));
        assert_eq!(error.user_message(), "テキストの読み取りに失敗しました");
    }
}
