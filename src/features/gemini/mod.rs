/// 生成モデル（Gemini）連携モジュール
///
/// このモジュールは以下を提供します：
/// - generateContent APIのリクエスト・レスポンスモデル
/// - 領収書抽出・補充推奨のプロンプト
/// - reqwestベースのAPIクライアント
pub mod client;
pub mod models;
pub mod prompts;

pub use client::GeminiClient;
pub use models::{Candidate, Content, GeminiRequest, GeminiResponse, InlineData, Part};
pub use prompts::{receipt_extraction_prompt, restock_recommendation_prompt};

use crate::shared::errors::AppResult;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// テキストを生成するモデル
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// リクエストを送信し、最初の候補のテキストを返す
    ///
    /// # 戻り値
    /// 生成テキスト（候補が無い場合はNone）、または通信失敗時は `AppError::ExternalService`
    async fn generate(&self, request: &GeminiRequest) -> AppResult<Option<String>>;
}

/// 画像をBase64（改行なし）に変換する
pub fn encode_image_base64(image: &[u8]) -> String {
    STANDARD.encode(image)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::shared::errors::AppError;
    use std::sync::Mutex;

    /// 固定の応答を返し、受け取ったリクエストを記録するモデル
    pub struct ScriptedModel {
        pub reply: Result<Option<String>, String>,
        pub requests: Mutex<Vec<GeminiRequest>>,
    }

    impl ScriptedModel {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(Some(text.to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn empty() -> Self {
            Self {
                reply: Ok(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Option<GeminiRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: &GeminiRequest) -> AppResult<Option<String>> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply
                .clone()
                .map_err(|message| AppError::external_service("Gemini", message))
        }
    }
}
