/// 文字認識（OCR）機能モジュール
///
/// 具体的なOCRエンジンは同梱せず、プラットフォーム側が `TextRecognizer` を実装します。
pub mod models;

pub use models::{BoundingBox, ExtractedText, TextBlock};

use crate::shared::errors::AppResult;
use async_trait::async_trait;

/// 画像からテキストを抽出するOCRエンジン
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// 画像（JPEGなどのバイト列）からテキストを抽出する
    ///
    /// # 戻り値
    /// 抽出結果、または失敗時は `AppError::ExternalService`
    async fn extract_text(&self, image: &[u8]) -> AppResult<ExtractedText>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::shared::errors::AppError;

    /// 固定の結果を返すOCR
    pub struct FixedRecognizer {
        pub result: Result<String, String>,
    }

    impl FixedRecognizer {
        pub fn text(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for FixedRecognizer {
        async fn extract_text(&self, _image: &[u8]) -> AppResult<ExtractedText> {
            match &self.result {
                Ok(text) => Ok(ExtractedText {
                    raw_text: text.clone(),
                    ..ExtractedText::default()
                }),
                Err(message) => Err(AppError::external_service("OCR", message.clone())),
            }
        }
    }
}
