use serde::{Deserialize, Serialize};

/// 画像入力の既定MIMEタイプ
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// generateContent リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
}

impl GeminiRequest {
    /// テキストのみのリクエストを作成
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
        }
    }

    /// 画像（Base64）とテキストを1つのコンテンツとして送るリクエストを作成
    pub fn image_with_text(base64_image: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::inline_image(base64_image), Part::text(prompt)],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// コンテンツの構成要素（画像またはテキスト）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inlineData")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            inline_data: None,
            text: Some(text.into()),
        }
    }

    pub fn inline_image(base64_data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data: base64_data.into(),
            }),
            text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// generateContent レスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// 最初の候補の最初のパートのテキストを取得（それ以外は使用しない）
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}
