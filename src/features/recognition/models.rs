use serde::{Deserialize, Serialize};

/// 画像上の矩形領域（ピクセル座標）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }
}

/// 認識されたテキストブロック
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bounding_box: BoundingBox,
    /// 信頼度（現在は未設定で0.0）
    pub confidence: f32,
}

/// 画像から抽出されたテキスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub raw_text: String,
    /// 信頼度（現在は未設定で0.0）
    pub confidence: f32,
    pub blocks: Vec<TextBlock>,
}

impl ExtractedText {
    /// ブロックから抽出結果を組み立てる（全文はブロックを改行で連結）
    pub fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        let raw_text = blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            raw_text,
            confidence: 0.0,
            blocks,
        }
    }

    /// テキストが読み取れなかったかどうか
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}
