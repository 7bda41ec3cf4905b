use crate::shared::database::{Collection, Document};
use crate::shared::utils::non_negative;
use serde::{Deserialize, Serialize};

/// 商品データモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    /// 単価
    pub price: f64,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Item {
    /// 価格・説明を持たない最小限の商品（推奨結果などで使用）
    pub fn stub(name: impl Into<String>, timestamp: &str) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            price: 0.0,
            description: String::new(),
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        }
    }
}

impl Document for Item {
    const COLLECTION: Collection = Collection::Items;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

/// 商品作成用DTO
#[derive(Debug, Deserialize)]
pub struct CreateItemDto {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

/// 商品更新用DTO
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemDto {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

/// 入力欄の価格文字列を数値に変換する
///
/// 数値として解釈できない場合や負数の場合は0
pub fn parse_price_input(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .map(non_negative)
        .unwrap_or(0.0)
}
