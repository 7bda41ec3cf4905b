use crate::features::items::Item;
use crate::features::recommendations::summarizer::{ITEMS_DELIMITER, SUMMARY_DELIMITER};
use crate::shared::database::{Collection, Document};
use serde::{Deserialize, Serialize};

/// 推奨商品と推奨理由
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    pub item: Item,
    pub recommendation: String,
}

/// 補充推奨の結果（ユーザーごとに最新の1件を保持）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AIResult {
    pub id: String,
    /// 関連する領収書ID（特定の領収書に紐付かない場合は空）
    #[serde(default)]
    pub receipt_id: String,
    pub user_id: String,
    pub recommendation_summary: String,
    pub recommendation_items: Vec<Recommendation>,
    pub created_at: String,
}

impl AIResult {
    /// 推奨商品名の一覧
    pub fn item_names(&self) -> Vec<&str> {
        self.recommendation_items
            .iter()
            .map(|r| r.item.name.as_str())
            .collect()
    }

    /// 生成モデルの出力と同じ2セクション形式で書き出す
    pub fn to_template_text(&self) -> String {
        format!(
            "- {ITEMS_DELIMITER}\n[{}]\n\n{SUMMARY_DELIMITER}\n{}",
            self.item_names().join(", "),
            self.recommendation_summary
        )
    }
}

impl Document for AIResult {
    const COLLECTION: Collection = Collection::AiResults;

    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.created_at
    }
}
