use crate::shared::database::{Collection, Document};
use serde::{Deserialize, Serialize};

/// ユーザーデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// 店舗・事業者名
    #[serde(default)]
    pub business_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    // ユーザー自身のIDで検索できるようにする
    fn user_id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}
