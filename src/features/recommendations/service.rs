use crate::features::gemini::{restock_recommendation_prompt, GeminiRequest, GenerativeModel};
use crate::features::receipts::get_receipt_texts_by_user;
use crate::features::recommendations::models::AIResult;
use crate::features::recommendations::repository::{
    get_ai_result_by_user_id, upsert_ai_result_by_user_id,
};
use crate::features::recommendations::summarizer::summarize_recommendation;
use crate::shared::database::lock_database;
use crate::shared::errors::AppResult;
use log::{debug, info, warn};
use rusqlite::Connection;
use std::sync::Mutex;

/// 推奨の入力に使う直近の領収書の件数
pub const RECENT_RECEIPT_LIMIT: usize = 5;

/// 補充推奨サービス
pub struct RecommendationService<M> {
    model: M,
}

impl<M: GenerativeModel> RecommendationService<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// 直近の領収書から補充推奨を作り直し、ユーザーの推奨結果を置き換える
    ///
    /// # 引数
    /// * `db` - 共有データベース接続
    /// * `user_id` - ユーザーID
    ///
    /// # 戻り値
    /// 新しい推奨結果。領収書が無い場合やモデルの出力が使えない場合はNone
    pub async fn refresh(&self, db: &Mutex<Connection>, user_id: &str) -> AppResult<Option<AIResult>> {
        let texts = {
            let conn = lock_database(db)?;
            get_receipt_texts_by_user(&conn, user_id, RECENT_RECEIPT_LIMIT)?
        };

        let combined = texts.join("\n\n");
        if combined.trim().is_empty() {
            info!("領収書が無いため補充推奨を作成しません: user_id={user_id}");
            return Ok(None);
        }
        debug!("補充推奨の入力: receipts={}", texts.len());

        let request = GeminiRequest::text(restock_recommendation_prompt(&combined));
        let Some(output) = self.model.generate(&request).await? else {
            warn!("生成モデルから補充推奨の応答がありません: user_id={user_id}");
            return Ok(None);
        };

        let Some(result) = summarize_recommendation(&output, user_id) else {
            warn!("補充推奨の形式が不正なため破棄します: user_id={user_id}");
            return Ok(None);
        };

        let conn = lock_database(db)?;
        let saved = upsert_ai_result_by_user_id(&conn, result)?;

        info!(
            "補充推奨を更新しました: id={}, items={}",
            saved.id,
            saved.recommendation_items.len()
        );

        Ok(Some(saved))
    }

    /// 保存済みの推奨結果を取得する
    pub fn latest(&self, db: &Mutex<Connection>, user_id: &str) -> AppResult<Option<AIResult>> {
        let conn = lock_database(db)?;
        get_ai_result_by_user_id(&conn, user_id)
    }
}
