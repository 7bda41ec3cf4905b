use crate::features::gemini::{
    encode_image_base64, receipt_extraction_prompt, GeminiRequest, GenerativeModel,
};
use crate::features::receipts::{add_receipt, parse_receipt_text, Receipt};
use crate::features::recognition::TextRecognizer;
use crate::shared::database::lock_database;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, info};
use rusqlite::Connection;
use std::sync::Mutex;

/// 領収書スキャンサービス
///
/// 画像 → OCR → Base64 → 生成モデル → 正規化 を順に実行する
pub struct ScanService<R, M> {
    recognizer: R,
    model: M,
}

impl<R: TextRecognizer, M: GenerativeModel> ScanService<R, M> {
    pub fn new(recognizer: R, model: M) -> Self {
        Self { recognizer, model }
    }

    /// 領収書画像を読み取り、保存前の領収書を作成する
    ///
    /// # 引数
    /// * `image` - 撮影した画像（JPEG）
    /// * `user_id` - 所有ユーザーID
    ///
    /// # 戻り値
    /// 領収書。読み取り失敗は `AppError::ExternalService`、解析失敗は `AppError::Parse`
    pub async fn process_image(&self, image: &[u8], user_id: &str) -> AppResult<Receipt> {
        info!("領収書画像の処理を開始します: size={} bytes", image.len());

        let extracted = self
            .recognizer
            .extract_text(image)
            .await
            .map_err(as_extraction_failure)?;
        debug!(
            "OCRでテキストを抽出しました: chars={}, blocks={}",
            extracted.raw_text.chars().count(),
            extracted.blocks.len()
        );

        let request = GeminiRequest::image_with_text(
            encode_image_base64(image),
            receipt_extraction_prompt(),
        );
        let text = self
            .model
            .generate(&request)
            .await
            .map_err(as_extraction_failure)?
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::external_service("Gemini", "応答にテキストがありません"))?;

        let receipt = parse_receipt_text(&text, user_id)?;

        info!(
            "領収書を読み取りました: store={}, items={}",
            receipt.store_name,
            receipt.items.len()
        );

        Ok(receipt)
    }

    /// 確認済みの領収書を保存する
    pub fn save_receipt(&self, db: &Mutex<Connection>, receipt: Receipt) -> AppResult<Receipt> {
        let conn = lock_database(db)?;
        add_receipt(&conn, receipt)
    }
}

fn as_extraction_failure(error: AppError) -> AppError {
    match error {
        AppError::ExternalService(_) => error,
        other => AppError::external_service("テキスト抽出", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::gemini::test_support::ScriptedModel;
    use crate::features::gemini::Part;
    use crate::features::receipts::get_receipts_for_user;
    use crate::features::recognition::test_support::FixedRecognizer;
    use crate::shared::database::open_in_memory;

    const MODEL_REPLY: &str = "- store name : Toko Makmur\n- date and time : 01/02/2024 10:15\n- items : [\n[Rice, 2, 10.000],\n[Tea, 1, 2500]\n]\n- subtotal : 22.500";

    fn service(model: ScriptedModel) -> ScanService<FixedRecognizer, ScriptedModel> {
        ScanService::new(FixedRecognizer::text("TOKO MAKMUR\nRice 2 10.000"), model)
    }

    #[tokio::test]
    async fn test_process_image() {
        let scan = service(ScriptedModel::replying(MODEL_REPLY));

        let receipt = scan.process_image(b"jpeg-bytes", "user-1").await.unwrap();
        assert_eq!(receipt.store_name, "Toko Makmur");
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.total_amount, 22500.0);
        assert_eq!(receipt.full_text, MODEL_REPLY);

        let request = scan.model.last_request().unwrap();
        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::inline_image(encode_image_base64(b"jpeg-bytes"))
        );
        assert!(parts[1].text.as_deref().unwrap().contains("store name"));
    }

    #[tokio::test]
    async fn test_extraction_failures() {
        let ocr_down = ScanService::new(
            FixedRecognizer::failing("camera image unreadable"),
            ScriptedModel::replying(MODEL_REPLY),
        );
        let error = ocr_down.process_image(b"x", "user-1").await.unwrap_err();
        assert!(matches!(error, AppError::ExternalService(_)));
        // OCR失敗時は生成モデルを呼ばない
        assert_eq!(ocr_down.model.request_count(), 0);

        let model_down = service(ScriptedModel::failing("503"));
        assert!(matches!(
            model_down.process_image(b"x", "user-1").await,
            Err(AppError::ExternalService(_))
        ));

        let silent = service(ScriptedModel::empty());
        let error = silent.process_image(b"x", "user-1").await.unwrap_err();
        assert_eq!(error.user_message(), "テキストの読み取りに失敗しました");
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_parse_error() {
        let scan = service(ScriptedModel::replying("**\"cannot detect receipt\"**"));
        let error = scan.process_image(b"x", "user-1").await.unwrap_err();

        assert!(matches!(error, AppError::Parse(_)));
        assert_eq!(error.user_message(), "領収書を解析できませんでした");
    }

    #[tokio::test]
    async fn test_save_receipt() {
        let scan = service(ScriptedModel::replying(MODEL_REPLY));
        let db = Mutex::new(open_in_memory().unwrap());

        let receipt = scan.process_image(b"x", "user-1").await.unwrap();
        let saved = scan.save_receipt(&db, receipt).unwrap();

        let conn = lock_database(&db).unwrap();
        let stored = get_receipts_for_user(&conn, "user-1").unwrap();
        assert_eq!(stored, vec![saved]);
    }
}
