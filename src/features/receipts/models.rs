// 領収書機能のデータモデル

use crate::features::items::Item;
use crate::shared::database::{Collection, Document};
use crate::shared::utils::format_amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// 通貨の既定値
pub const DEFAULT_CURRENCY: &str = "IDR";

/// 店舗名が読み取れなかった場合の表示名
pub const UNKNOWN_STORE: &str = "Unknown Store";

/// 取引日の由来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// 領収書テキストから解析した日付
    Parsed,
    /// 解析できず、処理日で代用した日付
    Fallback,
}

/// 購入明細（商品と数量）
///
/// 領収書に埋め込まれ、単独では保存されない
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PurchasedItem {
    pub item: Item,
    pub quantity: u32,
}

impl PurchasedItem {
    /// 明細の小計（単価 × 数量）
    pub fn line_total(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// 領収書データモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Receipt {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub store_name: String,
    /// 取引日
    pub date: NaiveDate,
    pub date_source: DateSource,
    pub items: Vec<PurchasedItem>,
    /// 生成モデルが出力した小計（検証はしない）
    pub subtotal: f64,
    /// 明細から計算した合計（単価 × 数量の総和）
    pub total_amount: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub currency: String,
    /// 解析元の生テキスト（監査用）
    pub full_text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Receipt {
    /// 明細から合計金額を計算する
    pub fn compute_total(items: &[PurchasedItem]) -> f64 {
        items.iter().map(PurchasedItem::line_total).sum()
    }

    /// 合計金額を再計算する
    pub fn recompute_total(&mut self) {
        self.total_amount = Self::compute_total(&self.items);
    }

    /// 明細を置き換え、合計金額を再計算する
    pub fn set_items(&mut self, items: Vec<PurchasedItem>) {
        self.items = items;
        self.recompute_total();
    }

    /// 取引日が代用値かどうか
    pub fn has_estimated_date(&self) -> bool {
        self.date_source == DateSource::Fallback
    }

    /// 明細を `[[name,quantity,price],...]` 形式で出力する
    ///
    /// カンマ・括弧・引用符を含む商品名は `"..."` で囲む
    pub fn serialize_items(&self) -> String {
        let tuples: Vec<String> = self
            .items
            .iter()
            .map(|p| {
                format!(
                    "[{},{},{}]",
                    quote_item_name(&p.item.name),
                    p.quantity,
                    format_amount(p.item.price)
                )
            })
            .collect();
        format!("[{}]", tuples.join(","))
    }
}

fn quote_item_name(name: &str) -> Cow<'_, str> {
    if name.contains(|c: char| matches!(c, ',' | '[' | ']' | '"')) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        Cow::Owned(format!("\"{escaped}\""))
    } else {
        Cow::Borrowed(name)
    }
}

impl Document for Receipt {
    const COLLECTION: Collection = Collection::Receipts;

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
        &self.updated_at
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// テスト用の領収書を作成する
    pub fn receipt_on(date: NaiveDate, total: f64) -> Receipt {
        let item = Item {
            price: total,
            ..Item::stub("Item", "2024-01-01T00:00:00+07:00")
        };
        let mut receipt = Receipt {
            id: format!("r-{date}-{total}"),
            user_id: "user-1".to_string(),
            store_name: "Toko".to_string(),
            date,
            date_source: DateSource::Parsed,
            items: Vec::new(),
            subtotal: total,
            total_amount: 0.0,
            tax_amount: 0.0,
            discount_amount: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            full_text: String::new(),
            created_at: format!("{date}T00:00:00+07:00"),
            updated_at: format!("{date}T00:00:00+07:00"),
        };
        receipt.set_items(vec![PurchasedItem { item, quantity: 1 }]);
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::receipt_on;
    use super::*;

    fn purchased(name: &str, price: f64, quantity: u32) -> PurchasedItem {
        PurchasedItem {
            item: Item {
                price,
                ..Item::stub(name, "2024-01-01T00:00:00+07:00")
            },
            quantity,
        }
    }

    #[test]
    fn test_total_is_recomputed_when_items_change() {
        let mut receipt = receipt_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 100.0);
        assert_eq!(receipt.total_amount, 100.0);

        receipt.set_items(vec![purchased("Rice", 10000.0, 2), purchased("Egg", 2000.0, 3)]);
        assert_eq!(receipt.total_amount, 26000.0);
        // 小計は解析値のまま
        assert_eq!(receipt.subtotal, 100.0);
    }

    #[test]
    fn test_serialize_items() {
        let mut receipt = receipt_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 0.0);
        receipt.set_items(vec![purchased("Rice", 10000.0, 2), purchased("Tea", 2500.5, 1)]);

        assert_eq!(receipt.serialize_items(), "[[Rice,2,10000],[Tea,1,2500.50]]");
    }

    #[test]
    fn test_serialize_items_quotes_names_with_separators() {
        let mut receipt = receipt_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 0.0);
        receipt.set_items(vec![
            purchased("Pack, 12", 1500.0, 2),
            purchased("Pipe 5\"", 300.0, 1),
        ]);

        assert_eq!(
            receipt.serialize_items(),
            r#"[["Pack, 12",2,1500],["Pipe 5\"",1,300]]"#
        );
    }

    #[test]
    fn test_date_source_serialization() {
        assert_eq!(
            serde_json::to_string(&DateSource::Fallback).unwrap(),
            "\"fallback\""
        );
        let mut receipt = receipt_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 0.0);
        assert!(!receipt.has_estimated_date());
        receipt.date_source = DateSource::Fallback;
        assert!(receipt.has_estimated_date());
    }
}
