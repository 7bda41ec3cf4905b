use crate::features::receipts::{PurchasedItem, Receipt};

/// スキャン画面の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub is_loading: bool,
    /// 読み取った保存前の領収書
    pub receipt: Option<Receipt>,
    pub is_saved: bool,
    pub error_message: Option<String>,
}

/// スキャン画面の操作
#[derive(Debug, Clone, PartialEq)]
pub enum ScanAction {
    ScanStarted,
    Scanned(Receipt),
    /// 保存前に明細を修正
    ItemsEdited(Vec<PurchasedItem>),
    Saved(Receipt),
    Failed(String),
    Reset,
}

impl ScanState {
    /// 操作を適用した新しい状態を返す
    pub fn reduce(&self, action: ScanAction) -> Self {
        match action {
            ScanAction::ScanStarted => Self {
                is_loading: true,
                ..Self::default()
            },
            ScanAction::Scanned(receipt) => Self {
                receipt: Some(receipt),
                ..Self::default()
            },
            ScanAction::ItemsEdited(items) => {
                // 保存後は変更しない
                if self.is_saved {
                    return self.clone();
                }
                let mut next = self.clone();
                if let Some(receipt) = next.receipt.as_mut() {
                    receipt.set_items(items);
                }
                next
            }
            ScanAction::Saved(receipt) => Self {
                receipt: Some(receipt),
                is_saved: true,
                ..Self::default()
            },
            ScanAction::Failed(message) => Self {
                is_loading: false,
                error_message: Some(message),
                ..self.clone()
            },
            ScanAction::Reset => Self::default(),
        }
    }

    /// 日付が推定値であることを表示すべきかどうか
    pub fn shows_estimated_date(&self) -> bool {
        self.receipt
            .as_ref()
            .map(Receipt::has_estimated_date)
            .unwrap_or(false)
    }
}
