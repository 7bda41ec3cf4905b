use crate::features::items::models::Item;

/// 商品一覧画面の状態
#[derive(Debug, Clone, PartialEq)]
pub struct ItemListState {
    pub items: Vec<Item>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    /// 編集シートの表示
    pub is_sheet_open: bool,
    /// 編集中の商品（新規作成時はNone）
    pub selected_item: Option<Item>,
}

impl Default for ItemListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: true,
            error_message: None,
            is_sheet_open: false,
            selected_item: None,
        }
    }
}

/// 商品一覧画面の操作
#[derive(Debug, Clone, PartialEq)]
pub enum ItemListAction {
    LoadStarted,
    Loaded(Vec<Item>),
    SheetOpened(Option<Item>),
    SheetDismissed,
    Failed(String),
}

impl ItemListState {
    /// 操作を適用した新しい状態を返す
    pub fn reduce(&self, action: ItemListAction) -> Self {
        let mut next = self.clone();
        match action {
            ItemListAction::LoadStarted => next.is_loading = true,
            ItemListAction::Loaded(items) => {
                next.items = items;
                next.is_loading = false;
                next.error_message = None;
            }
            ItemListAction::SheetOpened(item) => {
                next.is_sheet_open = true;
                next.selected_item = item;
            }
            ItemListAction::SheetDismissed => {
                next.is_sheet_open = false;
                next.selected_item = None;
            }
            ItemListAction::Failed(message) => {
                next.is_loading = false;
                next.error_message = Some(message);
            }
        }
        next
    }

    /// IDで一覧中の商品を探す
    pub fn find(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }
}
