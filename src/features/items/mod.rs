/// 商品機能モジュール
///
/// 商品マスタ（名前・単価・説明）の作成、取得、更新、削除を提供します。
/// 領収書から解析された商品もこのモデルで表現されます。
pub mod models;
pub mod repository;
pub mod state;

pub use models::{parse_price_input, CreateItemDto, Item, UpdateItemDto};
pub use repository::{add_item, delete_item, get_item, get_items, update_item};
pub use state::{ItemListAction, ItemListState};
