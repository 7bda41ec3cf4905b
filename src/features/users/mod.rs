/// ユーザー機能モジュール
pub mod models;
pub mod repository;

pub use models::User;
pub use repository::{add_user, get_user, update_user};
