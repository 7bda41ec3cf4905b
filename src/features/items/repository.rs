use crate::features::items::models::{CreateItemDto, Item, UpdateItemDto};
use crate::shared::config::environment::app_timezone;
use crate::shared::database::documents;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{current_timestamp, generate_id, non_negative};
use rusqlite::Connection;

/// 商品を作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - 商品作成用DTO
///
/// # 戻り値
/// 作成された商品、または失敗時はエラー
pub fn add_item(conn: &Connection, dto: CreateItemDto) -> AppResult<Item> {
    let name = dto.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("商品名は必須項目です"));
    }

    let now = current_timestamp(app_timezone());
    let item = Item {
        id: generate_id(),
        name,
        price: non_negative(dto.price),
        description: dto.description.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    documents::upsert(conn, &item)?;
    log::info!("商品を作成しました: id={}, name={}", item.id, item.name);

    Ok(item)
}

/// IDで商品を取得する
pub fn get_item(conn: &Connection, id: &str) -> AppResult<Item> {
    documents::find_by_id::<Item>(conn, id)?.ok_or_else(|| AppError::not_found("商品"))
}

/// 商品一覧を名前順で取得する
pub fn get_items(conn: &Connection) -> AppResult<Vec<Item>> {
    let mut items: Vec<Item> = documents::find_all(conn)?;
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// 商品を更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - 商品ID（空の場合はバリデーションエラー）
/// * `dto` - 商品更新用DTO
pub fn update_item(conn: &Connection, id: &str, dto: UpdateItemDto) -> AppResult<Item> {
    if id.trim().is_empty() {
        log::error!("IDのない商品を更新しようとしました");
        return Err(AppError::validation("商品IDが指定されていません"));
    }

    let existing = get_item(conn, id)?;

    let updated = Item {
        name: dto
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(existing.name),
        price: dto.price.map(non_negative).unwrap_or(existing.price),
        description: dto.description.unwrap_or(existing.description),
        updated_at: current_timestamp(app_timezone()),
        ..existing
    };

    documents::upsert(conn, &updated)?;

    Ok(updated)
}

/// 商品を削除する
pub fn delete_item(conn: &Connection, id: &str) -> AppResult<()> {
    if !documents::delete::<Item>(conn, id)? {
        return Err(AppError::not_found("商品"));
    }
    Ok(())
}
