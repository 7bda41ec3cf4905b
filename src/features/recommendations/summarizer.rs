use crate::features::items::Item;
use crate::features::recommendations::models::{AIResult, Recommendation};
use crate::shared::config::environment::app_timezone;
use crate::shared::utils::{current_timestamp, generate_id};

/// 推奨商品リストの見出し
pub const ITEMS_DELIMITER: &str = "Recommended items to restock:";

/// 要約の見出し
pub const SUMMARY_DELIMITER: &str = "Summary:";

/// 推奨商品に付ける固定の理由
pub const RESTOCK_RATIONALE: &str = "Recommended for restock based on frequent sales";

/// 生成モデルの補充推奨テキストを解析する
///
/// # 引数
/// * `text` - 生成モデルの出力
/// * `user_id` - 所有ユーザーID
///
/// # 戻り値
/// 推奨結果。見出しが欠けている場合はNone
pub fn summarize_recommendation(text: &str, user_id: &str) -> Option<AIResult> {
    let (_, after_items) = text.split_once(ITEMS_DELIMITER)?;
    let (items_section, summary) = after_items.split_once(SUMMARY_DELIMITER)?;

    let timestamp = current_timestamp(app_timezone());
    let recommendation_items: Vec<Recommendation> = parse_item_names(items_section)
        .into_iter()
        .map(|name| Recommendation {
            item: Item::stub(name, &timestamp),
            recommendation: RESTOCK_RATIONALE.to_string(),
        })
        .collect();

    log::debug!(
        "補充推奨を解析しました: items={}, user_id={user_id}",
        recommendation_items.len()
    );

    Some(AIResult {
        id: generate_id(),
        receipt_id: String::new(),
        user_id: user_id.to_string(),
        recommendation_summary: summary.trim().to_string(),
        recommendation_items,
        created_at: timestamp,
    })
}

/// `[a, b, c]` 形式の商品名リストを分割する
fn parse_item_names(section: &str) -> Vec<String> {
    let trimmed = section.trim();
    let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
