//! 生成モデルが出力した領収書テキストを構造化された領収書に変換する
//!
//! 入力は次のような半構造化テキスト（またはJSONオブジェクト）を想定する。
//!
//! ```text
//! - store name : Toko Makmur
//! - date and time : 01/02/2024 14:30
//! - items : [
//! [Rice, 2, 10000],
//! [Egg, 10, 2.000]
//! ]
//! - subtotal : 40000
//! ```
//!
//! 解析方針:
//! - `items` セクションと `subtotal` は必須。欠落や括弧の不整合は全体を失敗とする
//! - 個々の明細が不正な場合はその明細のみ読み飛ばす
//! - 店舗名は省略時 `Unknown Store`、税額・割引額は省略時 0
//! - 日付が解析できない場合は処理日で代用し、`DateSource::Fallback` を記録する
//! - 区切りが1つで後ろが3桁、かつ整数部が0以外の1〜3桁なら桁区切りとみなす
//!   （`1.875` は 1875、`0.125` は 0.125）
//! - 商品名にカンマや括弧を含む場合は `"..."` で囲む（`\"` と `\\` でエスケープ）

use crate::features::items::Item;
use crate::features::receipts::models::{
    DateSource, PurchasedItem, Receipt, DEFAULT_CURRENCY, UNKNOWN_STORE,
};
use crate::shared::config::environment::app_timezone;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{current_timestamp, generate_id, non_negative, today};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// 生成モデルが「領収書ではない」と判断した場合に返す文字列
pub const NO_RECEIPT_SENTINEL: &str = "cannot detect receipt";

/// 日付の解析に試す書式（先に一致したものを採用）
pub const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// 商品名が無い明細に付ける名前
pub const UNNAMED_ITEM: &str = "Unnamed";

static ITEMS_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[\s\-*]*items\s*\**\s*:?\s*\**\s*\[").expect("items key pattern")
});

static KEY_VALUE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s\-*]*([A-Za-z][A-Za-z _]*?)\s*\**\s*:\s*(.*)$").expect("key value pattern")
});

static THOUSANDS_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}(\.\d+)?$").expect("thousands group pattern"));

/// 領収書テキストの解析エラー
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("テキストが空です")]
    Empty,

    #[error("領収書が検出されませんでした")]
    NoReceiptDetected,

    #[error("必須フィールドがありません: {0}")]
    MissingField(&'static str),

    #[error("items の形式が不正です: {0}")]
    MalformedItems(String),

    #[error("{field} の値が数値ではありません: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("JSONの解析に失敗しました: {0}")]
    Json(String),
}

impl From<NormalizeError> for AppError {
    fn from(error: NormalizeError) -> Self {
        AppError::Parse(error.to_string())
    }
}

/// 解析途中の明細
#[derive(Debug, Clone, PartialEq)]
struct RawItem {
    name: Option<String>,
    quantity: i64,
    price: f64,
}

/// 解析途中の領収書
#[derive(Debug, Default)]
struct RawReceipt {
    store_name: Option<String>,
    date_text: Option<String>,
    items: Vec<RawItem>,
    subtotal: Option<f64>,
    tax: Option<f64>,
    discount: Option<f64>,
}

/// 領収書テキストを解析する（日付の代用値はアプリのタイムゾーンでの今日）
pub fn parse_receipt_text(raw: &str, user_id: &str) -> AppResult<Receipt> {
    normalize_receipt(raw, user_id, today(app_timezone())).map_err(|e| {
        log::warn!("領収書テキストの解析に失敗しました: {e}");
        AppError::from(e)
    })
}

/// 領収書テキストを構造化された領収書に変換する
///
/// # 引数
/// * `raw` - 生成モデルの出力テキスト
/// * `user_id` - 所有ユーザーID
/// * `today` - 日付が解析できない場合に使う日付
///
/// # 戻り値
/// 領収書、または解析できない場合はエラー（部分的な領収書は返さない）
pub fn normalize_receipt(
    raw: &str,
    user_id: &str,
    today: NaiveDate,
) -> Result<Receipt, NormalizeError> {
    let cleaned = strip_code_fences(raw);
    log::debug!("コードフェンス除去後のテキスト:\n{cleaned}");

    if cleaned.is_empty() {
        return Err(NormalizeError::Empty);
    }
    if is_no_receipt_sentinel(&cleaned) {
        return Err(NormalizeError::NoReceiptDetected);
    }

    let parsed = if cleaned.starts_with('{') {
        parse_json_template(&cleaned)?
    } else {
        parse_line_template(&cleaned)?
    };

    let subtotal = parsed
        .subtotal
        .ok_or(NormalizeError::MissingField("subtotal"))?;

    let (date, date_source) = match parsed.date_text.as_deref().and_then(parse_date) {
        Some(date) => (date, DateSource::Parsed),
        None => {
            log::warn!(
                "日付を解析できないため処理日で代用します: {:?}",
                parsed.date_text
            );
            (today, DateSource::Fallback)
        }
    };

    let timestamp = current_timestamp(app_timezone());
    let items: Vec<PurchasedItem> = parsed
        .items
        .into_iter()
        .map(|raw_item| PurchasedItem {
            item: Item {
                price: sanitize_price(raw_item.price),
                ..Item::stub(sanitize_name(raw_item.name.as_deref()), &timestamp)
            },
            quantity: sanitize_quantity(raw_item.quantity),
        })
        .collect();

    let mut receipt = Receipt {
        id: generate_id(),
        user_id: user_id.to_string(),
        store_name: parsed
            .store_name
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_STORE.to_string()),
        date,
        date_source,
        items: Vec::new(),
        subtotal: non_negative(subtotal),
        total_amount: 0.0,
        tax_amount: parsed.tax.map(non_negative).unwrap_or(0.0),
        discount_amount: parsed.discount.map(non_negative).unwrap_or(0.0),
        currency: DEFAULT_CURRENCY.to_string(),
        full_text: raw.to_string(),
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    receipt.set_items(items);

    log::info!(
        "領収書を解析しました: store={}, date={} ({:?}), items={}, total={}",
        receipt.store_name,
        receipt.date,
        receipt.date_source,
        receipt.items.len(),
        receipt.total_amount
    );

    Ok(receipt)
}

/// コードブロックの囲み（```json / ```）を取り除く
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// 「領収書を検出できない」応答かどうか
pub fn is_no_receipt_sentinel(text: &str) -> bool {
    let normalized: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '"' | '\'' | '`'))
        .collect();
    normalized
        .trim()
        .trim_end_matches('.')
        .eq_ignore_ascii_case(NO_RECEIPT_SENTINEL)
}

/// 日付文字列を解析する
///
/// 先頭の日付部分を `DATE_FORMATS` の順に厳密に解析し、後続の時刻などは無視する
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let candidate = text.trim();

    DATE_FORMATS.iter().find_map(|format| {
        let (date, remainder) = NaiveDate::parse_and_remainder(candidate, format).ok()?;
        // 年の途中で切れた場合は一致としない
        (!remainder.starts_with(|c: char| c.is_ascii_digit())).then_some(date)
    })
}

/// 価格を補正する（負数・非数は0）
pub fn sanitize_price(price: f64) -> f64 {
    non_negative(price)
}

/// 数量を補正する（0以下は1）
pub fn sanitize_quantity(quantity: i64) -> u32 {
    if quantity > 0 {
        u32::try_from(quantity).unwrap_or(u32::MAX)
    } else {
        1
    }
}

/// 商品名を補正する（前後を囲む引用符は外し、空の場合は `Unnamed`）
pub fn sanitize_name(name: Option<&str>) -> String {
    name.map(|n| strip_wrapping_quotes(n.trim()).trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(UNNAMED_ITEM)
        .to_string()
}

fn strip_wrapping_quotes(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            text.strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(text)
}

/// 金額文字列を数値に変換する
///
/// 通貨記号や空白は無視し、桁区切り（`10.000` / `10,000`）と小数点を判別する
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let negative = trimmed
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-')
        .starts_with('-');

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let kept = kept.trim_matches(|c: char| c == '.' || c == ',');

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let has_dot = kept.contains('.');
    let has_comma = kept.contains(',');

    let normalized = match (has_dot, has_comma) {
        (true, true) => {
            // 最後に現れた区切りを小数点とみなす
            let last_dot = kept.rfind('.').unwrap_or(0);
            let last_comma = kept.rfind(',').unwrap_or(0);
            if last_dot > last_comma {
                kept.replace(',', "")
            } else {
                kept.replace('.', "").replace(',', ".")
            }
        }
        (true, false) => normalize_single_separator(kept, '.'),
        (false, true) => normalize_single_separator(kept, ','),
        (false, false) => kept.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn normalize_single_separator(text: &str, separator: char) -> String {
    let count = text.matches(separator).count();
    let digits_after = text
        .rsplit(separator)
        .next()
        .map(|tail| tail.len())
        .unwrap_or(0);

    let head = text.split(separator).next().unwrap_or("");
    let grouped_head =
        (1..=3).contains(&head.len()) && head.chars().any(|c| c != '0');

    if count > 1 || (digits_after == 3 && grouped_head) {
        // 桁区切り
        text.replace(separator, "")
    } else {
        text.replace(separator, ".")
    }
}

/// 数量文字列を整数に変換する
fn parse_quantity(text: &str) -> Option<i64> {
    let trimmed = text.trim().trim_matches(|c: char| c == '"' || c == '\'');
    if let Ok(quantity) = trimmed.parse::<i64>() {
        return Some(quantity);
    }
    let value: f64 = trimmed.parse().ok()?;
    (value.fract() == 0.0 && value.is_finite()).then_some(value as i64)
}

/// 行形式のテンプレートを解析する
fn parse_line_template(text: &str) -> Result<RawReceipt, NormalizeError> {
    let items_match = ITEMS_KEY
        .find(text)
        .ok_or(NormalizeError::MissingField("items"))?;

    // 一致範囲の末尾は開き括弧
    let open = items_match.end() - 1;
    let close = find_matching_bracket(text, open).ok_or_else(|| {
        NormalizeError::MalformedItems("items の閉じ括弧がありません".to_string())
    })?;

    let items = parse_item_tuples(&text[open + 1..close])?;

    let mut remaining = String::with_capacity(text.len());
    remaining.push_str(&text[..items_match.start()]);
    remaining.push('\n');
    remaining.push_str(&text[close + 1..]);

    let mut receipt = RawReceipt {
        items,
        ..RawReceipt::default()
    };

    for line in remaining.lines() {
        let Some(captures) = KEY_VALUE_LINE.captures(line) else {
            continue;
        };
        let key = captures[1].trim().to_lowercase().replace('_', " ");
        let value = clean_value(&captures[2]);

        match key.as_str() {
            "store name" | "store" | "merchant" => receipt.store_name = Some(value),
            "date and time" | "date" | "date time" => receipt.date_text = Some(value),
            "subtotal" | "sub total" => {
                receipt.subtotal = Some(parse_amount(&value).ok_or_else(|| {
                    NormalizeError::InvalidNumber {
                        field: "subtotal",
                        value: value.clone(),
                    }
                })?);
            }
            "tax" | "tax amount" | "taxamount" => receipt.tax = parse_optional_amount("tax", &value),
            "discount" | "discount amount" | "discountamount" => {
                receipt.discount = parse_optional_amount("discount", &value)
            }
            _ => {}
        }
    }

    Ok(receipt)
}

fn parse_optional_amount(field: &str, value: &str) -> Option<f64> {
    let parsed = parse_amount(value);
    if parsed.is_none() && !value.is_empty() {
        log::warn!("{field} の値を解析できないため0とします: {value}");
    }
    parsed
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| c == '*' || c == '"' || c == '<' || c == '>')
        .trim()
        .to_string()
}

/// 引用符で囲まれた商品名の内外を追跡する
///
/// `"` はフィールドの先頭（`[` または `,` の直後）に現れた場合のみ引用符とみなす
struct QuoteTracker {
    in_quotes: bool,
    escaped: bool,
    at_field_start: bool,
}

impl QuoteTracker {
    fn new() -> Self {
        Self {
            in_quotes: false,
            escaped: false,
            at_field_start: true,
        }
    }

    /// 1文字読み進め、引用符の外にある構造上の文字ならtrueを返す
    fn is_structural(&mut self, c: char) -> bool {
        if self.in_quotes {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_quotes = false;
            }
            return false;
        }

        if c == '"' && self.at_field_start {
            self.in_quotes = true;
            self.at_field_start = false;
            return false;
        }

        if c == '[' || c == ',' {
            self.at_field_start = true;
        } else if !c.is_whitespace() {
            self.at_field_start = false;
        }
        true
    }
}

/// 開き括弧に対応する閉じ括弧の位置を探す
fn find_matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quotes = QuoteTracker::new();
    for (offset, c) in text[open..].char_indices() {
        if !quotes.is_structural(c) {
            continue;
        }
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// `[name, quantity, price]` の並びを解析する（不正な明細は読み飛ばす）
fn parse_item_tuples(inner: &str) -> Result<Vec<RawItem>, NormalizeError> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut stray = String::new();
    let mut quotes = QuoteTracker::new();

    for c in inner.chars() {
        if !quotes.is_structural(c) {
            if depth > 0 {
                current.push(c);
            } else {
                stray.push(c);
            }
            continue;
        }
        match c {
            '[' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    match parse_item_tuple(&current) {
                        Some(item) => items.push(item),
                        None => log::warn!("不正な明細を読み飛ばします: [{current}]"),
                    }
                    current.clear();
                } else {
                    current.push(c);
                }
            }
            _ if depth > 0 => current.push(c),
            _ => stray.push(c),
        }
    }

    let stray = stray.trim_matches(|c: char| c.is_whitespace() || c == ',');
    if !stray.is_empty() {
        if items.is_empty() {
            return Err(NormalizeError::MalformedItems(format!(
                "明細が [name, quantity, price] の形式ではありません: {stray}"
            )));
        }
        log::warn!("明細の外側にある不正な文字列を読み飛ばします: {stray}");
    }

    Ok(items)
}

/// 1件の明細を解析する
///
/// `"..."` で囲まれた商品名はそのまま採用する。囲まれていない場合は商品名に
/// カンマが含まれることや価格が `10,000` のように桁区切りされていることがあるため、
/// 末尾から価格・数量を切り出し、残りを商品名とする
fn parse_item_tuple(tuple: &str) -> Option<RawItem> {
    if let Some(quoted) = tuple.trim_start().strip_prefix('"') {
        let (name, rest) = split_quoted_name(quoted)?;
        if rest.contains('[') || rest.contains(']') {
            return None;
        }
        let tokens: Vec<&str> = rest.trim_start().strip_prefix(',')?.split(',').collect();
        let (quantity, price) = quantity_and_price(&tokens)?;
        return Some(RawItem {
            name: Some(name).filter(|n| !n.trim().is_empty()),
            quantity,
            price,
        });
    }

    if tuple.contains('[') || tuple.contains(']') {
        return None;
    }

    let tokens: Vec<&str> = tuple.split(',').collect();
    if tokens.len() < 3 {
        return None;
    }

    // 価格に使うトークン数が多い（＝桁区切りとみなせる）分割を優先する
    (1..tokens.len() - 1).find_map(|quantity_index| {
        let (quantity, price) = quantity_and_price(&tokens[quantity_index..])?;
        let name = tokens[..quantity_index].join(",");
        Some(RawItem {
            name: Some(name.trim().to_string()).filter(|n| !n.is_empty()),
            quantity,
            price,
        })
    })
}

/// 引用符の直後から閉じ引用符までを商品名として取り出す
fn split_quoted_name(text: &str) -> Option<(String, &str)> {
    let mut name = String::new();
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if escaped {
            name.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some((name, &text[index + 1..]));
        } else {
            name.push(c);
        }
    }
    None
}

/// 先頭を数量、残りを価格として解析する
fn quantity_and_price(tokens: &[&str]) -> Option<(i64, f64)> {
    let (quantity, price) = tokens.split_first()?;
    let price = price_from_tokens(price)?;
    Some((parse_quantity(quantity)?, price))
}

fn price_from_tokens(tokens: &[&str]) -> Option<f64> {
    match tokens {
        [single] => parse_amount(single),
        [first, rest @ ..] => {
            let first = first.trim();
            let leading_digits = first
                .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-')
                .trim_start_matches('-');
            let grouped = !leading_digits.is_empty()
                && leading_digits.len() <= 3
                && leading_digits.chars().all(|c| c.is_ascii_digit())
                && rest.iter().all(|t| THOUSANDS_GROUP.is_match(t.trim()));
            if !grouped {
                return None;
            }
            let joined: String = std::iter::once(first)
                .chain(rest.iter().map(|t| t.trim()))
                .collect::<Vec<_>>()
                .join("");
            parse_amount(&joined)
        }
        [] => None,
    }
}

/// JSONオブジェクト形式を解析する
fn parse_json_template(text: &str) -> Result<RawReceipt, NormalizeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| NormalizeError::Json(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| NormalizeError::Json("トップレベルがオブジェクトではありません".to_string()))?;

    let items_value = object
        .get("items")
        .ok_or(NormalizeError::MissingField("items"))?;
    let items_array = items_value
        .as_array()
        .ok_or_else(|| NormalizeError::MalformedItems("items が配列ではありません".to_string()))?;

    let items = items_array
        .iter()
        .filter_map(|entry| {
            let parsed = json_item(entry);
            if parsed.is_none() {
                log::warn!("不正な明細を読み飛ばします: {entry}");
            }
            parsed
        })
        .collect();

    let subtotal = match object.get("subtotal") {
        None | Some(Value::Null) => None,
        Some(v) => Some(json_number(v).ok_or_else(|| NormalizeError::InvalidNumber {
            field: "subtotal",
            value: v.to_string(),
        })?),
    };

    Ok(RawReceipt {
        store_name: object
            .get("store name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        date_text: object
            .get("date and time")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        items,
        subtotal,
        tax: object.get("taxAmount").and_then(json_number),
        discount: object.get("discountAmount").and_then(json_number),
    })
}

fn json_item(entry: &Value) -> Option<RawItem> {
    let tuple = entry.as_array()?;
    if tuple.len() < 3 {
        return None;
    }

    let name = match &tuple[0] {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    };
    let quantity = match &tuple[1] {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => parse_quantity(s)?,
        _ => return None,
    };
    let price = json_number(&tuple[2])?;

    Some(RawItem {
        name,
        quantity,
        price,
    })
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}
