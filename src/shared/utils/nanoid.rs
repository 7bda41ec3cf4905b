use nanoid::nanoid;

/// ドキュメントID用のnanoIdを生成する
///
/// # 戻り値
/// 21文字のURL-safeなnanoId
///
/// # 特性
/// - 文字セット: A-Za-z0-9_- (64文字)
/// - 長さ: 21文字
pub fn generate_id() -> String {
    nanoid!()
}

/// IDが空の場合のみ新しいIDを生成する
pub fn ensure_id(id: &str) -> String {
    if id.trim().is_empty() {
        generate_id()
    } else {
        id.to_string()
    }
}

/// nanoIdが有効な形式かどうかを検証する
///
/// # 検証条件
/// - 長さが21文字
/// - URL-safe文字（A-Za-z0-9_-）のみを含む
pub fn is_valid_nanoid(id: &str) -> bool {
    id.len() == 21
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
