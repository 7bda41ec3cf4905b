use std::env;

fn main() {
    // 環境変数をコンパイル時に埋め込み
    // ENVIRONMENT環境変数に基づいて適切な.envファイルを読み込み
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    println!("cargo:rerun-if-env-changed=ENVIRONMENT");
    println!("cargo:rerun-if-changed={env_file}");

    // 環境変数ファイルを読み込み
    if dotenv::from_filename(env_file).is_ok() {
        println!("cargo:warning={env_file}ファイルを読み込みました");

        // 生成モデルAPIの設定を埋め込み
        if let Ok(api_key) = env::var("GEMINI_API_KEY") {
            println!("cargo:rustc-env=EMBEDDED_GEMINI_API_KEY={api_key}");
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            println!("cargo:rustc-env=EMBEDDED_GEMINI_MODEL={model}");
        }
        if let Ok(timezone) = env::var("APP_TIMEZONE") {
            println!("cargo:rustc-env=EMBEDDED_APP_TIMEZONE={timezone}");
        }

        // 注意: EMBEDDED_ENVIRONMENTは設定しない
        // 実行時に.envファイルから環境変数を読み込むため
    } else {
        println!("cargo:warning={env_file}ファイルが見つかりません");
    }
}
