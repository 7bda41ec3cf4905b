// 生成モデルに渡すプロンプト
//
// 出力形式は receipts::normalizer と recommendations::summarizer が解析する形式と一致させること

use crate::features::receipts::normalizer::NO_RECEIPT_SENTINEL;
use crate::features::recommendations::summarizer::{ITEMS_DELIMITER, SUMMARY_DELIMITER};

/// 領収書画像から構造化テキストを抽出するプロンプト
pub fn receipt_extraction_prompt() -> String {
    format!(
        "Read the receipt in this image (printed or handwritten) and reply with exactly these fields:\n\
         - store name : <name of the store, or your best guess>\n\
         - date and time : <transaction date as DD/MM/YYYY, estimated if unclear>\n\
         - items : [\n\
         [item name, quantity, unit price],\n\
         [item name, quantity, unit price]\n\
         ]\n\
         - subtotal : <subtotal amount>\n\
         \n\
         Use plain numbers for quantity and price. When part of the receipt is hard to read, \
         fill it in with a plausible value that fits common receipts.\n\
         \n\
         If the image does not show a receipt, or nothing on it can be read, reply with only:\n\
         \"{NO_RECEIPT_SENTINEL}\"\n\
         \n\
         Reply with the fields above and nothing else."
    )
}

/// 直近の領収書テキストから補充推奨を作成するプロンプト
///
/// # 引数
/// * `receipt_texts` - 空行で連結した領収書テキスト
pub fn restock_recommendation_prompt(receipt_texts: &str) -> String {
    format!(
        "You help a small food business plan its stock.\n\
         The receipt texts below show what was sold recently:\n\
         \n\
         \"{receipt_texts}\"\n\
         \n\
         Look at which items sell often or in large quantities and which items are bought together, \
         then suggest what to restock without overstocking, so less food goes to waste.\n\
         \n\
         Reply in this format:\n\
         - {ITEMS_DELIMITER}\n\
         [item name 1, item name 2, item name 3]\n\
         \n\
         {SUMMARY_DELIMITER}\n\
         <one or two sentences explaining the recommendation>\n\
         \n\
         If the texts are not receipts or are too unclear to use, reply with only:\n\
         \"{NO_RECEIPT_SENTINEL}\"\n\
         \n\
         Reply in the format above and nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_prompt_names_parsed_fields() {
        let prompt = receipt_extraction_prompt();
        for key in ["store name :", "date and time :", "items : [", "subtotal :"] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("\"cannot detect receipt\""));
    }

    #[test]
    fn test_restock_prompt_embeds_texts_and_delimiters() {
        let prompt = restock_recommendation_prompt("Rice 2 10000\n\nTea 1 2500");
        assert!(prompt.contains("\"Rice 2 10000\n\nTea 1 2500\""));
        assert!(prompt.contains("Recommended items to restock:"));
        assert!(prompt.contains("Summary:"));
        assert!(prompt.contains("cannot detect receipt"));
    }
}
