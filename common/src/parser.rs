//! 解析テキストパーサー
//!
//! 画像解析APIが返す自由記述テキストを、固定カテゴリの
//! StructuredAnalysis に分解する。I/Oは行わず、失敗もしない。

use crate::types::{AnalysisField, StructuredAnalysis, NOT_DETECTED};
use lazy_static::lazy_static;
use regex::Regex;

/// ラベル直後の区切り文字（コロン、ハイフン、en/em ダッシュ）
const SEPARATOR: &str = r"[ \t]*[:\-–—]";

lazy_static! {
    /// Markdown強調記号（`*` の連続）
    static ref EMPHASIS_RE: Regex = Regex::new(r"\*+").unwrap();

    /// カテゴリごとのラベル検索パターン（AnalysisField::ALL と同順）
    static ref LABEL_RES: Vec<Regex> = AnalysisField::ALL
        .iter()
        .map(|field| {
            Regex::new(&format!("(?i){}{}", regex::escape(field.label()), SEPARATOR)).unwrap()
        })
        .collect();

    /// 次のラベル行の開始
    ///
    /// 「単語+コロン」で始まる行、または既知ラベル（複数語の "Design Summary" を含む）で始まる行。
    static ref BOUNDARY_RE: Regex = {
        let labels = AnalysisField::ALL
            .iter()
            .map(|field| regex::escape(field.label()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\n[ \t]*(?:[a-z][a-z]+:|(?:{}){})", labels, SEPARATOR)).unwrap()
    };
}

/// Markdown強調記号を除去
pub fn strip_emphasis(text: &str) -> String {
    EMPHASIS_RE.replace_all(text, "").into_owned()
}

/// 解析テキストからカテゴリごとの値を抽出
///
/// 抽出ルール:
/// 1. `*` の連続を全て除去（ラベル検索より先に1回だけ）
/// 2. 各カテゴリについて、ラベル名（大文字小文字無視）+ 区切り文字を検索
/// 3. 次のラベル行の直前、または末尾までを値とし、前後の空白を除去
/// 4. ラベルが無ければ `"Not detected or unavailable."`
///
/// 各カテゴリは整形済みテキスト全体に対して独立に検索される。
/// 同じラベルが複数ある場合は最初のものを使う。
///
/// # Examples
/// ```
/// use room_report_common::{extract_fields, AnalysisField};
///
/// let analysis = extract_fields("**Materials:** Oak wood\n**Style:** Modern");
/// assert_eq!(analysis.get(AnalysisField::Materials), "Oak wood");
/// assert_eq!(analysis.get(AnalysisField::Style), "Modern");
/// assert_eq!(analysis.get(AnalysisField::Furniture), "Not detected or unavailable.");
/// ```
pub fn extract_fields(raw: &str) -> StructuredAnalysis {
    let cleaned = strip_emphasis(raw);
    let mut analysis = StructuredAnalysis::filled(NOT_DETECTED);

    for (field, label_re) in AnalysisField::ALL.iter().zip(LABEL_RES.iter()) {
        if let Some(value) = capture_after(label_re, &cleaned) {
            analysis.set(*field, value);
        }
    }

    analysis
}

/// ラベル直後から次のラベル行（または末尾）までを切り出す
fn capture_after<'a>(label_re: &Regex, text: &'a str) -> Option<&'a str> {
    let label = label_re.find(text)?;
    let rest = &text[label.end()..];
    let end = BOUNDARY_RE
        .find(rest)
        .map(|boundary| boundary.start())
        .unwrap_or(rest.len());
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnalysisField::*;

    // =============================================
    // 基本動作
    // =============================================

    #[test]
    fn test_extract_all_labels() {
        let raw = "Materials: Oak and steel\nFurniture: Sofa, table\nStyle: Minimalist\nDesign Summary: A clean space.";
        let analysis = extract_fields(raw);

        assert_eq!(analysis.get(Materials), "Oak and steel");
        assert_eq!(analysis.get(Furniture), "Sofa, table");
        assert_eq!(analysis.get(Style), "Minimalist");
        assert_eq!(analysis.get(DesignSummary), "A clean space.");
    }

    #[test]
    fn test_no_labels_gives_placeholders() {
        let analysis = extract_fields("A bright room with plenty of natural light.");
        for (_, value) in analysis.iter() {
            assert_eq!(value, NOT_DETECTED);
        }
    }

    #[test]
    fn test_empty_input() {
        let analysis = extract_fields("");
        assert_eq!(analysis, StructuredAnalysis::placeholder());
    }

    #[test]
    fn test_markdown_emphasis_removed() {
        let analysis = extract_fields("**Materials:** Oak wood\n**Style:** Modern");

        assert_eq!(analysis.get(Materials), "Oak wood");
        assert_eq!(analysis.get(Style), "Modern");
        assert_eq!(analysis.get(Furniture), NOT_DETECTED);
        assert_eq!(analysis.get(DesignSummary), NOT_DETECTED);
    }

    #[test]
    fn test_emphasis_inside_content_removed() {
        let analysis = extract_fields("Materials: ***polished*** concrete and *raw* brick");
        assert_eq!(analysis.get(Materials), "polished concrete and raw brick");
    }

    // =============================================
    // 区切り文字・大文字小文字
    // =============================================

    #[test]
    fn test_case_insensitive_with_dash() {
        let analysis = extract_fields("materials - concrete");
        assert_eq!(analysis.get(Materials), "concrete");
    }

    #[test]
    fn test_dash_variants() {
        let analysis = extract_fields("STYLE– Industrial\nfurniture— Bench");
        assert_eq!(analysis.get(Style), "Industrial");
        assert_eq!(analysis.get(Furniture), "Bench");
    }

    // =============================================
    // 境界・複数行
    // =============================================

    #[test]
    fn test_multiline_content() {
        let raw = "Furniture:\n- Grey sofa\n- Walnut coffee table\n\nStyle: Scandinavian";
        let analysis = extract_fields(raw);
        assert_eq!(analysis.get(Furniture), "- Grey sofa\n- Walnut coffee table");
        assert_eq!(analysis.get(Style), "Scandinavian");
    }

    #[test]
    fn test_unknown_label_ends_capture() {
        let raw = "Materials: Marble\nLighting: Pendant lamps\nStyle: Classic";
        let analysis = extract_fields(raw);
        assert_eq!(analysis.get(Materials), "Marble");
        assert_eq!(analysis.get(Style), "Classic");
    }

    #[test]
    fn test_multi_word_label_ends_capture() {
        let analysis = extract_fields("Style: Boho\nDesign Summary: Warm and layered.");
        assert_eq!(analysis.get(Style), "Boho");
        assert_eq!(analysis.get(DesignSummary), "Warm and layered.");
    }

    #[test]
    fn test_label_without_content_is_empty_not_placeholder() {
        let analysis = extract_fields("Materials:\nFurniture: Chair\nStyle:");
        assert_eq!(analysis.get(Materials), "");
        assert_eq!(analysis.get(Furniture), "Chair");
        assert_eq!(analysis.get(Style), "");
        assert_eq!(analysis.get(DesignSummary), NOT_DETECTED);
    }

    #[test]
    fn test_duplicate_label_uses_first() {
        let raw = "Style: Modern\nMaterials: Glass\nStyle: Rustic";
        let analysis = extract_fields(raw);
        assert_eq!(analysis.get(Style), "Modern");
    }

    #[test]
    fn test_out_of_order_labels() {
        let raw = "Design Summary: Calm.\nStyle: Japandi\nMaterials: Linen";
        let analysis = extract_fields(raw);
        assert_eq!(analysis.get(Materials), "Linen");
        assert_eq!(analysis.get(Style), "Japandi");
        assert_eq!(analysis.get(DesignSummary), "Calm.");
        assert_eq!(analysis.get(Furniture), NOT_DETECTED);
    }

    #[test]
    fn test_crlf_line_endings_trimmed() {
        let analysis = extract_fields("Materials: Oak\r\nStyle: Modern\r\n");
        assert_eq!(analysis.get(Materials), "Oak");
        assert_eq!(analysis.get(Style), "Modern");
    }

    // =============================================
    // 性質
    // =============================================

    #[test]
    fn test_values_are_trimmed() {
        let raw = "Materials:    \t  Oak   \n\n\nFurniture:   Sofa  ";
        let analysis = extract_fields(raw);
        for (_, value) in analysis.iter() {
            assert_eq!(value, value.trim());
        }
    }

    #[test]
    fn test_extract_is_repeatable() {
        let raw = "Materials: Oak\nFurniture: Sofa\nStyle: Modern\nDesign Summary: Bright.";
        assert_eq!(extract_fields(raw), extract_fields(raw));
    }

    #[test]
    fn test_adversarial_input_never_panics() {
        let inputs = ["*", "****", ":::", "\n\n\n", "Materials", "Materials-", "Design Summary:*"];
        for input in inputs {
            let analysis = extract_fields(input);
            assert_eq!(analysis.iter().count(), AnalysisField::COUNT);
        }
    }
}
