//! PDF export core utilities.
//!
//! ページ上の配置計算（mm、ページ上端基準）と折り返し処理。
//! 描画バックエンドには依存しない。

use crate::layout::{mm_to_pt, pt_to_mm, PdfLayout};
use crate::types::StructuredAnalysis;

/// 文字スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// ページヘッダー（太字・大）
    Header,
    /// フィールドラベル（太字）
    Label,
    /// フィールド本文
    Body,
}

impl TextStyle {
    pub fn is_bold(self) -> bool {
        !matches!(self, TextStyle::Body)
    }
}

/// 配置済みの1行
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: TextStyle,
    pub font_pt: f32,
    pub x_mm: f32,
    /// ベースライン位置（ページ上端から）
    pub baseline_mm: f32,
}

/// 写真の配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x_mm: f32,
    pub top_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl ImagePlacement {
    /// 下端（ページ上端から）
    pub fn bottom_mm(&self) -> f32 {
        self.top_mm + self.height_mm
    }
}

/// 1ページ分の配置計画
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub lines: Vec<PlacedLine>,
    pub image: ImagePlacement,
    /// ページ下端を超えて省略した行数
    pub dropped_lines: usize,
}

/// PDFの情報欄に表示する1項目
#[derive(Debug, Clone)]
pub struct PdfInfoField {
    pub label: String,
    pub value: String,
}

/// 情報欄フィールドを固定順で構築
pub fn build_pdf_info_fields(analysis: &StructuredAnalysis) -> Vec<PdfInfoField> {
    analysis
        .iter()
        .map(|(field, value)| PdfInfoField {
            label: format!("{}:", field.label()),
            value: to_pdf_text(value),
        })
        .collect()
}

/// 1ページの配置を計算
///
/// * `image_px` - 埋め込む画像のピクセルサイズ (幅, 高さ)。縦横比の算出にのみ使う
pub fn plan_page(
    layout: &PdfLayout,
    title: &str,
    analysis: &StructuredAnalysis,
    image_px: (u32, u32),
) -> PagePlan {
    let mut lines = Vec::new();
    let mut dropped_lines = 0;

    // ヘッダー（中央揃え）
    let title = to_pdf_text(title);
    let header_width_mm = pt_to_mm(text_width_pt(&title, layout.header_font_pt, true));
    lines.push(PlacedLine {
        text: title,
        style: TextStyle::Header,
        font_pt: layout.header_font_pt,
        x_mm: ((layout.page_width_mm - header_width_mm) / 2.0).max(layout.margin_mm),
        baseline_mm: baseline_in_cell(layout.margin_mm, layout.header_height_mm, layout.header_font_pt),
    });

    let (px_w, px_h) = image_px;
    let aspect = if px_w == 0 { 1.0 } else { px_h as f32 / px_w as f32 };
    let image = ImagePlacement {
        x_mm: layout.image_x_mm(),
        top_mm: layout.content_top_mm,
        width_mm: layout.image_width_mm,
        height_mm: layout.image_width_mm * aspect,
    };

    let max_width_pt = mm_to_pt(layout.text_width_mm());
    let bottom = layout.content_bottom_mm();
    let mut cursor_mm = layout.content_top_mm;

    for info in build_pdf_info_fields(analysis) {
        for (text, style) in wrap_text(&info.label, max_width_pt, layout.body_font_pt, true)
            .into_iter()
            .map(|l| (l, TextStyle::Label))
            .chain(
                wrap_text(&info.value, max_width_pt, layout.body_font_pt, false)
                    .into_iter()
                    .map(|l| (l, TextStyle::Body)),
            )
        {
            if cursor_mm + layout.line_height_mm > bottom {
                dropped_lines += 1;
                continue;
            }
            lines.push(PlacedLine {
                text,
                style,
                font_pt: layout.body_font_pt,
                x_mm: layout.margin_mm,
                baseline_mm: baseline_in_cell(cursor_mm, layout.line_height_mm, layout.body_font_pt),
            });
            cursor_mm += layout.line_height_mm;
        }
        cursor_mm += layout.field_gap_mm;
    }

    PagePlan {
        lines,
        image,
        dropped_lines,
    }
}

/// セル内で縦中央に置いたときのベースライン位置
fn baseline_in_cell(cell_top_mm: f32, cell_height_mm: f32, font_pt: f32) -> f32 {
    cell_top_mm + cell_height_mm / 2.0 + pt_to_mm(font_pt) * 0.3
}

/// テキストを指定幅で折り返す
///
/// 改行は段落区切りとして維持し、単語単位で詰める。
/// 1行に収まらない単語は文字単位で分割する。
pub fn wrap_text(text: &str, max_width_pt: f32, font_pt: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width_pt(&candidate, font_pt, bold) <= max_width_pt {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width_pt(word, font_pt, bold) <= max_width_pt {
                current = word.to_string();
            } else {
                let mut pieces = split_long_word(word, max_width_pt, font_pt, bold);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(current);
    }

    lines
}

fn split_long_word(word: &str, max_width_pt: f32, font_pt: f32, bold: bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && text_width_pt(&current, font_pt, bold) > max_width_pt {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

/// 標準14フォント（Helvetica）で描画できる文字列に変換
///
/// 組み込みフォントには1バイト文字しか渡せないため、ASCII以外は近い文字に置き換える。
/// アクセント付き文字は基底文字、引用符・ダッシュ類は ASCII 記号、その他は `?`。
/// 改行は段落区切りとして残す。
pub fn to_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            ' '..='~' => out.push(c),
            c if c.is_control() => {}
            '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => {}
            '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => out.push(' '),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{00B4}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' | '\u{00B7}' | '\u{2023}' | '\u{2043}' => out.push('-'),
            '\u{00D7}' => out.push('x'),
            '\u{00B0}' => out.push_str(" deg"),
            _ => match fold_latin(c) {
                Some(folded) => out.push_str(folded),
                None => out.push('?'),
            },
        }
    }

    out
}

/// ラテン文字のアクセント除去
fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ð' | 'Ď' => "D",
        'ð' | 'ď' => "d",
        'È'..='Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ì'..='Ï' | 'Ī' | 'İ' => "I",
        'ì'..='ï' | 'ī' | 'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' | 'Ş' => "S",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'Ť' => "T",
        'ť' => "t",
        'Ù'..='Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// 文字列幅（pt）。Helvetica / Helvetica-Bold の字幅で計算
pub fn text_width_pt(text: &str, font_pt: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c, bold)).sum();
    units as f32 * font_pt / 1000.0
}

// Helvetica AFM widths for ' '..='~' (1/1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

fn char_width(c: char, bold: bool) -> u32 {
    let table = if bold { &HELVETICA_BOLD_WIDTHS } else { &HELVETICA_WIDTHS };
    match c {
        ' '..='~' => table[(c as usize) - 32] as u32,
        _ => 556,
    }
}
