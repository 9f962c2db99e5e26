//! レイアウト設定モジュール
//!
//! mm基準のレイアウト定義（Source of Truth）
//! 座標はページ左上を原点、下方向を正とする（PDF座標への変換は pdf_core で行う）

// ============================================
// mm基準レイアウト（Source of Truth）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_MM: f32 = 10.0;

/// 写真幅（mm）。高さは縦横比から決まる
pub const IMAGE_WIDTH_MM: f32 = 80.0;

/// 写真・テキスト欄の上端（ページ上端から、mm）
pub const CONTENT_TOP_MM: f32 = 30.0;

/// ヘッダー行の高さ（mm）
pub const HEADER_HEIGHT_MM: f32 = 10.0;

/// テキスト行の高さ（mm）
pub const LINE_HEIGHT_MM: f32 = 8.0;

/// フィールド間の余白（mm）
pub const FIELD_GAP_MM: f32 = 2.0;

/// テキスト欄の幅: ページ幅 - 写真幅 - 余白×3（mm）
pub const TEXT_WIDTH_MM: f32 = A4_WIDTH_MM - IMAGE_WIDTH_MM - MARGIN_MM * 3.0; // 100mm

/// フォントサイズ（pt）
pub const HEADER_FONT_PT: f32 = 16.0;
pub const BODY_FONT_PT: f32 = 11.0;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

// ============================================
// レイアウト設定構造体
// ============================================

/// PDFページレイアウト
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub image_width_mm: f32,
    pub content_top_mm: f32,
    pub header_height_mm: f32,
    pub line_height_mm: f32,
    pub field_gap_mm: f32,
    pub header_font_pt: f32,
    pub body_font_pt: f32,
}

impl PdfLayout {
    /// A4縦、写真右上・テキスト左の2カラム
    pub fn a4() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
            image_width_mm: IMAGE_WIDTH_MM,
            content_top_mm: CONTENT_TOP_MM,
            header_height_mm: HEADER_HEIGHT_MM,
            line_height_mm: LINE_HEIGHT_MM,
            field_gap_mm: FIELD_GAP_MM,
            header_font_pt: HEADER_FONT_PT,
            body_font_pt: BODY_FONT_PT,
        }
    }

    /// 写真の左端X座標（mm）
    pub fn image_x_mm(&self) -> f32 {
        self.page_width_mm - self.margin_mm - self.image_width_mm
    }

    /// テキスト欄の幅（mm）
    pub fn text_width_mm(&self) -> f32 {
        self.page_width_mm - self.image_width_mm - self.margin_mm * 3.0
    }

    /// テキストを置ける最下端（ページ上端から、mm）
    pub fn content_bottom_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::a4()
    }
}

// ============================================
// ヘルパー関数
// ============================================

/// mm → pt 変換
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}
