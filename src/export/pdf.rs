//! PDFレポート生成
//!
//! 1レコード = 1ページ。写真を右上、各フィールドを左カラムに配置する。
//! 配置計算は room_report_common::export::pdf_core に任せ、ここでは描画のみ行う。

use crate::cli::PdfQuality;
use crate::error::{Result, RoomReportError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, RawImage, TextItem, XObjectId,
    XObjectTransform,
};
use room_report_common::export::pdf_core::{plan_page, PagePlan};
use room_report_common::{PdfLayout, StructuredAnalysis};
use std::path::Path;
use tracing::{debug, warn};

/// 埋め込み用に縮小・JPEG化した画像
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// 画像を読み込み、品質設定に合わせて縮小・再エンコード
///
/// 形式は拡張子ではなく内容から判定する。
pub fn prepare_image(path: &Path, quality: PdfQuality) -> Result<PreparedImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| RoomReportError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| RoomReportError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let max_width = quality.max_width();
    let img = if img.width() > max_width {
        let height = (img.height() as f64 * max_width as f64 / img.width() as f64).round().max(1.0) as u32;
        img.resize_exact(max_width, height, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality())
        .encode_image(&rgb)
        .map_err(|e| RoomReportError::ImageLoad(format!("{}: JPEG変換エラー: {}", path.display(), e)))?;

    Ok(PreparedImage {
        jpeg,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// ページを順に追加し、最後に1つのPDFへ書き出す
pub struct ReportBuilder {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    layout: PdfLayout,
    title: String,
    quality: PdfQuality,
}

impl ReportBuilder {
    pub fn new(title: &str, quality: PdfQuality) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            layout: PdfLayout::a4(),
            title: title.to_string(),
            quality,
        }
    }

    /// 解析結果と写真から1ページ追加
    ///
    /// 写真が読めない場合はエラー（ページは追加されない）。
    pub fn add_page(&mut self, analysis: &StructuredAnalysis, image_path: &Path) -> Result<()> {
        let prepared = prepare_image(image_path, self.quality)?;

        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&prepared.jpeg, &mut warnings)
            .map_err(|e| RoomReportError::ImageLoad(format!("{}: {}", image_path.display(), e)))?;
        let image_id = self.doc.add_image(&raw);

        let plan = plan_page(
            &self.layout,
            &self.title,
            analysis,
            (prepared.width, prepared.height),
        );
        if plan.dropped_lines > 0 {
            warn!(
                "{} line(s) did not fit on the page for {}",
                plan.dropped_lines,
                image_path.display()
            );
        }

        let ops = self.page_ops(&plan, image_id, &prepared);
        self.pages.push(PdfPage::new(
            Mm(self.layout.page_width_mm),
            Mm(self.layout.page_height_mm),
            ops,
        ));
        debug!("Added page {} for {}", self.pages.len(), image_path.display());

        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// PDFバイト列に変換（終端操作）
    pub fn finalize(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(RoomReportError::PdfGeneration("ページがありません".into()));
        }

        let page_count = self.pages.len();
        let mut warnings = Vec::new();
        let bytes = self
            .doc
            .with_pages(self.pages)
            .save(&PdfSaveOptions::default(), &mut warnings);

        for warning in &warnings {
            debug!("printpdf: {:?}", warning);
        }
        if bytes.is_empty() {
            return Err(RoomReportError::PdfGeneration("PDFの出力が空です".into()));
        }

        debug!("Finalized report: {} pages, {} bytes", page_count, bytes.len());
        Ok(bytes)
    }

    fn page_ops(&self, plan: &PagePlan, image_id: XObjectId, prepared: &PreparedImage) -> Vec<Op> {
        let page_height = self.layout.page_height_mm;
        let mut ops = Vec::new();

        // 写真: PDF座標は左下原点。dpi=72 で 1px = 1pt として拡大率を決める
        let placement = plan.image;
        let width_pt = Mm(placement.width_mm).into_pt().0;
        let height_pt = Mm(placement.height_mm).into_pt().0;
        ops.push(Op::UseXobject {
            id: image_id,
            transform: XObjectTransform {
                translate_x: Some(Mm(placement.x_mm).into_pt()),
                translate_y: Some(Mm(page_height - placement.bottom_mm()).into_pt()),
                scale_x: Some(width_pt / prepared.width.max(1) as f32),
                scale_y: Some(height_pt / prepared.height.max(1) as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        });

        for line in &plan.lines {
            if line.text.is_empty() {
                continue;
            }
            let font = if line.style.is_bold() {
                BuiltinFont::HelveticaBold
            } else {
                BuiltinFont::Helvetica
            };
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point::new(Mm(line.x_mm), Mm(page_height - line.baseline_mm)),
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(line.font_pt),
                font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text.clone())],
                font,
            });
            ops.push(Op::EndTextSection);
        }

        ops
    }
}
