//! 解析 → レポート生成の一連の処理
//!
//! アップロード画像は1リクエスト専用の一時ディレクトリに置き、
//! StagedUploads の破棄時にディレクトリごと削除される（エラー時も同様）。

use crate::analyzer::{analyze_images, VisionAnalyzer};
use crate::cli::PdfQuality;
use crate::config::Config;
use crate::error::{Result, RoomReportError};
use crate::export;
use crate::scanner::ImageInfo;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info};
use uuid::Uuid;

/// レポート生成オプション
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub quality: PdfQuality,
    pub concurrency: usize,
}

impl ReportOptions {
    pub fn from_config(config: &Config, quality: PdfQuality) -> Self {
        Self {
            title: config.report_title.clone(),
            quality,
            concurrency: config.concurrency,
        }
    }
}

/// 一時保存したアップロード画像（アップロード順）
pub struct StagedUploads {
    dir: TempDir,
    images: Vec<ImageInfo>,
}

impl StagedUploads {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("room-report-").tempdir()?;
        debug!("Staging uploads in {}", dir.path().display());
        Ok(Self {
            dir,
            images: Vec::new(),
        })
    }

    /// 画像を `<uuid>.<元の拡張子>` として保存
    pub async fn add(&mut self, original_name: &str, bytes: &[u8]) -> Result<&ImageInfo> {
        let path = self.dir.path().join(staged_file_name(original_name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| RoomReportError::Upload(format!("{}: {}", original_name, e)))?;

        let file_name = if original_name.is_empty() {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            original_name.to_string()
        };
        self.images.push(ImageInfo { path, file_name });

        Ok(&self.images[self.images.len() - 1])
    }

    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// 保存用ファイル名。元の名前からは拡張子だけを使う
fn staged_file_name(original_name: &str) -> PathBuf {
    let ext = Path::new(original_name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    let stem = Uuid::new_v4().to_string();
    match ext {
        Some(ext) => PathBuf::from(format!("{}.{}", stem, ext)),
        None => PathBuf::from(stem),
    }
}

/// 画像を解析し、入力順に1ページずつのPDFを生成
///
/// API失敗は該当ページのプレースホルダーになるだけで処理は続行する。
/// 写真の埋め込みに失敗した場合は全体をエラーとする。
pub async fn build_report(
    analyzer: Arc<dyn VisionAnalyzer>,
    images: Vec<ImageInfo>,
    options: &ReportOptions,
) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(RoomReportError::NoImagesFound("入力が空です".into()));
    }

    let ReportOptions { title, quality, concurrency } = options.clone();
    let page_count = images.len();

    info!("Analyzing {} image(s)", page_count);
    let records = analyze_images(analyzer, images, concurrency).await?;

    let bytes = tokio::task::spawn_blocking(move || export::render_report(&records, &title, quality))
        .await
        .map_err(|e| RoomReportError::PdfGeneration(format!("描画タスクが異常終了しました: {}", e)))??;

    info!("Report ready: {} page(s), {} bytes", page_count, bytes.len());
    Ok(bytes)
}
