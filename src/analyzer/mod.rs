mod gemini;
mod types;

pub use gemini::{mime_type_for_path, parse_response_text, ApiFailure, GeminiClient};
pub use types::GeminiRequest;

use crate::error::{Result, RoomReportError};
use crate::scanner::ImageInfo;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use room_report_common::{AnalysisRecord, StructuredAnalysis};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 画像解析サービス
///
/// API側の失敗は `Ok(StructuredAnalysis::api_error())` として返し、
/// `Err` は画像ファイル自体が読めない場合に限る。
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, image: &Path) -> Result<StructuredAnalysis>;
}

/// 画像を順に解析してレコード化
///
/// `concurrency` 件まで同時に解析するが、結果は常に入力順で返す。
/// 各解析タスクは解析器と画像情報を所有する（'static）。
pub async fn analyze_images(
    analyzer: Arc<dyn VisionAnalyzer>,
    images: Vec<ImageInfo>,
    concurrency: usize,
) -> Result<Vec<AnalysisRecord>> {
    let total = images.len();

    futures::stream::iter(images.into_iter().enumerate())
        .map(move |(idx, image)| {
            let analyzer = Arc::clone(&analyzer);
            async move {
                let analysis = analyzer.analyze(&image.path).await?;
                let note = if analysis.is_api_error() { " (API error)" } else { "" };
                info!("Analyzed {}/{}: {}{}", idx + 1, total, image.file_name, note);

                let ImageInfo { path, file_name } = image;
                Ok::<_, RoomReportError>(AnalysisRecord::new(path, analysis).with_file_name(file_name))
            }
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
