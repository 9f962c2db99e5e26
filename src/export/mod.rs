pub mod pdf;

use crate::cli::PdfQuality;
use crate::error::Result;
use room_report_common::AnalysisRecord;
use std::path::{Path, PathBuf};

pub use pdf::ReportBuilder;

/// レスポンス・既定の出力ファイル名
pub const REPORT_FILE_NAME: &str = "design_analysis.pdf";

/// 出力先がディレクトリ（または拡張子なし）の場合は既定ファイル名を付ける
pub fn output_path_for(output: &Path) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(REPORT_FILE_NAME)
    } else {
        output.to_path_buf()
    }
}

/// レコードを入力順に1ページずつ描画してPDFを返す
///
/// 1枚でも写真を埋め込めなければ全体を失敗とする。
pub fn render_report(records: &[AnalysisRecord], title: &str, quality: PdfQuality) -> Result<Vec<u8>> {
    let mut builder = ReportBuilder::new(title, quality);
    for record in records {
        builder.add_page(record.analysis(), record.image_path())?;
    }
    builder.finalize()
}

/// PDFを描画してファイルに保存
pub fn write_report(
    records: &[AnalysisRecord],
    output: &Path,
    title: &str,
    quality: PdfQuality,
) -> Result<PathBuf> {
    let bytes = render_report(records, title, quality)?;
    let output_path = output_path_for(output);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&output_path, bytes)?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(output_path_for(dir.path()), dir.path().join(REPORT_FILE_NAME));
    }

    #[test]
    fn test_output_path_for_file() {
        let path = Path::new("/tmp/out/living.pdf");
        assert_eq!(output_path_for(path), path.to_path_buf());
    }

    #[test]
    fn test_output_path_without_extension() {
        let path = Path::new("reports");
        assert_eq!(output_path_for(path), Path::new("reports").join(REPORT_FILE_NAME));
    }
}
