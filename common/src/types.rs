//! 解析結果の型定義
//!
//! サーバーとCLIで共有される型:
//! - AnalysisField: 抽出対象の固定カテゴリ（順序付き）
//! - StructuredAnalysis: カテゴリ → テキストの完全なマッピング
//! - AnalysisRecord: 画像1枚分の解析結果

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

/// ラベルが見つからなかった場合の値
pub const NOT_DETECTED: &str = "Not detected or unavailable.";

/// 解析APIが失敗した場合の値
pub const API_ERROR: &str = "API error";

/// 抽出対象のカテゴリ
///
/// 宣言順が抽出順・レポートの表示順になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisField {
    Materials,
    Furniture,
    Style,
    DesignSummary,
}

impl AnalysisField {
    pub const COUNT: usize = 4;

    /// 全カテゴリ（固定順）
    pub const ALL: [AnalysisField; Self::COUNT] = [
        AnalysisField::Materials,
        AnalysisField::Furniture,
        AnalysisField::Style,
        AnalysisField::DesignSummary,
    ];

    /// 正規ラベル名
    pub fn label(self) -> &'static str {
        match self {
            AnalysisField::Materials => "Materials",
            AnalysisField::Furniture => "Furniture",
            AnalysisField::Style => "Style",
            AnalysisField::DesignSummary => "Design Summary",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AnalysisField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 構造化された解析結果
///
/// 常に全カテゴリの値を持つ（欠落・追加なし）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAnalysis {
    values: [String; AnalysisField::COUNT],
}

impl StructuredAnalysis {
    /// 全カテゴリを同じ値で埋める
    pub fn filled(value: &str) -> Self {
        Self {
            values: std::array::from_fn(|_| value.to_string()),
        }
    }

    /// 全カテゴリが「未検出」
    pub fn placeholder() -> Self {
        Self::filled(NOT_DETECTED)
    }

    /// 全カテゴリが「API error」
    pub fn api_error() -> Self {
        Self::filled(API_ERROR)
    }

    pub fn get(&self, field: AnalysisField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: AnalysisField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// 固定順で (カテゴリ, 値) を返す
    pub fn iter(&self) -> impl Iterator<Item = (AnalysisField, &str)> + '_ {
        AnalysisField::ALL
            .iter()
            .map(move |&field| (field, self.get(field)))
    }

    /// API失敗によるプレースホルダーかどうか
    pub fn is_api_error(&self) -> bool {
        self.values.iter().all(|v| v == API_ERROR)
    }
}

impl Default for StructuredAnalysis {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl Index<AnalysisField> for StructuredAnalysis {
    type Output = str;

    fn index(&self, field: AnalysisField) -> &str {
        self.get(field)
    }
}

impl Serialize for StructuredAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(AnalysisField::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.label(), value)?;
        }
        map.end()
    }
}

/// 画像1枚分の解析レコード
///
/// 生成後は変更しない。アップロード順にレポートへ渡される。
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    file_name: String,
    image_path: PathBuf,
    analysis: StructuredAnalysis,
}

impl AnalysisRecord {
    pub fn new(image_path: impl Into<PathBuf>, analysis: StructuredAnalysis) -> Self {
        let image_path = image_path.into();
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            file_name,
            image_path,
            analysis,
        }
    }

    /// 表示用のファイル名を差し替える（一時ファイル名ではなく元の名前を残す）
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn analysis(&self) -> &StructuredAnalysis {
        &self.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_and_labels() {
        let labels: Vec<&str> = AnalysisField::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(labels, vec!["Materials", "Furniture", "Style", "Design Summary"]);
    }

    #[test]
    fn test_placeholder_covers_every_field() {
        let analysis = StructuredAnalysis::placeholder();
        assert_eq!(analysis.iter().count(), AnalysisField::COUNT);
        assert!(analysis.iter().all(|(_, v)| v == NOT_DETECTED));
        assert!(!analysis.is_api_error());
    }

    #[test]
    fn test_api_error_detection() {
        let mut analysis = StructuredAnalysis::api_error();
        assert!(analysis.is_api_error());

        analysis.set(AnalysisField::Style, "Modern");
        assert!(!analysis.is_api_error());
        assert_eq!(&analysis[AnalysisField::Style], "Modern");
    }

    #[test]
    fn test_serialize_keeps_field_order() {
        let mut analysis = StructuredAnalysis::placeholder();
        analysis.set(AnalysisField::Materials, "Oak");
        let json = serde_json::to_string(&analysis).unwrap();
        assert_eq!(
            json,
            r#"{"Materials":"Oak","Furniture":"Not detected or unavailable.","Style":"Not detected or unavailable.","Design Summary":"Not detected or unavailable."}"#
        );
    }

    #[test]
    fn test_record_file_name() {
        let record = AnalysisRecord::new("/tmp/abc/1234.jpg", StructuredAnalysis::placeholder());
        assert_eq!(record.file_name(), "1234.jpg");

        let record = record.with_file_name("living_room.jpg");
        assert_eq!(record.file_name(), "living_room.jpg");
        assert_eq!(record.image_path(), Path::new("/tmp/abc/1234.jpg"));
    }
}
