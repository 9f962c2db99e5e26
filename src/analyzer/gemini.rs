//! Gemini API連携
//!
//! 画像1枚 + 固定プロンプトを送信し、返ってきたテキストを
//! room_report_common::extract_fields で構造化する。
//! API側の失敗は例外にせず、全項目 "API error" の結果に置き換える。

use super::types::{Content, GeminiRequest, GeminiResponse, GenerationConfig, InlineData, Part};
use super::VisionAnalyzer;
use crate::config::Config;
use crate::error::{Result, RoomReportError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use room_report_common::{build_room_prompt, extract_fields, StructuredAnalysis};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// API呼び出しの失敗理由（ログ用）
#[derive(Error, Debug)]
pub enum ApiFailure {
    #[error("HTTP status {status}")]
    Status { status: u16, body: String },

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RoomReportError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    /// generateContent のURL（キーはクエリで別途付与）
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// 画像バイト列からリクエストを構築
    pub fn build_request(&self, image: &[u8], mime_type: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: STANDARD.encode(image),
                        },
                    },
                    Part::Text {
                        text: build_room_prompt().to_string(),
                    },
                ],
            }],
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }

    /// API呼び出し。成功時は先頭候補の先頭テキストを返す
    pub async fn generate(&self, request: &GeminiRequest) -> std::result::Result<String, ApiFailure> {
        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(ApiFailure::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        parse_response_text(&body)
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiClient {
    async fn analyze(&self, image: &Path) -> Result<StructuredAnalysis> {
        let bytes = tokio::fs::read(image).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RoomReportError::FileNotFound(image.display().to_string())
            } else {
                RoomReportError::Io(e)
            }
        })?;

        let mime_type = mime_type_for_path(image);
        let request = self.build_request(&bytes, mime_type);
        debug!(
            "Sending {} ({}, {} bytes) to {}",
            image.display(),
            mime_type,
            bytes.len(),
            self.url()
        );

        match self.generate(&request).await {
            Ok(text) => {
                debug!("Received {} chars of analysis for {}", text.len(), image.display());
                Ok(extract_fields(&text))
            }
            Err(ApiFailure::Status { status, body }) => {
                error!("API ERROR: {} for {} ({})", status, image.display(), body);
                Ok(StructuredAnalysis::api_error())
            }
            Err(failure) => {
                warn!("Analysis failed for {}: {}", image.display(), failure);
                Ok(StructuredAnalysis::api_error())
            }
        }
    }
}

/// 拡張子からMIMEタイプを決める（内容は見ない）
///
/// `.jpg` / `.jpeg` → image/jpeg、それ以外は image/png
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        _ => "image/png",
    }
}

/// レスポンスボディから `candidates[0].content.parts[0].text` を取り出す
pub fn parse_response_text(body: &str) -> std::result::Result<String, ApiFailure> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ApiFailure::Malformed(e.to_string()))?;

    response
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| ApiFailure::Malformed("candidates[0].content.parts[0].text がありません".into()))
}

// reqwest のエラー表示にはURL（APIキー付き）が含まれるため外してから記録する
fn classify_transport_error(e: reqwest::Error) -> ApiFailure {
    if e.is_timeout() {
        ApiFailure::Timeout
    } else {
        ApiFailure::Transport(e.without_url().to_string())
    }
}
