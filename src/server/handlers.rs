//! HTTPハンドラ

use super::types::{ErrorResponse, HealthResponse};
use super::AppState;
use crate::error::RoomReportError;
use crate::export::REPORT_FILE_NAME;
use crate::pipeline::{build_report, StagedUploads};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 画像を受け取るマルチパートのフィールド名
pub const UPLOAD_FIELD: &str = "files";

/// JSON `{"error": ...}` で返すエラー
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<RoomReportError> for ApiError {
    fn from(err: RoomReportError) -> Self {
        let status = match &err {
            RoomReportError::NoImagesFound(_) | RoomReportError::Upload(_) => StatusCode::BAD_REQUEST,
            RoomReportError::ImageLoad(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.status, self.message);
        } else {
            warn!("Request rejected ({}): {}", self.status, self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 写真をアップロードしてレポートPDFを受け取る
///
/// 各画像パートを1ページとし、アップロード順に並べる。
pub async fn generate_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart?;
    let mut staged = StagedUploads::new()?;

    while let Some(field) = multipart.next_field().await? {
        // `files` 以外でもファイル名付きのパートは画像として扱う
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        if name.as_deref() != Some(UPLOAD_FIELD) && file_name.is_none() {
            debug!("Ignoring multipart field {:?}", name);
            continue;
        }

        let file_name = file_name.unwrap_or_default();
        let bytes = field.bytes().await?;
        let info = staged.add(&file_name, &bytes).await?;
        debug!("Staged {} ({} bytes)", info.file_name, bytes.len());
    }

    if staged.is_empty() {
        return Err(ApiError::bad_request(format!(
            "画像がアップロードされていません（フィールド名: {}）",
            UPLOAD_FIELD
        )));
    }

    info!("Received {} file(s)", staged.len());
    let pdf = build_report(Arc::clone(&state.analyzer), staged.images().to_vec(), &state.options).await?;
    // staged はここで破棄され、一時ディレクトリも削除される
    drop(staged);

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
        ),
    ];
    Ok((headers, pdf).into_response())
}
