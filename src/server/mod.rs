//! HTTPサーバー
//!
//! - `POST /generate-pdf`: マルチパート `files` の写真群からPDFを生成
//! - `GET /health`: 死活確認

mod handlers;
mod types;

pub use handlers::{generate_pdf, health_check, ApiError, UPLOAD_FIELD};
pub use types::{ErrorResponse, HealthResponse};

use crate::analyzer::VisionAnalyzer;
use crate::pipeline::ReportOptions;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// ハンドラ間で共有する状態（起動後は読み取り専用）
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn VisionAnalyzer>,
    pub options: ReportOptions,
    /// リクエストボディ全体の上限（バイト）
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Arc<dyn VisionAnalyzer>, options: ReportOptions, max_upload_bytes: usize) -> Self {
        Self {
            analyzer,
            options,
            max_upload_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/generate-pdf", post(generate_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 指定アドレスで待ち受け（終了まで戻らない）
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state)).await
}
