//! HTTPサーバーの統合テスト（解析はスタブ）

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use room_report::analyzer::VisionAnalyzer;
use room_report::cli::PdfQuality;
use room_report::error::Result;
use room_report::pipeline::ReportOptions;
use room_report::server::{build_router, AppState, ErrorResponse, HealthResponse};
use room_report_common::StructuredAnalysis;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 呼ばれたパスを記録し、固定の結果を返す
struct StubAnalyzer {
    result: StructuredAnalysis,
    seen: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl VisionAnalyzer for StubAnalyzer {
    async fn analyze(&self, image: &Path) -> Result<StructuredAnalysis> {
        assert!(image.exists(), "一時ファイルが存在しない: {}", image.display());
        self.seen.lock().unwrap().push(image.to_path_buf());
        Ok(self.result.clone())
    }
}

async fn spawn_server(result: StructuredAnalysis, max_upload_bytes: usize) -> (String, Arc<StubAnalyzer>) {
    let stub = Arc::new(StubAnalyzer {
        result,
        seen: Mutex::new(Vec::new()),
    });
    let options = ReportOptions {
        title: "Maya Design Analysis".into(),
        quality: PdfQuality::Low,
        concurrency: 2,
    };
    let state = AppState::new(stub.clone(), options, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    (format!("http://{}", addr), stub)
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([210, 190, 170])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn file_part(name: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes).file_name(name.to_string())
}

const LIMIT: usize = 8 * 1024 * 1024;

#[tokio::test]
async fn test_health() {
    let (base, _) = spawn_server(StructuredAnalysis::placeholder(), LIMIT).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_generate_pdf_from_uploads() {
    let (base, stub) = spawn_server(StructuredAnalysis::filled("Oak"), LIMIT).await;

    let form = Form::new()
        .part("files", file_part("living.png", png_bytes(120, 80)))
        .part("files", file_part("kitchen.jpg", png_bytes(80, 120)));
    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("design_analysis.pdf"));

    let body = response.bytes().await.unwrap();
    assert!(body.starts_with(b"%PDF"));

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    // 拡張子は保持、ファイル名は元の名前を使わない
    assert_eq!(seen[0].extension().unwrap(), "png");
    assert_eq!(seen[1].extension().unwrap(), "jpg");
    assert!(!seen[0].to_string_lossy().contains("living"));
    // リクエスト完了後は一時ファイルが残らない
    assert!(seen.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_api_errors_still_produce_pdf() {
    let (base, _) = spawn_server(StructuredAnalysis::api_error(), LIMIT).await;

    let form = Form::new().part("files", file_part("room.png", png_bytes(64, 64)));
    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.bytes().await.unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_any_file_field_is_accepted() {
    let (base, stub) = spawn_server(StructuredAnalysis::placeholder(), LIMIT).await;

    let form = Form::new()
        .text("note", "ignored")
        .part("photo", file_part("bedroom.png", png_bytes(40, 40)));
    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stub.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_no_files_is_bad_request() {
    let (base, stub) = spawn_server(StructuredAnalysis::placeholder(), LIMIT).await;

    let form = Form::new().text("note", "no photos here");
    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(error.error.contains("files"));
    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body_is_bad_request() {
    let (base, _) = spawn_server(StructuredAnalysis::placeholder(), LIMIT).await;

    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .json(&serde_json::json!({"files": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(!error.error.is_empty());
}

#[tokio::test]
async fn test_corrupt_image_is_unprocessable() {
    let (base, stub) = spawn_server(StructuredAnalysis::placeholder(), LIMIT).await;

    let form = Form::new()
        .part("files", file_part("good.png", png_bytes(32, 32)))
        .part("files", file_part("broken.jpg", b"not really a jpeg".to_vec()));
    let response = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(!error.error.is_empty());

    // エラー応答でも一時ファイルは削除済み
    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let (base, stub) = spawn_server(StructuredAnalysis::placeholder(), 1024).await;

    let form = Form::new().part("files", file_part("big.png", vec![0u8; 64 * 1024]));
    let result = reqwest::Client::new()
        .post(format!("{}/generate-pdf", base))
        .multipart(form)
        .send()
        .await;

    // サーバーが本文を読み切る前に接続を閉じることがある
    if let Ok(response) = result {
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
    assert!(stub.seen.lock().unwrap().is_empty());
}
