use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use room_report::analyzer::{self, GeminiClient};
use room_report::cli::{Cli, Commands};
use room_report::config::Config;
use room_report::pipeline::ReportOptions;
use room_report::server::{self, AppState};
use room_report::{export, scanner};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "room_report=debug,tower_http=debug"
    } else {
        "room_report=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { addr, concurrency, pdf_quality } => {
            let mut config = Config::load()?;
            if let Some(addr) = addr {
                config.bind_addr = addr;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            config.validate()?;

            let client = GeminiClient::new(&config)?;
            let state = AppState::new(
                Arc::new(client),
                ReportOptions::from_config(&config, pdf_quality),
                config.max_upload_bytes,
            );

            tracing::info!(
                "Starting room-report server (model: {}, concurrency: {})",
                config.model,
                config.concurrency
            );
            server::start_server(&config.bind_addr, state)
                .await
                .with_context(|| format!("failed to serve on {}", config.bind_addr))?;
        }

        Commands::Report { paths, output, title, pdf_quality, json } => {
            let config = Config::load()?;
            config.validate()?;
            println!("🏠 room-report - デザインレポート\n");

            println!("[1/3] 写真を確認中...");
            let images = scanner::collect_images(&paths)?;
            if images.is_empty() {
                anyhow::bail!("画像が見つかりません（jpg/jpeg/png）");
            }
            println!("✔ {}枚の写真\n", images.len());

            println!("[2/3] AI解析中...");
            let client = GeminiClient::new(&config)?;
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            spinner.set_message(format!("{}枚を解析中...", images.len()));
            spinner.enable_steady_tick(Duration::from_millis(80));

            let records = analyzer::analyze_images(Arc::new(client), images, config.concurrency).await?;
            let failed = records.iter().filter(|r| r.analysis().is_api_error()).count();
            spinner.finish_and_clear();
            if failed > 0 {
                println!("⚠ {}枚はAPIエラーのため未解析\n", failed);
            } else {
                println!("✔ 解析完了\n");
            }

            if let Some(json_path) = json {
                let content = serde_json::to_string_pretty(&records)?;
                std::fs::write(&json_path, content)
                    .with_context(|| format!("failed to write {}", json_path.display()))?;
                println!("✔ 解析結果を保存: {}", json_path.display());
            }

            println!("[3/3] PDF生成中...");
            let output = output.unwrap_or_else(|| export::REPORT_FILE_NAME.into());
            let title = title.unwrap_or_else(|| config.report_title.clone());
            let written = export::write_report(&records, &output, &title, pdf_quality)?;
            println!("✔ PDFを保存: {}", written.display());

            println!("\n✅ 完了");
        }

        Commands::Config { set_api_key, show } => {
            // 壊れた設定ファイルもここで上書きできるようにする
            let mut config = Config::load_or_default()?;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  ファイル: {}", Config::config_path()?.display());
                println!("  エンドポイント: {}", config.endpoint);
                println!("  モデル: {}", config.model);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  同時解析数: {}", config.concurrency);
                println!("  タイトル: {}", config.report_title);
                println!("  待ち受け: {}", config.bind_addr);
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
