use crate::error::{Result, RoomReportError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TITLE: &str = "Maya Design Analysis";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// 起動時に1回だけ読み込み、以降は読み取り専用で共有する
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// 解析APIのベースURL（`/models/{model}:generateContent` を付けて呼ぶ）
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// 同時に実行する解析リクエスト数（1 = 逐次）
    pub concurrency: usize,
    pub temperature: Option<f32>,
    pub report_title: String,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            timeout_seconds: 60,
            concurrency: 1,
            temperature: None,
            report_title: DEFAULT_TITLE.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl Config {
    /// 設定ファイル + 環境変数から読み込み
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 指定パスの設定ファイルを読み込み（なければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 設定ファイルが壊れていてもデフォルトで続行する（`config` サブコマンド用）
    pub fn load_or_default() -> Result<Self> {
        let mut config = Self::load_from_or_default(&Self::config_path()?);
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RoomReportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("room-report").join("config.json"))
    }

    /// 環境変数で上書き（ファイルより優先）
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty("ROOM_REPORT_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = non_empty("ROOM_REPORT_MODEL") {
            self.model = model;
        }
        if let Some(addr) = non_empty("ROOM_REPORT_ADDR") {
            self.bind_addr = addr;
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RoomReportError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    /// 値の範囲チェック
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(RoomReportError::Config("concurrency は1以上を指定してください".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(RoomReportError::Config("timeout_seconds は1以上を指定してください".into()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(RoomReportError::Config(format!("endpoint が不正です: {}", self.endpoint)));
        }
        Ok(())
    }
}
