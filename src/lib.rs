//! 部屋写真をAIで解析し、デザイン所見をまとめたPDFレポートを生成する

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod scanner;
pub mod server;
