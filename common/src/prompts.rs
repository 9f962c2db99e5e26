//! プロンプト定義
//!
//! 画像解析APIへ送る固定の指示文。ラベル名は AnalysisField と一致させること。

/// 部屋写真の解析指示
pub const ROOM_ANALYSIS_PROMPT: &str = "Describe this room's materials, furniture, style, and provide a design summary. \
Respond in plain text without markdown or asterisks. Use labels like \
Materials:, Furniture:, Style:, Design Summary: clearly for each section.";

/// 解析プロンプトを返す
pub fn build_room_prompt() -> &'static str {
    ROOM_ANALYSIS_PROMPT
}
