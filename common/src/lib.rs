//! Room Report Common Library
//!
//! サーバーとCLIで共有される型とユーティリティ（I/Oなし）

pub mod types;
pub mod layout;
pub mod parser;
pub mod prompts;
pub mod export;

pub use types::{AnalysisField, AnalysisRecord, StructuredAnalysis, API_ERROR, NOT_DETECTED};
pub use layout::PdfLayout;
pub use parser::{extract_fields, strip_emphasis};
pub use prompts::{build_room_prompt, ROOM_ANALYSIS_PROMPT};
pub use export::pdf_core::{plan_page, to_pdf_text, wrap_text, ImagePlacement, PagePlan, PlacedLine, TextStyle};
