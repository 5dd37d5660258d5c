pub mod client;
pub mod error;
pub mod motivation;
pub mod parse;
pub mod prompt;

pub use client::{AiConfig, GeminiClient, ImagePayload};
pub use error::AiError;
pub use motivation::{get_motivation, random_quote};
pub use parse::{
    fallback_analysis, fallback_tasks, parse_ai_response, parse_comparison_response,
    ProgressComparison, RoomAnalysis,
};
pub use prompt::AnalysisContext;
