//! Data models shared with the external services.
//!
//! This module contains the type definitions for:
//! - The upstream Gemini Generative Language API (`gemini`)
//! - The structured analysis report the model is asked to produce (`report`)
//! - The training-quiz scenario record (`quiz`)

pub mod gemini;
pub mod quiz;
pub mod report;

pub use gemini::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
pub use quiz::QuizScenario;
pub use report::{AnalysisReport, Verdict};
