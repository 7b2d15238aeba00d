//! Remote collaborators backed by the Gemini API.

pub mod assistant;
pub mod diarizer;
pub mod gemini;
pub mod json;
pub mod prompts;

pub use assistant::GeminiAssistant;
pub use diarizer::GeminiDiarizer;
pub use gemini::{GeminiClient, ResponseFormat, TextGenerator};
