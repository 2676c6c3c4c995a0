// Hosted LLM providers
//
// Each provider implements the crate-wide `LLM` trait so the analysis chain
// is agnostic of where generation happens.

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider};
