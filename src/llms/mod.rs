// Generic LLM abstraction layer
//
// Both backends (local quantized model, hosted Gemini API) reduce to one
// capability: given an ordered list of turns, return generated text. The
// analysis chain only ever talks to this trait.

mod handle;

pub use handle::{LoadedModel, ModelHandle};

use anyhow::Result;
use std::sync::Arc;

use crate::chat::Turn;

/// Generation backend - works with both local and remote models
#[async_trait::async_trait]
pub trait LLM: Send + Sync {
    /// Backend name for logs (e.g., "gemini", "local:mistralai/Mistral-7B-Instruct-v0.2")
    fn name(&self) -> &str;

    /// Generate the next assistant message for the given conversation
    async fn generate(&self, turns: &[Turn]) -> Result<String>;

    /// Release per-request accelerator state (KV caches, scratch buffers).
    ///
    /// Called once after every analysis request, on success and on failure.
    fn release_resources(&self) {}
}

/// Builds a backend from a model identifier (local variant)
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn LLM>>;
}

/// Calls [`LLM::release_resources`] when dropped, covering every exit path
pub struct ReleaseGuard<'a> {
    llm: &'a dyn LLM,
}

impl<'a> ReleaseGuard<'a> {
    pub fn new(llm: &'a dyn LLM) -> Self {
        Self { llm }
    }
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!("Releasing resources held by {}", self.llm.name());
        self.llm.release_resources();
    }
}
