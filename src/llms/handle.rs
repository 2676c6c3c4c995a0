// Shared, injectable model handle for the local variant
//
// Concurrency policy:
// - loads are serialized through `load_gate` (one writer at a time);
// - the new backend is built outside the state lock and swapped in with a
//   short write lock, so analysis requests never wait on a download;
// - analysis takes a snapshot (`Arc` clone) at request start and finishes on
//   that model even if a load replaces it meanwhile.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{ModelLoader, LLM};

/// A backend together with the identifier it was loaded from
#[derive(Clone)]
pub struct LoadedModel {
    pub model_id: String,
    pub llm: Arc<dyn LLM>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_id", &self.model_id)
            .field("llm", &self.llm.name())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct ModelHandle {
    current: Arc<RwLock<Option<LoadedModel>>>,
    load_gate: Arc<Mutex<()>>,
}

impl ModelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current model, if any. Cheap: clones an `Arc`.
    pub async fn snapshot(&self) -> Option<LoadedModel> {
        self.current.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Build a backend with `loader` and install it.
    ///
    /// On failure the previously installed model (if any) stays in place.
    pub async fn load_with(&self, loader: &dyn ModelLoader, model_id: &str) -> Result<()> {
        let _gate = self.load_gate.lock().await;

        tracing::info!("Loading model {}", model_id);
        let llm = loader.load(model_id).await?;

        let previous = self.current.write().await.replace(LoadedModel {
            model_id: model_id.to_string(),
            llm,
        });

        match previous {
            Some(old) => tracing::info!("Model {} replaced by {}", old.model_id, model_id),
            None => tracing::info!("Model {} installed", model_id),
        }

        Ok(())
    }
}
