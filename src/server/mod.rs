// HTTP surface for the readability service
//
// Routes: GET /, GET /status, POST /object_analysis, and POST /load when the
// local backend is active. Backends are injected through `AppState`.

mod handlers;
mod types;

pub use handlers::{index, load_model, object_analysis, status};
pub use types::{
    AnalysisRequest, ApiResponse, LoadRequest, MSG_INDEX, MSG_MODEL_LOADED, MSG_SUCCESS,
    STATUS_ERROR, STATUS_OK,
};

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::analysis::ObjectAnalyzer;
use crate::config::constants::MAX_BODY_BYTES;
use crate::errors::ServiceError;
use crate::llms::{ModelHandle, ModelLoader, LLM};

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5002")
    pub bind_address: String,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!(
                "{}:{}",
                crate::config::constants::DEFAULT_HOST,
                crate::config::constants::DEFAULT_PORT
            ),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Generation backend behind the routes
pub enum Backend {
    /// Model chosen at runtime through `POST /load`
    Local {
        handle: ModelHandle,
        loader: Arc<dyn ModelLoader>,
    },
    /// Client attached once at start-up
    Hosted(Arc<dyn LLM>),
}

/// Shared application state
pub struct AppState {
    backend: Backend,
    analyzer: ObjectAnalyzer,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            analyzer: ObjectAnalyzer::default(),
        }
    }

    pub fn local(handle: ModelHandle, loader: Arc<dyn ModelLoader>) -> Self {
        Self::new(Backend::Local { handle, loader })
    }

    pub fn hosted(llm: Arc<dyn LLM>) -> Self {
        Self::new(Backend::Hosted(llm))
    }

    pub fn supports_loading(&self) -> bool {
        matches!(self.backend, Backend::Local { .. })
    }

    pub fn analyzer(&self) -> &ObjectAnalyzer {
        &self.analyzer
    }

    pub fn local_backend(&self) -> Option<(&ModelHandle, &dyn ModelLoader)> {
        match &self.backend {
            Backend::Local { handle, loader } => Some((handle, loader.as_ref())),
            Backend::Hosted(_) => None,
        }
    }

    /// Backend for one request; the local handle is snapshotted here
    pub async fn current_llm(&self) -> Result<Arc<dyn LLM>, ServiceError> {
        match &self.backend {
            Backend::Local { handle, .. } => handle
                .snapshot()
                .await
                .map(|loaded| loaded.llm)
                .ok_or(ServiceError::ModelNotLoaded),
            Backend::Hosted(llm) => Ok(Arc::clone(llm)),
        }
    }
}

/// Build the router for the given state
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/object_analysis", post(object_analysis));

    if state.supports_loading() {
        router = router.route("/load", post(load_model));
    }

    router.with_state(state)
}

/// Readability HTTP server
pub struct ReadabilityServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl ReadabilityServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Router with body limit and request tracing
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state)).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(self.config.max_body_bytes)),
        )
    }

    /// Serve until ctrl-c
    pub async fn serve(self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind_address))?;

        tracing::info!(
            "Object readability service listening on {}",
            self.config.bind_address
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
