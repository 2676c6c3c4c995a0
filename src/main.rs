// Objeto Readability - HTTP service entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use objeto_readability::cli::Cli;
use objeto_readability::config::constants::MAX_BODY_BYTES;
use objeto_readability::config::{load_dotenv, load_settings, BackendKind, Settings};
use objeto_readability::llms::ModelHandle;
use objeto_readability::logging::init_tracing;
use objeto_readability::models::CandleLoader;
use objeto_readability::providers::{GeminiConfig, GeminiProvider};
use objeto_readability::server::{AppState, ReadabilityServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment first so credentials are visible to the config loader
    let env_files = load_dotenv();
    let settings = load_settings(&cli.to_overrides())?;

    init_tracing(settings.debug)?;
    for path in &env_files {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    tracing::debug!("Settings: {:?}", settings);

    println!("Running Object Readability Service...");
    println!("Host: {}", settings.host);
    println!("Port: {}", settings.port);
    println!("Debug: {}", settings.debug);

    let state = build_state(&settings).await?;

    let server = ReadabilityServer::new(
        ServerConfig {
            bind_address: settings.bind_address(),
            max_body_bytes: MAX_BODY_BYTES,
        },
        state,
    );

    server.serve().await
}

async fn build_state(settings: &Settings) -> Result<AppState> {
    match settings.backend {
        BackendKind::Local => {
            let loader = CandleLoader::with_defaults(settings.hf_token.clone())?;
            let handle = ModelHandle::new();

            if let Some(model_id) = &settings.model {
                handle
                    .load_with(&loader, model_id)
                    .await
                    .with_context(|| format!("Failed to preload model {}", model_id))?;
            } else {
                tracing::info!("No model loaded yet; POST /load to choose one");
            }

            Ok(AppState::local(handle, Arc::new(loader)))
        }
        BackendKind::Gemini => {
            let api_key = settings
                .google_api_key
                .clone()
                .context("GOOGLE_API_KEY must be set for the gemini backend")?;

            let provider = GeminiProvider::new(
                api_key,
                GeminiConfig {
                    model: settings.gemini_model.clone(),
                    ..GeminiConfig::default()
                },
            )?;

            tracing::info!("Using hosted model {}", settings.gemini_model);
            Ok(AppState::hosted(Arc::new(provider)))
        }
    }
}
