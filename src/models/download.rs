// Model Downloader - fetches config, tokenizer and weights from the HuggingFace Hub
// Uses hf-hub for download management and caching (~/.cache/huggingface/)

use anyhow::{Context, Result};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const SHARDED_WEIGHTS_INDEX: &str = "model.safetensors.index.json";

/// Local paths of everything needed to build a model
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

/// Model downloader with HuggingFace Hub integration
#[derive(Clone, Default)]
pub struct ModelDownloader {
    token: Option<String>,
}

impl ModelDownloader {
    /// `token` is needed for gated repositories (`TOKEN_HF`)
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Download (or reuse cached) model files.
    ///
    /// This is a blocking operation - spawn in a thread if you need async.
    pub fn fetch(&self, model_id: &str) -> Result<ModelFiles> {
        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.clone()));
        }
        let api = builder
            .build()
            .context("Failed to initialise HuggingFace Hub client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        tracing::info!("Downloading {} to cache...", model_id);

        let config = repo
            .get(CONFIG_FILE)
            .with_context(|| format!("Failed to download {} for {}", CONFIG_FILE, model_id))?;
        let tokenizer = repo
            .get(TOKENIZER_FILE)
            .with_context(|| format!("Failed to download {} for {}", TOKENIZER_FILE, model_id))?;

        // Sharded checkpoints list their files in an index; small models ship one file.
        let weight_files = match repo.get(SHARDED_WEIGHTS_INDEX) {
            Ok(index) => shard_files(&index)?,
            Err(e) => {
                tracing::debug!("No shard index for {} ({}), expecting a single file", model_id, e);
                vec![SINGLE_WEIGHTS_FILE.to_string()]
            }
        };

        let pb = ProgressBar::new(weight_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("=>-"),
        );

        let mut weights = Vec::with_capacity(weight_files.len());
        for file in &weight_files {
            pb.set_message(format!("Downloading {}", file));
            let path = repo
                .get(file)
                .with_context(|| format!("Failed to download {} for {}", file, model_id))?;
            tracing::debug!("Downloaded {} to {:?}", file, path);
            weights.push(path);
            pb.inc(1);
        }
        pb.finish_with_message("Download complete");

        Ok(ModelFiles {
            config,
            tokenizer,
            weights,
        })
    }
}

#[derive(Deserialize)]
struct ShardIndex {
    weight_map: std::collections::HashMap<String, String>,
}

/// Distinct shard file names listed in a `model.safetensors.index.json`
pub fn shard_files(index_path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(index_path)
        .with_context(|| format!("Failed to read {}", index_path.display()))?;
    parse_shard_index(&contents)
}

fn parse_shard_index(contents: &str) -> Result<Vec<String>> {
    let index: ShardIndex =
        serde_json::from_str(contents).context("Failed to parse safetensors index")?;
    let files: BTreeSet<String> = index.weight_map.into_values().collect();
    if files.is_empty() {
        anyhow::bail!("Safetensors index lists no weight files");
    }
    Ok(files.into_iter().collect())
}
