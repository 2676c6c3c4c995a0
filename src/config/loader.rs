// Configuration loader
// Layers built-in defaults, ~/.config/objeto-readability/config.toml,
// READABILITY_* environment variables, credentials and CLI flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::settings::{BackendKind, Settings};

/// Values given on the command line; `None` leaves the lower layers in charge
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub backend: Option<BackendKind>,
    pub model: Option<String>,
}

/// Load `.env` from the working directory, then from its parent.
///
/// Returns the files that were read so the caller can log them once tracing
/// is up. Variables already present in the process environment are never
/// overwritten.
pub fn load_dotenv() -> Vec<PathBuf> {
    match std::env::current_dir() {
        Ok(dir) => load_dotenv_from(&dir),
        Err(_) => Vec::new(),
    }
}

/// `dir/.env` then `dir/../.env`; unreadable or absent files are skipped
pub fn load_dotenv_from(dir: &Path) -> Vec<PathBuf> {
    [dir.join(".env"), dir.join("..").join(".env")]
        .into_iter()
        .filter(|path| path.is_file() && dotenvy::from_path(path).is_ok())
        .collect()
}

/// Location of the optional TOML config file
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Load settings using the default config file location
pub fn load_settings(cli: &CliOverrides) -> Result<Settings> {
    load_settings_from(config_file_path().as_deref(), cli)
}

/// Load settings with an explicit config file (which may not exist)
pub fn load_settings_from(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Settings> {
    let mut builder = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("debug", false)?
        .set_default("backend", BackendKind::Local.as_str())?
        .set_default("gemini_model", GEMINI_MODEL)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
    }

    builder = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .set_override_option("hf_token", credential(HF_TOKEN_ENV))?
        .set_override_option("google_api_key", credential(GOOGLE_API_KEY_ENV))?
        .set_override_option("host", cli.host.clone())?
        .set_override_option("port", cli.port.map(i64::from))?
        .set_override_option("backend", cli.backend.map(|b| b.as_str()))?
        .set_override_option("model", cli.model.clone())?;

    if cli.debug {
        builder = builder.set_override("debug", true)?;
    }

    let settings: Settings = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    Ok(settings)
}

fn credential(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.trim().is_empty())
}
