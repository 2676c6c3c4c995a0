// Configuration structs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which generation backend the service runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local causal LM, quantized to 4 bits and loaded through `POST /load`
    Local,
    /// Hosted Gemini API, attached once at start-up
    Gemini,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved service settings (defaults < config file < env < CLI)
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Verbose logging
    pub debug: bool,

    /// Generation backend
    pub backend: BackendKind,

    /// Local model to load at start-up (local backend only)
    #[serde(default)]
    pub model: Option<String>,

    /// Hosted model name (gemini backend only)
    pub gemini_model: String,

    /// HuggingFace Hub token (`TOKEN_HF`)
    #[serde(default)]
    pub hf_token: Option<String>,

    /// Gemini API key (`GOOGLE_API_KEY`)
    #[serde(default)]
    pub google_api_key: Option<String>,
}

impl Settings {
    /// `host:port` string handed to the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Credentials never reach the logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(secret: &Option<String>) -> &'static str {
            if secret.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("gemini_model", &self.gemini_model)
            .field("hf_token", &redact(&self.hf_token))
            .field("google_api_key", &redact(&self.google_api_key))
            .finish()
    }
}
