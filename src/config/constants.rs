// Project-wide constants
//
// Centralised here so port numbers, generation parameters and other magic
// values have one source of truth. Import via `use crate::config::constants::*;`.

/// Default bind host (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port for the readability service.
pub const DEFAULT_PORT: u16 = 5002;

/// Upper bound for request bodies. An objeto is a paragraph of text; 1MB is generous.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Name of the directory (under the platform config dir) holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "objeto-readability";

/// Environment variable prefix for service settings (`READABILITY_PORT`, ...).
pub const ENV_PREFIX: &str = "READABILITY";

/// Credential for downloading gated models from the HuggingFace Hub.
pub const HF_TOKEN_ENV: &str = "TOKEN_HF";

/// Credential for the hosted Gemini API.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

// Hosted-API variant

/// Hosted model used by the Gemini backend.
pub const GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Sampling temperature for the hosted backend.
pub const GEMINI_TEMPERATURE: f32 = 0.2;

/// Output token ceiling for the hosted backend.
pub const GEMINI_MAX_OUTPUT_TOKENS: u32 = 8192;

// Local-model variant

/// Sampling temperature for the local pipeline.
pub const LOCAL_TEMPERATURE: f64 = 0.1;

/// Maximum number of tokens generated per turn by the local pipeline.
pub const LOCAL_MAX_NEW_TOKENS: usize = 512;

/// Repetition penalty applied to recently generated tokens.
pub const LOCAL_REPETITION_PENALTY: f32 = 1.2;

/// How many trailing tokens the repetition penalty looks at.
pub const LOCAL_REPEAT_LAST_N: usize = 64;
