// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{
    config_file_path, load_dotenv, load_dotenv_from, load_settings, load_settings_from,
    CliOverrides,
};
pub use settings::{BackendKind, Settings};
