// Command-line interface

use clap::Parser;

use crate::config::{BackendKind, CliOverrides};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "objeto-readability",
    version,
    about = "Grades the readability of procurement-bid objects with an LLM"
)]
pub struct Cli {
    /// Host to bind (default 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default 5002)
    #[arg(long)]
    pub port: Option<u16>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Generation backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Local model to load before serving (local backend only)
    #[arg(long)]
    pub model: Option<String>,
}

impl Cli {
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            debug: self.debug,
            backend: self.backend,
            model: self.model.clone(),
        }
    }
}
