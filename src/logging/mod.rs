// Tracing setup
//
// `RUST_LOG` wins when set; otherwise `--debug` selects debug-level output for
// this crate and info for everything else.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "objeto_readability=debug,tower_http=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber and bridge `log` records (hf-hub, ureq)
pub fn init_tracing(debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    tracing_log::LogTracer::init().context("Failed to bridge log records into tracing")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_directive_is_more_verbose() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("objeto_readability=debug"));
    }

    #[test]
    fn test_directives_parse() {
        for debug in [false, true] {
            assert!(EnvFilter::try_new(default_directive(debug)).is_ok());
        }
    }
}
