//! Tracing subscriber setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::api::middleware::recovery;
use crate::config::Config;

/// Installs the global subscriber and the panic hook used by request recovery.
///
/// `log_level` takes `RUST_LOG` directive syntax; an unparsable value falls
/// back to `info`. `log_format` selects `json` or plain `text` output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.log_format == "json" {
        builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    recovery::install_panic_hook();

    Ok(())
}
