//! Logging Infrastructure
//!
//! Console logging for hosts embedding the grid. Hosts that install their
//! own subscriber can skip this entirely.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console logging
///
/// # Arguments
/// * `level` - Log level used when `RUST_LOG` is unset (e.g., "info", "pim_client=debug")
/// * `json_format` - JSON lines instead of the human-readable format
///
/// Returns `Ok(false)` when a global subscriber was already installed.
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<bool> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("invalid log level {level:?}: {e}"))?;

    let subscriber = tracing_subscriber::registry();

    let result = if json_format {
        let console_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter);
        subscriber.with(console_layer).try_init()
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter);
        subscriber.with(console_layer).try_init()
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::debug!(error = %e, "Global subscriber already set");
            Ok(false)
        }
    }
}
