//! Logging setup.
//!
//! The engine only emits `tracing` events. Hosts that do not install their own
//! subscriber can call [`init_logging`] once at startup.
//!
//! Filter directives come from `SPARK_VDOM_LOG` (same syntax as `RUST_LOG`),
//! defaulting to `info`:
//!
//! ```text
//! SPARK_VDOM_LOG=spark_vdom::renderer=trace,info
//! ```

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "SPARK_VDOM_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

/// Install a fmt subscriber filtered by [`LOG_ENV_VAR`] (idempotent).
///
/// Does nothing if another global subscriber is already set.
pub fn init_logging() {
    TRACING_INSTALLED.call_once(|| {
        let filter = env_filter();
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already set, keeping it");
        }
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging();
        init_logging();
        tracing::info!("logging initialized");
    }
}
