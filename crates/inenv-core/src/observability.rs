//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for INENV_QUIET, INENV_LOG_LEVEL, INENV_LOG_JSON.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call at process startup; later calls are no-ops.
/// `RUST_LOG` takes precedence over INENV_LOG_LEVEL. When INENV_QUIET=1 only
/// WARN and above are logged.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = filter_directive(cfg.quiet, &cfg.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

fn filter_directive(quiet: bool, log_level: &str) -> String {
    if quiet {
        "inenv=warn".to_string()
    } else {
        log_level.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_level() {
        assert_eq!(filter_directive(true, "inenv=debug"), "inenv=warn");
        assert_eq!(filter_directive(false, "inenv=debug"), "inenv=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
