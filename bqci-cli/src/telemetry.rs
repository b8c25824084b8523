//! Tracing subscriber setup
//!
//! Logs go to stderr; stdout is reserved for the report.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,bqci={level},run_tests={level},create_dev_env={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(verbose: bool, json: bool) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert!(default_filter(false).contains("bqci=info"));
        assert!(default_filter(true).contains("bqci=debug"));
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }
}
