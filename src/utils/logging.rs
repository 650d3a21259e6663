// Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::config::Config;

/// Target whose events `--debug` turns up; dependencies stay at their defaults
const DEBUG_DIRECTIVE: &str = "info,scaffold=debug";

/// Pick the filter: `RUST_LOG` wins unless `--debug` forced debug output
pub fn build_filter(config: &Config) -> EnvFilter {
    if config.log_level == "debug" {
        return EnvFilter::new(DEBUG_DIRECTIVE);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber. Output goes to stderr so the child's
/// stdout stays untouched.
pub fn init_tracing(config: &Config) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
