//! JSON tracing subscriber.
//!
//! `RUST_LOG` wins when set; otherwise the default directive applies.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the process-wide subscriber at `info`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default(DEFAULT_DIRECTIVE);
}

/// Install the process-wide subscriber, falling back to `directive` when `RUST_LOG` is
/// unset or unparsable. Returns `false` when a subscriber was already installed.
pub fn init_with_default(directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .json()
        .with_current_span(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init()
        .is_ok()
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}
