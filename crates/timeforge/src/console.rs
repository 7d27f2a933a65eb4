//! Console logging for planner runs.
//!
//! Installs a `tracing` subscriber printing planner lifecycle events
//! (`solve_start`, `solve_end`, `backtrack`) with their fields.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "timeforge_solver=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. An
/// already installed global subscriber is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init();
    });
}

/// True once [`init`] has run.
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
