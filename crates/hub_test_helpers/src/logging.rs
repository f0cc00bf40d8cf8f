//! Test logging configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Install a test-writer subscriber at `level` (or `RUST_LOG` when set)
///
/// The mock HTTP server and client stack stay at `warn` so sync decisions
/// are readable. Only the first call per test process has an effect.
///
/// ```rust
/// use hub_test_helpers::logging::init_test_logging;
///
/// init_test_logging("debug");
/// tracing::debug!("visible with --nocapture");
/// ```
pub fn init_test_logging(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{},hyper=warn,reqwest=warn,wiremock=warn", level))
        });

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Errors only
pub fn suppress_logs() {
    init_test_logging("error");
}
