//! Shared helpers for integration tests.

use std::sync::Once;
use std::time::Duration;

use strata::CacheBuilder;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber honouring `RUST_LOG` (once per test binary).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builder over `dir` with background housekeeping effectively disabled.
pub fn quiet_builder(dir: &TempDir) -> CacheBuilder {
    init_tracing();
    strata::builder(dir.path()).housekeeping_interval(Duration::from_secs(3600))
}
