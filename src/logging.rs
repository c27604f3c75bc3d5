//! Diagnostic tracing for the dispatcher.
//!
//! Events go to stderr so query results on stdout stay parseable. The level
//! comes from `RUST_LOG` and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=confq=debug confq -f app.yaml query server.port
//! ```

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops, and a subscriber
/// installed elsewhere (e.g. by a test harness) is left in place.
pub fn init() {
    INITIALISED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).compact())
            .try_init();
    });
}
