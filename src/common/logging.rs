use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `RUST_LOG` overrides the default `sheet_ledger=info` directive. Calling
/// this more than once is harmless, and a subscriber installed elsewhere
/// is left in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sheet_ledger=info"));

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
