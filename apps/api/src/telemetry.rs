//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set (`RUST_LOG=facture_db=debug`)
/// - otherwise `default_filter` (from `FACTURE_LOG`)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(default_filter: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", default_filter)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
