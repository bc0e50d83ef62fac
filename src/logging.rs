//! Logging bootstrap.
//!
//! Console output for interactive runs plus a daily-rolling JSON file under
//! `<data_dir>/logs` for later inspection. Call once from the embedding
//! application, before constructing a [`Store`](crate::store::Store).

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "storefront";

/// Install the global subscriber: an `EnvFilter` from `RUST_LOG` (defaulting
/// to `info,the_small_storefront=debug`), an ANSI console layer, and a daily
/// rolling JSON file layer.
pub fn init(data_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,the_small_storefront=debug"));

    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Dropping the guard flushes and stops the file writer; the subscriber
    // lives until process exit, so leak it.
    std::mem::forget(guard);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "logging initialized"
    );
}
