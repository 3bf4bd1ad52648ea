//! Provides helper functions for initializing log collection.
use anyhow::Result;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Registry};

/// Initialize logging.
///
/// Logs are written to stderr so stdout can carry generated manifests.
/// The filter is read from `RUST_LOG` and defaults to INFO.
pub fn init() -> Result<()> {
    // Setup filters
    // Default to INFO if no env is specified
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    let logger = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(log_filter);

    let collector = Registry::default().with(logger);

    // Initialize tracing
    tracing::subscriber::set_global_default(collector)?;

    Ok(())
}
