#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Command-line front-ends for the three verbs.

pub mod cli;
pub mod csv_report;

use tracing_subscriber::EnvFilter;

/// Initializes structured logging for the binaries: warnings and errors to
/// stderr unless `RUST_LOG` says otherwise. Result lines stay on stdout.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
