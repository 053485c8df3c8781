use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::TelemetryError;

static TRACING_INITIALISED: OnceLock<Result<(), TelemetryError>> = OnceLock::new();

/// Initialises structured logging for embedding applications.
///
/// Reads the filter from `RUST_LOG` (default `warn`); renders pretty
/// output on an interactive stderr and JSON otherwise. Safe to call more
/// than once; only the first call installs a subscriber.
///
/// # Errors
///
/// Returns an error when installing the subscriber fails.
pub fn init_tracing() -> Result<(), &'static TelemetryError> {
    TRACING_INITIALISED
        .get_or_init(init_tracing_once)
        .as_ref()
        .copied()
}

fn init_tracing_once() -> Result<(), TelemetryError> {
    let log_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(fmt::layer().pretty().with_target(false).with_filter(log_filter))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(false).with_filter(log_filter))
            .try_init()?;
    }

    Ok(())
}
