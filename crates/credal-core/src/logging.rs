//! Logging setup with credal segment prefixes.
//!
//! The engine only emits `tracing` events; binaries embedding it call
//! [`init`] once to get terminal output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with credal defaults.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format suitable for terminal output
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Segment prefixes for log lines.
pub mod prefix {
    /// Evidence combination
    pub const COMBINE: &str = "⊕";
    /// Conflict filtering and weighted aggregation
    pub const AGGREGATE: &str = "Σ";
    /// Bootstrap resampling
    pub const BOOTSTRAP: &str = "↻";
    /// Whole analysis runs
    pub const RUN: &str = "꩜";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_keeps_first_subscriber() {
        init();
        init_with_filter("debug");
        tracing::info!("{} logging initialized", prefix::RUN);
    }
}
