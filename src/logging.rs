//! Logging and tracing configuration for ewf-ltree
//!
//! The parser logs through the `tracing` crate:
//!
//! - `debug` - section level progress (record values, entry count)
//! - `trace` - one event per entry, plus per-field values when
//!   [`ParseOptions::verbose`](crate::ltree::ParseOptions) is set
//! - `warn`  - tolerated format deviations (missing terminator line)
//!
//! Tools embedding the parser can install a subscriber with [`init`], or
//! hand a `tracing::Dispatch` to a single parse through `ParseOptions`.
//!
//! ```bash
//! RUST_LOG=ewf_ltree=trace ./tool
//! RUST_LOG=ewf_ltree::ltree::entry=trace,warn ./tool
//! ```

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Default: info in release, debug in debug builds
        if cfg!(debug_assertions) {
            EnvFilter::new("ewf_ltree=debug")
        } else {
            EnvFilter::new("ewf_ltree=info")
        }
    })
}

/// Initialize the global logging/tracing subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let subscriber = tracing_subscriber::registry().with(default_filter()).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );

    // Ignore error if already set
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Initialize logging with verbose output (file:line, every level)
pub fn init_verbose() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty(),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Build a dispatcher writing trace-level output to the test writer,
/// without touching the global default
#[cfg(test)]
pub(crate) fn test_dispatch() -> tracing::Dispatch {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(fmt::layer().with_test_writer().compact());
    tracing::Dispatch::new(subscriber)
}

/// Check if trace logging is enabled
/// Used to skip formatting per-field diagnostics
#[inline]
pub fn is_trace_enabled() -> bool {
    tracing::enabled!(Level::TRACE)
}
