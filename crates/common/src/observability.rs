//! Observability module for the Palisade validation gateway
//!
//! Provides tracing/logging initialization. The gateway itself emits structured
//! `tracing` events; wiring them to an output format is the embedding process's
//! one-time setup, done here.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing/logging subsystem
///
/// Honors `PALISADE_LOG_FORMAT` (`json` or `pretty`, default `json`) and the
/// standard `RUST_LOG` filter. Call once at process start; a second call
/// returns an error from the global subscriber registration.
pub fn init_tracing() -> Result<()> {
    let format = std::env::var("PALISADE_LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    // Structured JSON for production
    let json_layer = if format == "json" {
        Some(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    // Pretty format for development
    let pretty_layer = if format == "pretty" {
        Some(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    info!("Tracing initialized");
    Ok(())
}
