//! # photostat
//!
//! Imports photos and movies into a deduplicated, date-organized repository.
//!
//! ## Core Philosophy
//! - **Never overwrite** - An existing repository file is always left alone
//! - **Same input, same place** - A file's location depends only on its
//!   capture time and content
//! - **Safe to repeat** - Importing the same tree twice changes nothing
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - The import engine
//! - `config` - Persisted user settings
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PhotostatError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides the default level; `verbose` raises the default to `debug`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    // Already set (e.g. by a test harness): keep the existing one
    let _ = tracing::subscriber::set_global_default(subscriber);
}
