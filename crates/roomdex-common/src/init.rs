//! Global initialization utilities for the application

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the application environment
///
/// This should be called once at the start of the process to load
/// environment variables from a .env file before any configuration is read.
///
/// Safe to call multiple times - will only run once
pub fn initialize_environment() {
    INIT.call_once(|| {
        // Load .env file if it exists, searching up the directory tree
        dotenvy::dotenv().ok();
    });
}

static TRACING_INIT: Once = Once::new();

/// Initialize the global tracing subscriber
///
/// Filter level comes from `RUST_LOG`. Safe to call multiple times - will
/// only run once.
pub fn initialize_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}
