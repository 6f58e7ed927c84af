//! Common utilities and patterns shared across Roomdex crates
//!
//! This crate provides shared functionality to reduce duplication across
//! the various Roomdex components.

pub mod error;
pub mod init;
pub mod tracing;

pub use error::ErrorContext;
pub use init::{initialize_environment, initialize_tracing};
pub use tracing::CorrelationId;
