//! Common error handling utilities
//!
//! Provides a small trait for attaching operation context to errors as they
//! cross crate boundaries, so failures surfaced from the worker still carry
//! the operation name and identifiers they originated with.

use std::fmt;

/// Trait for adding context to errors
///
/// This trait provides a consistent way to add context to errors
/// across all crates, similar to anyhow's context() but for custom error types.
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Add context with a closure (lazy evaluation)
    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| format!("{context}: {e}"))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| format!("{}: {}", f(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("IO error: {0}")]
        Io(String),
    }

    #[test]
    fn test_error_context() {
        let result: Result<(), TestError> = Err(TestError::Io("original error".into()));
        let with_context = result.context("while signing url");
        assert!(with_context.is_err());
        assert!(with_context.unwrap_err().contains("while signing url"));
    }

    #[test]
    fn test_lazy_error_context() {
        let result: Result<(), TestError> = Err(TestError::Io("boom".into()));
        let with_context = result.with_context(|| format!("dataroom {}", "dr_1"));
        assert!(with_context.unwrap_err().starts_with("dataroom dr_1"));
    }
}
