// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache store operations.

/// An error from a cache store.
///
/// Opaque: it wraps whatever the backend reported. Use
/// [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use querycache_tier::Error;
///
/// let error = Error::from_message("connection reset");
/// assert!(error.to_string().contains("connection reset"));
/// ```
#[ohno::error]
pub struct Error {}

impl Error {
    /// Creates a store error from any type that can be converted to an error.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for cache store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_cause_message() {
        let error = Error::from_message("backend unavailable");
        let display = format!("{error}");
        assert!(display.contains("backend unavailable"), "got: {display}");
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::other("disk full");
        let error = Error::from_message(io);
        let source = std::error::Error::source(&error).expect("cause is kept");
        assert!(source.to_string().contains("disk full"));
    }
}
