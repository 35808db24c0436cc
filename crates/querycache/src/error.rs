// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache-aside operations.

use std::fmt;

use querykey::{EvaluationFailure, KeyError, KeyErrorKind};

/// What went wrong in a cache-aside operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An argument was rejected before any store I/O, e.g. an empty key.
    InvalidArgument,
    /// The cache store failed.
    Backend,
    /// A value could not be encoded or a payload could not be decoded.
    Serialization,
    /// The query source failed to produce results.
    Query,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::Backend => f.write_str("backend failure"),
            Self::Serialization => f.write_str("serialization failure"),
            Self::Query => f.write_str("query failure"),
        }
    }
}

/// An error from a cache-aside operation.
///
/// # Examples
///
/// ```
/// use querycache::{Error, ErrorKind};
///
/// let error = Error::from_message(ErrorKind::Query, "table `books` is offline");
/// assert_eq!(error.kind(), ErrorKind::Query);
/// ```
#[ohno::error]
#[display("cache-aside operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind from any cause.
    ///
    /// Query sources and custom serializers use this to report failures.
    pub fn from_message(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Returns the kind of failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn invalid_argument(reason: &'static str) -> Self {
        Self::caused_by(ErrorKind::InvalidArgument, reason)
    }

    pub(crate) fn serialization(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Serialization, cause)
    }

    pub(crate) fn query(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Query, cause)
    }
}

impl From<querycache_tier::Error> for Error {
    fn from(error: querycache_tier::Error) -> Self {
        Self::caused_by(ErrorKind::Backend, error)
    }
}

impl From<KeyError> for Error {
    fn from(error: KeyError) -> Self {
        let kind = match error.kind() {
            KeyErrorKind::InvalidArgument => ErrorKind::InvalidArgument,
            _ => ErrorKind::Query,
        };
        Self::caused_by(kind, error)
    }
}

impl From<EvaluationFailure> for Error {
    fn from(failure: EvaluationFailure) -> Self {
        Self::query(failure)
    }
}

/// A specialized [`Result`] type for cache-aside operations.
pub type Result<T> = std::result::Result<T, Error>;
