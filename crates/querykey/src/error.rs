// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for key derivation.

use std::fmt;

/// A closed sub-tree could not be evaluated in isolation.
///
/// Raised by captured values whose read fails, by methods whose implementation
/// fails, and by nodes that only make sense with the query variable bound.
/// [`derive_key`](crate::derive_key) recovers from it by falling back to a
/// key built from the extra parameters alone.
///
/// # Examples
///
/// ```
/// use querykey::EvaluationFailure;
///
/// let failure = EvaluationFailure::from_message("value(session)", "session already closed");
/// assert_eq!(failure.expression(), "value(session)");
/// ```
#[ohno::error]
#[display("cannot evaluate `{expression}`")]
pub struct EvaluationFailure {
    expression: String,
}

impl EvaluationFailure {
    /// Creates a failure for the rendered `expression`, caused by `cause`.
    pub fn from_message(expression: impl Into<String>, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(expression, cause)
    }

    /// The rendered expression that failed to evaluate.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// What went wrong while generating a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyErrorKind {
    /// A required input was missing or empty.
    InvalidArgument,
    /// A closed sub-tree failed to evaluate.
    EvaluationFailure,
}

impl fmt::Display for KeyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::EvaluationFailure => f.write_str("evaluation failure"),
        }
    }
}

/// An error from a key generator.
#[ohno::error]
#[display("cache key generation failed: {kind}")]
pub struct KeyError {
    kind: KeyErrorKind,
}

impl KeyError {
    /// Returns the kind of failure.
    #[must_use]
    pub fn kind(&self) -> KeyErrorKind {
        self.kind
    }

    pub(crate) fn invalid_argument(reason: &'static str) -> Self {
        Self::caused_by(KeyErrorKind::InvalidArgument, reason)
    }
}

impl From<EvaluationFailure> for KeyError {
    fn from(failure: EvaluationFailure) -> Self {
        Self::caused_by(KeyErrorKind::EvaluationFailure, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_failure_converts_to_key_error() {
        let failure = EvaluationFailure::from_message("value(x)", "gone");
        let error = KeyError::from(failure);
        assert_eq!(error.kind(), KeyErrorKind::EvaluationFailure);
        assert!(format!("{error}").contains("evaluation failure"));
    }

    #[test]
    fn invalid_argument_display_contains_reason() {
        let error = KeyError::invalid_argument("no key parameters");
        assert_eq!(error.kind(), KeyErrorKind::InvalidArgument);
        let display = format!("{error}");
        assert!(display.contains("no key parameters"), "got: {display}");
    }

    #[test]
    fn evaluation_failure_display_names_expression() {
        let failure = EvaluationFailure::from_message("value(session)", "closed");
        let display = format!("{failure}");
        assert!(display.contains("value(session)"), "got: {display}");
        assert!(display.contains("closed"), "got: {display}");
    }
}
