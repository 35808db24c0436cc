// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Expiration policy for a stored entry.
///
/// An entry may carry an absolute lifetime, counted from the moment it is
/// written, a sliding lifetime, renewed by every read, or both. With both, the
/// entry expires at whichever deadline comes first. With neither, it stays until
/// removed or evicted.
///
/// # Examples
///
/// ```
/// use querycache_tier::EntryOptions;
/// use std::time::Duration;
///
/// let options = EntryOptions::from_seconds(60);
/// assert_eq!(options.absolute_expiration_relative_to_now(), Some(Duration::from_secs(60)));
/// assert_eq!(options.sliding_expiration(), None);
///
/// let options = EntryOptions::sliding(Duration::from_secs(5)).with_absolute(Duration::from_secs(60));
/// assert_eq!(options.sliding_expiration(), Some(Duration::from_secs(5)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntryOptions {
    absolute_expiration_relative_to_now: Option<Duration>,
    sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// No expiration.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Expires `ttl` after the entry is written.
    #[must_use]
    pub fn absolute(ttl: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(ttl),
            sliding_expiration: None,
        }
    }

    /// Expires `seconds` after the entry is written.
    #[must_use]
    pub fn from_seconds(seconds: u64) -> Self {
        Self::absolute(Duration::from_secs(seconds))
    }

    /// Expires once the entry has not been read for `idle`.
    #[must_use]
    pub fn sliding(idle: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: None,
            sliding_expiration: Some(idle),
        }
    }

    /// Adds or replaces the absolute lifetime.
    #[must_use]
    pub fn with_absolute(self, ttl: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(ttl),
            ..self
        }
    }

    /// Adds or replaces the sliding lifetime.
    #[must_use]
    pub fn with_sliding(self, idle: Duration) -> Self {
        Self {
            sliding_expiration: Some(idle),
            ..self
        }
    }

    /// Lifetime counted from the write.
    #[must_use]
    pub fn absolute_expiration_relative_to_now(&self) -> Option<Duration> {
        self.absolute_expiration_relative_to_now
    }

    /// Idle lifetime renewed by each read.
    #[must_use]
    pub fn sliding_expiration(&self) -> Option<Duration> {
        self.sliding_expiration
    }

    /// Returns `true` if neither lifetime is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.absolute_expiration_relative_to_now.is_none() && self.sliding_expiration.is_none()
    }
}
