// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! Keeps moka's builder out of the public API.

use std::time::Duration;

use crate::store::MemoryStore;

/// Builder for a [`MemoryStore`].
///
/// Store-wide limits apply on top of the per-entry
/// [`EntryOptions`](querycache_tier::EntryOptions) passed to each write: an
/// entry expires at whichever deadline comes first.
///
/// # Examples
///
/// ```
/// use querycache_memory::MemoryStore;
/// use std::time::Duration;
///
/// let store = MemoryStore::builder()
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .time_to_live(Duration::from_secs(3600))
///     .name("query-results")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) time_to_live: Option<Duration>,
    pub(crate) time_to_idle: Option<Duration>,
    pub(crate) name: Option<String>,
}

impl MemoryStoreBuilder {
    /// Creates a builder for an unbounded store without store-wide expiration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries.
    ///
    /// Once reached, entries are evicted with moka's `TinyLFU` policy.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the pre-allocation hint.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Caps the lifetime of every entry, counted from its write.
    #[must_use]
    pub fn time_to_live(mut self, duration: Duration) -> Self {
        self.time_to_live = Some(duration);
        self
    }

    /// Expires every entry that has not been accessed for `duration`.
    #[must_use]
    pub fn time_to_idle(mut self, duration: Duration) -> Self {
        self.time_to_idle = Some(duration);
        self
    }

    /// Names the store in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured store.
    #[must_use]
    pub fn build(self) -> MemoryStore {
        MemoryStore::from_builder(&self)
    }
}
