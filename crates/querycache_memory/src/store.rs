// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use moka::{Expiry, sync::Cache};
use querycache_tier::{CacheStore, EntryOptions, Error};

use crate::builder::MemoryStoreBuilder;

#[derive(Clone, Debug)]
struct StoredEntry {
    payload: Arc<[u8]>,
    options: EntryOptions,
}

impl StoredEntry {
    /// Lifetime granted on write: the shorter of the two deadlines.
    fn lifetime_on_write(&self) -> Option<Duration> {
        match (
            self.options.absolute_expiration_relative_to_now(),
            self.options.sliding_expiration(),
        ) {
            (Some(absolute), Some(sliding)) => Some(absolute.min(sliding)),
            (absolute, sliding) => absolute.or(sliding),
        }
    }
}

/// Per-entry expiration driven by [`EntryOptions`].
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &StoredEntry, _created_at: Instant) -> Option<Duration> {
        entry.lifetime_on_write()
    }

    fn expire_after_read(
        &self,
        _key: &String,
        entry: &StoredEntry,
        read_at: Instant,
        duration_until_expiry: Option<Duration>,
        last_modified_at: Instant,
    ) -> Option<Duration> {
        let Some(sliding) = entry.options.sliding_expiration() else {
            return duration_until_expiry;
        };
        let absolute_left = entry
            .options
            .absolute_expiration_relative_to_now()
            .map(|ttl| ttl.saturating_sub(read_at.saturating_duration_since(last_modified_at)));
        Some(absolute_left.map_or(sliding, |left| left.min(sliding)))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.lifetime_on_write()
    }
}

/// A [`CacheStore`] kept in process memory.
///
/// Each entry expires according to the [`EntryOptions`] it was written with:
/// an absolute lifetime counted from the write, a sliding lifetime renewed by
/// each read, or both. Clones share the same entries.
///
/// # Examples
///
/// ```
/// use querycache_memory::MemoryStore;
/// use querycache_tier::{CacheStore, EntryOptions};
///
/// let store = MemoryStore::new();
/// store.set("books", b"[]".to_vec(), &EntryOptions::from_seconds(60))?;
/// assert_eq!(store.get("books")?, Some(b"[]".to_vec()));
/// # Ok::<(), querycache_tier::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct MemoryStore {
    inner: Cache<String, StoredEntry>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a store holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a builder for a configured store.
    #[must_use]
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::new()
    }

    pub(crate) fn from_builder(builder: &MemoryStoreBuilder) -> Self {
        let mut moka_builder = Cache::builder().expire_after(EntryExpiry);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(ttl) = builder.time_to_live {
            moka_builder = moka_builder.time_to_live(ttl);
        }

        if let Some(tti) = builder.time_to_idle {
            moka_builder = moka_builder.time_to_idle(tti);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Approximate number of live entries.
    ///
    /// The count is updated lazily; call [`MemoryStore::run_pending_tasks`]
    /// first for an exact figure.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Applies pending evictions and expirations.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.inner.get(key).map(|entry| entry.payload.to_vec()))
    }

    fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> Result<(), Error> {
        let entry = StoredEntry {
            payload: value.into(),
            options: *options,
        };
        self.inner.insert(key.to_owned(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.invalidate(key);
        Ok(())
    }
}
