// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{CacheAside, CacheName, JsonSerializer, Serializer};

/// Builder for a [`CacheAside`].
///
/// Created by [`CacheAside::builder`].
///
/// # Examples
///
/// ```
/// use querycache::{CacheAside, JsonSerializer, MemoryStore};
///
/// let cache = CacheAside::builder(MemoryStore::new())
///     .serializer(JsonSerializer)
///     .name("books")
///     .build();
/// assert_eq!(cache.name(), "books");
/// ```
#[derive(Debug)]
pub struct CacheAsideBuilder<S, Z = JsonSerializer> {
    store: S,
    serializer: Z,
    name: Option<CacheName>,
}

impl<S> CacheAsideBuilder<S, JsonSerializer> {
    pub(crate) fn new(store: S) -> Self {
        Self {
            store,
            serializer: JsonSerializer,
            name: None,
        }
    }
}

impl<S, Z> CacheAsideBuilder<S, Z> {
    /// Replaces the payload serializer. JSON is used by default.
    #[must_use]
    pub fn serializer<Z2: Serializer>(self, serializer: Z2) -> CacheAsideBuilder<S, Z2> {
        CacheAsideBuilder {
            store: self.store,
            serializer,
            name: self.name,
        }
    }

    /// Names the cache in log events.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = Some(name);
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> CacheAside<S, Z> {
        CacheAside::from_parts(self.store, self.serializer, self.name.unwrap_or(crate::aside::DEFAULT_CACHE_NAME))
    }
}
