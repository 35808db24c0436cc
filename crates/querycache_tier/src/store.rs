// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The trait cache backends implement.
//!
//! A [`CacheStore`] maps string keys to opaque payloads. It knows nothing about
//! the values being cached; serialization and the cache-aside policy live in
//! `querycache`.

use std::sync::Arc;

use crate::{EntryOptions, Error};

/// A key/value store for serialized cache entries.
///
/// The blocking methods are required. The async twins default to calling the
/// blocking ones; backends with real I/O override them.
pub trait CacheStore: Send + Sync {
    /// Reads the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Stores `value` under `key` with the given expiration policy, replacing any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> Result<(), Error>;

    /// Removes the entry stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove(&self, key: &str) -> Result<(), Error>;

    /// Async form of [`CacheStore::get`].
    fn get_async(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send {
        async move { self.get(key) }
    }

    /// Async form of [`CacheStore::set`].
    fn set_async(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> impl Future<Output = Result<(), Error>> + Send {
        async move { self.set(key, value, options) }
    }

    /// Async form of [`CacheStore::remove`].
    fn remove_async(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send {
        async move { self.remove(key) }
    }
}

impl<S: CacheStore> CacheStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> Result<(), Error> {
        (**self).set(key, value, options)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        (**self).remove(key)
    }

    fn get_async(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send {
        (**self).get_async(key)
    }

    fn set_async(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).set_async(key, value, options)
    }

    fn remove_async(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).remove_async(key)
    }
}
