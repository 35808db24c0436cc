// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-aside orchestrator.

use querycache_tier::{CacheStore, EntryOptions};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    CacheAsideBuilder, Error, JsonSerializer, Serializer,
    telemetry::{self, CacheActivity},
};

/// Name used in log events when the builder was not given one.
pub(crate) const DEFAULT_CACHE_NAME: CacheName = "querycache";

/// A static string naming a cache in log events.
pub type CacheName = &'static str;

/// Reads a store, computes on miss and writes the result back.
///
/// A stored value only counts as a hit if it decodes to something other than
/// `T::default()`, and a produced value equal to `T::default()` is returned
/// without being written. Concurrent misses on the same key each compute and
/// write; the last write wins.
///
/// Every operation has a blocking and an async form with the same contract.
///
/// # Examples
///
/// ```
/// use querycache::{CacheAside, EntryOptions, MemoryStore};
///
/// let cache = CacheAside::new(MemoryStore::new());
///
/// let first: i64 = cache.get_or_compute("answer", || Ok(42), &EntryOptions::from_seconds(60))?;
/// let second: i64 = cache.get_or_compute("answer", || Ok(0), &EntryOptions::from_seconds(60))?;
/// assert_eq!((first, second), (42, 42));
/// # Ok::<(), querycache::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CacheAside<S, Z = JsonSerializer> {
    store: S,
    serializer: Z,
    name: CacheName,
}

impl<S> CacheAside<S> {
    /// Creates a cache over `store` with the JSON serializer.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Starts building a cache over `store`.
    #[must_use]
    pub fn builder(store: S) -> CacheAsideBuilder<S> {
        CacheAsideBuilder::new(store)
    }
}

impl<S, Z> CacheAside<S, Z> {
    pub(crate) fn from_parts(store: S, serializer: Z, name: CacheName) -> Self {
        Self { store, serializer, name }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The name used in log events.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.name
    }
}

impl<S: CacheStore, Z: Serializer> CacheAside<S, Z> {
    /// Returns the cached value for `key`, or produces, stores and returns it.
    ///
    /// # Errors
    ///
    /// - [`InvalidArgument`](crate::ErrorKind::InvalidArgument) if `key` is
    ///   empty, before any store I/O.
    /// - [`Backend`](crate::ErrorKind::Backend) if the store fails.
    /// - [`Serialization`](crate::ErrorKind::Serialization) if the stored payload
    ///   does not decode or the produced value does not encode.
    /// - Whatever `produce` returns.
    pub fn get_or_compute<T, F>(&self, key: &str, produce: F, options: &EntryOptions) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default + PartialEq,
        F: FnOnce() -> Result<T, Error>,
    {
        ensure_key(key)?;
        if let Some(value) = self.decode_hit(key, self.store.get(key)?)? {
            return Ok(value);
        }

        let value = produce()?;
        if let Some(payload) = self.encode_computed(key, &value)? {
            self.store.set(key, payload, options)?;
            telemetry::record(self.name, key, CacheActivity::Stored);
        }
        Ok(value)
    }

    /// Async form of [`CacheAside::get_or_compute`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::get_or_compute`].
    pub async fn get_or_compute_async<T, F, Fut>(&self, key: &str, produce: F, options: &EntryOptions) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default + PartialEq + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        ensure_key(key)?;
        if let Some(value) = self.decode_hit(key, self.store.get_async(key).await?)? {
            return Ok(value);
        }

        let value = produce().await?;
        if let Some(payload) = self.encode_computed(key, &value)? {
            self.store.set_async(key, payload, options).await?;
            telemetry::record(self.name, key, CacheActivity::Stored);
        }
        Ok(value)
    }

    /// [`CacheAside::get_or_compute`] with an absolute lifetime of `seconds`.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`](crate::ErrorKind::InvalidArgument) if `seconds` is
    /// not positive, before any store I/O; otherwise as
    /// [`CacheAside::get_or_compute`].
    pub fn get_or_compute_for<T, F>(&self, key: &str, produce: F, seconds: i64) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default + PartialEq,
        F: FnOnce() -> Result<T, Error>,
    {
        self.get_or_compute(key, produce, &lifetime(seconds)?)
    }

    /// Async form of [`CacheAside::get_or_compute_for`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::get_or_compute_for`].
    pub async fn get_or_compute_for_async<T, F, Fut>(&self, key: &str, produce: F, seconds: i64) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Default + PartialEq + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        let options = lifetime(seconds)?;
        self.get_or_compute_async(key, produce, &options).await
    }

    /// Reads and decodes the value stored under `key`.
    ///
    /// Unlike [`CacheAside::get_or_compute`], a stored default value is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty, the store fails or the payload does
    /// not decode into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        ensure_key(key)?;
        self.store
            .get(key)?
            .map(|payload| self.serializer.deserialize(&payload))
            .transpose()
    }

    /// Async form of [`CacheAside::get`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::get`].
    pub async fn get_async<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        ensure_key(key)?;
        self.store
            .get_async(key)
            .await?
            .map(|payload| self.serializer.deserialize(&payload))
            .transpose()
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty, the value does not encode or the
    /// store fails.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: &EntryOptions) -> Result<(), Error> {
        ensure_key(key)?;
        let payload = self.serializer.serialize(value)?;
        self.store.set(key, payload, options)?;
        Ok(())
    }

    /// Async form of [`CacheAside::set`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::set`].
    pub async fn set_async<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T, options: &EntryOptions) -> Result<(), Error> {
        ensure_key(key)?;
        let payload = self.serializer.serialize(value)?;
        self.store.set_async(key, payload, options).await?;
        Ok(())
    }

    /// [`CacheAside::set`] with an absolute lifetime of `seconds`.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`](crate::ErrorKind::InvalidArgument) if `seconds` is
    /// not positive; otherwise as [`CacheAside::set`].
    pub fn set_for<T: Serialize + ?Sized>(&self, key: &str, value: &T, seconds: i64) -> Result<(), Error> {
        self.set(key, value, &lifetime(seconds)?)
    }

    /// Async form of [`CacheAside::set_for`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::set_for`].
    pub async fn set_for_async<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T, seconds: i64) -> Result<(), Error> {
        let options = lifetime(seconds)?;
        self.set_async(key, value, &options).await
    }

    /// Removes the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty or the store fails.
    pub fn remove(&self, key: &str) -> Result<(), Error> {
        ensure_key(key)?;
        self.store.remove(key)?;
        Ok(())
    }

    /// Async form of [`CacheAside::remove`].
    ///
    /// # Errors
    ///
    /// Same as [`CacheAside::remove`].
    pub async fn remove_async(&self, key: &str) -> Result<(), Error> {
        ensure_key(key)?;
        self.store.remove_async(key).await?;
        Ok(())
    }

    /// Decodes a stored payload; `None` unless it holds a non-default value.
    fn decode_hit<T>(&self, key: &str, payload: Option<Vec<u8>>) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned + Default + PartialEq,
    {
        let hit = match payload {
            Some(payload) => Some(self.serializer.deserialize::<T>(&payload)?).filter(|value| *value != T::default()),
            None => None,
        };
        let activity = if hit.is_some() { CacheActivity::Hit } else { CacheActivity::Miss };
        telemetry::record(self.name, key, activity);
        Ok(hit)
    }

    /// Encodes a produced value; `None` if it equals the default and must not be stored.
    fn encode_computed<T>(&self, key: &str, value: &T) -> Result<Option<Vec<u8>>, Error>
    where
        T: Serialize + Default + PartialEq,
    {
        if *value == T::default() {
            telemetry::record(self.name, key, CacheActivity::SkipDefault);
            return Ok(None);
        }
        self.serializer.serialize(value).map(Some)
    }
}

fn ensure_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::invalid_argument("cache key must not be empty"));
    }
    Ok(())
}

fn lifetime(seconds: i64) -> Result<EntryOptions, Error> {
    u64::try_from(seconds)
        .ok()
        .filter(|seconds| *seconds > 0)
        .map(EntryOptions::from_seconds)
        .ok_or_else(|| Error::invalid_argument("cache lifetime must be a positive number of seconds"))
}
