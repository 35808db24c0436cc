// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store for testing.
//!
//! [`MockStore`] keeps entries in memory, records every operation and can be
//! told to fail selected operations.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{CacheStore, EntryOptions, Error};

/// A recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A read of the given key.
    Get(String),
    /// A write.
    Set {
        /// The key written.
        key: String,
        /// The payload written.
        value: Vec<u8>,
        /// The expiration policy requested.
        options: EntryOptions,
    },
    /// A removal of the given key.
    Remove(String),
}

impl StoreOp {
    /// The key the operation targets.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Remove(key) | Self::Set { key, .. } => key,
        }
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A recording, failure-injecting in-memory store.
///
/// Clones share state, so a test can keep one handle while the code under test
/// owns another. Expiration options are recorded but not enforced.
///
/// # Examples
///
/// ```
/// use querycache_tier::{CacheStore, EntryOptions, testing::{MockStore, StoreOp}};
///
/// let store = MockStore::new();
/// store.set("k", b"1".to_vec(), &EntryOptions::from_seconds(60))?;
/// assert_eq!(store.get("k")?, Some(b"1".to_vec()));
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// store.get("k").expect_err("reads are failing");
/// assert_eq!(store.operations().len(), 3);
/// # Ok::<(), querycache_tier::Error>(())
/// ```
#[derive(Clone)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, (Vec<u8>, EntryOptions)>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a store holding `data`, each entry without expiration.
    #[must_use]
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        let data = data.into_iter().map(|(key, value)| (key, (value, EntryOptions::never()))).collect();
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if an entry is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// The payload stored under `key`, read without recording an operation.
    #[must_use]
    pub fn payload(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().get(key).map(|(value, _)| value.clone())
    }

    /// The options the entry under `key` was stored with.
    #[must_use]
    pub fn entry_options(&self, key: &str) -> Option<EntryOptions> {
        self.data.lock().get(key).map(|(_, options)| *options)
    }

    /// Makes every operation matching `predicate` fail. Failed operations are
    /// still recorded.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Lets all operations succeed again.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// All recorded operations, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Forgets the recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Records `op` and fails it if it matches the failure predicate.
    fn check(&self, op: StoreOp, message: &'static str) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail { Err(Error::caused_by(message)) } else { Ok(()) }
    }
}

impl CacheStore for MockStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.check(StoreOp::Get(key.to_owned()), "mock: get failed")?;
        Ok(self.payload(key))
    }

    fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> Result<(), Error> {
        let op = StoreOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            options: *options,
        };
        self.check(op, "mock: set failed")?;
        self.data.lock().insert(key.to_owned(), (value, *options));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.check(StoreOp::Remove(key.to_owned()), "mock: remove failed")?;
        self.data.lock().remove(key);
        Ok(())
    }
}
