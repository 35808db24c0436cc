// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache store abstraction for query result caching.
//!
//! This crate defines the [`CacheStore`] trait that cache backends implement,
//! [`EntryOptions`] describing how long an entry lives, and the [`Error`] type
//! stores report.
//!
//! Stores deal in serialized payloads keyed by strings. Typed access, the
//! cache-aside policy and key derivation are layered on top by `querycache`.
//!
//! # Implementing a Store
//!
//! ```
//! use querycache_tier::{CacheStore, EntryOptions, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleStore(RwLock<HashMap<String, Vec<u8>>>);
//!
//! impl CacheStore for SimpleStore {
//!     fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     fn set(&self, key: &str, value: Vec<u8>, _options: &EntryOptions) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), value);
//!         Ok(())
//!     }
//!
//!     fn remove(&self, key: &str) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - `test-util`: enables [`testing::MockStore`], a recording store with failure
//!   injection.

pub mod error;
mod options;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use options::EntryOptions;
#[doc(inline)]
pub use store::CacheStore;
