// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process cache store backed by moka.
//!
//! [`MemoryStore`] implements [`CacheStore`](querycache_tier::CacheStore) on a
//! concurrent moka cache and honors the per-entry
//! [`EntryOptions`](querycache_tier::EntryOptions) of every write. Use
//! [`MemoryStoreBuilder`] to bound capacity or add store-wide expiration.
//!
//! # Quick Start
//!
//! ```
//! use querycache_memory::MemoryStoreBuilder;
//! use querycache_tier::{CacheStore, EntryOptions};
//! use std::time::Duration;
//!
//! let store = MemoryStoreBuilder::new().max_capacity(1000).build();
//!
//! store.set("key", b"42".to_vec(), &EntryOptions::absolute(Duration::from_secs(300)))?;
//! assert_eq!(store.get("key")?, Some(b"42".to_vec()));
//! # Ok::<(), querycache_tier::Error>(())
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::MemoryStoreBuilder;
#[doc(inline)]
pub use store::MemoryStore;
