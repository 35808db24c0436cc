// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache-aside caching of query results.
//!
//! [`CacheAside`] wraps a [`CacheStore`]: reads go to the store first, and on a
//! miss the caller's producer runs and its result is written back with the
//! requested lifetime. Values are encoded by a pluggable [`Serializer`], JSON by
//! default.
//!
//! [`CachedQueryExt`] builds on it to cache whole query results. The key comes
//! from the query's expression tree via [`querykey::derive_key`], so the same
//! filter with the same captured values always maps to the same entry, and the
//! rows come from a [`QuerySource`] on a miss.
//!
//! # Caching Values
//!
//! ```
//! use querycache::{CacheAside, MemoryStore};
//!
//! let cache = CacheAside::new(MemoryStore::new());
//!
//! let greeting: String = cache.get_or_compute_for("greeting", || Ok("hello".to_owned()), 60)?;
//! assert_eq!(greeting, "hello");
//! assert_eq!(cache.get::<String>("greeting")?, Some("hello".to_owned()));
//! # Ok::<(), querycache::Error>(())
//! ```
//!
//! # Caching Queries
//!
//! ```
//! use querycache::{CacheAside, CachedQueryExt, InMemorySource, MemoryStore};
//! use querykey::{Expr, Lambda, Parameter, Query, Value, ValueType};
//!
//! let source = InMemorySource::new().with_table(
//!     "books",
//!     [
//!         Value::record([("Title", Value::from("Dune")), ("Category", Value::from("Books"))]),
//!         Value::record([("Title", Value::from("Heat")), ("Category", Value::from("Films"))]),
//!     ],
//! );
//!
//! let book = ValueType::record("Book");
//! let x = Parameter::new("x", book.clone());
//! let query = Query::from_source("books", book)
//!     .filter(Lambda::new(x.clone(), x.field("Category", ValueType::Str).equals(Expr::constant("Books"))))
//!     .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));
//!
//! let cache = CacheAside::new(MemoryStore::new());
//! let titles: Vec<String> = cache.to_cache_list(&source, &query, 60, &[Value::from(42)])?;
//! assert_eq!(titles, vec!["Dune".to_owned()]);
//! # Ok::<(), querycache::Error>(())
//! ```
//!
//! # Features
//!
//! - `memory` (default): re-exports [`MemoryStore`], an in-process store.
//! - `logs`: emits `tracing` events for hits, misses and writes, with the cache
//!   name and key as fields.
//! - `test-util`: enables `querycache_tier::testing::MockStore`.

mod aside;
mod builder;
mod cached_query;
mod error;
mod serializer;
pub mod source;
mod telemetry;

#[doc(inline)]
pub use aside::{CacheAside, CacheName};
#[doc(inline)]
pub use builder::CacheAsideBuilder;
#[doc(inline)]
pub use cached_query::{CachedQueryExt, DEFAULT_CACHE_SECONDS};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "memory")]
#[doc(inline)]
pub use querycache_memory::MemoryStore;
#[doc(inline)]
pub use querycache_tier::{CacheStore, EntryOptions};
#[doc(inline)]
pub use serializer::{JsonSerializer, Serializer};
#[doc(inline)]
pub use source::{InMemorySource, QuerySource};
