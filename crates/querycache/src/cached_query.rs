// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use querycache_tier::CacheStore;
use querykey::{Query, Value, derive_key};
use serde::{Serialize, de::DeserializeOwned};

use crate::{CacheAside, Error, QuerySource, Serializer};

/// Lifetime in seconds suggested for cached query results.
pub const DEFAULT_CACHE_SECONDS: i64 = 60;

/// Caches the results of queries under keys derived from the query itself.
///
/// The key is the hex digest of the query's partially evaluated, collection
/// normalized text followed by `params`, so two structurally identical queries
/// share an entry and captured values are part of the key. An empty result is
/// never stored.
///
/// # Examples
///
/// ```
/// use querycache::{CacheAside, CachedQueryExt, DEFAULT_CACHE_SECONDS, InMemorySource, MemoryStore};
/// use querykey::{Expr, Lambda, Parameter, Query, Value, ValueType};
///
/// let source = InMemorySource::new().with_table("numbers", [Value::from(1), Value::from(2), Value::from(3)]);
/// let n = Parameter::new("n", ValueType::Int);
/// let query = Query::from_source("numbers", ValueType::Int).filter(Lambda::new(n.clone(), n.expr().greater_than(Expr::constant(1))));
///
/// let cache = CacheAside::new(MemoryStore::new());
/// let numbers: Vec<i64> = cache.to_cache_list(&source, &query, DEFAULT_CACHE_SECONDS, &[])?;
/// assert_eq!(numbers, vec![2, 3]);
/// # Ok::<(), querycache::Error>(())
/// ```
pub trait CachedQueryExt {
    /// Returns the cached rows of `query`, running it on `source` on a miss.
    ///
    /// # Errors
    ///
    /// - [`InvalidArgument`](crate::ErrorKind::InvalidArgument) if `seconds` is
    ///   not positive, before any store I/O.
    /// - [`Query`](crate::ErrorKind::Query) if the key cannot be derived or the
    ///   source fails.
    /// - [`Serialization`](crate::ErrorKind::Serialization) if a row does not
    ///   convert into `T`.
    /// - [`Backend`](crate::ErrorKind::Backend) if the store fails.
    fn to_cache_list<T, Q>(&self, source: &Q, query: &Query, seconds: i64, params: &[Value]) -> Result<Vec<T>, Error>
    where
        T: Serialize + DeserializeOwned + PartialEq,
        Q: QuerySource;

    /// [`CachedQueryExt::to_cache_list`] returning a boxed slice.
    ///
    /// # Errors
    ///
    /// Same as [`CachedQueryExt::to_cache_list`].
    fn to_cache_array<T, Q>(&self, source: &Q, query: &Query, seconds: i64, params: &[Value]) -> Result<Box<[T]>, Error>
    where
        T: Serialize + DeserializeOwned + PartialEq,
        Q: QuerySource,
    {
        self.to_cache_list(source, query, seconds, params).map(Vec::into_boxed_slice)
    }

    /// Async form of [`CachedQueryExt::to_cache_list`].
    ///
    /// # Errors
    ///
    /// Same as [`CachedQueryExt::to_cache_list`].
    fn to_cache_list_async<T, Q>(
        &self,
        source: &Q,
        query: &Query,
        seconds: i64,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>, Error>> + Send
    where
        T: Serialize + DeserializeOwned + PartialEq + Send,
        Q: QuerySource;
}

impl<S: CacheStore, Z: Serializer> CachedQueryExt for CacheAside<S, Z> {
    fn to_cache_list<T, Q>(&self, source: &Q, query: &Query, seconds: i64, params: &[Value]) -> Result<Vec<T>, Error>
    where
        T: Serialize + DeserializeOwned + PartialEq,
        Q: QuerySource,
    {
        let key = derive_key(Some(query.expression()), params)?;
        self.get_or_compute_for(key.as_str(), || source.fetch(query).and_then(convert_rows), seconds)
    }

    fn to_cache_list_async<T, Q>(
        &self,
        source: &Q,
        query: &Query,
        seconds: i64,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>, Error>> + Send
    where
        T: Serialize + DeserializeOwned + PartialEq + Send,
        Q: QuerySource,
    {
        // Deriving reads captured values, so it happens when the call is made.
        let key = derive_key(Some(query.expression()), params);
        async move {
            let key = key?;
            let produce = || async { source.fetch_async(query).await.and_then(convert_rows) };
            self.get_or_compute_for_async(key.as_str(), produce, seconds).await
        }
    }
}

fn convert_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, Error> {
    rows.into_iter()
        .map(|row| serde_json::to_value(row).and_then(serde_json::from_value).map_err(Error::serialization))
        .collect()
}

#[cfg(test)]
mod tests {
    use querycache_tier::testing::MockStore;
    use querykey::{Expr, Lambda, Parameter, ValueType};

    use super::*;
    use crate::{ErrorKind, InMemorySource};

    fn numbers() -> (InMemorySource, Query) {
        let source = InMemorySource::new().with_table("numbers", [Value::from(3), Value::from(1), Value::from(4)]);
        let n = Parameter::new("n", ValueType::Int);
        let query = Query::from_source("numbers", ValueType::Int)
            .filter(Lambda::new(n.clone(), n.expr().greater_than(Expr::constant(2))));
        (source, query)
    }

    #[test]
    fn rows_convert_into_requested_type() {
        let (source, query) = numbers();
        let cache = CacheAside::new(MockStore::new());

        let rows: Vec<i64> = cache
            .to_cache_list(&source, &query, DEFAULT_CACHE_SECONDS, &[])
            .expect("query runs");
        assert_eq!(rows, vec![3, 4]);
    }

    #[test]
    fn array_form_matches_list_form() {
        let (source, query) = numbers();
        let cache = CacheAside::new(MockStore::new());

        let rows: Box<[i64]> = cache
            .to_cache_array(&source, &query, DEFAULT_CACHE_SECONDS, &[])
            .expect("query runs");
        assert_eq!(&*rows, &[3, 4]);
    }

    #[test]
    fn mismatched_row_type_is_serialization_error() {
        let (source, query) = numbers();
        let cache = CacheAside::new(MockStore::new());

        let error = cache
            .to_cache_list::<String, _>(&source, &query, DEFAULT_CACHE_SECONDS, &[])
            .expect_err("integers are not strings");
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn non_positive_lifetime_fails_without_io() {
        let (source, query) = numbers();
        let store = MockStore::new();
        let cache = CacheAside::new(store.clone());

        let error = cache
            .to_cache_list::<i64, _>(&source, &query, 0, &[])
            .expect_err("zero seconds");
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert!(store.operations().is_empty());
    }
}
