// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Books Example
//!
//! Caches the titles of a filtered book query in an in-memory store. The second
//! call is served from the store, and changing the captured category yields a
//! different key. Hit and miss events are logged through `tracing`.

use std::sync::Arc;

use parking_lot::Mutex;
use querycache::{CacheAside, CachedQueryExt, DEFAULT_CACHE_SECONDS, InMemorySource, MemoryStore};
use querykey::{Expr, Lambda, Parameter, Query, Value, ValueType, derive_key};

fn book(title: &str, category: &str) -> Value {
    Value::record([("Title", Value::from(title)), ("Category", Value::from(category))])
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), querycache::Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let source = InMemorySource::new().with_table(
        "books",
        [
            book("Dune", "Books"),
            book("Heat", "Films"),
            book("Emma", "Books"),
        ],
    );

    // The category is read every time a key is derived.
    let category = Arc::new(Mutex::new("Books"));
    let row = ValueType::record("Book");
    let x = Parameter::new("x", row.clone());
    let captured = Arc::clone(&category);
    let query = Query::from_source("books", row)
        .filter(Lambda::new(
            x.clone(),
            x.field("Category", ValueType::Str)
                .equals(Expr::captured("category", ValueType::Str, move || Ok(Value::from(*captured.lock())))),
        ))
        .select(Lambda::new(x.clone(), x.field("Title", ValueType::Str)));

    let cache = CacheAside::builder(MemoryStore::new()).name("books").build();
    let params = [Value::from(42)];

    let key = derive_key(Some(query.expression()), &params)?;
    println!("{} -> {key}", query.expression());

    // Miss: the source runs and the titles are stored for a minute.
    let titles: Vec<String> = cache.to_cache_list_async(&source, &query, DEFAULT_CACHE_SECONDS, &params).await?;
    println!("first call:  {titles:?}");

    // Hit: served from the store.
    let titles: Vec<String> = cache.to_cache_list_async(&source, &query, DEFAULT_CACHE_SECONDS, &params).await?;
    println!("second call: {titles:?}");

    *category.lock() = "Films";
    let films: Vec<String> = cache.to_cache_list(&source, &query, DEFAULT_CACHE_SECONDS, &params)?;
    println!("films:       {films:?} under {}", derive_key(Some(query.expression()), &params)?);

    Ok(())
}
