// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logging of cache-aside activity.
//!
//! With the `logs` feature every lookup and write emits a `tracing` event named
//! after its [`CacheActivity`], carrying the cache name and key as fields.
//! Without it, [`record`] compiles to nothing.

use crate::CacheName;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
pub(crate) const CACHE_NAME: &str = "cache.name";

#[cfg(test)]
pub(crate) const CACHE_KEY: &str = "cache.key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    /// A stored, non-default value was returned.
    Hit,
    /// Nothing usable was stored; the producer runs.
    Miss,
    /// A produced value was written.
    Stored,
    /// A produced value equal to the default was returned without a write.
    SkipDefault,
}

impl CacheActivity {
    #[cfg(any(feature = "logs", test))]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "querycache.hit",
            Self::Miss => "querycache.miss",
            Self::Stored => "querycache.store",
            Self::SkipDefault => "querycache.skip_default",
        }
    }

    #[cfg(any(feature = "logs", test))]
    pub fn level(self) -> tracing::Level {
        match self {
            Self::Hit | Self::Miss | Self::SkipDefault => tracing::Level::DEBUG,
            Self::Stored => tracing::Level::INFO,
        }
    }
}

#[cfg_attr(
    not(any(feature = "logs", test)),
    expect(unused_variables, reason = "fields are only read when logging")
)]
#[inline]
pub(crate) fn record(cache_name: CacheName, key: &str, activity: CacheActivity) {
    #[cfg(any(feature = "logs", test))]
    emit(cache_name, key, activity);
}

#[cfg(any(feature = "logs", test))]
fn emit(cache_name: CacheName, key: &str, activity: CacheActivity) {
    let activity_name = activity.as_str();

    // Tracing levels and messages must be constant, so a macro picks the call.
    // Field names must match CACHE_NAME and CACHE_KEY.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(cache.name = cache_name, cache.key = key, cache.activity = activity_name, "{activity_name}")
        };
    }

    match activity.level() {
        tracing::Level::INFO => emit_event!(info),
        _ => emit_event!(debug),
    }
}
