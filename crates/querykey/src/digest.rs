// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A derived cache key: 32 lowercase hexadecimal characters.
///
/// # Examples
///
/// ```
/// use querykey::hash;
///
/// let key = hash("x => (x.Category == \"Books\"),42");
/// assert_eq!(key.as_str().len(), 32);
/// assert_eq!(key, hash("x => (x.Category == \"Books\"),42"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Hashes canonical key text into a [`CacheKey`] using the 128-bit XXH3 digest.
#[must_use]
pub fn hash(text: &str) -> CacheKey {
    let digest = xxhash_rust::xxh3::xxh3_128(text.as_bytes());
    CacheKey(format!("{digest:032x}"))
}
