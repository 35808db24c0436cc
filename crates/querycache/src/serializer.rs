// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Serialize, de::DeserializeOwned};

use crate::Error;

/// Turns cached values into store payloads and back.
pub trait Serializer: Send + Sync {
    /// Encodes `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`Serialization`](crate::ErrorKind::Serialization) error if the
    /// value cannot be encoded.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Error>;

    /// Decodes a payload produced by [`Serializer::serialize`].
    ///
    /// # Errors
    ///
    /// Returns a [`Serialization`](crate::ErrorKind::Serialization) error if the
    /// payload does not decode into `T`.
    fn deserialize<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, Error>;
}

/// JSON payloads via `serde_json`.
///
/// # Examples
///
/// ```
/// use querycache::{JsonSerializer, Serializer};
///
/// let payload = JsonSerializer.serialize(&vec!["Dune", "Emma"])?;
/// assert_eq!(payload, br#"["Dune","Emma"]"#);
/// let titles: Vec<String> = JsonSerializer.deserialize(&payload)?;
/// assert_eq!(titles, ["Dune", "Emma"]);
/// # Ok::<(), querycache::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(value).map_err(Error::serialization)
    }

    fn deserialize<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, Error> {
        serde_json::from_slice(payload).map_err(Error::serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn malformed_payload_is_serialization_error() {
        let error = JsonSerializer.deserialize::<Vec<i32>>(b"not json").expect_err("payload is malformed");
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn mismatched_payload_is_serialization_error() {
        let payload = JsonSerializer.serialize("text").expect("strings encode");
        let error = JsonSerializer.deserialize::<i64>(&payload).expect_err("a string is not a number");
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }
}
