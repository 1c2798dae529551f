//! MVSTORE - Row and Value Encoding
//! bincode helpers shared by the serialization strategies.
//!
//! bincode length-prefixes strings, so the encoded form of a scope tuple
//! is unambiguous and two scopes can never produce the same row key.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Encode any serializable value as a row key or cell value.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Decode a cell value, naming what was being read on failure.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::Serialization(format!("unable to decode {}: {}", what, e)))
}
