//! Opaque pagination cursors for `MapManager::get_keys`.
//!
//! A cursor is URL-safe base64 (no padding) of a bincode `MapCursor`.
//! Callers only ever hand back what they were given.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MapCursor {
    pub last_key: String,
}

impl MapCursor {
    pub fn new(last_key: impl Into<String>) -> Self {
        Self {
            last_key: last_key.into(),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(codec::encode(self)?))
    }

    /// Any token that does not decode is the caller's error.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| StoreError::validation(format!("invalid cursor: {}", e)))?;
        codec::decode(&bytes, "cursor")
            .map_err(|e| StoreError::validation(format!("invalid cursor: {}", e)))
    }
}
