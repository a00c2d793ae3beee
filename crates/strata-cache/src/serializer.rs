//! Value serializers for the cache wire format.
//!
//! Keys and hash fields are always stored as plain UTF-8 strings; only
//! values and collection members go through a [`ResultSerializer`].

use serde::{de::DeserializeOwned, Serialize};
use strata_core::{StrataError, StrataResult};

/// Converts values to and from the bytes stored by a cache backend.
///
/// Implementations must round-trip every value they accept, including
/// `None` and empty collections.
pub trait ResultSerializer: Send + Sync {
    /// Encodes a value into its stored representation.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StrataResult<Vec<u8>>;

    /// Decodes a stored representation into the expected type.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StrataResult<T>;
}

/// Compact JSON serializer (the default wire format).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ResultSerializer for JsonSerializer {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StrataResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StrataResult<T> {
        serde_json::from_slice(bytes).map_err(|e| {
            StrataError::Serialization(format!(
                "Failed to decode {} bytes as {}: {}",
                bytes.len(),
                std::any::type_name::<T>(),
                e
            ))
        })
    }
}
