//! CBOR encoding of stored values.
//!
//! Keepers persist their records as CBOR (RFC 8949) through [`ciborium`].
//! [`get`], [`put`] and [`scan`] pair the codec with a [`KvStore`].

use serde::{de::DeserializeOwned, Serialize};

use crate::{KvStore, Result, StoreError};

/// Serialize a value to CBOR bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(format!("CBOR serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data)
        .map_err(|e| StoreError::Deserialization(format!("CBOR deserialization failed: {e}")))
}

/// Read and decode the value at `key`.
pub fn get<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    store
        .get(key.as_bytes())?
        .map(|bytes| from_slice(&bytes))
        .transpose()
}

/// Encode and write `value` at `key`.
pub fn put<T: Serialize>(store: &mut dyn KvStore, key: &str, value: &T) -> Result<()> {
    store.set(key.as_bytes(), to_vec(value)?)
}

/// Decode every value under `prefix`, in key order.
pub fn scan<T: DeserializeOwned>(store: &dyn KvStore, prefix: &str) -> Result<Vec<(String, T)>> {
    store
        .scan_prefix(prefix.as_bytes())?
        .into_iter()
        .map(|(key, bytes)| {
            let key = String::from_utf8(key)
                .map_err(|e| StoreError::Deserialization(format!("non-UTF-8 key: {e}")))?;
            Ok((key, from_slice(&bytes)?))
        })
        .collect()
}
