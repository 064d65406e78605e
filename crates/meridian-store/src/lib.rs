//! # meridian-store
//!
//! Key-value state storage for the Meridian keepers.
//!
//! Every keeper reads and writes through the [`KvStore`] trait: ordered byte
//! keys, opaque byte values, and an ordered prefix scan. Two backends are
//! provided, plus an overlay used to make calls atomic:
//!
//! - [`mem`]: `BTreeMap`-backed store for tests and embedding
//! - [`sqlite`]: SQLite-backed store (WAL mode, versioned schema)
//! - [`branch`]: write-buffering overlay committed or dropped as a unit
//! - [`codec`]: CBOR encoding of typed values

pub mod branch;
pub mod codec;
pub mod mem;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use branch::{atomically, Branch};
pub use mem::MemStore;
pub use sqlite::SqliteStore;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A staged write: `Some(value)` sets the key, `None` deletes it.
pub type WriteOp = (Vec<u8>, Option<Vec<u8>>);

/// Ordered key-value storage.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply a batch of writes. Backends with real transactions apply the
    /// batch all-or-nothing.
    fn apply_batch(&mut self, ops: Vec<WriteOp>) -> Result<()> {
        for (key, value) in ops {
            match value {
                Some(value) => self.set(&key, value)?,
                None => self.delete(&key)?,
            }
        }
        Ok(())
    }
}
