//! SQL schema definitions for the on-disk store.

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

/// Initial schema.
///
/// Keys and values are BLOBs; SQLite compares BLOB keys with `memcmp`, so
/// `ORDER BY key` matches the byte ordering of the in-memory store.
pub const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
) WITHOUT ROWID;
";
