//! SQLite-backed store.
//!
//! A single `kv` table holds every keeper's state. The database runs in WAL
//! mode and batches are applied inside one transaction.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::{migrations, KvStore, Result, WriteOp};

/// A [`KvStore`] persisted in a SQLite database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the store at `path`, running pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        migrations::run(&conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

impl KvStore for SqliteStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")?;
        let mut rows = stmt.query([prefix])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let key: Vec<u8> = row.get(0)?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, row.get(1)?));
        }
        Ok(entries)
    }

    fn apply_batch(&mut self, ops: Vec<WriteOp>) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            let mut remove = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
            for (key, value) in &ops {
                match value {
                    Some(value) => upsert.execute(params![key, value])?,
                    None => remove.execute([key])?,
                };
            }
        }
        tx.commit()?;
        Ok(())
    }
}
