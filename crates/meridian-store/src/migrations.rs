//! Schema migrations.
//!
//! The schema version lives in `PRAGMA user_version`. Migrations only move
//! forward; a database written by a newer build is refused.

use rusqlite::Connection;

use crate::schema::{self, SCHEMA_VERSION};
use crate::{Result, StoreError};

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<()> {
    let current_version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current_version == 0 {
        tracing::info!("initializing store schema v{SCHEMA_VERSION}");
        conn.execute_batch(schema::SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            tracing::info!("running store migration to v{version}");
            run_migration(conn, version)?;
            conn.pragma_update(None, "user_version", version)?;
        }
    } else if current_version > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "store version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

fn run_migration(_conn: &Connection, version: u32) -> Result<()> {
    Err(StoreError::Migration(format!(
        "unknown migration version: {version}"
    )))
}
