//! Cache schema versioning through `PRAGMA user_version`.
//!
//! A fresh file has version 0 and receives the `kv` table. A file written by
//! a newer build is refused rather than read with the wrong layout.

use super::Error;
use tokio_rusqlite::{Connection, rusqlite};

pub const SCHEMA_VERSION: i64 = 1;

const KV_TABLE: &str = include_str!("../../migrations/kv.sql");

fn user_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Create the `kv` table on a fresh database and check the version of an existing one.
pub async fn ensure(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        match user_version(conn)? {
            0 => {
                let tx = conn.transaction()?;
                tx.execute_batch(KV_TABLE)?;
                tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
                tx.commit()?;
                tracing::debug!(version = SCHEMA_VERSION, "initialized cache schema");
                Ok(())
            }
            SCHEMA_VERSION => Ok(()),
            found => Err(Error::SchemaFailed(format!(
                "cache schema v{} is newer than supported v{}",
                found, SCHEMA_VERSION
            ))),
        }
    })
    .await
    .map_err(Error::from)
}
