//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! (WAL journal, exclusive locking), and checking the schema version.

use super::schema;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, takes an exclusive lock on it,
    /// applies performance pragmas, and creates or checks the schema. A second
    /// process opening the same file fails on its first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).await.map_err(|e| Error::Database(e.into()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA locking_mode=EXCLUSIVE;
                 PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        schema::ensure(&conn).await?;

        tracing::info!(path = %path.display(), "opened cache database");

        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        schema::ensure(&conn).await?;

        Ok(Self { conn })
    }

    /// Flush the WAL into the main file and close the connection.
    ///
    /// Other clones of this handle fail with `ConnectionClosed` afterwards.
    pub async fn close(self) -> Result<(), Error> {
        self.conn
            .call(|conn| conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())))
            .await
            .map_err(Error::Database)?;

        self.conn.close().await.map_err(|e| Error::CloseFailed(e.to_string()))
    }
}
