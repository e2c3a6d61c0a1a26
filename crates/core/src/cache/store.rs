//! Key-value operations over the `kv` table.
//!
//! Values are stored as JSON text. Entries are never deleted or expired;
//! `set` on an existing key overwrites it (last write wins).

use super::connection::CacheDb;
use crate::Error;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Durable string-keyed store of JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Whether a value has ever been written under `key`.
    async fn contains(&self, key: &str) -> Result<bool, Error>;

    /// The value under `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    /// Write `value` under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), Error>;
}

/// Read and decode the value under `key`.
pub async fn get_typed<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, Error> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode `value` and write it under `key`.
pub async fn set_typed<T: Serialize + Sync + ?Sized>(
    store: &dyn KeyValueStore, key: &str, value: &T,
) -> Result<(), Error> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

#[async_trait]
impl KeyValueStore for CacheDb {
    async fn contains(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row("SELECT EXISTS(SELECT 1 FROM kv WHERE key = ?1)", params![key], |row| row.get(0))
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;

                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let key = key.to_string();
        let json = serde_json::to_string(&value)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv (key, value, written_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        written_at = excluded.written_at",
                    params![key, json, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
