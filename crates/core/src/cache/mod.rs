//! SQLite-backed key-value cache for titles, versions, documents and counts.
//!
//! This module provides a persistent, write-once-per-key store using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - A `{contains, get, set}` interface over JSON values
//! - A versioned schema checked on open
//! - Exclusive locking so only one process owns a cache file

pub mod connection;
pub mod schema;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{KeyValueStore, get_typed, set_typed};
