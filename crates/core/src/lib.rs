//! Core types and shared functionality for the eCFR word-count service.
//!
//! This crate provides:
//! - Key-value cache implementation with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - The XML word-count engine

pub mod cache;
pub mod config;
pub mod error;
pub mod words;

pub use cache::{CacheDb, KeyValueStore};
pub use config::{AppConfig, ConfigError, VersionCachePolicy};
pub use error::Error;
pub use words::word_count;
