//! Unified error types for the eCFR service.
//!
//! Remote-fetch failures inside the title service become payloads instead;
//! these variants are what reaches the request layer.

use tokio_rusqlite::rusqlite;

/// Unified error types for the eCFR service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Schema creation failed or the file has an unsupported version.
    #[error("CACHE_ERROR: schema: {0}")]
    SchemaFailed(String),

    /// Closing the cache database failed.
    #[error("CACHE_ERROR: close failed: {0}")]
    CloseFailed(String),

    /// A cached or fetched value could not be (de)serialized.
    #[error("SERDE_ERROR: {0}")]
    Serialization(String),

    /// Document text is not well-formed XML.
    #[error("XML_PARSE_FAILED: {0}")]
    Xml(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A background task ended without producing a result.
    #[error("TASK_FAILED: {0}")]
    TaskFailed(String),
}

impl Error {
    /// HTTP status reported in failure payloads for transport-level errors.
    pub fn upstream_status(&self) -> u16 {
        match self {
            Error::FetchTimeout(_) => 504,
            _ => 502,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
