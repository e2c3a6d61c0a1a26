//! Client code for the eCFR word-count service.
//!
//! This crate provides the HTTP fetch pipeline and the eCFR endpoint
//! derivation and response models used by the server.

pub mod ecfr;
pub mod fetch;

pub use ecfr::{Agency, Endpoints, Title, Version};
pub use fetch::{Fetch, FetchClient, FetchConfig, FetchResponse};
pub use reqwest::StatusCode;
