//! eCFR API endpoints.
//!
//! ### Versioner API
//! - `GET {versioner}/titles.json`: every title
//! - `GET {versioner}/versions/title-{N}.json`: content versions of a title
//! - `GET {versioner}/full/{date}/title-{N}.xml`: full XML of a title at a date,
//!   optionally narrowed with `part`, `section` or `appendix` query parameters
//!
//! ### Admin API
//! - `GET {admin}/agencies.json`: agency directory

pub mod models;

pub use models::{AgenciesResponse, Agency, Title, TitlesResponse, Version, VersionsResponse};

use crate::fetch::{UrlError, normalize_base_url};
use ecfr_core::AppConfig;

/// URL derivation for the eCFR versioner and admin APIs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    versioner: String,
    admin: String,
}

impl Endpoints {
    /// Build endpoints from the two API roots.
    pub fn new(versioner: &str, admin: &str) -> Result<Self, UrlError> {
        Ok(Self { versioner: normalize_base_url(versioner)?, admin: normalize_base_url(admin)? })
    }

    /// Build endpoints from the configured API roots.
    pub fn from_config(config: &AppConfig) -> Result<Self, UrlError> {
        Self::new(&config.versioner_url, &config.admin_url)
    }

    pub fn titles(&self) -> String {
        format!("{}/titles.json", self.versioner)
    }

    pub fn versions(&self, title: &str) -> String {
        format!("{}/versions/title-{}.json", self.versioner, title)
    }

    /// Full XML of a title at `date`.
    pub fn full_title(&self, date: &str, title: &str) -> String {
        format!("{}/full/{}/title-{}.xml", self.versioner, date, title)
    }

    /// XML of the content unit a version describes, at the version's date.
    ///
    /// Sections and appendices are narrowed by identifier within their part;
    /// other kinds fetch the whole part (or the whole title without one).
    pub fn version_document(&self, title: &str, version: &Version) -> String {
        let date = version.date.as_deref().unwrap_or(models::KEY_PLACEHOLDER);
        let base = self.full_title(date, title);

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(part) = version.part.as_deref().filter(|p| !p.is_empty()) {
            query.push(("part", part));
        }
        if let Some(identifier) = version.identifier.as_deref().filter(|i| !i.is_empty()) {
            match version.kind.as_deref() {
                Some("section") => query.push(("section", identifier)),
                Some("appendix") => query.push(("appendix", identifier)),
                _ => {}
            }
        }

        match url::Url::parse_with_params(&base, &query) {
            Ok(url) if !query.is_empty() => url.to_string(),
            _ => base,
        }
    }

    pub fn agencies(&self) -> String {
        format!("{}/agencies.json", self.admin)
    }
}
