//! Agency directory from the eCFR admin API.

use std::sync::Arc;

use ecfr_client::ecfr::AgenciesResponse;
use ecfr_client::{Endpoints, Fetch};
use ecfr_core::Error;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencySummary {
    pub agency_count: usize,
    pub agencies: Vec<String>,
}

/// Lists top-level agencies. Not cached.
#[derive(Clone)]
pub struct AgencyDirectory {
    http: Arc<dyn Fetch>,
    endpoints: Endpoints,
}

impl AgencyDirectory {
    pub fn new(http: Arc<dyn Fetch>, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Short names of every top-level agency, falling back to the full name.
    pub async fn list(&self) -> Result<AgencySummary, Error> {
        let url = self.endpoints.agencies();
        let response = self.http.fetch(&url, None).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("{} returned {}", url, response.status)));
        }

        let agencies: Vec<String> = response
            .json::<AgenciesResponse>()?
            .agencies
            .into_iter()
            .map(|agency| agency.short_name.filter(|s| !s.is_empty()).unwrap_or(agency.name))
            .collect();

        tracing::debug!(count = agencies.len(), "listed agencies");
        Ok(AgencySummary { agency_count: agencies.len(), agencies })
    }
}
