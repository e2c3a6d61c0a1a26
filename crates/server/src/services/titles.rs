//! Title, version and document retrieval with a permanent key-value cache.
//!
//! Cache layout (one flat namespace):
//!
//! | key | value |
//! |---|---|
//! | `titles` | every title |
//! | `<title>` | versions of a title |
//! | `<title>/<part>/<subpart>/<identifier>/<date>` | version document XML |
//! | `word-counts/<version key>` | words in a version document |
//! | `title-counts/<title>` | full title XML at the snapshot date |
//! | `title-word-counts/<title>` | words in the full title |
//! | `title-counts` | per-title counts for every title |
//! | `first_run` | set once the first background count finished |
//!
//! Remote failures are returned as payloads and never written, so the next
//! call retries them. Nothing is ever deleted.

use std::sync::Arc;
use std::time::Duration;

use ecfr_client::ecfr::{TitlesResponse, VersionsResponse};
use ecfr_client::{Endpoints, Fetch, FetchResponse, Title, Version};
use ecfr_core::cache::{get_typed, set_typed};
use ecfr_core::{Error, KeyValueStore, VersionCachePolicy, word_count};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sample;
use crate::tasks::TaskRegistry;

pub const TITLES_KEY: &str = "titles";
pub const TITLE_COUNTS_KEY: &str = "title-counts";
pub const FIRST_RUN_KEY: &str = "first_run";
pub const COUNTS_TASK: &str = "counts_task";

const DEFAULT_TITLE_DATE: &str = "2025-03-31";
const SECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream failure reported in place of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub error: String,
    pub status_code: u16,
}

/// Data from the eCFR API, or why it could not be retrieved.
pub type RemoteResult<T> = std::result::Result<T, RemoteFailure>;

/// Word count of one title; failed lookups carry `error` and `status_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleWordCount {
    pub title: String,
    pub word_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl TitleWordCount {
    pub fn new(title: &str, word_count: u64) -> Self {
        Self { title: title.to_string(), word_count, error: None, status_code: None }
    }

    fn failed(title: &str, status_code: u16) -> Self {
        Self {
            title: title.to_string(),
            word_count: 0,
            error: Some(format!("Title {} not found or rate limited", title)),
            status_code: Some(status_code),
        }
    }
}

/// Numbers of every known title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleSummary {
    pub title_count: usize,
    pub titles: Vec<u32>,
}

/// One entry of a section fetch plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFetch {
    pub key: String,
    pub url: String,
    pub needs_fetch: bool,
}

/// A successfully fetched version document.
#[derive(Debug, Clone)]
pub struct SectionDocument {
    pub key: String,
    pub xml: String,
}

/// Fetches titles, versions and documents through the cache.
#[derive(Clone)]
pub struct TitleService {
    store: Arc<dyn KeyValueStore>,
    http: Arc<dyn Fetch>,
    endpoints: Endpoints,
    tasks: Arc<TaskRegistry>,
    title_date: String,
    version_policy: VersionCachePolicy,
}

impl TitleService {
    pub fn new(
        store: Arc<dyn KeyValueStore>, http: Arc<dyn Fetch>, endpoints: Endpoints, tasks: Arc<TaskRegistry>,
    ) -> Self {
        Self {
            store,
            http,
            endpoints,
            tasks,
            title_date: DEFAULT_TITLE_DATE.to_string(),
            version_policy: VersionCachePolicy::default(),
        }
    }

    /// Snapshot date for full-title documents.
    pub fn with_title_date(mut self, date: impl Into<String>) -> Self {
        self.title_date = date.into();
        self
    }

    pub fn with_version_policy(mut self, policy: VersionCachePolicy) -> Self {
        self.version_policy = policy;
        self
    }

    fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Fetch `url`, reducing any failure to the status code to report.
    async fn fetch_ok(&self, url: &str, timeout: Option<Duration>) -> Result<FetchResponse, u16> {
        match self.http.fetch(url, timeout).await {
            Ok(response) if response.is_ok() => Ok(response),
            Ok(response) => {
                tracing::error!("Failed to retrieve {}: {}", url, response.status.as_u16());
                Err(response.status.as_u16())
            }
            Err(e) => {
                tracing::error!("Failed to retrieve {}: {}", url, e);
                Err(e.upstream_status())
            }
        }
    }

    /// All titles, from the cache or the titles endpoint.
    pub async fn get_titles(&self) -> Result<RemoteResult<Vec<Title>>, Error> {
        if let Some(titles) = get_typed::<Vec<Title>>(self.store(), TITLES_KEY).await? {
            tracing::debug!("Cache hit for titles {}", TITLES_KEY);
            return Ok(Ok(titles));
        }

        let response = match self.fetch_ok(&self.endpoints.titles(), None).await {
            Ok(response) => response,
            Err(status_code) => {
                return Ok(Err(RemoteFailure {
                    title: None,
                    error: "Failed to retrieve titles".to_string(),
                    status_code,
                }));
            }
        };

        let titles = response.json::<TitlesResponse>()?.titles;
        set_typed(self.store(), TITLES_KEY, &titles).await?;
        tracing::info!(count = titles.len(), "cached title list");
        Ok(Ok(titles))
    }

    /// Versions of one title, cached under the bare title number.
    pub async fn get_title_sections(&self, title: &str) -> Result<RemoteResult<Vec<Version>>, Error> {
        if let Some(versions) = get_typed::<Vec<Version>>(self.store(), title).await? {
            tracing::debug!("Cache hit for title {}", title);
            return Ok(Ok(versions));
        }

        let response = match self.fetch_ok(&self.endpoints.versions(title), None).await {
            Ok(response) => response,
            Err(status_code) => {
                return Ok(Err(RemoteFailure {
                    title: Some(title.to_string()),
                    error: format!("Title {} not found or rate limited", title),
                    status_code,
                }));
            }
        };

        let versions = response.json::<VersionsResponse>()?.content_versions;
        set_typed(self.store(), title, &versions).await?;
        tracing::info!(title, count = versions.len(), "cached title versions");
        Ok(Ok(versions))
    }

    /// Cache the versions of every title, retrying each failed title once.
    ///
    /// Returns how many titles have their versions cached afterwards.
    pub async fn populate_title_sections(&self) -> Result<usize, Error> {
        let titles = match self.get_titles().await? {
            Ok(titles) => titles,
            Err(failure) => {
                tracing::warn!(status_code = failure.status_code, "cannot populate sections: {}", failure.error);
                return Ok(0);
            }
        };

        let mut populated = 0;
        for title in &titles {
            let key = title.key();
            if self.get_title_sections(&key).await?.is_ok() {
                populated += 1;
                continue;
            }
            match self.get_title_sections(&key).await? {
                Ok(_) => populated += 1,
                Err(failure) => tracing::warn!(title = %key, status_code = failure.status_code, "{}", failure.error),
            }
        }

        tracing::info!("Cache populated with sections for {} of {} titles", populated, titles.len());
        Ok(populated)
    }

    /// Derive the key, document URL and fetch decision for every version.
    pub async fn check_version_cache(&self, title: &str, versions: &[Version]) -> Result<Vec<SectionFetch>, Error> {
        let mut plan = Vec::with_capacity(versions.len());

        for version in versions {
            let owner = version.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(title);
            let key = version.cache_key(title);
            let url = self.endpoints.version_document(owner, version);
            let cached = self.store().contains(&key).await?;

            let needs_fetch = match self.version_policy {
                VersionCachePolicy::AlwaysRefetch => {
                    if cached {
                        tracing::info!("Cache hit for {}", key);
                    } else {
                        tracing::debug!("Cache miss for {}", key);
                    }
                    true
                }
                VersionCachePolicy::RespectCache => !cached,
            };

            plan.push(SectionFetch { key, url, needs_fetch });
        }

        Ok(plan)
    }

    /// Fetch one version document; `None` when the upstream did not answer 200.
    pub async fn get_section(&self, key: &str, url: &str) -> Option<SectionDocument> {
        let response = self.fetch_ok(url, Some(SECTION_TIMEOUT)).await.ok()?;
        Some(SectionDocument { key: key.to_string(), xml: response.text() })
    }

    /// Cached word count under `count_key`, computing it from `xml` on a miss.
    async fn cached_word_count(&self, count_key: &str, xml: &str) -> Result<u64, Error> {
        if let Some(count) = get_typed::<u64>(self.store(), count_key).await? {
            tracing::debug!("Cache hit for {}", count_key);
            return Ok(count);
        }

        tracing::info!("Cache miss for {}", count_key);
        let count = word_count(xml)?;
        set_typed(self.store(), count_key, &count).await?;
        Ok(count)
    }

    /// Words in the full title XML at the snapshot date.
    pub async fn get_title_words(&self, title: &str) -> Result<TitleWordCount, Error> {
        let document_key = format!("title-counts/{}", title);

        let xml = match get_typed::<String>(self.store(), &document_key).await? {
            Some(xml) => {
                tracing::info!("Cache hit for {}", document_key);
                xml
            }
            None => {
                tracing::info!("Cache miss for {}", document_key);
                let url = self.endpoints.full_title(&self.title_date, title);
                match self.fetch_ok(&url, None).await {
                    Ok(response) => {
                        let xml = response.text();
                        set_typed(self.store(), &document_key, &xml).await?;
                        xml
                    }
                    Err(status_code) => return Ok(TitleWordCount::failed(title, status_code)),
                }
            }
        };

        let count = self
            .cached_word_count(&format!("title-word-counts/{}", title), &xml)
            .await?;
        tracing::info!("Title {} has {} words in total", title, count);
        Ok(TitleWordCount::new(title, count))
    }

    /// Words in a title summed over its version documents.
    ///
    /// Documents are fetched concurrently. Versions whose document was
    /// never retrieved are left out of the sum.
    pub async fn get_title_word_count_by_sections(&self, title: &str) -> Result<u64, Error> {
        let versions = match self.get_title_sections(title).await? {
            Ok(versions) => versions,
            Err(failure) => {
                tracing::warn!(title, status_code = failure.status_code, "{}", failure.error);
                return Ok(0);
            }
        };

        let plan = self.check_version_cache(title, &versions).await?;

        let documents = join_all(
            plan.iter()
                .filter(|section| section.needs_fetch)
                .map(|section| self.get_section(&section.key, &section.url)),
        )
        .await;
        tracing::info!("Title {} retrieving counts for {} sections", title, documents.len());

        for document in documents.into_iter().flatten() {
            set_typed(self.store(), &document.key, &document.xml).await?;
            tracing::debug!("Put {} in cache", document.key);
        }

        let mut total = 0;
        for section in &plan {
            let Some(xml) = get_typed::<String>(self.store(), &section.key).await? else {
                tracing::debug!("Skipping {}: document unavailable", section.key);
                continue;
            };
            total += self
                .cached_word_count(&format!("word-counts/{}", section.key), &xml)
                .await?;
        }

        tracing::info!("Title {} has {} words across {} sections", title, total, plan.len());
        Ok(total)
    }

    /// Section-summed word counts for every title, in title order.
    pub async fn get_section_counts(&self) -> Result<Vec<u64>, Error> {
        let titles = match self.get_titles().await? {
            Ok(titles) => titles,
            Err(failure) => {
                tracing::warn!(status_code = failure.status_code, "{}", failure.error);
                return Ok(Vec::new());
            }
        };

        let mut counts = Vec::with_capacity(titles.len());
        for title in &titles {
            counts.push(self.get_title_word_count_by_sections(&title.key()).await?);
        }
        Ok(counts)
    }

    /// Full-title word counts for every title.
    ///
    /// With `cached`, a previously stored aggregate is returned as is.
    pub async fn get_title_counts(&self, cached: bool) -> Result<Vec<TitleWordCount>, Error> {
        if cached {
            if let Some(counts) = get_typed::<Vec<TitleWordCount>>(self.store(), TITLE_COUNTS_KEY).await? {
                tracing::info!("Cache hit for {}", TITLE_COUNTS_KEY);
                return Ok(counts);
            }
        }

        let titles = match self.get_titles().await? {
            Ok(titles) => titles,
            Err(failure) => {
                tracing::warn!(status_code = failure.status_code, "{}", failure.error);
                return Ok(Vec::new());
            }
        };

        let mut counts = Vec::with_capacity(titles.len());
        for title in &titles {
            counts.push(self.get_title_words(&title.key()).await?);
        }

        set_typed(self.store(), TITLE_COUNTS_KEY, &counts).await?;
        Ok(counts)
    }

    /// `get_title_counts` behind the first-run guard.
    ///
    /// Until one background computation has completed, and whenever a counts
    /// task is already running, the built-in sample is returned instead.
    pub async fn get_title_counts_cached(&self, cached: bool) -> Result<Vec<TitleWordCount>, Error> {
        if !self.store().contains(FIRST_RUN_KEY).await? {
            let service = self.clone();
            let started = self.tasks.spawn_unique(COUNTS_TASK, async move {
                match service.get_title_counts(true).await {
                    Ok(counts) => tracing::info!(titles = counts.len(), "First run done"),
                    Err(e) => tracing::error!("First run failed: {}", e),
                }
                if let Err(e) = service.store().set(FIRST_RUN_KEY, Value::Bool(true)).await {
                    tracing::error!("Failed to record first run: {}", e);
                }
            });
            if started.is_some() {
                tracing::info!("First run, populating cache, giving sample response");
            } else {
                tracing::info!("First run still in progress, giving sample response");
            }
            return sample::title_counts();
        }

        let service = self.clone();
        let Some(handle) = self
            .tasks
            .spawn_unique(COUNTS_TASK, async move { service.get_title_counts(cached).await })
        else {
            tracing::info!("Title counts already computing, giving sample response");
            return sample::title_counts();
        };
        tracing::info!("Cache populated, retrieving title counts");

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                tracing::info!("Task started during shutdown");
                Ok(Vec::new())
            }
            Err(e) => Err(Error::TaskFailed(e.to_string())),
        }
    }

    /// Count and numbers of every known title.
    pub async fn title_summary(&self) -> Result<RemoteResult<TitleSummary>, Error> {
        Ok(self.get_titles().await?.map(|titles| TitleSummary {
            title_count: titles.len(),
            titles: titles.iter().map(|t| t.number).collect(),
        }))
    }
}
