//! Scripted `Fetch` implementation and fixtures for service and route tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ecfr_client::{Endpoints, Fetch, FetchResponse, StatusCode};
use ecfr_core::Error;

pub const VERSIONER: &str = "https://ecfr.test/api/versioner/v1";
pub const ADMIN: &str = "https://ecfr.test/api/admin/v1";

pub fn endpoints() -> Endpoints {
    Endpoints::new(VERSIONER, ADMIN).unwrap()
}

/// Answers from a URL table; unknown URLs get 404.
#[derive(Default)]
pub struct FakeFetch {
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    timeouts: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    hang: AtomicBool,
    latency_ms: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: StatusCode, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn time_out(&self, url: &str) {
        self.timeouts.lock().unwrap().insert(url.to_string());
    }

    /// Make every subsequent fetch wait forever.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    /// Delay every response by `latency`.
    pub fn with_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Most requests ever waiting on a response at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn fetch(&self, url: &str, _timeout: Option<Duration>) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(latency)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        if self.timeouts.lock().unwrap().contains(url) {
            return Err(Error::FetchTimeout(url.to_string()));
        }

        let response = match self.responses.lock().unwrap().get(url) {
            Some((status, body)) => FetchResponse::new(url, *status, body.clone()),
            None => FetchResponse::new(url, StatusCode::NOT_FOUND, ""),
        };
        Ok(response)
    }
}

pub fn titles_json(numbers: &[u32]) -> String {
    let titles: Vec<String> = numbers
        .iter()
        .map(|n| format!(r#"{{"number": {n}, "name": "Title {n}", "reserved": false}}"#))
        .collect();
    format!(r#"{{"titles": [{}], "meta": {{}}}}"#, titles.join(", "))
}

/// `(identifier, part, date)` section versions of one title.
pub fn versions_json(title: &str, sections: &[(&str, &str, &str)]) -> String {
    let versions: Vec<String> = sections
        .iter()
        .map(|(identifier, part, date)| {
            format!(
                r#"{{"date": "{date}", "identifier": "{identifier}", "name": "§ {identifier}", "part": "{part}",
                    "subpart": null, "title": "{title}", "type": "section", "substantive": true, "removed": false}}"#
            )
        })
        .collect();
    format!(r#"{{"content_versions": [{}]}}"#, versions.join(", "))
}
