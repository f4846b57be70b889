//! Optional "is this posting still up?" probe.
//!
//! # Closed detection
//!
//! The same heuristic applies to every source:
//!
//! 1. The URL itself contains a closed marker (`/expired`, `position-filled`, …)
//! 2. `HEAD` (falling back to `GET` on `405`) follows redirects; the final URL
//!    contains a closed marker
//! 3. The final status is `404`, `410` or `451`
//! 4. A posting URL redirected to a generic listing (site root, `/jobs`,
//!    `/careers`)
//!
//! Any of these yields [`JobStatus::Closed`]. A `2xx` answer is
//! [`JobStatus::Open`]. Everything else (rate limits, `403`, `5xx`, timeouts,
//! connection errors) is [`JobStatus::Unknown`] and the job is kept.

use crate::http::browser_headers;
use crate::models::{Job, JobStatus};
use crate::scrapers::is_generic_listing_url;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Method;
use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

const CLOSED_MARKERS: &[&str] = &[
    "/closed",
    "/expired",
    "job-not-found",
    "no-longer-available",
    "position-filled",
    "position-closed",
];

const GONE_STATUSES: &[u16] = &[404, 410, 451];

/// What a probe saw after following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub final_url: String,
}

/// Trait for issuing a single reachability request.
pub trait LinkProbe {
    async fn probe(&self, method: Method, url: &str) -> Result<ProbeResponse, Box<dyn Error>>;
}

/// `reqwest`-backed [`LinkProbe`]. Redirects are followed; bodies are never read.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl LinkProbe for HttpProbe {
    async fn probe(&self, method: Method, url: &str) -> Result<ProbeResponse, Box<dyn Error>> {
        let response = self.client.request(method, url).send().await?;
        Ok(ProbeResponse {
            status: response.status().as_u16(),
            final_url: response.url().to_string(),
        })
    }
}

pub fn has_closed_marker(url: &str) -> bool {
    let lower = url.to_lowercase();
    CLOSED_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classify a completed probe of `original_url`.
pub fn classify_response(original_url: &str, response: &ProbeResponse) -> JobStatus {
    if has_closed_marker(&response.final_url) || GONE_STATUSES.contains(&response.status) {
        return JobStatus::Closed;
    }
    let redirected = response.final_url.trim_end_matches('/') != original_url.trim_end_matches('/');
    if redirected && is_generic_listing_url(&response.final_url) && !is_generic_listing_url(original_url) {
        return JobStatus::Closed;
    }
    if (200..300).contains(&response.status) {
        JobStatus::Open
    } else {
        JobStatus::Unknown
    }
}

async fn probe_within<P: LinkProbe>(
    probe: &P,
    method: Method,
    url: &str,
    limit: Duration,
) -> Option<ProbeResponse> {
    match timeout(limit, probe.probe(method, url)).await {
        Ok(Ok(response)) => Some(response),
        Ok(Err(e)) => {
            debug!(%url, error = %e, "Probe failed");
            None
        }
        Err(_) => {
            debug!(%url, ?limit, "Probe timed out");
            None
        }
    }
}

/// Probe one URL. Never fails: errors and timeouts resolve to [`JobStatus::Unknown`].
pub async fn check_open<P: LinkProbe>(probe: &P, url: &str, limit: Duration) -> JobStatus {
    if has_closed_marker(url) {
        return JobStatus::Closed;
    }
    let Some(mut response) = probe_within(probe, Method::HEAD, url, limit).await else {
        return JobStatus::Unknown;
    };
    if response.status == 405 {
        match probe_within(probe, Method::GET, url, limit).await {
            Some(get) => response = get,
            None => return JobStatus::Unknown,
        }
    }
    classify_response(url, &response)
}

/// The liveness stage: probes every job's URL with bounded concurrency.
#[derive(Debug)]
pub struct LivenessChecker<P> {
    probe: P,
    timeout: Duration,
    concurrency: usize,
}

impl<P: LinkProbe> LivenessChecker<P> {
    pub fn new(probe: P, timeout: Duration, concurrency: usize) -> Self {
        Self {
            probe,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Set each job's `status` and drop the closed ones.
    ///
    /// Each distinct URL is probed once. Input order is preserved. Returns the
    /// surviving jobs and the number dropped as closed.
    #[instrument(level = "info", skip_all, fields(jobs = jobs.len(), concurrency = self.concurrency))]
    pub async fn check_all(&self, jobs: Vec<Job>) -> (Vec<Job>, usize) {
        let urls: Vec<&str> = jobs.iter().map(|j| j.url.as_str()).unique().collect();
        let statuses: HashMap<String, JobStatus> = stream::iter(urls)
            .map(|url| async move { (url.to_string(), check_open(&self.probe, url, self.timeout).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut dropped = 0usize;
        let kept: Vec<Job> = jobs
            .into_iter()
            .filter_map(|mut job| {
                job.status = statuses.get(&job.url).copied().unwrap_or_default();
                if job.status == JobStatus::Closed {
                    debug!(url = %job.url, title = %job.title, "Dropping closed posting");
                    dropped += 1;
                    None
                } else {
                    Some(job)
                }
            })
            .collect();

        let open = kept.iter().filter(|j| j.status == JobStatus::Open).count();
        info!(
            probed = statuses.len(),
            open,
            unknown = kept.len() - open,
            closed = dropped,
            "Liveness check complete"
        );
        (kept, dropped)
    }
}
