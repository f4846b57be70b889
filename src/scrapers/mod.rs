//! Job source adapters.
//!
//! Each submodule fetches postings from one job board and returns them as
//! [`RawRecord`]s, untouched apart from the bare minimum of shaping needed to
//! get them out of HTML or XML. Everything else (field mapping, date parsing,
//! filtering) happens in [`crate::pipeline`].
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | RemoteOK | [`remoteok`] | JSON API | Array prefixed with a legal notice |
//! | Remotive | [`remotive`] | JSON API | Remote-only board |
//! | We Work Remotely | [`weworkremotely`] | RSS | Titles look like `Company: Role` |
//! | Adzuna | [`adzuna`] | JSON API | Requires `ADZUNA_APP_ID` / `ADZUNA_APP_KEY` |
//! | SEEK | [`seek`] | HTML scraping | One search page per role slug |
//! | LinkedIn | [`linkedin`] | HTML scraping | Public guest search listings |
//! | GradConnection | [`gradconnection`] | HTML scraping | Australian graduate IT roles |
//! | AusJobs | [`ausjobs`] | Markdown table | Curated GitHub README |
//!
//! # Failure Model
//!
//! A source that errors contributes nothing and the run continues. A source
//! that is missing credentials is skipped before it is invoked.

use crate::config::AppConfig;
use crate::http::FetchText;
use crate::models::RawRecord;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub mod adzuna;
pub mod ausjobs;
pub mod gradconnection;
pub mod linkedin;
pub mod remoteok;
pub mod remotive;
pub mod seek;
pub mod weworkremotely;

/// The fixed set of sources this program knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    RemoteOk,
    Remotive,
    WeWorkRemotely,
    Adzuna,
    Seek,
    LinkedIn,
    GradConnection,
    AusJobs,
}

impl SourceId {
    /// Every source, in the order they are run and reported.
    pub const ALL: [SourceId; 8] = [
        SourceId::AusJobs,
        SourceId::Seek,
        SourceId::Adzuna,
        SourceId::LinkedIn,
        SourceId::GradConnection,
        SourceId::RemoteOk,
        SourceId::Remotive,
        SourceId::WeWorkRemotely,
    ];

    /// Identifier used in config files and on [`RawRecord::source`].
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::RemoteOk => "remoteok",
            SourceId::Remotive => "remotive",
            SourceId::WeWorkRemotely => "weworkremotely",
            SourceId::Adzuna => "adzuna",
            SourceId::Seek => "seek",
            SourceId::LinkedIn => "linkedin",
            SourceId::GradConnection => "gradconnection",
            SourceId::AusJobs => "ausjobs",
        }
    }

    /// Human-facing name written to the `source` column of the output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::RemoteOk => "RemoteOK",
            SourceId::Remotive => "Remotive",
            SourceId::WeWorkRemotely => "WeWorkRemotely",
            SourceId::Adzuna => "Adzuna",
            SourceId::Seek => "SEEK",
            SourceId::LinkedIn => "LinkedIn",
            SourceId::GradConnection => "GradConnection",
            SourceId::AusJobs => "GitHub-AusJobs",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown source `{}`", s))
    }
}

/// A producer of raw postings.
///
/// Implementations are independent of each other and may be polled
/// concurrently. `fetch` failures are isolated by [`collect_records`].
pub trait SourceAdapter {
    /// Source identifier, used for logging and stats.
    fn name(&self) -> &str;

    /// Whether the adapter has what it needs (credentials) to run at all.
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, Box<dyn Error>>;
}

/// Adzuna application credentials.
#[derive(Clone)]
pub struct AdzunaCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl AdzunaCredentials {
    /// Both halves must be present and non-blank.
    pub fn from_parts(app_id: Option<String>, app_key: Option<String>) -> Option<Self> {
        match (app_id, app_key) {
            (Some(app_id), Some(app_key)) if !app_id.trim().is_empty() && !app_key.trim().is_empty() => {
                Some(Self { app_id, app_key })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for AdzunaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdzunaCredentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// One of the built-in sources, bound to a shared fetcher.
#[derive(Debug)]
pub struct Source<F> {
    id: SourceId,
    fetcher: Arc<F>,
    adzuna: Option<AdzunaCredentials>,
}

impl<F> Source<F> {
    pub fn new(id: SourceId, fetcher: Arc<F>) -> Self {
        Self {
            id,
            fetcher,
            adzuna: None,
        }
    }

    pub fn with_adzuna(mut self, credentials: Option<AdzunaCredentials>) -> Self {
        self.adzuna = credentials;
        self
    }
}

impl<F> SourceAdapter for Source<F>
where
    F: FetchText,
{
    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn is_configured(&self) -> bool {
        match self.id {
            SourceId::Adzuna => self.adzuna.is_some(),
            _ => true,
        }
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, Box<dyn Error>> {
        let fetcher = self.fetcher.as_ref();
        match self.id {
            SourceId::RemoteOk => remoteok::fetch_jobs(fetcher).await,
            SourceId::Remotive => remotive::fetch_jobs(fetcher).await,
            SourceId::WeWorkRemotely => weworkremotely::fetch_jobs(fetcher).await,
            SourceId::Adzuna => match &self.adzuna {
                Some(credentials) => adzuna::fetch_jobs(fetcher, credentials).await,
                None => Ok(Vec::new()),
            },
            SourceId::Seek => seek::fetch_jobs(fetcher).await,
            SourceId::LinkedIn => linkedin::fetch_jobs(fetcher).await,
            SourceId::GradConnection => gradconnection::fetch_jobs(fetcher).await,
            SourceId::AusJobs => ausjobs::fetch_jobs(fetcher).await,
        }
    }
}

/// Build the adapters enabled in `config`, in [`SourceId::ALL`] order.
pub fn enabled_sources<F>(
    config: &AppConfig,
    fetcher: Arc<F>,
    adzuna: Option<AdzunaCredentials>,
) -> Vec<Source<F>> {
    SourceId::ALL
        .into_iter()
        .filter(|id| config.source_enabled(*id))
        .map(|id| {
            let source = Source::new(id, Arc::clone(&fetcher));
            if id == SourceId::Adzuna {
                source.with_adzuna(adzuna.clone())
            } else {
                source
            }
        })
        .collect()
}

/// Per-source outcome of a collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fetched(usize),
    Failed,
    Skipped,
}

/// Everything [`collect_records`] gathered, in adapter order.
#[derive(Debug, Default)]
pub struct Collected {
    pub records: Vec<RawRecord>,
    pub outcomes: Vec<(String, SourceOutcome)>,
}

impl Collected {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == SourceOutcome::Failed)
            .count()
    }
}

/// Run every adapter, at most `concurrency` at a time.
///
/// Unconfigured adapters are skipped without being invoked. A failing adapter
/// is logged and contributes zero records. Records are returned grouped in
/// adapter order regardless of completion order, so downstream stages see a
/// deterministic sequence.
#[instrument(level = "info", skip_all, fields(sources = adapters.len(), concurrency = concurrency))]
pub async fn collect_records<A>(adapters: &[A], concurrency: usize) -> Collected
where
    A: SourceAdapter,
{
    let mut results: Vec<(usize, String, SourceOutcome, Vec<RawRecord>)> =
        stream::iter(adapters.iter().enumerate())
            .map(|(i, adapter)| async move {
                let name = adapter.name().to_string();
                if !adapter.is_configured() {
                    info!(source = %name, "Source missing credentials; skipping");
                    return (i, name, SourceOutcome::Skipped, Vec::new());
                }
                match adapter.fetch().await {
                    Ok(records) => {
                        info!(source = %name, count = records.len(), "Fetched source");
                        (i, name, SourceOutcome::Fetched(records.len()), records)
                    }
                    Err(e) => {
                        error!(source = %name, error = %e, "Source fetch failed; continuing without it");
                        (i, name, SourceOutcome::Failed, Vec::new())
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    results.sort_by_key(|(i, _, _, _)| *i);

    let mut collected = Collected::default();
    for (_, name, outcome, records) in results {
        collected.outcomes.push((name, outcome));
        collected.records.extend(records);
    }
    collected
}

/// Check whether a URL points at a specific posting rather than a careers landing page.
pub fn is_direct_job_url(url: &str) -> bool {
    static JOB_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"/jobs?/",
            r"/positions?/",
            r"/openings?/",
            r"/requisition",
            r"/req\d+",
            r"/jid/",
            r"/jobid/",
            r"/job-\d+",
            r"/apply/",
            r"jobid=",
            r"job_id=",
            r"positionid=",
            r"id=\d+",
            r"/\d{5,}",
            r"greenhouse\.io/.+/jobs/",
            r"lever\.co/.+/",
            r"myworkdayjobs\.com/.+/job/",
            r"smartrecruiters\.com/.+/\d+",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    let lower = url.to_lowercase();
    if lower.is_empty() || matches_generic(&lower) {
        return false;
    }
    JOB_PATTERNS.iter().any(|re| re.is_match(&lower))
}

/// Check whether a URL is a domain root or a generic careers / jobs index.
///
/// Query strings and fragments are ignored, so tracking parameters on a
/// redirect target don't hide a bounce to the careers page.
pub fn is_generic_listing_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path_only = lower.split(['?', '#']).next().unwrap_or_default();
    matches_generic(path_only)
}

fn matches_generic(lower: &str) -> bool {
    static GENERIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"^https?://[^/]+/?$",
            r"/careers/?$",
            r"/jobs/?$",
            r"/about/?$",
            r"/company/?$",
            r"/teams?/?$",
            r"/culture/?$",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    GENERIC_PATTERNS.iter().any(|re| re.is_match(lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::sleep;

    struct FakeAdapter {
        name: &'static str,
        delay_ms: u64,
        result: Result<usize, &'static str>,
        configured: bool,
    }

    impl SourceAdapter for FakeAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch(&self) -> Result<Vec<RawRecord>, Box<dyn Error>> {
            assert!(self.configured, "unconfigured adapter must not be invoked");
            sleep(Duration::from_millis(self.delay_ms)).await;
            match self.result {
                Ok(n) => Ok((0..n)
                    .map(|i| {
                        RawRecord::from_value(self.name, json!({ "title": format!("{}-{}", self.name, i) }))
                            .unwrap()
                    })
                    .collect()),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn fake(name: &'static str, delay_ms: u64, result: Result<usize, &'static str>) -> FakeAdapter {
        FakeAdapter {
            name,
            delay_ms,
            result,
            configured: true,
        }
    }

    #[tokio::test]
    async fn test_collect_records_keeps_adapter_order() {
        // The first adapter finishes last.
        let adapters = vec![fake("slow", 30, Ok(2)), fake("fast", 0, Ok(1))];
        let collected = collect_records(&adapters, 4).await;

        let titles: Vec<String> = collected
            .records
            .iter()
            .map(|r| r.get_text("title").unwrap())
            .collect();
        assert_eq!(titles, vec!["slow-0", "slow-1", "fast-0"]);
        assert_eq!(
            collected.outcomes,
            vec![
                ("slow".to_string(), SourceOutcome::Fetched(2)),
                ("fast".to_string(), SourceOutcome::Fetched(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_source_is_isolated() {
        let adapters = vec![
            fake("broken", 0, Err("503 Service Unavailable")),
            fake("ok", 0, Ok(3)),
        ];
        let collected = collect_records(&adapters, 1).await;
        assert_eq!(collected.records.len(), 3);
        assert_eq!(collected.failed(), 1);
        assert_eq!(collected.outcomes[0].1, SourceOutcome::Failed);
    }

    #[tokio::test]
    async fn test_unconfigured_source_is_skipped_not_failed() {
        let mut needs_key = fake("adzuna", 0, Ok(5));
        needs_key.configured = false;
        let adapters = vec![needs_key, fake("ok", 0, Ok(1))];
        let collected = collect_records(&adapters, 2).await;
        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.failed(), 0);
        assert_eq!(collected.outcomes[0].1, SourceOutcome::Skipped);
    }

    #[test]
    fn test_source_id_round_trips_through_config_names() {
        for id in SourceId::ALL {
            assert_eq!(id.as_str().parse::<SourceId>().unwrap(), id);
        }
        assert!("monster".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_adzuna_credentials_need_both_parts() {
        assert!(AdzunaCredentials::from_parts(Some("id".into()), Some("key".into())).is_some());
        assert!(AdzunaCredentials::from_parts(Some("id".into()), None).is_none());
        assert!(AdzunaCredentials::from_parts(Some("id".into()), Some("  ".into())).is_none());
        let debug = format!(
            "{:?}",
            AdzunaCredentials::from_parts(Some("id".into()), Some("secret".into())).unwrap()
        );
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_is_direct_job_url() {
        assert!(is_direct_job_url("https://boards.greenhouse.io/acme/jobs/123456"));
        assert!(is_direct_job_url("https://au.gradconnection.com/employers/acme/jobs/graduate-dev/"));
        assert!(is_direct_job_url("https://example.com/careers?jobid=42"));
        assert!(!is_direct_job_url("https://example.com/careers"));
        assert!(!is_direct_job_url("https://example.com/"));
        assert!(!is_direct_job_url("https://example.com/about-us"));
        assert!(!is_direct_job_url(""));
    }

    #[test]
    fn test_is_generic_listing_url() {
        assert!(is_generic_listing_url("https://example.com"));
        assert!(is_generic_listing_url("https://example.com/jobs/"));
        assert!(is_generic_listing_url("https://example.com/careers?utm_source=x"));
        assert!(!is_generic_listing_url("https://example.com/jobs/123"));
    }
}
