//! The processing stages between raw records and the published set.
//!
//! ```text
//! RawRecord ─▶ normalize ─▶ classify ─▶ eligible? ─▶ recent? ─▶ liveness ─▶ dedupe ─▶ merge
//! ```
//!
//! Every stage is a pure function of its input except liveness, which does
//! network I/O, and merge, which needs the previous result set. Both are
//! optional and configured on [`Pipeline`].

pub mod classify;
pub mod dedupe;
pub mod liveness;
pub mod merge;
pub mod normalize;
pub mod recency;

use crate::config::KeywordConfig;
use crate::models::{Job, RawRecord};
use crate::scrapers::SourceId;
use chrono::{DateTime, Duration, Utc};
use liveness::{LinkProbe, LivenessChecker};
use merge::MergeStats;
use tracing::{info, instrument, warn};

/// What happened to the records of one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub raw: usize,
    pub unknown_source: usize,
    pub malformed: usize,
    pub ineligible: usize,
    pub too_old: usize,
    pub closed: usize,
    pub duplicates: usize,
    /// Present when the run merged with a previous result set.
    pub merge: Option<MergeStats>,
    pub kept: usize,
}

/// A configured run of the processing stages.
#[derive(Debug)]
pub struct Pipeline<P> {
    keywords: KeywordConfig,
    max_age: Duration,
    liveness: Option<LivenessChecker<P>>,
    previous: Option<Vec<Job>>,
}

impl<P: LinkProbe> Pipeline<P> {
    pub fn new(keywords: KeywordConfig, max_age: Duration) -> Self {
        Self {
            keywords,
            max_age,
            liveness: None,
            previous: None,
        }
    }

    pub fn with_liveness(mut self, checker: LivenessChecker<P>) -> Self {
        self.liveness = Some(checker);
        self
    }

    /// Merge the result with `previous` instead of replacing it.
    pub fn with_merge(mut self, previous: Vec<Job>) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Normalize, classify and apply the eligibility and recency filters.
    ///
    /// Records are processed in order and dropped records are only counted.
    pub fn filter(&self, records: &[RawRecord], now: DateTime<Utc>) -> (Vec<Job>, PipelineStats) {
        let mut stats = PipelineStats {
            raw: records.len(),
            ..PipelineStats::default()
        };
        let mut jobs = Vec::with_capacity(records.len());

        for raw in records {
            let Ok(source) = raw.source.parse::<SourceId>() else {
                warn!(source = %raw.source, "Record from unknown source; skipping");
                stats.unknown_source += 1;
                continue;
            };
            let Some(job) = normalize::normalize(raw, source, now) else {
                stats.malformed += 1;
                continue;
            };
            let job = classify::classify(job, &self.keywords);
            if !job.is_eligible() {
                stats.ineligible += 1;
                continue;
            }
            if !recency::is_recent(&job, self.max_age, now) {
                stats.too_old += 1;
                continue;
            }
            jobs.push(job);
        }
        (jobs, stats)
    }

    /// Run every configured stage over `records`.
    #[instrument(level = "info", skip_all, fields(records = records.len(), liveness = self.liveness.is_some(), merge = self.previous.is_some()))]
    pub async fn run(self, records: &[RawRecord], now: DateTime<Utc>) -> (Vec<Job>, PipelineStats) {
        let (mut jobs, mut stats) = self.filter(records, now);
        info!(
            raw = stats.raw,
            unknown_source = stats.unknown_source,
            malformed = stats.malformed,
            ineligible = stats.ineligible,
            too_old = stats.too_old,
            remaining = jobs.len(),
            "Filtered records"
        );

        if let Some(checker) = &self.liveness {
            let (open, closed) = checker.check_all(jobs).await;
            jobs = open;
            stats.closed = closed;
        }

        let before = jobs.len();
        jobs = dedupe::dedupe(jobs);
        stats.duplicates = before - jobs.len();
        info!(duplicates = stats.duplicates, remaining = jobs.len(), "Deduplicated");

        if let Some(previous) = self.previous {
            let (merged, merge_stats) = merge::merge(previous, jobs, now);
            info!(
                carried = merge_stats.carried,
                new = merge_stats.new,
                dropped = merge_stats.dropped,
                "Merged with previous result set"
            );
            jobs = merged;
            stats.merge = Some(merge_stats);
        }

        stats.kept = jobs.len();
        (jobs, stats)
    }
}
