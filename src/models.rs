//! Data models for raw source records and canonical job postings.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawRecord`]: Loosely-typed posting exactly as an adapter produced it
//! - [`Job`]: The canonical, normalized posting written to `jobs.json` / `jobs.csv`
//! - [`JobStatus`]: Outcome of the optional liveness probe
//! - [`JobsDocument`]: The top-level shape of `jobs.json`
//!
//! The field order of [`Job`] is the column order of the CSV export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw job posting as returned by a source adapter.
///
/// The shape of `fields` varies per source. The normalizer knows, per source,
/// which keys carry the title, company, url and so on. Nested values are
/// addressed with dotted paths (`company.display_name`).
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier of the source that produced this record (e.g. `"remoteok"`).
    pub source: String,
    /// Source-specific fields.
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Create an empty record for `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: Map::new(),
        }
    }

    /// Wrap an already-decoded JSON object from an API response.
    ///
    /// Returns `None` when `value` is not an object (RemoteOK prefixes its
    /// array with a legal notice, for instance).
    pub fn from_value(source: impl Into<String>, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self {
                source: source.into(),
                fields,
            }),
            _ => None,
        }
    }

    /// Builder-style string field setter used by the HTML and RSS adapters.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Look up a field by dotted path and render it as text.
    ///
    /// Strings are returned as-is, numbers are formatted, anything else
    /// (null, arrays, objects, missing) yields `None`.
    pub fn get_text(&self, path: &str) -> Option<String> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.get(part)?;
        }
        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Result of probing a posting's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The page answered with a success status.
    Open,
    /// The page is gone, expired, or redirected to a generic listing.
    Closed,
    /// Not probed, timed out, or the answer was ambiguous.
    #[default]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Unknown => "unknown",
        }
    }
}

/// A normalized job posting.
///
/// Every `Job` leaving the pipeline is eligible: it matched at least one role
/// keyword and at least one remote or Kenya keyword.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Job {
    /// Short hex fingerprint of the dedup key.
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
    pub url: String,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
    /// Set on the first run that saw this posting; carried forward by the merger.
    pub first_seen_at: DateTime<Utc>,
    #[serde(default)]
    pub is_remote_eligible: bool,
    #[serde(default)]
    pub is_kenya_eligible: bool,
    #[serde(default)]
    pub is_role_match: bool,
    #[serde(default)]
    pub status: JobStatus,
    /// Plain-text description snippet, used for keyword matching only.
    #[serde(skip)]
    pub description: String,
}

impl Job {
    /// Column names of the CSV export, in [`Job`] field order.
    pub const FIELDS: [&'static str; 13] = [
        "id",
        "title",
        "company",
        "location",
        "salary",
        "url",
        "source",
        "posted_at",
        "first_seen_at",
        "is_remote_eligible",
        "is_kenya_eligible",
        "is_role_match",
        "status",
    ];

    /// Whether this job may appear in the output at all.
    pub fn is_eligible(&self) -> bool {
        self.is_role_match && (self.is_remote_eligible || self.is_kenya_eligible)
    }
}

/// Top-level shape of `jobs.json`.
#[derive(Debug, Deserialize, Serialize)]
pub struct JobsDocument {
    /// When this document was generated.
    pub last_updated: DateTime<Utc>,
    /// Number of entries in `jobs`.
    pub total_jobs: usize,
    pub jobs: Vec<Job>,
}

impl JobsDocument {
    pub fn new(jobs: Vec<Job>, last_updated: DateTime<Utc>) -> Self {
        Self {
            last_updated,
            total_jobs: jobs.len(),
            jobs,
        }
    }
}
