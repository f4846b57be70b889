//! Raw record → [`Job`] mapping.
//!
//! Every source gets a [`FieldMap`] naming the keys its records use for each
//! canonical field and the date formats it emits. This is the only place in
//! the pipeline that knows anything about individual sources.

use super::dedupe::DedupKey;
use crate::models::{Job, JobStatus, RawRecord};
use crate::scrapers::SourceId;
use crate::utils::{clean_text, strip_html};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;
use url::Url;

/// Company name used when a source doesn't provide one.
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// A date representation a source is known to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2025-05-06T08:00:00Z`, `2025-05-06T08:00:00+03:00`
    Rfc3339,
    /// `Tue, 06 May 2025 08:00:00 +0000` (RSS)
    Rfc2822,
    /// A zone-less date-time in the given `strftime` format, read as UTC.
    Naive(&'static str),
    /// A bare date in the given `strftime` format, read as midnight UTC.
    Date(&'static str),
    /// Seconds since the Unix epoch.
    UnixSeconds,
}

impl DateFormat {
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc)),
            DateFormat::Rfc2822 => DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.with_timezone(&Utc)),
            DateFormat::Naive(fmt) => NaiveDateTime::parse_from_str(raw, fmt).ok().map(|dt| dt.and_utc()),
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            DateFormat::UnixSeconds => raw
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

const ISO_FORMATS: &[DateFormat] = &[
    DateFormat::Rfc3339,
    DateFormat::Naive("%Y-%m-%dT%H:%M:%S"),
    DateFormat::Naive("%Y-%m-%dT%H:%M:%S%.f"),
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Date("%Y/%m/%d"),
];

/// Where a source keeps each canonical field.
///
/// Key lists are tried in order; the first non-blank value wins.
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub location: &'static [&'static str],
    pub url: &'static [&'static str],
    pub posted_at: &'static [&'static str],
    pub description: &'static [&'static str],
    pub salary: &'static [&'static str],
    /// Keys whose value qualifies the source label, e.g. `Adzuna-AU`.
    pub label_suffix: &'static [&'static str],
    /// Used when none of the location keys yields a value.
    pub default_location: &'static str,
    /// Base for resolving site-relative links.
    pub base_url: Option<&'static str>,
    pub date_formats: &'static [DateFormat],
}

const HTML_CARD: FieldMap = FieldMap {
    title: &["title"],
    company: &["company"],
    location: &["location"],
    url: &["url"],
    posted_at: &[],
    description: &[],
    salary: &["salary"],
    label_suffix: &[],
    default_location: "",
    base_url: None,
    date_formats: &[],
};

/// The field map for `source`.
pub fn field_map(source: SourceId) -> FieldMap {
    match source {
        SourceId::RemoteOk => FieldMap {
            title: &["position", "title"],
            company: &["company"],
            location: &["location"],
            url: &["url", "apply_url"],
            posted_at: &["date", "epoch"],
            description: &["description"],
            salary: &["salary"],
            label_suffix: &[],
            default_location: "Remote",
            base_url: Some("https://remoteok.com"),
            date_formats: &[DateFormat::Rfc3339, DateFormat::UnixSeconds],
        },
        SourceId::Remotive => FieldMap {
            title: &["title"],
            company: &["company_name"],
            location: &["candidate_required_location"],
            url: &["url"],
            posted_at: &["publication_date"],
            description: &["description"],
            salary: &["salary"],
            label_suffix: &[],
            default_location: "Remote",
            base_url: None,
            date_formats: ISO_FORMATS,
        },
        SourceId::WeWorkRemotely => FieldMap {
            title: &["title"],
            company: &["company"],
            location: &["region"],
            url: &["url"],
            posted_at: &["pub_date"],
            description: &["description"],
            salary: &[],
            label_suffix: &[],
            default_location: "Remote",
            base_url: Some("https://weworkremotely.com"),
            date_formats: &[DateFormat::Rfc2822, DateFormat::Rfc3339],
        },
        SourceId::Adzuna => FieldMap {
            title: &["title"],
            company: &["company.display_name"],
            location: &["location.display_name"],
            url: &["redirect_url"],
            posted_at: &["created"],
            description: &["description"],
            salary: &["salary"],
            label_suffix: &["country"],
            default_location: "",
            base_url: None,
            date_formats: ISO_FORMATS,
        },
        SourceId::Seek => FieldMap {
            base_url: Some("https://www.seek.com.au"),
            ..HTML_CARD
        },
        SourceId::LinkedIn => FieldMap {
            posted_at: &["listed_at"],
            date_formats: ISO_FORMATS,
            ..HTML_CARD
        },
        SourceId::GradConnection => FieldMap {
            default_location: "Australia",
            base_url: Some("https://au.gradconnection.com"),
            ..HTML_CARD
        },
        SourceId::AusJobs => FieldMap {
            default_location: "Australia",
            ..HTML_CARD
        },
    }
}

fn first_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get_text(key))
        .map(|value| clean_text(&value))
        .find(|value| !value.is_empty())
}

/// Parse the first date field that any of the source's formats accepts.
pub fn parse_posted_at(raw: &RawRecord, map: &FieldMap) -> Option<DateTime<Utc>> {
    map.posted_at
        .iter()
        .filter_map(|key| raw.get_text(key))
        .map(|value| clean_text(&value))
        .filter(|value| !value.is_empty())
        .find_map(|value| map.date_formats.iter().find_map(|fmt| fmt.parse(&value)))
}

/// Turn `candidate` into an absolute http(s) URL, resolving relative links
/// against `base` when the source has one.
pub fn absolute_url(candidate: &str, base: Option<&str>) -> Option<Url> {
    let url = match Url::parse(candidate) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base?).ok()?.join(candidate).ok()?,
        Err(_) => return None,
    };
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

fn source_label(raw: &RawRecord, source: SourceId, map: &FieldMap) -> String {
    match first_text(raw, map.label_suffix) {
        Some(suffix) => format!("{}-{}", source.label(), suffix),
        None => source.label().to_string(),
    }
}

/// Map one raw record to a [`Job`].
///
/// Returns `None` when the title or URL is missing, or the URL cannot be
/// made absolute. The caller counts the drop; nothing here can fail the run.
pub fn normalize(raw: &RawRecord, source: SourceId, seen_at: DateTime<Utc>) -> Option<Job> {
    let map = field_map(source);

    let Some(title) = first_text(raw, map.title) else {
        debug!(%source, "Skipping record without a title");
        return None;
    };
    let Some(candidate) = first_text(raw, map.url) else {
        debug!(%source, %title, "Skipping record without a url");
        return None;
    };
    let Some(url) = absolute_url(&candidate, map.base_url) else {
        debug!(%source, %title, url = %candidate, "Skipping record with an unusable url");
        return None;
    };

    let company = first_text(raw, map.company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
    let location = first_text(raw, map.location).unwrap_or_else(|| map.default_location.to_string());
    let description = map
        .description
        .iter()
        .filter_map(|key| raw.get_text(key))
        .map(|value| strip_html(&value))
        .find(|value| !value.is_empty())
        .unwrap_or_default();

    let mut job = Job {
        id: String::new(),
        title,
        company,
        location,
        salary: first_text(raw, map.salary).unwrap_or_default(),
        url: url.to_string(),
        source: source_label(raw, source, &map),
        posted_at: parse_posted_at(raw, &map),
        first_seen_at: seen_at,
        is_remote_eligible: false,
        is_kenya_eligible: false,
        is_role_match: false,
        status: JobStatus::Unknown,
        description,
    };
    job.id = DedupKey::of(&job).short_id();
    Some(job)
}
