//! `jobs.csv`: the result set as a flat table.
//!
//! One header row with the [`Job::FIELDS`] names, then one row per job.
//! Every field is double-quoted with embedded quotes doubled, timestamps are
//! RFC 3339 in UTC and a missing `posted_at` is an empty field.

use crate::models::Job;
use chrono::{DateTime, SecondsFormat, Utc};

pub const FILE_NAME: &str = "jobs.csv";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row(job: &Job) -> [String; 13] {
    [
        job.id.clone(),
        job.title.clone(),
        job.company.clone(),
        job.location.clone(),
        job.salary.clone(),
        job.url.clone(),
        job.source.clone(),
        job.posted_at.as_ref().map(timestamp).unwrap_or_default(),
        timestamp(&job.first_seen_at),
        job.is_remote_eligible.to_string(),
        job.is_kenya_eligible.to_string(),
        job.is_role_match.to_string(),
        job.status.as_str().to_string(),
    ]
}

/// Render `jobs` as CSV text, header included.
pub fn render_csv(jobs: &[Job]) -> String {
    let mut out = String::new();
    let header: Vec<String> = Job::FIELDS.iter().map(|f| quote(f)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for job in jobs {
        let fields: Vec<String> = row(job).iter().map(|f| quote(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
