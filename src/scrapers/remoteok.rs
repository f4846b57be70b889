//! RemoteOK JSON API adapter.
//!
//! The endpoint returns a JSON array whose first element is a legal notice
//! rather than a job. Every remaining object is passed through as-is.

use crate::http::FetchText;
use crate::models::RawRecord;
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument, warn};

pub const API_URL: &str = "https://remoteok.com/api";

/// Fetch and decode the RemoteOK listing.
#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let body = fetcher.fetch(API_URL).await?;
    let records = parse_listing(&body).inspect_err(|e| {
        warn!(error = %e, body_preview = %truncate_for_log(&body, 200), "RemoteOK returned unexpected JSON");
    })?;
    info!(count = records.len(), "Parsed RemoteOK listing");
    Ok(records)
}

/// Decode the API body into raw records, skipping the legal notice and non-objects.
pub fn parse_listing(body: &str) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let items: Vec<Value> = serde_json::from_str(body)?;
    let records = items
        .into_iter()
        .filter(|item| item.get("legal").is_none())
        .filter_map(|item| RawRecord::from_value("remoteok", item))
        .map(with_salary)
        .collect();
    Ok(records)
}

/// Render `salary_min`/`salary_max` into a display string when present.
fn with_salary(record: RawRecord) -> RawRecord {
    let min = record.fields.get("salary_min").and_then(Value::as_u64).filter(|v| *v > 0);
    let max = record.fields.get("salary_max").and_then(Value::as_u64).filter(|v| *v > 0);
    match (min, max) {
        (Some(min), Some(max)) => record.with("salary", format!("${} - ${}", min, max)),
        (Some(min), None) => record.with("salary", format!("${}+", min)),
        _ => record,
    }
}
