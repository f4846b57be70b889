//! Remotive public API adapter.

use crate::http::FetchText;
use crate::models::RawRecord;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument};

pub const API_URL: &str = "https://remotive.com/api/remote-jobs";

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    jobs: Vec<Value>,
}

/// Fetch and decode the Remotive listing.
#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let body = fetcher.fetch(API_URL).await?;
    let records = parse_listing(&body)?;
    info!(count = records.len(), "Parsed Remotive listing");
    Ok(records)
}

pub fn parse_listing(body: &str) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing
        .jobs
        .into_iter()
        .filter_map(|job| RawRecord::from_value("remotive", job))
        .collect())
}
