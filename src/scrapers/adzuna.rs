//! Adzuna search API adapter.
//!
//! Adzuna only serves a handful of countries, each behind its own endpoint.
//! The adapter runs one query per (country, search term) pair. A failing
//! query is logged and skipped; the source as a whole only fails when every
//! query does.

use super::AdzunaCredentials;
use crate::http::FetchText;
use crate::models::RawRecord;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

const SEARCHES: &[&str] = &[
    "data engineer",
    "data analyst",
    "data scientist",
    "software engineer",
    "software developer",
    "devops engineer",
    "machine learning engineer",
    "python developer",
    "graduate developer",
    "junior developer",
    "quant developer",
    "quantitative analyst",
];

const COUNTRIES: &[(&str, &str)] = &[
    ("au", "Australia"),
    ("gb", "United Kingdom"),
    ("us", "United States"),
    ("ca", "Canada"),
];

const RESULTS_PER_PAGE: &str = "25";
const MAX_DAYS_OLD: &str = "14";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Build the search URL for one country/term pair.
pub fn search_url(
    credentials: &AdzunaCredentials,
    country_code: &str,
    location: &str,
    what: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &format!("https://api.adzuna.com/v1/api/jobs/{}/search/1", country_code),
        &[
            ("app_id", credentials.app_id.as_str()),
            ("app_key", credentials.app_key.as_str()),
            ("results_per_page", RESULTS_PER_PAGE),
            ("what", what),
            ("where", location),
            ("sort_by", "date"),
            ("max_days_old", MAX_DAYS_OLD),
        ],
    )
}

/// Run every search and gather the results.
#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(
    fetcher: &impl FetchText,
    credentials: &AdzunaCredentials,
) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let mut records = Vec::new();
    let mut failures = 0usize;
    let mut last_error: Option<Box<dyn Error>> = None;

    for (country_code, location) in COUNTRIES {
        for what in SEARCHES {
            let url = search_url(credentials, country_code, location, what)?;
            match fetcher.fetch(url.as_str()).await.and_then(|body| parse_results(&body, country_code)) {
                Ok(batch) => {
                    debug!(country_code, what, count = batch.len(), "Adzuna search");
                    records.extend(batch);
                }
                Err(e) => {
                    // Don't log the URL: it carries the app key.
                    warn!(country_code, what, error = %e, "Adzuna search failed; skipping");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }
    }

    let total = COUNTRIES.len() * SEARCHES.len();
    if failures == total {
        if let Some(e) = last_error {
            return Err(e);
        }
    }
    info!(count = records.len(), failures, "Fetched Adzuna results");
    Ok(records)
}

/// Decode one search response.
pub fn parse_results(body: &str, country_code: &str) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .results
        .into_iter()
        .filter_map(|result| RawRecord::from_value("adzuna", result))
        .map(|record| with_salary(record).with("country", country_code.to_uppercase()))
        .collect())
}

fn with_salary(record: RawRecord) -> RawRecord {
    let min = record.fields.get("salary_min").and_then(Value::as_f64);
    let max = record.fields.get("salary_max").and_then(Value::as_f64);
    match (min, max) {
        (Some(min), Some(max)) => record.with("salary", format!("${:.0} - ${:.0}", min, max)),
        (Some(min), None) => record.with("salary", format!("${:.0}+", min)),
        _ => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fixtures::StaticFetcher;

    fn credentials() -> AdzunaCredentials {
        AdzunaCredentials {
            app_id: "id".to_string(),
            app_key: "key".to_string(),
        }
    }

    const BODY: &str = r#"{
        "count": 1,
        "results": [{
            "title": "Python Developer",
            "company": {"display_name": "Acme"},
            "location": {"display_name": "Sydney, New South Wales"},
            "redirect_url": "https://www.adzuna.com.au/land/ad/123",
            "created": "2025-05-06T07:15:00Z",
            "salary_min": 95000.0,
            "salary_max": 110000.4
        }]
    }"#;

    #[test]
    fn test_search_url_encodes_terms() {
        let url = search_url(&credentials(), "gb", "United Kingdom", "data engineer").unwrap();
        let text = url.as_str();
        assert!(text.starts_with("https://api.adzuna.com/v1/api/jobs/gb/search/1?"));
        assert!(text.contains("what=data+engineer"));
        assert!(text.contains("where=United+Kingdom"));
        assert!(text.contains("sort_by=date"));
    }

    #[test]
    fn test_parse_results() {
        let records = parse_results(BODY, "au").unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.get_text("company.display_name").as_deref(), Some("Acme"));
        assert_eq!(record.get_text("salary").as_deref(), Some("$95000 - $110000"));
        assert_eq!(record.get_text("country").as_deref(), Some("AU"));
    }

    #[tokio::test]
    async fn test_fetch_jobs_tolerates_partial_failure() {
        // Only the Australian endpoint answers.
        let fetcher = StaticFetcher::default().with("https://api.adzuna.com/v1/api/jobs/au/", BODY);
        let records = fetch_jobs(&fetcher, &credentials()).await.unwrap();
        assert_eq!(records.len(), SEARCHES.len());
    }

    #[tokio::test]
    async fn test_fetch_jobs_fails_when_everything_fails() {
        let fetcher = StaticFetcher::default();
        assert!(fetch_jobs(&fetcher, &credentials()).await.is_err());
    }
}
