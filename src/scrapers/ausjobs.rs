//! AusJobs curated internship list.
//!
//! The list is a GitHub README containing a markdown table of the form
//! `| [Role](URL) | Company | Location | ... |`. Entries carry no reliable
//! posting date.

use crate::http::FetchText;
use crate::models::RawRecord;
use crate::utils::clean_text;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use tracing::{info, instrument};

pub const README_URL: &str =
    "https://raw.githubusercontent.com/AusJobs/Australia-Tech-Internship/main/README.md";

static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*\[([^\]]+)\]\(([^)]+)\)\s*\|\s*([^|]+)\|\s*([^|]+)\|").unwrap()
});

const HEADER_WORDS: &[&str] = &["role", "company", "position"];

#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let markdown = fetcher.fetch(README_URL).await?;
    let records = parse_table(&markdown);
    info!(count = records.len(), "Parsed AusJobs table");
    Ok(records)
}

pub fn parse_table(markdown: &str) -> Vec<RawRecord> {
    ROW.captures_iter(markdown)
        .filter_map(|caps| {
            let title = clean_text(&caps[1]);
            let url = caps[2].trim();
            if HEADER_WORDS.contains(&title.to_lowercase().as_str()) || title.contains("---") {
                return None;
            }
            if !url.starts_with("http") {
                return None;
            }
            Some(
                RawRecord::new("ausjobs")
                    .with("title", title)
                    .with("url", url)
                    .with("company", clean_text(&caps[3]))
                    .with("location", clean_text(&caps[4])),
            )
        })
        .collect()
}
