//! GradConnection (Australia) graduate IT jobs scraper.

use super::is_direct_job_url;
use super::seek::element_text;
use crate::http::FetchText;
use crate::models::RawRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{info, instrument};

pub const BASE_URL: &str = "https://au.gradconnection.com";
pub const LISTING_URL: &str = "https://au.gradconnection.com/graduate-jobs/information-technology/";

const MAX_CARDS: usize = 30;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.job-card").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.job-title").unwrap());
static COMPANY: Lazy<Selector> = Lazy::new(|| Selector::parse("span.company-name").unwrap());
static LOCATION: Lazy<Selector> = Lazy::new(|| Selector::parse("span.location").unwrap());

#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let html = fetcher.fetch(LISTING_URL).await?;
    let records = parse_listing(&html);
    info!(count = records.len(), "Parsed GradConnection listing");
    Ok(records)
}

pub fn parse_listing(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .take(MAX_CARDS)
        .filter_map(parse_card)
        .collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<RawRecord> {
    let title_elem = card.select(&TITLE).next()?;
    let href = title_elem.value().attr("href")?;

    // Only postings, not employer profile pages.
    let absolute = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", BASE_URL, href)
    };
    if !is_direct_job_url(&absolute) && !absolute.contains("/graduate-jobs/") {
        return None;
    }

    let mut record = RawRecord::new("gradconnection")
        .with("title", element_text(title_elem))
        .with("url", absolute);
    if let Some(company) = card.select(&COMPANY).next() {
        record = record.with("company", element_text(company));
    }
    if let Some(location) = card.select(&LOCATION).next() {
        record = record.with("location", element_text(location));
    }
    Some(record)
}
