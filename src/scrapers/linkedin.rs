//! LinkedIn public (logged-out) job search scraper.
//!
//! Only cards that link to `/jobs/view/` are kept. Tracking query strings are
//! removed from the link so the same posting keeps the same URL across runs.

use super::seek::element_text;
use crate::http::FetchText;
use crate::models::RawRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};

const SEARCHES: &[(&str, &str)] = &[
    ("data engineer", "Australia"),
    ("data analyst", "Kenya"),
    ("software engineer", "United Arab Emirates"),
    ("python developer", "United Kingdom"),
    ("graduate software", "United States"),
    ("quant engineer", "Canada"),
    ("quant developer", "United Kingdom"),
    ("quantitative analyst", "United States"),
    ("machine learning engineer", "Kenya"),
    ("software engineer", "Kenya"),
];

const CARDS_PER_SEARCH: usize = 10;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.base-card").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3.base-search-card__title").unwrap());
static COMPANY: Lazy<Selector> = Lazy::new(|| Selector::parse("h4.base-search-card__subtitle").unwrap());
static LOCATION: Lazy<Selector> = Lazy::new(|| Selector::parse("span.job-search-card__location").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.base-card__full-link").unwrap());
static LISTED: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());

/// Search URL restricted to the past week (`f_TPR=r604800`).
pub fn search_url(keywords: &str, location: &str) -> String {
    format!(
        "https://www.linkedin.com/jobs/search?keywords={}&location={}&f_TPR=r604800",
        urlencoding::encode(keywords),
        urlencoding::encode(location)
    )
}

#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let mut records = Vec::new();
    for (keywords, location) in SEARCHES {
        let url = search_url(keywords, location);
        match fetcher.fetch(&url).await {
            Ok(html) => {
                let batch = parse_search_page(&html);
                debug!(keywords, location, count = batch.len(), "Parsed LinkedIn search page");
                records.extend(batch);
            }
            Err(e) => warn!(keywords, location, error = %e, "LinkedIn search failed; skipping"),
        }
    }
    info!(count = records.len(), "Fetched LinkedIn job cards");
    Ok(records)
}

pub fn parse_search_page(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .take(CARDS_PER_SEARCH)
        .filter_map(parse_card)
        .collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<RawRecord> {
    let title = element_text(card.select(&TITLE).next()?);
    let company = element_text(card.select(&COMPANY).next()?);
    let href = card.select(&LINK).next()?.value().attr("href")?;
    if !href.contains("/jobs/view/") {
        return None;
    }
    let url = href.split('?').next().unwrap_or(href);

    let mut record = RawRecord::new("linkedin")
        .with("title", title)
        .with("company", company)
        .with("url", url);
    if let Some(location) = card.select(&LOCATION).next() {
        record = record.with("location", element_text(location));
    }
    if let Some(listed) = card.select(&LISTED).next().and_then(|t| t.value().attr("datetime")) {
        record = record.with("listed_at", listed);
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<ul>
  <li><div class="base-card relative">
    <a class="base-card__full-link" href="https://ke.linkedin.com/jobs/view/data-analyst-at-acme-3912345678?refId=abc&amp;trackingId=xyz"></a>
    <h3 class="base-search-card__title"> Data Analyst </h3>
    <h4 class="base-search-card__subtitle"><a>Acme</a></h4>
    <span class="job-search-card__location">Nairobi, Nairobi County, Kenya</span>
    <time class="job-search-card__listdate" datetime="2025-05-05">1 day ago</time>
  </div></li>
  <li><div class="base-card">
    <a class="base-card__full-link" href="https://www.linkedin.com/company/acme"></a>
    <h3 class="base-search-card__title">Company page</h3>
    <h4 class="base-search-card__subtitle">Acme</h4>
  </div></li>
  <li><div class="base-card">
    <h3 class="base-search-card__title">No link</h3>
  </div></li>
</ul>"#;

    #[test]
    fn test_parse_search_page() {
        let records = parse_search_page(PAGE);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.get_text("title").as_deref(), Some("Data Analyst"));
        assert_eq!(
            record.get_text("url").as_deref(),
            Some("https://ke.linkedin.com/jobs/view/data-analyst-at-acme-3912345678")
        );
        assert_eq!(record.get_text("location").as_deref(), Some("Nairobi, Nairobi County, Kenya"));
        assert_eq!(record.get_text("listed_at").as_deref(), Some("2025-05-05"));
    }

    #[test]
    fn test_search_url_is_encoded() {
        assert_eq!(
            search_url("data engineer", "United Kingdom"),
            "https://www.linkedin.com/jobs/search?keywords=data%20engineer&location=United%20Kingdom&f_TPR=r604800"
        );
    }
}
