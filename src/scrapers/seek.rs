//! SEEK Australia search-page scraper.
//!
//! One search page is fetched per role slug and the top job cards are
//! extracted. Card links are site-relative; the normalizer resolves them
//! against `https://www.seek.com.au`.

use crate::http::FetchText;
use crate::models::RawRecord;
use crate::utils::clean_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};

const SEARCH_SLUGS: &[&str] = &[
    "data-engineer",
    "data-analyst",
    "data-scientist",
    "software-engineer",
    "software-developer",
    "backend-developer",
    "frontend-developer",
    "full-stack-developer",
    "devops-engineer",
    "machine-learning-engineer",
    "python-developer",
    "graduate-software",
    "junior-developer",
    "bi-developer",
    "analytics-engineer",
    "quantitative-analyst",
    "quant-developer",
];

const CARDS_PER_SEARCH: usize = 15;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"article[data-card-type="JobCard"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[data-automation="jobTitle"]"#).unwrap());
static COMPANY: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[data-automation="jobCompany"]"#).unwrap());
static LOCATION: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[data-automation="jobLocation"]"#).unwrap());
static SALARY: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"span[data-automation="jobSalary"]"#).unwrap());

pub fn search_url(slug: &str) -> String {
    format!("https://www.seek.com.au/{}-jobs/in-All-Australia", slug)
}

/// Fetch every search page. Individual page failures are logged and skipped.
#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let mut records = Vec::new();
    for slug in SEARCH_SLUGS {
        let url = search_url(slug);
        match fetcher.fetch(&url).await {
            Ok(html) => {
                let batch = parse_search_page(&html);
                debug!(%url, count = batch.len(), "Parsed SEEK search page");
                records.extend(batch);
            }
            Err(e) => warn!(%url, error = %e, "SEEK search page failed; skipping"),
        }
    }
    info!(count = records.len(), "Fetched SEEK job cards");
    Ok(records)
}

/// Extract job cards from one search results page.
pub fn parse_search_page(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .take(CARDS_PER_SEARCH)
        .filter_map(parse_card)
        .collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<RawRecord> {
    let title_elem = card.select(&TITLE).next()?;
    let href = title_elem.value().attr("href")?;
    // Promoted cards link to search pages rather than a posting.
    if !href.contains("/job/") {
        return None;
    }

    let mut record = RawRecord::new("seek")
        .with("title", element_text(title_elem))
        .with("url", href);
    for (key, selector) in [("company", &*COMPANY), ("location", &*LOCATION), ("salary", &*SALARY)] {
        if let Some(elem) = card.select(selector).next() {
            record = record.with(key, element_text(elem));
        }
    }
    Some(record)
}

pub(crate) fn element_text(elem: ElementRef<'_>) -> String {
    clean_text(&elem.text().collect::<Vec<_>>().join(" "))
}
