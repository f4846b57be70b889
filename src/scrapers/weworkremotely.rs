//! We Work Remotely RSS adapter.
//!
//! Feed item titles are `Company: Role`. The adapter splits them so the
//! normalizer sees separate `company` and `title` fields; a title without a
//! colon keeps the whole string as the role and leaves `company` unset.

use crate::http::FetchText;
use crate::models::RawRecord;
use crate::utils::clean_text;
use serde::Deserialize;
use std::error::Error;
use tracing::{info, instrument};

pub const FEED_URL: &str = "https://weworkremotely.com/categories/remote-programming-jobs.rss";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    region: Option<String>,
}

/// Fetch and decode the programming-jobs feed.
#[instrument(level = "info", skip_all)]
pub async fn fetch_jobs(fetcher: &impl FetchText) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let body = fetcher.fetch(FEED_URL).await?;
    let records = parse_feed(&body)?;
    info!(count = records.len(), "Parsed We Work Remotely feed");
    Ok(records)
}

pub fn parse_feed(xml: &str) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss.channel.items.into_iter().map(into_record).collect())
}

fn into_record(item: Item) -> RawRecord {
    let mut record = RawRecord::new("weworkremotely");
    if let Some(title) = item.title.as_deref() {
        let (company, role) = split_title(title);
        record = record.with("title", role);
        if let Some(company) = company {
            record = record.with("company", company);
        }
    }
    if let Some(link) = item.link {
        record = record.with("url", clean_text(&link));
    }
    if let Some(pub_date) = item.pub_date {
        record = record.with("pub_date", pub_date);
    }
    if let Some(description) = item.description {
        record = record.with("description", description);
    }
    if let Some(region) = item.region {
        record = record.with("region", region);
    }
    record
}

/// Split `"Company: Role"` into its parts.
fn split_title(title: &str) -> (Option<String>, String) {
    match title.split_once(':') {
        Some((company, role)) if !clean_text(company).is_empty() => {
            (Some(clean_text(company)), clean_text(role))
        }
        _ => (None, clean_text(title)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>We Work Remotely: Programming Jobs</title>
    <link>https://weworkremotely.com</link>
    <item>
      <title>Acme &amp; Co: Senior Rust Engineer</title>
      <region>Anywhere in the World</region>
      <pubDate>Tue, 06 May 2025 08:00:00 +0000</pubDate>
      <description><![CDATA[<p>Build <strong>things</strong></p>]]></description>
      <guid isPermaLink="false">https://weworkremotely.com/remote-jobs/acme-senior-rust-engineer</guid>
      <link>https://weworkremotely.com/remote-jobs/acme-senior-rust-engineer</link>
    </item>
    <item>
      <title>Backend Developer</title>
      <link>https://weworkremotely.com/remote-jobs/backend-developer</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let records = parse_feed(FEED).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.get_text("company").as_deref(), Some("Acme & Co"));
        assert_eq!(first.get_text("title").as_deref(), Some("Senior Rust Engineer"));
        assert_eq!(
            first.get_text("pub_date").as_deref(),
            Some("Tue, 06 May 2025 08:00:00 +0000")
        );
        assert!(first.get_text("description").unwrap().contains("<strong>"));

        let second = &records[1];
        assert_eq!(second.get_text("company"), None);
        assert_eq!(second.get_text("title").as_deref(), Some("Backend Developer"));
    }

    #[test]
    fn test_split_title() {
        assert_eq!(
            split_title("Globex: Data Engineer: Platform"),
            (Some("Globex".to_string()), "Data Engineer: Platform".to_string())
        );
        assert_eq!(split_title(": SRE"), (None, ": SRE".to_string()));
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed("<html><body>maintenance</body></html>").is_err());
    }
}
