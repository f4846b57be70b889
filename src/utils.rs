//! Utility functions for text cleanup, logging and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and HTML stripping for scraped text
//! - String truncation for log previews of upstream responses
//! - Writability check for the output directory

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim a string and collapse every run of whitespace into a single space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  Senior \n\t Engineer "), "Senior Engineer");
/// ```
pub fn clean_text(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Elements that start a new line of text when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Strip HTML tags and decode entities, then collapse whitespace.
///
/// Description snippets from the JSON APIs and RSS feeds arrive as HTML
/// fragments. Parsing them as a fragment and concatenating the text nodes
/// removes markup and decodes `&amp;`, `&nbsp;` and friends in one pass.
/// Inline tags join their text as-is (`<b>Sen</b>ior` is `Senior`); block
/// elements separate words.
pub fn strip_html(s: &str) -> String {
    if !s.contains('<') && !s.contains('&') {
        return clean_text(s);
    }
    let fragment = Html::parse_fragment(s);
    let mut text = String::with_capacity(s.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => text.push(' '),
            _ => {}
        }
    }
    clean_text(&text)
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Name of the scratch file used to check the output directory.
const WRITE_CHECK: &str = ".write-check.tmp";

/// Create the output directory if needed and confirm files can be written
/// and replaced in it, before any source is fetched.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn ensure_output_dir(output_dir: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;
    let check = output_dir.join(WRITE_CHECK);
    fs::write(&check, b"ok").await?;
    fs::remove_file(&check).await?;
    debug!("Output directory accepts writes");
    Ok(())
}
