//! Keyword-based role and location classification.
//!
//! Matching is plain case-insensitive substring search. It is deliberately
//! not clever: false positives and negatives are tuned by editing the keyword
//! lists in the config file, not by changing code.

use crate::config::KeywordConfig;
use crate::models::Job;

/// Set the three classification flags on `job`.
///
/// - `is_role_match`: a role keyword appears in the title or description
/// - `is_remote_eligible`: a remote keyword appears in the location or description
/// - `is_kenya_eligible`: a Kenya keyword appears in the location or description
///
/// Keyword lists are expected to be lower-case already (see
/// [`KeywordConfig::normalized`]).
pub fn classify(mut job: Job, keywords: &KeywordConfig) -> Job {
    let role_text = format!("{} {}", job.title, job.description).to_lowercase();
    let place_text = format!("{} {}", job.location, job.description).to_lowercase();

    job.is_role_match = matches_any(&role_text, &keywords.role_keywords);
    job.is_remote_eligible = matches_any(&place_text, &keywords.remote_keywords);
    job.is_kenya_eligible = matches_any(&place_text, &keywords.kenya_keywords);
    job
}

fn matches_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw.as_str()))
}
