//! Posting-age window.

use crate::models::Job;
use chrono::{DateTime, Duration, Utc};

/// Whether `job` was posted within `max_age` of `now`.
///
/// Undated postings count as recent: some sources (curated lists, scraped
/// cards) never carry a reliable date and must not be silently dropped.
pub fn is_recent(job: &Job, max_age: Duration, now: DateTime<Utc>) -> bool {
    match job.posted_at {
        Some(posted_at) => now - posted_at <= max_age,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{at, job};

    const MAX_AGE_HOURS: i64 = 24;

    fn posted(hours_ago: i64) -> Job {
        let mut j = job("Rust Dev", "Acme", "Remote");
        j.posted_at = Some(at(12) - Duration::hours(hours_ago));
        j
    }

    #[test]
    fn test_boundary() {
        let max_age = Duration::hours(MAX_AGE_HOURS);
        assert!(!is_recent(&posted(MAX_AGE_HOURS + 1), max_age, at(12)));
        assert!(is_recent(&posted(MAX_AGE_HOURS - 1), max_age, at(12)));
        assert!(is_recent(&posted(MAX_AGE_HOURS), max_age, at(12)));
    }

    #[test]
    fn test_undated_is_recent() {
        let j = job("Rust Dev", "Acme", "Remote");
        assert!(is_recent(&j, Duration::hours(1), at(12)));
    }

    #[test]
    fn test_future_dates_are_recent() {
        assert!(is_recent(&posted(-3), Duration::hours(1), at(12)));
    }
}
