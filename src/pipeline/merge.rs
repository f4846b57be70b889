//! Reconciling this run with the previously published result set.
//!
//! The published set is a rolling snapshot, not an archive: postings that no
//! longer appear upstream are dropped. What survives from the previous run is
//! provenance, i.e. the time a posting was first seen.

use super::dedupe::DedupKey;
use crate::models::Job;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Counts describing one merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Current jobs that were already in the previous set.
    pub carried: usize,
    /// Current jobs seen for the first time.
    pub new: usize,
    /// Previous postings absent from this run.
    pub dropped: usize,
}

/// Merge `current` with `previous`.
///
/// - in both: the current job's fields, the previous `first_seen_at`
/// - only in `current`: kept, `first_seen_at = now`
/// - only in `previous`: dropped
///
/// Output follows `current` order. When `previous` holds several entries for
/// one key, the earliest `first_seen_at` among them is used.
pub fn merge(previous: Vec<Job>, current: Vec<Job>, now: DateTime<Utc>) -> (Vec<Job>, MergeStats) {
    let mut first_seen: HashMap<DedupKey, DateTime<Utc>> = HashMap::with_capacity(previous.len());
    for job in &previous {
        first_seen
            .entry(DedupKey::of(job))
            .and_modify(|seen| *seen = (*seen).min(job.first_seen_at))
            .or_insert(job.first_seen_at);
    }

    let mut stats = MergeStats::default();
    let mut matched: HashSet<DedupKey> = HashSet::new();
    let merged = current
        .into_iter()
        .map(|mut job| {
            let key = DedupKey::of(&job);
            match first_seen.get(&key) {
                Some(seen) => {
                    job.first_seen_at = *seen;
                    stats.carried += 1;
                    matched.insert(key.clone());
                }
                None => {
                    job.first_seen_at = now;
                    stats.new += 1;
                }
            }
            job.id = key.short_id();
            job
        })
        .collect();

    stats.dropped = first_seen.len() - matched.len();
    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{at, job};

    fn seen(mut j: Job, hour: u32) -> Job {
        j.first_seen_at = at(hour);
        j
    }

    #[test]
    fn test_first_seen_survives_from_previous() {
        let previous = vec![seen(job("Rust Dev", "Acme", "Remote"), 1)];
        let mut fresh = seen(job("rust dev", "ACME", "remote"), 12);
        fresh.salary = "$120k".to_string();
        let (merged, stats) = merge(previous, vec![fresh], at(12));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].first_seen_at, at(1));
        assert_eq!(merged[0].salary, "$120k");
        assert_eq!(merged[0].title, "rust dev");
        assert_eq!(stats, MergeStats { carried: 1, new: 0, dropped: 0 });
    }

    #[test]
    fn test_disappeared_postings_are_dropped() {
        let previous = vec![
            seen(job("Rust Dev", "Acme", "Remote"), 1),
            seen(job("Go Dev", "Globex", "Remote"), 2),
        ];
        let current = vec![seen(job("Rust Dev", "Acme", "Remote"), 12)];
        let (merged, stats) = merge(previous, current, at(12));

        assert_eq!(merged.len(), 1);
        assert!(merged.iter().all(|j| j.title != "Go Dev"));
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_new_postings_get_now() {
        let current = vec![seen(job("Data Analyst", "Initech", "Nairobi"), 3)];
        let (merged, stats) = merge(Vec::new(), current, at(12));
        assert_eq!(merged[0].first_seen_at, at(12));
        assert_eq!(stats.new, 1);
    }

    #[test]
    fn test_duplicate_previous_entries_use_earliest() {
        let previous = vec![
            seen(job("Rust Dev", "Acme", "Remote"), 5),
            seen(job("Rust Dev", "Acme", "Remote"), 2),
        ];
        let current = vec![job("Rust Dev", "Acme", "Remote")];
        let (merged, stats) = merge(previous, current, at(12));
        assert_eq!(merged[0].first_seen_at, at(2));
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let previous = vec![
            seen(job("Rust Dev", "Acme", "Remote"), 1),
            seen(job("Go Dev", "Globex", "Remote"), 2),
        ];
        let current = vec![
            job("ML Engineer", "Initech", "Remote"),
            job("Go Dev", "Globex", "Remote"),
            job("Rust Dev", "Acme", "Remote"),
        ];
        let first = merge(previous.clone(), current.clone(), at(12));
        let second = merge(previous, current, at(12));
        assert_eq!(first, second);

        let titles: Vec<&str> = first.0.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["ML Engineer", "Go Dev", "Rust Dev"]);
    }
}
