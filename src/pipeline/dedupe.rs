//! Cross-source duplicate collapsing.
//!
//! Two postings are the same when their normalized title, company and
//! location agree. The URL is deliberately left out: aggregators and
//! re-posts list the same role under different tracking links.

use crate::models::Job;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Fingerprint identifying a posting across sources and runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn of(job: &Job) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_part(&job.title).as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize_part(&job.company).as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize_part(&job.location).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The first 12 hex characters, used as the public job id.
    pub fn short_id(&self) -> String {
        self.0[..12].to_string()
    }
}

/// Characters joining parts of one word: dropped rather than split on.
const CONNECTORS: &[char] = &['-', '\'', '\u{2019}', '.'];

/// Lower-case, strip punctuation and collapse whitespace.
///
/// `"Software Engineer — Remote"` and `"software engineer remote"` both
/// become `"software engineer remote"`; `"Back-end"` becomes `"backend"`.
pub fn normalize_part(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| !CONNECTORS.contains(c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep one job per [`DedupKey`].
///
/// The survivor is the job with the earliest known `posted_at`; when no
/// member has a date, or dates tie, the first one seen wins. Survivors keep
/// the position at which their group first appeared.
pub fn dedupe(jobs: Vec<Job>) -> Vec<Job> {
    let mut slots: HashMap<DedupKey, usize> = HashMap::with_capacity(jobs.len());
    let mut kept: Vec<Job> = Vec::with_capacity(jobs.len());

    for job in jobs {
        match slots.entry(DedupKey::of(&job)) {
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(job);
            }
            Entry::Occupied(slot) => {
                let existing = &mut kept[*slot.get()];
                if posted_earlier(&job, existing) {
                    *existing = job;
                }
            }
        }
    }
    kept
}

fn posted_earlier(candidate: &Job, existing: &Job) -> bool {
    match (candidate.posted_at, existing.posted_at) {
        (Some(c), Some(e)) => c < e,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{at, job};

    #[test]
    fn test_normalize_part() {
        assert_eq!(normalize_part("Software Engineer — Remote"), "software engineer remote");
        assert_eq!(normalize_part("  software   engineer, remote! "), "software engineer remote");
        assert_eq!(normalize_part("C++/Rust Dev"), "c rust dev");
        assert_eq!(normalize_part(""), "");
        assert_eq!(normalize_part("Back-end Developer"), "backend developer");
        assert_eq!(normalize_part("O'Reilly Media, Inc."), "oreilly media inc");
    }

    #[test]
    fn test_hyphen_variants_collapse() {
        let a = job("Back-end Developer", "Acme", "Remote");
        let b = job("Backend Developer", "Acme", "Remote");
        let c = job("Full-Stack Engineer", "Acme", "Remote");
        let d = job("fullstack engineer", "Acme", "Remote");
        assert_eq!(dedupe(vec![a, b, c, d]).len(), 2);
    }

    #[test]
    fn test_key_ignores_url_and_formatting() {
        let a = job("Software Engineer — Remote", "Acme, Inc", "Remote");
        let mut b = job("software engineer remote", "acme inc", "remote");
        b.url = "https://aggregator.example/track?id=9".to_string();
        assert_eq!(DedupKey::of(&a), DedupKey::of(&b));

        let c = job("Software Engineer", "Acme Inc", "Nairobi");
        assert_ne!(DedupKey::of(&a), DedupKey::of(&c));
    }

    #[test]
    fn test_key_fields_do_not_bleed_into_each_other() {
        let a = job("data engineer", "acme", "");
        let b = job("data", "engineer acme", "");
        assert_ne!(DedupKey::of(&a), DedupKey::of(&b));
    }

    #[test]
    fn test_keeps_earliest_posted() {
        let mut late = job("Backend Engineer", "Acme", "Remote");
        late.posted_at = Some(at(10));
        late.source = "Remotive".to_string();
        let mut early = job("backend engineer", "acme", "remote");
        early.posted_at = Some(at(2));
        early.source = "RemoteOK".to_string();
        let other = job("Data Analyst", "Globex", "Remote");

        let out = dedupe(vec![late, other.clone(), early]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "RemoteOK");
        assert_eq!(out[0].posted_at, Some(at(2)));
        assert_eq!(out[1], other);
    }

    #[test]
    fn test_dated_beats_undated_and_ties_keep_first() {
        let undated = job("SRE", "Acme", "Remote");
        let mut dated = job("SRE", "Acme", "Remote");
        dated.posted_at = Some(at(5));
        dated.url = "https://example.com/jobs/dated".to_string();
        let out = dedupe(vec![undated.clone(), dated.clone()]);
        assert_eq!(out, vec![dated.clone()]);

        let mut tie = dated.clone();
        tie.url = "https://example.com/jobs/tie".to_string();
        let out = dedupe(vec![dated.clone(), tie]);
        assert_eq!(out[0].url, "https://example.com/jobs/dated");

        let mut second_undated = undated.clone();
        second_undated.url = "https://example.com/jobs/second".to_string();
        let out = dedupe(vec![undated.clone(), second_undated]);
        assert_eq!(out, vec![undated]);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let mut jobs = Vec::new();
        for (i, title) in ["Rust Dev", "rust dev", "Go Dev", "RUST DEV!", "go dev", "ML Engineer"]
            .iter()
            .enumerate()
        {
            let mut j = job(title, "Acme", "Remote");
            j.posted_at = if i % 2 == 0 { Some(at(i as u32)) } else { None };
            jobs.push(j);
        }
        let once = dedupe(jobs);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_short_id_is_stable() {
        let a = job("Rust Dev", "Acme", "Remote");
        let id = DedupKey::of(&a).short_id();
        assert_eq!(id.len(), 12);
        assert_eq!(id, DedupKey::of(&a.clone()).short_id());
        assert!(DedupKey::of(&a).0.starts_with(&id));
    }
}
