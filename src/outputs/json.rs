//! `jobs.json`: the canonical result document.
//!
//! ```json
//! {
//!   "last_updated": "2025-05-06T12:00:00Z",
//!   "total_jobs": 1,
//!   "jobs": [{ "id": "3f2a9c0d1e4b", "title": "Software Engineer", ... }]
//! }
//! ```
//!
//! The same file is the previous result set of the next `--merge` run.

use crate::models::{Job, JobsDocument};
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const FILE_NAME: &str = "jobs.json";

/// Serialize `document` as pretty-printed JSON.
pub fn render_jobs_json(document: &JobsDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Load the jobs of a previous run from `{output_dir}/jobs.json`.
///
/// A missing file is an empty previous set. A file that exists but does not
/// parse is an error: merging against it would silently reset every
/// `first_seen_at`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn load_previous(output_dir: &Path) -> Result<Vec<Job>, Box<dyn Error>> {
    let path = output_dir.join(FILE_NAME);
    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No previous result set; starting fresh");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let document: JobsDocument = serde_json::from_str(&text)
        .map_err(|e| format!("malformed previous result set {}: {}", path.display(), e))?;
    info!(path = %path.display(), jobs = document.jobs.len(), "Loaded previous result set");
    Ok(document.jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use crate::models::fixtures::{at, job};

    #[tokio::test]
    async fn test_written_document_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut j = job("Rust Dev", "Acme", "Remote");
        j.posted_at = Some(at(9));
        j.status = JobStatus::Open;
        j.description = "not persisted".to_string();

        let doc = JobsDocument::new(vec![j.clone()], at(12));
        let text = render_jobs_json(&doc).unwrap();
        std::fs::write(dir.path().join(FILE_NAME), &text).unwrap();

        assert!(text.contains("\"last_updated\": \"2025-05-06T12:00:00Z\""));
        assert!(text.contains("\"total_jobs\": 1"));
        assert!(text.contains("\"status\": \"open\""));
        assert!(!text.contains("not persisted"));

        let loaded = load_previous(dir.path()).await.unwrap();
        j.description.clear();
        assert_eq!(loaded, vec![j]);
    }

    #[tokio::test]
    async fn test_missing_previous_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_previous(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_previous_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "{\"jobs\": [").unwrap();
        let err = load_previous(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("malformed previous result set"));
    }
}
