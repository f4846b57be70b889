//! Writers for the published result set.
//!
//! # Submodules
//!
//! - [`json`]: `jobs.json`, the canonical document (also read back for `--merge`)
//! - [`csv`]: `jobs.csv`, the same jobs as a flat table
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── jobs.json
//! └── jobs.csv
//! ```
//!
//! Both files are rendered and staged as `*.tmp` siblings first and only
//! then renamed into place, so a failed write leaves the previous pair
//! untouched instead of a new `jobs.json` next to an old `jobs.csv`.

pub mod csv;
pub mod json;

use crate::models::JobsDocument;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Write `jobs.json` and `jobs.csv` for `document` into `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), jobs = document.total_jobs))]
pub async fn write_outputs(document: &JobsDocument, output_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let files = [
        (output_dir.join(json::FILE_NAME), json::render_jobs_json(document)?),
        (output_dir.join(csv::FILE_NAME), csv::render_csv(&document.jobs)),
    ];

    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, contents) in &files {
        let tmp = temp_path(path);
        debug!(tmp = %tmp.display(), bytes = contents.len(), "Staging output");
        if let Err(e) = fs::write(&tmp, contents).await {
            error!(path = %tmp.display(), error = %e, "Failed to stage output; keeping previous files");
            discard(&staged).await;
            return Err(e.into());
        }
        staged.push(tmp);
    }

    let mut written = Vec::with_capacity(files.len());
    for (i, ((path, _), tmp)) in files.iter().zip(&staged).enumerate() {
        if let Err(e) = fs::rename(tmp, path).await {
            error!(from = %tmp.display(), to = %path.display(), error = %e, "Failed to move output into place");
            discard(&staged[i..]).await;
            return Err(e.into());
        }
        info!(path = %path.display(), "Wrote output");
        written.push(path.clone());
    }
    Ok(written)
}

async fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp).await;
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
