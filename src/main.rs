//! # Remote Job Feed
//!
//! An aggregation pipeline that collects job postings from public job APIs,
//! RSS feeds and job-board pages, keeps the ones that match configured roles
//! and are open to remote or Kenya-based candidates, and publishes them as
//! `jobs.json` and `jobs.csv` for a static site.
//!
//! ## Features
//!
//! - Eight built-in sources (RemoteOK, Remotive, We Work Remotely, Adzuna,
//!   SEEK, LinkedIn, GradConnection and a curated GitHub list)
//! - Keyword classification tuned entirely from `config.yaml`
//! - Optional liveness probe that drops postings that have been taken down
//! - Cross-source deduplication and `--merge` mode that preserves when each
//!   posting was first seen
//!
//! ## Usage
//!
//! ```sh
//! remote_job_feed -c config.yaml -o ./site --merge
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Collection**: Every enabled source is fetched (4 at a time by default)
//! 2. **Filtering**: Records are normalized, classified and age-checked
//! 3. **Liveness**: Optionally probe each posting URL
//! 4. **Consolidation**: Deduplicate, then merge with the previous run if asked
//! 5. **Output**: Write `jobs.json` and `jobs.csv`

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod http;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::AppConfig;
use http::{HttpFetcher, RetryFetch};
use models::JobsDocument;
use outputs::{json, write_outputs};
use pipeline::Pipeline;
use pipeline::liveness::{HttpProbe, LivenessChecker};
use scrapers::{AdzunaCredentials, collect_records, enabled_sources};
use utils::ensure_output_dir;

const FETCH_RETRIES: usize = 2;
const FETCH_BACKOFF: Duration = Duration::from_millis(500);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("remote_job_feed starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output_dir, merge = args.merge, "Parsed CLI arguments");

    // ---- Load config ----
    let config = match AppConfig::load(Path::new(&args.config)).await.and_then(|c| {
        c.with_overrides(args.max_age_hours, args.open_check_enabled, args.open_check_timeout)
    }) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config, error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: ensure output dir is writable
    let output_dir = Path::new(&args.output_dir);
    if let Err(e) = ensure_output_dir(output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // Previous result set is read before anything is fetched so a corrupt file
    // fails the run early.
    let previous = if args.merge {
        Some(json::load_previous(output_dir).await?)
    } else {
        None
    };

    // ---- Collect raw records ----
    let fetcher = Arc::new(RetryFetch::new(
        HttpFetcher::new(config.fetch_timeout())?,
        FETCH_RETRIES,
        FETCH_BACKOFF,
    ));
    let adzuna = AdzunaCredentials::from_parts(args.adzuna_app_id.clone(), args.adzuna_app_key.clone());
    let sources = enabled_sources(&config, fetcher, adzuna);
    info!(sources = sources.len(), "Collecting from enabled sources");

    let collected = collect_records(&sources, config.fetch.concurrency).await;
    info!(
        records = collected.records.len(),
        failed_sources = collected.failed(),
        "Collection complete"
    );

    if collected.records.is_empty() {
        warn!("No records collected from any source; leaving existing output untouched");
        return Ok(());
    }

    // ---- Process ----
    let now = Utc::now();
    let mut pipeline = Pipeline::new(config.keywords.clone(), config.max_age());
    if config.liveness.enabled {
        let probe = HttpProbe::new(config.liveness.timeout())?;
        pipeline = pipeline.with_liveness(LivenessChecker::new(
            probe,
            config.liveness.timeout(),
            config.liveness.concurrency,
        ));
    } else {
        info!("Liveness check disabled");
    }
    if let Some(previous) = previous {
        pipeline = pipeline.with_merge(previous);
    }

    let (jobs, stats) = pipeline.run(&collected.records, now).await;
    info!(?stats, "Pipeline complete");

    // ---- Output ----
    let document = JobsDocument::new(jobs, now);
    write_outputs(&document, output_dir).await?;

    let elapsed = start_time.elapsed();
    info!(
        jobs = document.total_jobs,
        elapsed_secs = elapsed.as_secs_f64(),
        "remote_job_feed completed successfully"
    );

    Ok(())
}
