//! Command-line interface definitions for Remote Job Feed.
//!
//! Tunables that operators commonly change per deployment can also be set via
//! environment variables; those override the config file.

use clap::Parser;

/// Command-line arguments for the Remote Job Feed application.
///
/// # Examples
///
/// ```sh
/// # Fresh snapshot into ./site
/// remote_job_feed -o ./site
///
/// # Keep first-seen times from the previous run
/// remote_job_feed -c config.yaml -o ./site --merge
///
/// # Skip the liveness probe
/// OPEN_CHECK_ENABLED=false remote_job_feed -o ./site
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Directory receiving jobs.json and jobs.csv
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Merge with the jobs.json already in the output directory
    #[arg(long)]
    pub merge: bool,

    /// Override `max_age_hours`
    #[arg(long, env = "MAX_JOB_AGE_HOURS")]
    pub max_age_hours: Option<u64>,

    /// Override `liveness.enabled`
    #[arg(long, env = "OPEN_CHECK_ENABLED")]
    pub open_check_enabled: Option<bool>,

    /// Override `liveness.timeout_secs`
    #[arg(long, env = "OPEN_CHECK_TIMEOUT")]
    pub open_check_timeout: Option<u64>,

    /// Adzuna application id
    #[arg(long, env = "ADZUNA_APP_ID")]
    pub adzuna_app_id: Option<String>,

    /// Adzuna application key
    #[arg(long, env = "ADZUNA_APP_KEY", hide_env_values = true)]
    pub adzuna_app_key: Option<String>,
}
