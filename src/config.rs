//! Run configuration: keyword sets, age window, liveness and source toggles.
//!
//! Configuration lives in a YAML file (see `config.yaml` at the repository
//! root) and is validated once at startup. Any problem here is fatal: running
//! with a broken keyword list or an out-of-range age window would silently
//! produce wrong output.

use crate::scrapers::SourceId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`AppConfig`]
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A keyword list that must not be empty is empty
    #[error("keyword list `{0}` is empty")]
    EmptyKeywords(&'static str),

    /// Neither remote nor Kenya keywords are configured, so nothing could ever be eligible
    #[error("at least one of `remote_keywords` or `kenya_keywords` must be non-empty")]
    NoLocationKeywords,

    /// A numeric setting is out of range
    #[error("`{name}` must be positive, got {value}")]
    NotPositive { name: &'static str, value: u64 },

    /// The age window does not fit a signed duration
    #[error("`max_age_hours` is too large, got {0}")]
    AgeWindowTooLarge(u64),

    /// A source named in the config is not one this program knows
    #[error("unknown source `{0}` in `sources`")]
    UnknownSource(String),
}

/// Keyword sets driving role and location classification.
///
/// Matching is case-insensitive substring matching; the lists are lower-cased
/// by [`KeywordConfig::normalized`] so the classifier never has to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordConfig {
    pub role_keywords: Vec<String>,
    #[serde(default)]
    pub remote_keywords: Vec<String>,
    #[serde(default)]
    pub kenya_keywords: Vec<String>,
}

impl KeywordConfig {
    /// Lower-case, trim and drop blank entries.
    pub fn normalized(self) -> Self {
        fn clean(list: Vec<String>) -> Vec<String> {
            list.into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        }
        Self {
            role_keywords: clean(self.role_keywords),
            remote_keywords: clean(self.remote_keywords),
            kenya_keywords: clean(self.kenya_keywords),
        }
    }
}

/// Settings for the adapter fan-out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of sources fetched at once.
    pub concurrency: usize,
    /// Per-request timeout for adapter HTTP calls.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 20,
        }
    }
}

/// Settings for the optional liveness probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub enabled: bool,
    /// Per-probe timeout.
    pub timeout_secs: u64,
    /// Maximum number of probes in flight.
    pub concurrency: usize,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 6,
            concurrency: 8,
        }
    }
}

impl LivenessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The full configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub keywords: KeywordConfig,
    /// Postings older than this are dropped.
    pub max_age_hours: u64,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    /// Per-source enable flags keyed by source id. Sources not listed are enabled.
    #[serde(default)]
    pub sources: BTreeMap<String, bool>,
    /// `max_age_hours` as a duration, set by [`AppConfig::validate`].
    #[serde(skip)]
    max_age: chrono::Duration,
}

impl AppConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()
    }

    /// Read, parse and validate the config file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&text, path)?;
        info!(
            role_keywords = config.keywords.role_keywords.len(),
            remote_keywords = config.keywords.remote_keywords.len(),
            kenya_keywords = config.keywords.kenya_keywords.len(),
            max_age_hours = config.max_age_hours,
            liveness = config.liveness.enabled,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check every invariant the pipeline relies on and normalize keyword lists.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.keywords = self.keywords.normalized();

        if self.keywords.role_keywords.is_empty() {
            return Err(ConfigError::EmptyKeywords("role_keywords"));
        }
        if self.keywords.remote_keywords.is_empty() && self.keywords.kenya_keywords.is_empty() {
            return Err(ConfigError::NoLocationKeywords);
        }

        positive("max_age_hours", self.max_age_hours)?;
        self.max_age = i64::try_from(self.max_age_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .ok_or(ConfigError::AgeWindowTooLarge(self.max_age_hours))?;
        positive("fetch.concurrency", self.fetch.concurrency as u64)?;
        positive("fetch.timeout_secs", self.fetch.timeout_secs)?;
        positive("liveness.timeout_secs", self.liveness.timeout_secs)?;
        positive("liveness.concurrency", self.liveness.concurrency as u64)?;

        for name in self.sources.keys() {
            if name.parse::<SourceId>().is_err() {
                return Err(ConfigError::UnknownSource(name.clone()));
            }
        }

        debug!(?self.sources, "Validated configuration");
        Ok(self)
    }

    /// Apply command-line / environment overrides on top of the file.
    pub fn with_overrides(
        mut self,
        max_age_hours: Option<u64>,
        liveness_enabled: Option<bool>,
        liveness_timeout_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(hours) = max_age_hours {
            self.max_age_hours = hours;
        }
        if let Some(enabled) = liveness_enabled {
            self.liveness.enabled = enabled;
        }
        if let Some(secs) = liveness_timeout_secs {
            self.liveness.timeout_secs = secs;
        }
        self.validate()
    }

    pub fn max_age(&self) -> chrono::Duration {
        self.max_age
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Whether `source` should run this time.
    pub fn source_enabled(&self, source: SourceId) -> bool {
        self.sources.get(source.as_str()).copied().unwrap_or(true)
    }
}

fn positive(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::NotPositive { name, value })
    } else {
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
keywords:
  role_keywords: ["Software Engineer", " data engineer ", ""]
  remote_keywords: ["remote", "worldwide"]
  kenya_keywords: ["kenya", "nairobi"]
max_age_hours: 24
liveness:
  enabled: false
sources:
  adzuna: false
"#;

    fn parse(text: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_yaml(text, Path::new("config.yaml"))
    }

    #[test]
    fn test_parse_sample_config() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(
            config.keywords.role_keywords,
            vec!["software engineer".to_string(), "data engineer".to_string()]
        );
        assert_eq!(config.max_age_hours, 24);
        assert!(!config.liveness.enabled);
        assert_eq!(config.liveness.timeout_secs, 6);
        assert_eq!(config.fetch.concurrency, 4);
        assert!(!config.source_enabled(SourceId::Adzuna));
        assert!(config.source_enabled(SourceId::RemoteOk));
    }

    #[test]
    fn test_empty_role_keywords_is_fatal() {
        let text = SAMPLE.replace(
            r#"role_keywords: ["Software Engineer", " data engineer ", ""]"#,
            "role_keywords: []",
        );
        assert!(matches!(parse(&text), Err(ConfigError::EmptyKeywords("role_keywords"))));
    }

    #[test]
    fn test_missing_location_keywords_is_fatal() {
        let text = r#"
keywords:
  role_keywords: ["sre"]
max_age_hours: 24
"#;
        assert!(matches!(parse(text), Err(ConfigError::NoLocationKeywords)));
    }

    #[test]
    fn test_zero_age_window_is_fatal() {
        let text = SAMPLE.replace("max_age_hours: 24", "max_age_hours: 0");
        assert!(matches!(
            parse(&text),
            Err(ConfigError::NotPositive { name: "max_age_hours", .. })
        ));
    }

    #[test]
    fn test_age_window_beyond_i64_is_fatal() {
        let text = SAMPLE.replace("max_age_hours: 24", "max_age_hours: 18446744073709551615");
        assert!(matches!(parse(&text), Err(ConfigError::AgeWindowTooLarge(u64::MAX))));
    }

    #[test]
    fn test_age_window_beyond_duration_range_is_fatal() {
        let text = SAMPLE.replace("max_age_hours: 24", "max_age_hours: 3000000000000000");
        assert!(matches!(
            parse(&text),
            Err(ConfigError::AgeWindowTooLarge(3_000_000_000_000_000))
        ));
    }

    #[test]
    fn test_oversized_override_is_fatal() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.max_age(), chrono::Duration::hours(24));
        let err = config.with_overrides(Some(u64::MAX), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::AgeWindowTooLarge(_)));
    }

    #[test]
    fn test_negative_age_window_is_a_parse_error() {
        let text = SAMPLE.replace("max_age_hours: 24", "max_age_hours: -5");
        assert!(matches!(parse(&text), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_unknown_source_is_fatal() {
        let text = SAMPLE.replace("adzuna: false", "monster: true");
        match parse(&text) {
            Err(ConfigError::UnknownSource(name)) => assert_eq!(name, "monster"),
            other => panic!("expected UnknownSource, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_are_revalidated() {
        let config = parse(SAMPLE).unwrap();
        let config = config.with_overrides(Some(48), Some(true), Some(3)).unwrap();
        assert_eq!(config.max_age_hours, 48);
        assert_eq!(config.max_age(), chrono::Duration::hours(48));
        assert!(config.liveness.enabled);
        assert_eq!(config.liveness.timeout(), Duration::from_secs(3));

        let err = config.with_overrides(None, None, Some(0)).unwrap_err();
        assert!(err.to_string().contains("liveness.timeout_secs"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/definitely/not/here.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_repository_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
        let config = AppConfig::load(&path).await.unwrap();
        assert!(!config.keywords.role_keywords.is_empty());
        assert!(config.keywords.kenya_keywords.contains(&"nairobi".to_string()));
    }
}
