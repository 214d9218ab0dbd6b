use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LeadSignalError;
use crate::scoring::ScoreRules;

/// Scrape configuration loaded from a YAML file, optionally overridden per
/// run from the command line. `include` terms are dual-purpose by
/// convention: keyword-style sources treat them as search text, slug-style
/// sources (greenhouse, lever) as organization identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub sites: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub locations: Vec<String>,
    pub score_rules: Option<ScoreRules>,
    /// Mirror hosted writes into the embedded store and CSV snapshot.
    pub use_local_mirror: bool,
    pub output_csv: Option<PathBuf>,
    /// Minimum spacing between consecutive calls to one source.
    pub source_delay_ms: u64,
    /// Fan-out width across distinct sources.
    pub max_concurrent_sources: usize,
    pub http_timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            locations: Vec::new(),
            score_rules: None,
            use_local_mirror: false,
            output_csv: Some(PathBuf::from("out/jobs.csv")),
            source_delay_ms: 600,
            max_concurrent_sources: 4,
            http_timeout_secs: 20,
        }
    }
}

impl ScrapeConfig {
    pub fn load(path: &Path) -> Result<Self, LeadSignalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LeadSignalError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            LeadSignalError::Config(format!("cannot parse {}: {e}", path.display()))
        })
    }
}

/// Storage credentials and paths, read once from the environment and passed
/// in explicitly; nothing reads the environment mid-pipeline.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub sqlite_path: PathBuf,
}

impl StoreSettings {
    pub fn from_env() -> Self {
        Self {
            supabase_url: non_empty_env("SUPABASE_URL"),
            supabase_service_key: non_empty_env("SUPABASE_SERVICE_ROLE_KEY"),
            sqlite_path: env::var("LEADSIGNAL_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("out/jobs.sqlite")),
        }
    }

    /// The hosted backend is selectable when both credentials are present.
    pub fn hosted_available(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_key.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
