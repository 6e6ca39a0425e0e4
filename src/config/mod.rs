pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on rows returned by a single query.
pub const DEFAULT_MAX_RESULTS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit store file. `None` resolves to the per-user data directory.
    pub database_path: Option<PathBuf>,
    /// Explicit scan roots. Empty means "ask the platform".
    pub roots: Vec<PathBuf>,
    pub max_results: usize,
    pub scan: ScanSettings,
    pub estimator: EstimatorSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The store file this configuration points at.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(settings::default_database_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            roots: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
            scan: ScanSettings::default(),
            estimator: EstimatorSettings::default(),
        }
    }
}

/// Walk behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    /// Rows per committed transaction; also the progress event interval.
    pub batch_size: usize,
    pub hidden_dir_prefixes: Vec<String>,
    pub hidden_file_prefixes: Vec<String>,
    pub follow_links: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: 500,
            hidden_dir_prefixes: vec![".".to_string(), "$".to_string()],
            hidden_file_prefixes: vec![".".to_string()],
            follow_links: false,
        }
    }
}

/// Tunables for the progress denominator. These are empirical, not derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Directories sampled for the files-per-directory average.
    pub file_sample_dirs: usize,
    /// Directories sampled for the child-directories average.
    pub dir_sample_dirs: usize,
    /// Multiplier turning the child-directory average into a total.
    pub dir_scale_factor: usize,
    pub min_estimated_dirs: usize,
    pub fallback_dirs: usize,
    pub min_estimated_files: usize,
    pub fallback_files: usize,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            file_sample_dirs: 20,
            dir_sample_dirs: 10,
            dir_scale_factor: 50,
            min_estimated_dirs: 100,
            fallback_dirs: 1000,
            min_estimated_files: 1000,
            fallback_files: 10_000,
        }
    }
}
