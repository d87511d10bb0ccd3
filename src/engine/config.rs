//! Processor configuration: `.lictrace.toml`
//!
//! Thresholds, matching algorithms, license file names and excluded
//! paths for a run. A malformed threshold is reset to the default with a
//! warning rather than failing the run.

use crate::detection::MatchAlgorithm;
use crate::source::FileId;
use crate::{LictraceError, LictraceResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.10;

/// Case-insensitive base names recognized as license files
pub const DEFAULT_LICENSE_FILE_NAMES: &[&str] = &[
    "LICENSE",
    "LICENSE.TXT",
    "LICENCE",
    "LICENCE.TXT",
    "LICENSING",
    "LICENSING.TXT",
    "COPYING",
    "COPYING.TXT",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Minimum match ratio to keep a license match (0.0-1.0)
    #[serde(default = "default_threshold", deserialize_with = "lenient_threshold")]
    pub match_threshold: f64,

    /// Algorithm for comments in source files
    #[serde(default)]
    pub source_algorithm: MatchAlgorithm,

    /// Algorithm for license files
    #[serde(default = "default_license_file_algorithm")]
    pub license_file_algorithm: MatchAlgorithm,

    #[serde(default = "default_license_file_names")]
    pub license_file_names: Vec<String>,

    /// Path prefixes skipped during enumeration
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Analyze files on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}
fn default_license_file_algorithm() -> MatchAlgorithm {
    MatchAlgorithm::Exact
}
fn default_license_file_names() -> Vec<String> {
    DEFAULT_LICENSE_FILE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Accept numbers and numeric strings; anything else becomes NaN and is
/// reset by [`ProcessorConfig::validated`]
fn lenient_threshold<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(value) => value,
        Raw::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
        Raw::Other(_) => f64::NAN,
    })
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            source_algorithm: MatchAlgorithm::Partial,
            license_file_algorithm: MatchAlgorithm::Exact,
            license_file_names: default_license_file_names(),
            exclude_paths: vec![],
            parallel: false,
        }
    }
}

impl ProcessorConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> LictraceResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LictraceError::ConfigError(format!("Failed to read config file: {}", e)))?;
        let config: ProcessorConfig = toml::from_str(&content)
            .map_err(|e| LictraceError::ConfigError(format!("Failed to parse config: {}", e)))?;
        Ok(config.validated())
    }

    /// Try `.lictrace.toml` then `lictrace.toml` in the project root, fall
    /// back to defaults
    pub fn from_project_root(root: &Path) -> Self {
        for name in [".lictrace.toml", "lictrace.toml"] {
            let path = root.join(name);
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {} — using defaults", path.display(), e);
                }
            }
        }

        Self::default()
    }

    /// Reset a threshold that is not a number in [0, 1]
    pub fn validated(mut self) -> Self {
        if !(self.match_threshold.is_finite() && (0.0..=1.0).contains(&self.match_threshold)) {
            tracing::warn!(
                "Invalid match threshold {}, using default {}",
                self.match_threshold,
                DEFAULT_MATCH_THRESHOLD
            );
            self.match_threshold = DEFAULT_MATCH_THRESHOLD;
        }
        self
    }

    pub fn is_excluded(&self, file: &FileId) -> bool {
        let display = file.to_string();
        self.exclude_paths
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| display.starts_with(prefix.trim_start_matches('/')))
    }

    pub fn is_license_file(&self, file: &FileId) -> bool {
        self.license_file_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&file.name))
    }
}
