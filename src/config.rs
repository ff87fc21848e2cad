//! YAML Configuration File Support for srdedupe
//!
//! This module loads the deduplication pipeline's configuration from a
//! single YAML file: candidate blocker selection, scoring model path, the
//! decision engine's false-positive-rate controls, and clustering
//! tolerances.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! output_dir: "out"
//!
//! blocking:
//!   blockers:
//!     - type: doi
//!     - type: pmid
//!     - type: year_title
//!   max_block_size: 5000
//!
//! scoring:
//!   fs_model_path: "models/fs_v1.yaml"
//!
//! decision:
//!   fpr_alpha: 0.01
//!   t_low: 0.3
//!   t_high: null
//!   min_calibration_pairs: 200
//!   calibration_set_path: null
//!   conformal:
//!     enabled: false
//!     delta: 0.05
//!
//! clustering:
//!   strong_edge_use_reason_codes: true
//!   strong_edge_t_strong: 0.999
//!   soft_conflicts_year_max_spread: 2
//!   soft_conflicts_title_divergence_tolerance: 0
//!   oversized_cluster_max_size_auto: 25
//!   split_policy_enable_id_split: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use srdedupe_blocking::BlockerConfig;
use srdedupe_clustering::ClusteringConfig;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

/// Top-level YAML configuration structure for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrdedupeConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub blocking: BlockingYamlConfig,

    #[serde(default)]
    pub scoring: ScoringYamlConfig,

    #[serde(default)]
    pub decision: DecisionYamlConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,
}

impl SrdedupeConfig {
    /// Loads a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: SrdedupeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        self.blocking.validate()?;
        self.decision.validate()?;
        Ok(())
    }
}

impl Default for SrdedupeConfig {
    fn default() -> Self {
        SrdedupeConfig {
            version: default_version(),
            output_dir: default_output_dir(),
            blocking: BlockingYamlConfig::default(),
            scoring: ScoringYamlConfig::default(),
            decision: DecisionYamlConfig::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

fn default_blockers() -> Vec<BlockerConfig> {
    vec![
        BlockerConfig { blocker_type: "doi".to_string(), enabled: true, n_perm: None, bands: None, k: None, df_max_ratio: None },
        BlockerConfig { blocker_type: "pmid".to_string(), enabled: true, n_perm: None, bands: None, k: None, df_max_ratio: None },
        BlockerConfig { blocker_type: "year_title".to_string(), enabled: true, n_perm: None, bands: None, k: None, df_max_ratio: None },
    ]
}

fn default_max_block_size() -> usize {
    srdedupe_blocking::DEFAULT_MAX_BLOCK_SIZE
}

/// Candidate-generation (stage 2) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingYamlConfig {
    #[serde(default = "default_blockers")]
    pub blockers: Vec<BlockerConfig>,

    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,
}

impl Default for BlockingYamlConfig {
    fn default() -> Self {
        BlockingYamlConfig { blockers: default_blockers(), max_block_size: default_max_block_size() }
    }
}

impl BlockingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.blockers.is_empty() {
            return Err(ConfigLoadError::Validation("candidate_blockers must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Scoring (stage 3) configuration: which Fellegi-Sunter model to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringYamlConfig {
    #[serde(default)]
    pub fs_model_path: Option<PathBuf>,
}

impl Default for ScoringYamlConfig {
    fn default() -> Self {
        ScoringYamlConfig { fs_model_path: None }
    }
}

fn default_fpr_alpha() -> f64 {
    0.01
}

fn default_t_low() -> f64 {
    0.3
}

fn default_min_calibration_pairs() -> usize {
    srdedupe_decision::DEFAULT_MIN_CALIBRATION_PAIRS
}

fn default_t_high_auto() -> f64 {
    0.95
}

/// Decision (stage 4) configuration: NP calibration target and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionYamlConfig {
    #[serde(default = "default_fpr_alpha")]
    pub fpr_alpha: f64,

    #[serde(default = "default_t_low")]
    pub t_low: f64,

    /// `None` means "auto": use [`default_t_high_auto`] and a placeholder,
    /// zeroed NP calibration (no labeled calibration set supplied).
    #[serde(default)]
    pub t_high: Option<f64>,

    #[serde(default = "default_min_calibration_pairs")]
    pub min_calibration_pairs: usize,

    #[serde(default)]
    pub calibration_set_path: Option<PathBuf>,

    #[serde(default)]
    pub conformal: ConformalYamlConfig,
}

impl Default for DecisionYamlConfig {
    fn default() -> Self {
        DecisionYamlConfig {
            fpr_alpha: default_fpr_alpha(),
            t_low: default_t_low(),
            t_high: None,
            min_calibration_pairs: default_min_calibration_pairs(),
            calibration_set_path: None,
            conformal: ConformalYamlConfig::default(),
        }
    }
}

impl DecisionYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(0.0..=1.0).contains(&self.fpr_alpha) {
            return Err(ConfigLoadError::Validation(format!("fpr_alpha must be in [0,1], got {}", self.fpr_alpha)));
        }
        if !(0.0..=1.0).contains(&self.t_low) {
            return Err(ConfigLoadError::Validation(format!("t_low must be in [0,1], got {}", self.t_low)));
        }
        if let Some(t_high) = self.t_high {
            if !(0.0..=1.0).contains(&t_high) {
                return Err(ConfigLoadError::Validation(format!("t_high must be in [0,1], got {t_high}")));
            }
            if t_high <= self.t_low {
                return Err(ConfigLoadError::Validation(format!(
                    "t_high ({t_high}) must exceed t_low ({})",
                    self.t_low
                )));
            }
        }
        self.conformal.validate()
    }

    /// `t_high` resolved to a concrete value: the configured value, or the
    /// auto default when none was supplied.
    pub fn resolved_t_high(&self) -> f64 {
        self.t_high.unwrap_or_else(default_t_high_auto)
    }
}

fn default_conformal_delta() -> f64 {
    0.05
}

/// Selective Conformal Risk Control knobs; only consulted when
/// `calibration_set_path` is also set, since conformal calibration needs a
/// labeled calibration set same as NP calibration does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformalYamlConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_conformal_delta")]
    pub delta: f64,
}

impl Default for ConformalYamlConfig {
    fn default() -> Self {
        ConformalYamlConfig { enabled: false, delta: default_conformal_delta() }
    }
}

impl ConformalYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(0.0..1.0).contains(&self.delta) {
            return Err(ConfigLoadError::Validation(format!("conformal delta must be in (0,1), got {}", self.delta)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = SrdedupeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reloaded = SrdedupeConfig::from_yaml(&yaml).unwrap();
        assert_eq!(reloaded.decision.fpr_alpha, config.decision.fpr_alpha);
        assert_eq!(reloaded.blocking.blockers.len(), config.blocking.blockers.len());
    }

    #[test]
    fn loads_minimal_yaml_with_defaults() {
        let config = SrdedupeConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.decision.t_low, 0.3);
        assert!(config.decision.t_high.is_none());
        assert_eq!(config.decision.resolved_t_high(), 0.95);
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = SrdedupeConfig::from_yaml("version: \"9.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(_)));
    }

    #[test]
    fn rejects_t_high_below_t_low() {
        let yaml = "version: \"1.0\"\ndecision:\n  t_low: 0.5\n  t_high: 0.3\n";
        let err = SrdedupeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn rejects_empty_blocker_list() {
        let yaml = "version: \"1.0\"\nblocking:\n  blockers: []\n";
        let err = SrdedupeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn from_file_reads_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srdedupe.yaml");
        fs::write(&path, "version: \"1.0\"\noutput_dir: \"my_out\"\n").unwrap();
        let config = SrdedupeConfig::from_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("my_out"));
    }
}
