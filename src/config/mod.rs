//! TOML configuration of an annotation run.
//!
//! Every section and key is optional; missing values take the defaults below.
//!
//! ```toml
//! # lipidann.toml
//! [search]
//! ms1_tol = 0.005
//! is_ppm = false
//! ms2_tol = 0.02
//! ms2_threshold = 0.7
//! method = "entropy_similarity"
//!
//! [rules]
//! ms1_tol = 10.0
//! ms2_tol = 20.0
//! no_rules = false
//! confidence = 0.99
//!
//! [chains]
//! mass_tol_ppm = 10.0
//! min_carbons = 2
//! max_carbons = 36
//! max_double_bonds = 12
//! even_carbons_only = true
//!
//! [formula]
//! ms1_ppm = 5.0
//! ms2_ppm = 10.0
//! top_n = 5
//!
//! [runtime]
//! threads = 0
//! retry_attempts = 3
//! retry_backoff_ms = 50
//!
//! [artifacts]
//! reference = "library.csv"
//! class_model = "class_model.json"
//! adduct_model = "adduct_model.json"
//! chain_priors = "chain_priors.json"
//! rules = "rules.toml"
//! decomposer = ["sirius-decomp", "--input", "{input}"]
//! ```
//!
//! [`PipelineConfig::validate`] runs before any feature is touched; a rejected
//! configuration processes nothing.

mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chain::{ChainParams, MAX_CHAIN_CARBONS, MAX_CHAIN_DOUBLE_BONDS};
use crate::formula::FormulaParams;
use crate::retry::RetryPolicy;
use crate::rules::RuleParams;
use crate::search::{Ms1Tolerance, SearchParams};
use crate::similarity::SimilarityMethod;

pub use error::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Database search settings
    pub search: SearchConfig,
    /// Rule stage settings
    pub rules: RuleParams,
    /// Chain inference bounds
    pub chains: ChainParams,
    /// Formula branch settings
    pub formula: FormulaParams,
    /// Threads and retries
    pub runtime: RuntimeConfig,
    /// Paths of loaded resources
    pub artifacts: ArtifactPaths,
}

/// `[search]` section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// MS1 tolerance, Da or ppm per `is_ppm`
    pub ms1_tol: f64,
    /// Interpret `ms1_tol` as ppm
    pub is_ppm: bool,
    /// MS2 peak-matching tolerance in Da
    pub ms2_tol: f64,
    /// Minimum similarity for a library match
    pub ms2_threshold: f64,
    /// Similarity algorithm
    pub method: SimilarityMethod,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ms1_tol: 0.005,
            is_ppm: false,
            ms2_tol: 0.02,
            ms2_threshold: 0.7,
            method: SimilarityMethod::default(),
        }
    }
}

/// `[runtime]` section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads, 0 for the rayon default
    pub threads: usize,
    /// Attempts for transient store/decomposer failures
    pub retry_attempts: u32,
    /// Base backoff between attempts
    pub retry_backoff_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            retry_attempts: 3,
            retry_backoff_ms: 50,
        }
    }
}

/// `[artifacts]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Reference library CSV
    pub reference: Option<PathBuf>,
    /// Class model JSON
    pub class_model: Option<PathBuf>,
    /// Adduct model JSON
    pub adduct_model: Option<PathBuf>,
    /// Chain ranker priors JSON
    pub chain_priors: Option<PathBuf>,
    /// Rule table TOML; the bundled table when absent
    pub rules: Option<PathBuf>,
    /// External decomposer command line; the built-in decomposer when absent
    pub decomposer: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Search parameters derived from `[search]`
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            ms1_tolerance: Ms1Tolerance::new(self.search.ms1_tol, self.search.is_ppm),
            ms2_tolerance: self.search.ms2_tol,
            method: self.search.method,
            ms2_threshold: self.search.ms2_threshold,
        }
    }

    /// Retry policy derived from `[runtime]`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.runtime.retry_attempts,
            backoff: Duration::from_millis(self.runtime.retry_backoff_ms),
        }
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("search.ms1_tol", self.search.ms1_tol)?;
        non_negative("search.ms2_tol", self.search.ms2_tol)?;
        unit_interval("search.ms2_threshold", self.search.ms2_threshold)?;

        non_negative("rules.ms1_tol", self.rules.ms1_tol)?;
        non_negative("rules.ms2_tol", self.rules.ms2_tol)?;
        unit_interval("rules.confidence", self.rules.confidence)?;

        let chains = &self.chains;
        non_negative("chains.mass_tol_ppm", chains.mass_tol_ppm)?;
        if chains.min_carbons == 0 || chains.min_carbons > chains.max_carbons {
            return Err(ConfigError::Invalid(format!(
                "chains: carbon range {}..={} is empty or starts at 0",
                chains.min_carbons, chains.max_carbons
            )));
        }
        if chains.max_carbons > MAX_CHAIN_CARBONS {
            return Err(ConfigError::Invalid(format!(
                "chains.max_carbons must be at most {MAX_CHAIN_CARBONS}, got {}",
                chains.max_carbons
            )));
        }
        if chains.max_double_bonds > MAX_CHAIN_DOUBLE_BONDS {
            return Err(ConfigError::Invalid(format!(
                "chains.max_double_bonds must be at most {MAX_CHAIN_DOUBLE_BONDS}, got {}",
                chains.max_double_bonds
            )));
        }

        non_negative("formula.ms1_ppm", self.formula.ms1_ppm)?;
        non_negative("formula.ms2_ppm", self.formula.ms2_ppm)?;
        if self.formula.top_n == 0 {
            return Err(ConfigError::Invalid("formula.top_n must be at least 1".into()));
        }

        if self.runtime.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "runtime.retry_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{key} must be a non-negative number, got {value}"
        )))
    }
}

fn unit_interval(key: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{key} must be within [0, 1], got {value}")))
    }
}
