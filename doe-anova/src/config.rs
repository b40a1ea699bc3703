//! Configuration loading for doe-anova.
//!
//! Settings come from an optional TOML file; every field has a default, so a
//! partial file only overrides what it names.

use anyhow::{Context, Result};
use doe_anova_core::{Bound, DEFAULT_MAX_REPLICATES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for doe-anova.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for fitting models and contrast inference.
    pub analysis: AnalysisConfig,
    /// Settings for power analysis and sample-size searches.
    pub power: PowerConfig,
    /// Settings for presenting results.
    pub report: ReportConfig,
}

/// Configuration for model fitting and contrast inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Confidence level for error bars and contrast bounds (e.g., 0.95).
    pub confidence_level: f64,
    /// Pool the error mean square for contrast standard errors.
    pub equal_variance: bool,
    /// Which tail(s) contrast p-values and bounds use.
    pub bound: Bound,
}

/// Configuration for power analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Type I error rate.
    pub alpha: f64,
    /// Type II error rate targeted by sample-size searches.
    pub beta: f64,
    /// Largest replicate count a sample-size search will try.
    pub max_replicates: u32,
}

/// Configuration for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Use ANSI colors in terminal output.
    pub colors: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            equal_variance: true,
            bound: Bound::TwoSided,
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.2,
            max_replicates: DEFAULT_MAX_REPLICATES,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { colors: true }
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".doe-anova.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `.doe-anova.toml` in the current directory,
    /// falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the given path, or from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }
}
