use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles loading, validating and saving the tunable thresholds
/// used by extraction, validation and the per-file translation pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Integrity validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Translation pipeline settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for span computation and node extraction
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Minimum trimmed length (in characters) for a gap to become a text node
    #[serde(default = "default_min_node_length")]
    pub min_node_length: usize,

    /// Extra environment names that are always preserved verbatim
    #[serde(default)]
    pub extra_environments: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_node_length: default_min_node_length(),
            extra_environments: Vec::new(),
        }
    }
}

/// Thresholds for the integrity validator.
///
/// The tolerance bands are heuristics; none of them is a hard correctness bound.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Minimum trimmed length of an acceptable candidate
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Lowest accepted ratio of candidate to original `\begin` counts
    #[serde(default = "default_env_ratio_min")]
    pub env_ratio_min: f64,

    /// Highest accepted ratio of candidate to original `\begin` counts
    #[serde(default = "default_env_ratio_max")]
    pub env_ratio_max: f64,

    /// Allowed `\begin`/`\end` imbalance in the candidate, as a fraction of its begins
    #[serde(default = "default_env_balance_ratio")]
    pub env_balance_ratio: f64,

    /// Allowed `\begin`/`\end` imbalance floor
    #[serde(default = "default_env_balance_min")]
    pub env_balance_min: usize,

    /// Allowed difference in section heading counts
    #[serde(default = "default_section_tolerance")]
    pub section_tolerance: usize,

    /// Largest accepted fractional loss of cite/ref/label commands
    #[serde(default = "default_reference_drop_max")]
    pub reference_drop_max: f64,

    /// Reference counts at or below this value are not checked
    #[serde(default = "default_reference_min_count")]
    pub reference_min_count: usize,

    /// Largest accepted surplus of `{` over `}`
    #[serde(default = "default_max_unclosed_braces")]
    pub max_unclosed_braces: usize,

    /// Number of trailing characters inspected for a dangling command
    #[serde(default = "default_dangling_window")]
    pub dangling_window: usize,

    /// Commands that may legitimately end a file
    #[serde(default = "default_dangling_allow_list")]
    pub dangling_allow_list: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            env_ratio_min: default_env_ratio_min(),
            env_ratio_max: default_env_ratio_max(),
            env_balance_ratio: default_env_balance_ratio(),
            env_balance_min: default_env_balance_min(),
            section_tolerance: default_section_tolerance(),
            reference_drop_max: default_reference_drop_max(),
            reference_min_count: default_reference_min_count(),
            max_unclosed_braces: default_max_unclosed_braces(),
            dangling_window: default_dangling_window(),
            dangling_allow_list: default_dangling_allow_list(),
        }
    }
}

/// Settings for the per-file translation pipeline
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Number of files processed in parallel
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Number of translator calls in flight at once
    #[serde(default = "default_max_batch_concurrency")]
    pub max_batch_concurrency: usize,

    /// Upper bound on the summed node text sent in one batch
    #[serde(default = "default_max_chars_per_batch")]
    pub max_chars_per_batch: usize,

    /// Retry count for failed translator calls
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Prepend a comment banner to files that kept untranslated segments
    #[serde(default = "default_true")]
    pub warn_on_failed_nodes: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: default_max_concurrent_files(),
            max_batch_concurrency: default_max_batch_concurrency(),
            max_chars_per_batch: default_max_chars_per_batch(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            warn_on_failed_nodes: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map to the `log` crate filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_min_node_length() -> usize {
    10
}

fn default_min_length() -> usize {
    20
}

fn default_env_ratio_min() -> f64 {
    0.5
}

fn default_env_ratio_max() -> f64 {
    2.0
}

fn default_env_balance_ratio() -> f64 {
    0.15
}

fn default_env_balance_min() -> usize {
    1
}

fn default_section_tolerance() -> usize {
    1
}

fn default_reference_drop_max() -> f64 {
    0.15
}

fn default_reference_min_count() -> usize {
    3
}

fn default_max_unclosed_braces() -> usize {
    3
}

fn default_dangling_window() -> usize {
    50
}

fn default_dangling_allow_list() -> Vec<String> {
    ["\\end", "\\par", "\\item", "\\newline"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_concurrent_files() -> usize {
    16
}

fn default_max_batch_concurrency() -> usize {
    8
}

fn default_max_chars_per_batch() -> usize {
    3000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file, falling back to defaults for missing fields
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if !(v.env_ratio_min.is_finite() && v.env_ratio_max.is_finite()) || v.env_ratio_min < 0.0 {
            return Err(ConfigError::invalid(
                "validation.env_ratio_min",
                "ratio band must be finite and non-negative",
            ));
        }
        if v.env_ratio_min > v.env_ratio_max {
            return Err(ConfigError::invalid(
                "validation.env_ratio_max",
                format!("must be >= env_ratio_min ({})", v.env_ratio_min),
            ));
        }
        for (field, value) in [
            ("validation.env_balance_ratio", v.env_balance_ratio),
            ("validation.reference_drop_max", v.reference_drop_max),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a non-negative fraction"));
            }
        }

        let t = &self.translation;
        if t.max_concurrent_files == 0 {
            return Err(ConfigError::invalid("translation.max_concurrent_files", "must be at least 1"));
        }
        if t.max_batch_concurrency == 0 {
            return Err(ConfigError::invalid("translation.max_batch_concurrency", "must be at least 1"));
        }
        if t.max_chars_per_batch == 0 {
            return Err(ConfigError::invalid("translation.max_chars_per_batch", "must be at least 1"));
        }

        Ok(())
    }
}
