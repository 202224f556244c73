/*!
 * Structural integrity checks for reconstructed documents.
 *
 * A reconstructed file is compared against its original and rejected when
 * it looks truncated or structurally damaged. Checks run in a fixed order
 * and the first failure wins:
 *
 * 1. minimum length
 * 2. document body markers (plus full completeness for the entry point)
 * 3. environment counts and balance
 * 4. section headings
 * 5. citation, reference and label counts
 * 6. unclosed braces
 * 7. dangling trailing command
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_config::ValidationConfig;
use crate::extraction::is_complete_latex;

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

static BEGIN_ENV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{\w+\*?\}").expect("Invalid begin regex")
});

static END_ENV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\end\{\w+\*?\}").expect("Invalid end regex")
});

static SECTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:sub)*section\*?\{").expect("Invalid section regex")
});

static DANGLING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[a-zA-Z]+$").expect("Invalid dangling command regex")
});

/// Reference-like commands whose count must not drop
const REFERENCE_COMMANDS: [&str; 3] = ["\\cite{", "\\ref{", "\\label{"];

/// Why a candidate was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    #[error("Translation too short ({0} chars)")]
    TooShort(usize),

    #[error("Missing {0} in translation")]
    MissingMarker(&'static str),

    #[error("Incomplete document: {0} is not a complete LaTeX document")]
    IncompleteDocument(String),

    #[error("Environment count mismatch: original has {original} \\begin, translated has {translated}")]
    EnvironmentCount { original: usize, translated: usize },

    #[error("Unbalanced environments: {begins} \\begin vs {ends} \\end in translation")]
    UnbalancedEnvironments { begins: usize, ends: usize },

    #[error("Section count mismatch: original {original}, translated {translated}")]
    SectionCount { original: usize, translated: usize },

    #[error("{command} count dropped significantly: original {original}, translated {translated} ({percent}% loss)")]
    ReferenceDrop {
        command: String,
        original: usize,
        translated: usize,
        percent: u32,
    },

    #[error("Possible truncation: {0} unclosed braces")]
    UnclosedBraces(usize),

    #[error("Possible truncation: file ends with dangling command '{0}'")]
    DanglingCommand(String),
}

/// Accept/reject outcome with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub accepted: bool,
    /// Empty when accepted
    pub reason: String,
}

impl ValidationVerdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: String::new(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}

impl From<Result<(), IntegrityIssue>> for ValidationVerdict {
    fn from(result: Result<(), IntegrityIssue>) -> Self {
        match result {
            Ok(()) => Self::accept(),
            Err(issue) => Self::reject(issue.to_string()),
        }
    }
}

/// Runs the structural checks with configurable thresholds
#[derive(Debug, Clone, Default)]
pub struct IntegrityValidator {
    config: ValidationConfig,
}

impl IntegrityValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate and log the outcome against `filename`
    pub fn validate(&self, original: &str, candidate: &str, filename: &str, is_main_file: bool) -> ValidationVerdict {
        match self.check(original, candidate, is_main_file) {
            Ok(()) => {
                debug!("Integrity check passed for {}", filename);
                ValidationVerdict::accept()
            }
            Err(issue) => {
                warn!("Rejected translation of {}: {}", filename, issue);
                ValidationVerdict::reject(issue.to_string())
            }
        }
    }

    /// Run every check in order, stopping at the first issue
    pub fn check(&self, original: &str, candidate: &str, is_main_file: bool) -> Result<(), IntegrityIssue> {
        self.check_length(candidate)?;
        self.check_markers(original, candidate, is_main_file)?;
        self.check_environments(original, candidate)?;
        self.check_sections(original, candidate)?;
        self.check_references(original, candidate)?;
        self.check_braces(candidate)?;
        self.check_dangling(candidate)
    }

    fn check_length(&self, candidate: &str) -> Result<(), IntegrityIssue> {
        if candidate.trim().chars().count() < self.config.min_length {
            return Err(IntegrityIssue::TooShort(candidate.chars().count()));
        }
        Ok(())
    }

    fn check_markers(&self, original: &str, candidate: &str, is_main_file: bool) -> Result<(), IntegrityIssue> {
        for marker in [END_DOCUMENT, BEGIN_DOCUMENT] {
            if original.contains(marker) && !candidate.contains(marker) {
                return Err(IntegrityIssue::MissingMarker(marker));
            }
        }
        if is_main_file && is_complete_latex(original) && !is_complete_latex(candidate) {
            return Err(IntegrityIssue::IncompleteDocument("translation".to_string()));
        }
        Ok(())
    }

    fn check_environments(&self, original: &str, candidate: &str) -> Result<(), IntegrityIssue> {
        let original_begins = BEGIN_ENV_REGEX.find_iter(original).count();
        let begins = BEGIN_ENV_REGEX.find_iter(candidate).count();
        let ends = END_ENV_REGEX.find_iter(candidate).count();

        if original_begins > 0 {
            let ratio = begins as f64 / original_begins as f64;
            if ratio < self.config.env_ratio_min || ratio > self.config.env_ratio_max {
                return Err(IntegrityIssue::EnvironmentCount {
                    original: original_begins,
                    translated: begins,
                });
            }
        }

        if begins > 0 {
            let allowed = (self.config.env_balance_min as f64).max(begins as f64 * self.config.env_balance_ratio);
            if begins.abs_diff(ends) as f64 > allowed {
                return Err(IntegrityIssue::UnbalancedEnvironments { begins, ends });
            }
        }
        Ok(())
    }

    fn check_sections(&self, original: &str, candidate: &str) -> Result<(), IntegrityIssue> {
        let original_sections = SECTION_REGEX.find_iter(original).count();
        let sections = SECTION_REGEX.find_iter(candidate).count();
        if original_sections > 0 && original_sections.abs_diff(sections) > self.config.section_tolerance {
            return Err(IntegrityIssue::SectionCount {
                original: original_sections,
                translated: sections,
            });
        }
        Ok(())
    }

    fn check_references(&self, original: &str, candidate: &str) -> Result<(), IntegrityIssue> {
        for pattern in REFERENCE_COMMANDS {
            let original_count = original.matches(pattern).count();
            if original_count <= self.config.reference_min_count {
                continue;
            }
            let count = candidate.matches(pattern).count();
            let drop = (original_count as f64 - count as f64) / original_count as f64;
            if drop > self.config.reference_drop_max {
                return Err(IntegrityIssue::ReferenceDrop {
                    command: pattern.trim_end_matches('{').to_string(),
                    original: original_count,
                    translated: count,
                    percent: (drop * 100.0).round() as u32,
                });
            }
        }
        Ok(())
    }

    fn check_braces(&self, candidate: &str) -> Result<(), IntegrityIssue> {
        let opens = candidate.matches('{').count();
        let closes = candidate.matches('}').count();
        let unclosed = opens.saturating_sub(closes);
        if unclosed > self.config.max_unclosed_braces {
            return Err(IntegrityIssue::UnclosedBraces(unclosed));
        }
        Ok(())
    }

    fn check_dangling(&self, candidate: &str) -> Result<(), IntegrityIssue> {
        let trimmed = candidate.trim_end();
        let char_count = trimmed.chars().count();
        let tail_start = trimmed
            .char_indices()
            .nth(char_count.saturating_sub(self.config.dangling_window))
            .map_or(trimmed.len(), |(i, _)| i);
        let tail = &trimmed[tail_start..];

        if let Some(found) = DANGLING_REGEX.find(tail) {
            let command = found.as_str();
            if !self.config.dangling_allow_list.iter().any(|allowed| allowed == command) {
                return Err(IntegrityIssue::DanglingCommand(command.to_string()));
            }
        }
        Ok(())
    }
}

/// Validate with default thresholds
pub fn validate(original: &str, candidate: &str, filename: &str, is_main_file: bool) -> ValidationVerdict {
    IntegrityValidator::default().validate(original, candidate, filename, is_main_file)
}
