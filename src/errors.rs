/*!
 * Error types for the arxlate library.
 *
 * This module contains custom error types for the different parts of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while analyzing a LaTeX source tree
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No LaTeX source files were discovered under the given root
    #[error("No source files found in {0:?}")]
    NoSourceFiles(PathBuf),

    /// The source root could not be walked
    #[error("Failed to read source tree: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the external translation collaborator
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The translation service failed the request
    #[error("Translation provider failed: {0}")]
    Provider(String),

    /// The service answered with a different number of segments than it was sent
    #[error("Batch size mismatch: sent {sent} segments, received {received}")]
    BatchMismatch {
        /// Number of segments sent
        sent: usize,
        /// Number of segments received
        received: usize,
    },

    /// The concurrency limiter was closed before the request could run
    #[error("Translation cancelled: {0}")]
    Cancelled(String),
}

/// Errors raised while loading or checking configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is outside its accepted range
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from structure analysis
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Analysis(_) => 3,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for AppError {
    /// Recover the typed error when one sits at the root of the chain
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<AnalysisError>() {
            Ok(e) => return Self::Analysis(e),
            Err(error) => error,
        };
        let error = match error.downcast::<ConfigError>() {
            Ok(e) => return Self::Config(e),
            Err(error) => error,
        };
        let error = match error.downcast::<TranslationError>() {
            Ok(e) => return Self::Translation(e),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(e) => Self::File(e.to_string()),
            Err(error) => Self::Unknown(format!("{:#}", error)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
