/*!
 * # arxlate - structure-safe translation core for arXiv LaTeX sources
 *
 * A Rust library that decides which parts of a multi-file LaTeX submission
 * are prose that may be translated, and which parts must survive untouched.
 *
 * ## Features
 *
 * - Classify every `.tex` file of a source tree (entry point, sub-document,
 *   macro definitions, style provider, standalone)
 * - Compute skip spans for math, commands, comments, bibliography and
 *   other machine-sensitive content
 * - Extract translatable text nodes with a lossless round-trip
 * - Reintegrate translations at their exact byte offsets
 * - Reject truncated or structurally damaged output before it is written
 * - Drive any batch translator with bounded concurrency, retries and
 *   per-node fallback
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `analysis`: file discovery, inclusion graph and role classification
 * - `extraction`: skip spans, text nodes and reintegration
 * - `validation`: integrity checks, node guard and label deduplication
 * - `translation`: the `Translator` seam and the batch node translator
 * - `app_controller`: whole-tree pipeline
 * - `app_config`: configuration management
 * - `file_utils`: file system operations
 * - `errors`: custom error types
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod analysis;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use analysis::{analyze, FileRole, PaperStructure, SourceFile};
pub use app_config::Config;
pub use app_controller::{Controller, FileOutcome, FileStatus, RunReport};
pub use errors::{AnalysisError, AppError, ConfigError, TranslationError};
pub use extraction::{extract, reintegrate, Extraction, SkipSpan, TextNode};
pub use translation::{IdentityTranslator, NodeTranslator, Translator};
pub use validation::{validate, IntegrityValidator, ValidationVerdict};
