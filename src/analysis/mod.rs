/*!
 * Source tree analysis.
 *
 * - `structure`: the `PaperStructure` result and file roles
 * - `analyzer`: entry-point discovery, inclusion graph and classification
 */

pub mod analyzer;
pub mod structure;

pub use analyzer::{analyze, PaperAnalyzer};
pub use structure::{FileRole, PaperStructure, SourceFile};
