/*!
 * Validation of translated output.
 *
 * - `integrity`: whole-file structural checks gating what gets written
 * - `node`: per-node guard against introduced LaTeX-active characters
 * - `labels`: cross-file `\label` deduplication post-pass
 */

pub mod integrity;
pub mod labels;
pub mod node;

pub use integrity::{validate, IntegrityIssue, IntegrityValidator, ValidationVerdict};
pub use labels::LabelRegistry;
pub use node::{NodeIssue, NodeValidator};
