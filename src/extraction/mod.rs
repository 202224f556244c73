/*!
 * Prose extraction and reintegration.
 *
 * The round-trip is:
 *   1. `extract(text, envs)` finds skip spans and translatable text nodes
 *   2. an external translator fills each node's `replacement`
 *   3. `reintegrate(text, nodes)` stitches the replacements back in
 *
 * - `spans`: skip-span passes and interval merging
 * - `nodes`: gap filtering into text nodes
 * - `reintegrate`: lossless reconstruction
 */

pub mod nodes;
pub mod reintegrate;
pub mod spans;

pub use nodes::{
    detect_theorem_environments, extract, is_complete_latex, Extraction, NodeExtractor, TextNode,
    DEFAULT_MIN_NODE_LENGTH,
};
pub use reintegrate::reintegrate;
pub use spans::{merge_spans, SkipSpan, SpanComputer, BLOCK_ENVIRONMENTS};
