/*!
 * Node translation.
 *
 * The actual language model lives outside this crate; it is reached through
 * the [`Translator`] trait, which maps a batch of strings to a batch of the
 * same length. Everything here is about calling it safely:
 *
 * - `batch`: chunking, bounded concurrency, retry and bisection fallback
 * - `formatting`: whitespace preservation around translated nodes
 * - `mock`: scripted translators for tests and dry runs
 */

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::TranslationError;

pub mod batch;
pub mod formatting;
pub mod mock;

pub use batch::{chunk_nodes, NodeTranslationStats, NodeTranslator};
pub use formatting::FormatPreserver;
pub use mock::{MockBehavior, MockTranslator};

/// Contract for the external translation collaborator
///
/// Implementations must return exactly one output per input, in order.
/// Any error or length mismatch makes the caller leave the affected nodes
/// in the source language.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    async fn translate(&self, batch: &[String]) -> Result<Vec<String>, TranslationError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "translator"
    }
}

/// Returns every segment unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, batch: &[String]) -> Result<Vec<String>, TranslationError> {
        Ok(batch.to_vec())
    }

    fn name(&self) -> &str {
        "identity"
    }
}
