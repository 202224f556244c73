/*!
 * Scripted translators for testing.
 *
 * - `MockTranslator::working()` - prefixes every segment with `[TRANSLATED]`
 * - `MockTranslator::failing()` - always fails
 * - `MockTranslator::mismatched()` - drops the last segment of every batch
 * - `MockTranslator::fail_above(n)` - fails batches larger than `n`
 * - `MockTranslator::corrupting()` - appends an unbalanced brace
 * - `MockTranslator::intermittent(n)` - fails every `n`th call
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::errors::TranslationError;

use super::Translator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Prefix each segment's trimmed text
    Working { prefix: String },
    /// Return segments unchanged
    PassThrough,
    /// Always fail
    Failing,
    /// Return one segment fewer than sent
    Mismatched,
    /// Fail any batch with more than this many segments
    FailOnBatchesLargerThan(usize),
    /// Add a `{` to every segment
    Corrupting,
    /// Fail every `fail_every`th call, starting with the first
    Intermittent { fail_every: usize },
}

#[derive(Debug)]
pub struct MockTranslator {
    behavior: MockBehavior,
    calls: AtomicUsize,
    segments: AtomicUsize,
    largest_batch: AtomicUsize,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            segments: AtomicUsize::new(0),
            largest_batch: AtomicUsize::new(0),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working {
            prefix: "[TRANSLATED]".to_string(),
        })
    }

    pub fn pass_through() -> Self {
        Self::new(MockBehavior::PassThrough)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn mismatched() -> Self {
        Self::new(MockBehavior::Mismatched)
    }

    pub fn fail_above(max_batch: usize) -> Self {
        Self::new(MockBehavior::FailOnBatchesLargerThan(max_batch))
    }

    pub fn corrupting() -> Self {
        Self::new(MockBehavior::Corrupting)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Number of `translate` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total segments received so far
    pub fn segment_count(&self) -> usize {
        self.segments.load(Ordering::SeqCst)
    }

    pub fn largest_batch(&self) -> usize {
        self.largest_batch.load(Ordering::SeqCst)
    }

    fn prefixed(prefix: &str, batch: &[String]) -> Vec<String> {
        batch.iter().map(|s| format!("{} {}", prefix, s.trim())).collect()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, batch: &[String]) -> Result<Vec<String>, TranslationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.segments.fetch_add(batch.len(), Ordering::SeqCst);
        self.largest_batch.fetch_max(batch.len(), Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working { prefix } => Ok(Self::prefixed(prefix, batch)),
            MockBehavior::PassThrough => Ok(batch.to_vec()),
            MockBehavior::Failing => Err(TranslationError::Provider("mock provider failure".to_string())),
            MockBehavior::Mismatched => {
                let mut out = batch.to_vec();
                out.pop();
                Ok(out)
            }
            MockBehavior::FailOnBatchesLargerThan(max) => {
                if batch.len() > *max {
                    Err(TranslationError::Provider(format!("batch of {} exceeds {}", batch.len(), max)))
                } else {
                    Ok(Self::prefixed("[TRANSLATED]", batch))
                }
            }
            MockBehavior::Corrupting => Ok(batch.iter().map(|s| format!("{} {{", s.trim())).collect()),
            MockBehavior::Intermittent { fail_every } => {
                if call % fail_every == 0 {
                    Err(TranslationError::Provider(format!("intermittent failure on call {}", call + 1)))
                } else {
                    Ok(Self::prefixed("[TRANSLATED]", batch))
                }
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
