/*!
 * Batch translation of text nodes.
 *
 * Nodes are packed into character-bounded batches that run concurrently
 * under a shared semaphore. A batch that keeps failing after its retries
 * is split in half and each half retried, down to single nodes. A node
 * that still fails keeps its original text. Every node is resolved before
 * `translate_nodes` returns.
 */

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::app_config::TranslationConfig;
use crate::errors::TranslationError;
use crate::extraction::TextNode;
use crate::validation::NodeValidator;

use super::formatting::FormatPreserver;
use super::Translator;

/// Per-file node translation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTranslationStats {
    pub total: usize,
    pub translated: usize,
    /// Nodes whose batch failed even at size one
    pub failed: usize,
    /// Nodes whose replacement was refused by the node guard
    pub rejected: usize,
}

impl NodeTranslationStats {
    /// Nodes left in the source language
    pub fn untranslated(&self) -> usize {
        self.failed + self.rejected
    }

    pub fn merge(&mut self, other: &NodeTranslationStats) {
        self.total += other.total;
        self.translated += other.translated;
        self.failed += other.failed;
        self.rejected += other.rejected;
    }
}

/// Greedily group consecutive nodes into index ranges whose summed text
/// length stays within `max_chars`. An oversized node gets its own batch.
pub fn chunk_nodes(nodes: &[TextNode], max_chars: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (i, node) in nodes.iter().enumerate() {
        let len = node.text.chars().count();
        if i > start && chars + len > max_chars {
            batches.push(start..i);
            start = i;
            chars = 0;
        }
        chars += len;
    }
    if start < nodes.len() {
        batches.push(start..nodes.len());
    }
    batches
}

type Resolved = Vec<(usize, Option<String>)>;

/// Drives a [`Translator`] over the nodes of one file
#[derive(Debug, Clone)]
pub struct NodeTranslator {
    translator: Arc<dyn Translator>,
    semaphore: Arc<Semaphore>,
    config: TranslationConfig,
    guard: NodeValidator,
}

impl NodeTranslator {
    pub fn new(translator: Arc<dyn Translator>, config: TranslationConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_batch_concurrency.max(1)));
        Self::with_semaphore(translator, config, semaphore)
    }

    /// Share one concurrency limit between several translators
    pub fn with_semaphore(translator: Arc<dyn Translator>, config: TranslationConfig, semaphore: Arc<Semaphore>) -> Self {
        Self {
            translator,
            semaphore,
            config,
            guard: NodeValidator::new(),
        }
    }

    /// Fill `replacement` on every node that translates cleanly
    pub async fn translate_nodes(&self, nodes: &mut [TextNode]) -> NodeTranslationStats {
        let mut stats = NodeTranslationStats {
            total: nodes.len(),
            ..Default::default()
        };
        if nodes.is_empty() {
            return stats;
        }

        let start_time = Instant::now();
        let texts: Vec<String> = nodes.iter().map(|n| n.text.clone()).collect();
        let batches = chunk_nodes(nodes, self.config.max_chars_per_batch);
        debug!(
            "Translating {} nodes in {} batches with {}",
            texts.len(),
            batches.len(),
            self.translator.name()
        );

        let resolved: Vec<Resolved> = stream::iter(batches)
            .map(|range| self.translate_range(&texts, range))
            .buffer_unordered(self.config.max_batch_concurrency.max(1))
            .collect()
            .await;

        for (index, outcome) in resolved.into_iter().flatten() {
            let node = &mut nodes[index];
            let Some(translated) = outcome else {
                node.replacement = None;
                stats.failed += 1;
                continue;
            };
            match self.guard.check(&node.text, &translated) {
                Ok(()) => {
                    node.replacement = Some(FormatPreserver::restore_whitespace(&node.text, &translated));
                    stats.translated += 1;
                }
                Err(issue) => {
                    debug!("Keeping original text for node {}..{}: {}", node.start, node.end, issue);
                    node.replacement = None;
                    stats.rejected += 1;
                }
            }
        }

        debug!(
            "Node translation finished in {:?}: {}/{} translated, {} failed, {} rejected",
            start_time.elapsed(),
            stats.translated,
            stats.total,
            stats.failed,
            stats.rejected
        );
        stats
    }

    /// Translate one index range, bisecting on failure
    fn translate_range<'a>(&'a self, texts: &'a [String], range: Range<usize>) -> BoxFuture<'a, Resolved> {
        async move {
            let batch = &texts[range.clone()];
            match self.call_with_retry(batch).await {
                Ok(translations) => range.zip(translations.into_iter().map(Some)).collect(),
                Err(e) if range.len() <= 1 => {
                    warn!("Node {} left untranslated: {}", range.start, e);
                    range.map(|i| (i, None)).collect()
                }
                Err(e) => {
                    let mid = range.start + range.len() / 2;
                    debug!(
                        "Batch {}..{} failed ({}), splitting at {}",
                        range.start, range.end, e, mid
                    );
                    let (left, right) = futures::join!(
                        self.translate_range(texts, range.start..mid),
                        self.translate_range(texts, mid..range.end)
                    );
                    left.into_iter().chain(right).collect()
                }
            }
        }
        .boxed()
    }

    async fn call_with_retry(&self, batch: &[String]) -> Result<Vec<String>, TranslationError> {
        let mut attempt = 0;
        loop {
            let result = self.call_once(batch).await;
            match result {
                Ok(translations) => return Ok(translations),
                Err(TranslationError::Cancelled(reason)) => return Err(TranslationError::Cancelled(reason)),
                Err(e) if attempt < self.config.retry_count => {
                    attempt += 1;
                    let delay = self.backoff_delay(attempt);
                    debug!(
                        "Batch of {} failed ({}), retry {}/{} in {:?}",
                        batch.len(),
                        e,
                        attempt,
                        self.config.retry_count,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(&self, batch: &[String]) -> Result<Vec<String>, TranslationError> {
        let translations = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| TranslationError::Cancelled(e.to_string()))?;
            self.translator.translate(batch).await?
        };

        if translations.len() != batch.len() {
            return Err(TranslationError::BatchMismatch {
                sent: batch.len(),
                received: translations.len(),
            });
        }
        Ok(translations)
    }

    /// Exponential backoff with up to 50% random jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self
            .config
            .retry_backoff_ms
            .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16));
        let jitter = rand::random_range(0..=base / 2);
        Duration::from_millis(base + jitter)
    }
}
