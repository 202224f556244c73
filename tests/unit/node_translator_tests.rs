/*!
 * Tests for batch node translation, retries and per-node fallback
 */

use std::sync::Arc;
use tokio::sync::Semaphore;

use arxlate::app_config::TranslationConfig;
use arxlate::extraction::{extract, reintegrate};
use arxlate::translation::{chunk_nodes, MockTranslator, NodeTranslator, Translator};
use crate::common;

fn fast_config(max_chars_per_batch: usize) -> TranslationConfig {
    TranslationConfig {
        max_chars_per_batch,
        retry_count: 0,
        retry_backoff_ms: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_translate_nodes_withWorkingMock_shouldTranslateEveryNode() {
    let text = common::METHOD_TEX;
    let mut nodes = extract::<&str>(text, &[]).nodes;
    let translator = NodeTranslator::new(Arc::new(MockTranslator::working()), fast_config(3000));

    let stats = translator.translate_nodes(&mut nodes).await;

    assert_eq!(stats.total, nodes.len());
    assert_eq!(stats.translated, nodes.len());
    assert_eq!(stats.untranslated(), 0);
    let output = reintegrate(text, &nodes);
    assert!(output.contains("[TRANSLATED] Our approach proceeds"));
    assert!(output.contains("\\begin{equation}\n  \\mathcal{L}"));
}

#[tokio::test]
async fn test_translate_nodes_withSmallBudget_shouldSendSeveralBatches() {
    let mut nodes = extract::<&str>(common::INTRO_TEX, &["theorem"]).nodes;
    let mock = Arc::new(MockTranslator::working());
    let translator = NodeTranslator::new(mock.clone(), fast_config(40));

    translator.translate_nodes(&mut nodes).await;

    let expected_batches = chunk_nodes(&nodes, 40).len();
    assert!(expected_batches > 1);
    assert_eq!(mock.call_count(), expected_batches);
    assert_eq!(mock.segment_count(), nodes.len());
}

#[tokio::test]
async fn test_translate_nodes_withFailingMock_shouldReintegrateToOriginal() {
    let text = common::INTRO_TEX;
    let mut nodes = extract(text, &["theorem"]).nodes;
    let translator = NodeTranslator::new(Arc::new(MockTranslator::failing()), fast_config(3000));

    let stats = translator.translate_nodes(&mut nodes).await;

    assert_eq!(stats.failed, nodes.len());
    assert_eq!(reintegrate(text, &nodes), text);
}

#[tokio::test]
async fn test_translate_nodes_withBatchLimit_shouldBisectUntilAccepted() {
    let text = common::INTRO_TEX;
    let mut nodes = extract(text, &["theorem"]).nodes;
    let mock = Arc::new(MockTranslator::fail_above(2));
    let translator = NodeTranslator::new(mock.clone(), fast_config(3000));

    let stats = translator.translate_nodes(&mut nodes).await;

    assert_eq!(stats.translated, nodes.len());
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_translate_nodes_withSharedSemaphore_shouldCompleteUnderSinglePermit() {
    let semaphore = Arc::new(Semaphore::new(1));
    let translator: Arc<dyn Translator> = Arc::new(MockTranslator::fail_above(1));
    let first = NodeTranslator::with_semaphore(translator.clone(), fast_config(3000), semaphore.clone());
    let second = NodeTranslator::with_semaphore(translator, fast_config(3000), semaphore.clone());

    let mut a = extract::<&str>(common::METHOD_TEX, &[]).nodes;
    let mut b = extract::<&str>(common::MAIN_TEX, &[]).nodes;
    let (stats_a, stats_b) = tokio::join!(first.translate_nodes(&mut a), second.translate_nodes(&mut b));

    assert_eq!(stats_a.translated, a.len());
    assert_eq!(stats_b.translated, b.len());
    assert_eq!(semaphore.available_permits(), 1);
}

#[tokio::test]
async fn test_translate_nodes_withNoNodes_shouldNotCallTranslator() {
    let mock = Arc::new(MockTranslator::working());
    let translator = NodeTranslator::new(mock.clone(), fast_config(3000));

    let stats = translator.translate_nodes(&mut []).await;

    assert_eq!(stats.total, 0);
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_translate_nodes_fromBlockingContext_shouldResolveEveryNode() {
    common::init_test_logging();
    let mut nodes = extract::<&str>(common::METHOD_TEX, &[]).nodes;
    let translator = NodeTranslator::new(Arc::new(MockTranslator::working()), fast_config(3000));

    let stats = tokio_test::block_on(translator.translate_nodes(&mut nodes));

    assert_eq!(stats.translated, nodes.len());
    assert!(nodes.iter().all(|n| n.is_translated()));
}
