/*!
 * Integration tests for the extraction, translation and reintegration cycle
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use arxlate::app_config::{Config, TranslationConfig};
use arxlate::extraction::{extract, reintegrate};
use arxlate::file_utils::{FileManager, TEX_EXTENSION};
use arxlate::translation::{IdentityTranslator, MockTranslator, NodeTranslator};
use arxlate::validation::validate;
use arxlate::{analyze, Controller, FileStatus};
use crate::common;

#[tokio::test]
async fn test_roundtrip_withIdentityTranslator_shouldReproduceTreeByteForByte() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;
    let out = temp_dir.path().join("out");
    let controller = Controller::with_config(Config::default(), Arc::new(IdentityTranslator))?.with_progress(false);

    let report = controller.run(&root, &out).await?;

    assert!(report.is_clean());
    assert_eq!(report.count(FileStatus::Translated), 3);
    for source in FileManager::find_files(&root, TEX_EXTENSION)? {
        let relative = source.strip_prefix(&root)?;
        assert_eq!(
            fs::read(out.join(relative))?,
            fs::read(&source)?,
            "{:?} changed during round-trip",
            relative
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_roundtrip_withWorkingTranslator_shouldPassValidationForEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;
    let structure = analyze(&root)?;
    let environments = structure.theorem_environments();
    let config = TranslationConfig {
        retry_count: 0,
        ..Default::default()
    };
    let translator = NodeTranslator::new(Arc::new(MockTranslator::working()), config);

    for path in structure.files_to_translate() {
        let original = fs::read_to_string(path)?;
        let mut nodes = extract(&original, &environments).nodes;
        let stats = translator.translate_nodes(&mut nodes).await;
        let candidate = reintegrate(&original, &nodes);

        assert_eq!(stats.translated, nodes.len());
        let verdict = validate(&original, &candidate, &path.to_string_lossy(), path == structure.root);
        assert!(verdict.accepted, "{:?} rejected: {}", path, verdict.reason);
    }
    Ok(())
}

#[tokio::test]
async fn test_roundtrip_withPassThroughMock_shouldMatchOriginalText() {
    let translator = NodeTranslator::new(Arc::new(MockTranslator::pass_through()), TranslationConfig::default());

    for doc in common::tricky_documents() {
        let mut nodes = extract::<&str>(doc, &[]).nodes;
        translator.translate_nodes(&mut nodes).await;
        assert_eq!(reintegrate(doc, &nodes), doc);
    }
}
