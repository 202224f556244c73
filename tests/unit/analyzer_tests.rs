/*!
 * Tests for source tree analysis and file classification
 */

use anyhow::Result;
use std::path::Path;

use arxlate::analysis::{analyze, FileRole};
use arxlate::errors::AnalysisError;
use crate::common;

fn role(structure: &arxlate::PaperStructure, relative: &str) -> Option<FileRole> {
    structure
        .files
        .values()
        .find(|f| f.relative_path == Path::new(relative))
        .map(|f| f.role)
}

#[test]
fn test_analyze_withSamplePaper_shouldClassifyEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;

    let structure = analyze(&root)?;

    assert_eq!(structure.files.len(), 6);
    assert_eq!(role(&structure, "main.tex"), Some(FileRole::EntryPoint));
    assert_eq!(role(&structure, "macros.tex"), Some(FileRole::MacroDefinitions));
    assert_eq!(role(&structure, "sections/intro.tex"), Some(FileRole::SubDocument));
    assert_eq!(role(&structure, "sections/method.tex"), Some(FileRole::SubDocument));
    assert_eq!(role(&structure, "localstyle.tex"), Some(FileRole::StyleProvider));
    assert_eq!(role(&structure, "supplement.tex"), Some(FileRole::Standalone));
    Ok(())
}

#[test]
fn test_analyze_withSamplePaper_shouldTranslateEntryPointFirst() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;

    let structure = analyze(&root)?;
    let order: Vec<&Path> = structure.files_to_translate();

    assert_eq!(order.len(), 3);
    assert_eq!(order[0], structure.root.as_path());
    assert!(order[1].ends_with("sections/intro.tex"));
    assert!(order[2].ends_with("sections/method.tex"));
    assert_eq!(structure.files_to_skip().len(), 3);
    Ok(())
}

#[test]
fn test_analyze_withSamplePaper_shouldResolveInputsAndPreamble() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;

    let structure = analyze(&root)?;
    let entry = structure.entry_point().expect("entry point present");

    assert_eq!(entry.inputs.len(), 3);
    assert!(entry.has_document_class && entry.has_begin_document);
    assert!(structure.preamble.contains("\\newtheorem{theorem}"));
    assert!(!structure.preamble.contains("\\maketitle"));
    assert_eq!(structure.theorem_environments(), vec!["theorem".to_string()]);
    Ok(())
}

#[test]
fn test_analyze_withSingleCompleteFile_shouldPickItRegardlessOfName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "a_notes.tex", "Some loose notes without any class.\n")?;
    common::create_test_file(
        root,
        "zz_article.tex",
        "\\documentclass{article}\n\\begin{document}\nBody text.\n\\end{document}\n",
    )?;

    let structure = analyze(root)?;

    assert!(structure.root.ends_with("zz_article.tex"));
    assert_eq!(role(&structure, "a_notes.tex"), Some(FileRole::Indeterminate));
    Ok(())
}

#[test]
fn test_analyze_withSeveralCandidates_shouldPreferPriorityName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let doc = "\\documentclass{article}\n\\begin{document}\nText.\n\\end{document}\n";
    common::create_test_file(root, "aaa.tex", doc)?;
    common::create_test_file(root, "ms.tex", doc)?;
    common::create_test_file(root, "paper.tex", doc)?;

    let structure = analyze(root)?;

    assert!(structure.root.ends_with("ms.tex"));
    assert_eq!(role(&structure, "aaa.tex"), Some(FileRole::Standalone));
    Ok(())
}

#[test]
fn test_analyze_withCandidatesAtDifferentDepths_shouldPreferShallowest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let doc = "\\documentclass{article}\n\\begin{document}\nText.\n\\end{document}\n";
    common::create_test_file(root, "a/deep/first.tex", doc)?;
    common::create_test_file(root, "top.tex", doc)?;

    let structure = analyze(root)?;

    assert!(structure.root.ends_with("top.tex"));
    Ok(())
}

#[test]
fn test_analyze_withNoCompleteFile_shouldFallBackToClassDeclaration() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "body.tex", "Just prose in a body file.\n")?;
    common::create_test_file(root, "head.tex", "\\documentclass{article}\n\\input{body}\n")?;

    let structure = analyze(root)?;

    assert!(structure.root.ends_with("head.tex"));
    assert_eq!(role(&structure, "body.tex"), Some(FileRole::SubDocument));
    Ok(())
}

#[test]
fn test_analyze_withInputCycle_shouldTerminate() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(
        root,
        "main.tex",
        "\\documentclass{article}\n\\begin{document}\n\\input{a}\n\\end{document}\n",
    )?;
    common::create_test_file(root, "a.tex", "Part A text.\n\\input{b}\n")?;
    common::create_test_file(root, "b.tex", "Part B text.\n\\input{a}\n\\input{b}\n")?;

    let structure = analyze(root)?;

    assert_eq!(role(&structure, "a.tex"), Some(FileRole::SubDocument));
    assert_eq!(role(&structure, "b.tex"), Some(FileRole::SubDocument));
    Ok(())
}

#[test]
fn test_analyze_withMissingInputTarget_shouldIgnoreIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(
        root,
        "main.tex",
        "\\documentclass{article}\n\\begin{document}\n\\input{missing}\n\\end{document}\n",
    )?;

    let structure = analyze(root)?;

    assert!(structure.entry_point().map(|e| e.inputs.is_empty()).unwrap_or(false));
    Ok(())
}

#[test]
fn test_analyze_withEmptyDirectory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "not latex")?;

    let result = analyze(temp_dir.path());

    assert!(matches!(result, Err(AnalysisError::NoSourceFiles(_))));
    Ok(())
}
