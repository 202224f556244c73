/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;

use arxlate::file_utils::{FileManager, TEX_EXTENSION};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.tex", "content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_find_files_shouldReturnSortedTexFilesRecursively() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "b.tex", "")?;
    common::create_test_file(root, "a/z.TEX", "")?;
    common::create_test_file(root, "a/notes.txt", "")?;
    common::create_test_file(root, "c.bib", "")?;

    let found = FileManager::find_files(root, TEX_EXTENSION)?;

    assert_eq!(found.len(), 2);
    assert!(found[0].ends_with("a/z.TEX"));
    assert!(found[1].ends_with("b.tex"));
    Ok(())
}

#[test]
fn test_read_lossy_withInvalidUtf8_shouldReplaceBytes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("latin1.tex");
    fs::write(&path, [b'c', b'a', b'f', 0xE9, b'!'])?;

    let text = FileManager::read_lossy(&path)?;

    assert_eq!(text, "caf\u{FFFD}!");
    Ok(())
}

#[test]
fn test_write_to_file_shouldCreateParentDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("deep/er/out.tex");

    FileManager::write_to_file(&path, "hello")?;

    assert_eq!(fs::read_to_string(&path)?, "hello");
    Ok(())
}

#[test]
fn test_copy_tree_shouldMirrorAllFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_sample_paper(temp_dir.path())?;
    let out = temp_dir.path().join("out");

    let copied = FileManager::copy_tree(&root, &out)?;

    assert_eq!(copied, 7);
    assert_eq!(fs::read_to_string(out.join("sections/intro.tex"))?, common::INTRO_TEX);
    assert!(FileManager::file_exists(out.join("refs.bib")));
    Ok(())
}

#[test]
fn test_absolute_withMissingPath_shouldResolveExistingAncestor() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("not/yet/there");

    let resolved = FileManager::absolute(&missing);

    assert_eq!(resolved, fs::canonicalize(temp_dir.path())?.join("not/yet/there"));
    assert!(!missing.exists());
    Ok(())
}
