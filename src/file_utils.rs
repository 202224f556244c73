use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extension of LaTeX document files
pub const TEX_EXTENSION: &str = "tex";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let wanted = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string, replacing invalid UTF-8 sequences
    pub fn read_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Mirror every file under `from` into `to`, keeping relative paths
    pub fn copy_tree<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<usize> {
        let from = from.as_ref();
        let to = to.as_ref();
        let mut copied = 0;

        for entry in WalkDir::new(from).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .with_context(|| format!("Path {:?} escapes {:?}", entry.path(), from))?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                Self::ensure_dir(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    Self::ensure_dir(parent)?;
                }
                fs::copy(entry.path(), &target)
                    .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Absolute form of a path without requiring it to exist. The deepest
    /// existing ancestor is canonicalized so symlinked roots compare equal.
    pub fn absolute<P: AsRef<Path>>(path: P) -> PathBuf {
        let path = path.as_ref();
        if let Ok(resolved) = fs::canonicalize(path) {
            return resolved;
        }

        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        for ancestor in joined.ancestors().skip(1) {
            if let (Ok(resolved), Ok(rest)) = (fs::canonicalize(ancestor), joined.strip_prefix(ancestor)) {
                return resolved.join(rest);
            }
        }
        joined
    }
}
