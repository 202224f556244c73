/*!
 * Paper structure model.
 *
 * These types describe the result of analyzing one LaTeX source tree: which
 * file is the entry point, how files include each other, and what role each
 * file plays in the translation pipeline.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::extraction::detect_theorem_environments;

/// Role of a source file within a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// The root document: declares a class and opens the document body
    EntryPoint,
    /// Transitively included from the entry point
    SubDocument,
    /// Predominantly macro definitions
    MacroDefinitions,
    /// Declares itself a package, class or file provider
    StyleProvider,
    /// A complete document that the entry point never includes
    Standalone,
    /// Could not be classified; translated conservatively
    Indeterminate,
}

impl FileRole {
    /// Whether files with this role are sent to translation
    pub fn is_translatable(self) -> bool {
        matches!(self, Self::EntryPoint | Self::SubDocument | Self::Indeterminate)
    }

    /// Short lowercase name used in logs and JSON
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntryPoint => "entry_point",
            Self::SubDocument => "sub_document",
            Self::MacroDefinitions => "macro_definitions",
            Self::StyleProvider => "style_provider",
            Self::Standalone => "standalone",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical LaTeX file discovered during analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path, used as the file's identity
    pub path: PathBuf,
    /// Path relative to the source root
    pub relative_path: PathBuf,
    /// Assigned role
    pub role: FileRole,
    /// Contains `\documentclass`
    pub has_document_class: bool,
    /// Contains `\begin{document}`
    pub has_begin_document: bool,
    /// More than the macro threshold of its non-blank lines are definitions or comments
    pub is_macro_only: bool,
    /// Contains `\ProvidesPackage`, `\ProvidesClass` or `\ProvidesFile`
    pub is_style_provider: bool,
    /// Resolved `\input`/`\include` targets, in source order
    pub inputs: Vec<PathBuf>,
}

/// Analysis result for one source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperStructure {
    /// Absolute source root
    pub source_dir: PathBuf,
    /// Absolute path of the entry-point file
    pub root: PathBuf,
    /// Entry-point text preceding `\begin{document}`
    pub preamble: String,
    /// Every discovered file keyed by absolute path
    pub files: BTreeMap<PathBuf, SourceFile>,
}

impl PaperStructure {
    /// The entry-point file record
    pub fn entry_point(&self) -> Option<&SourceFile> {
        self.files.get(&self.root)
    }

    /// Role assigned to a file, if it was discovered
    pub fn role_of(&self, path: &Path) -> Option<FileRole> {
        self.files.get(path).map(|f| f.role)
    }

    /// Files to translate: entry point first, then by path
    pub fn files_to_translate(&self) -> Vec<&Path> {
        self.paths_where(|role| role.is_translatable())
    }

    /// Files that must be left untouched
    pub fn files_to_skip(&self) -> Vec<&Path> {
        self.paths_where(|role| !role.is_translatable())
    }

    /// Theorem-like environments declared in the entry-point preamble
    pub fn theorem_environments(&self) -> Vec<String> {
        detect_theorem_environments(&self.preamble)
    }

    /// Number of files with the given role
    pub fn count_role(&self, role: FileRole) -> usize {
        self.files.values().filter(|f| f.role == role).count()
    }

    fn paths_where(&self, keep: impl Fn(FileRole) -> bool) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self
            .files
            .values()
            .filter(|f| keep(f.role))
            .map(|f| f.path.as_path())
            .collect();
        // BTreeMap order is by path already; only the entry point moves
        paths.sort_by_key(|p| *p != self.root.as_path());
        paths
    }
}
