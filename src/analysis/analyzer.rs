/*!
 * Paper structure analyzer.
 *
 * Builds the inclusion graph of a LaTeX source tree and classifies each file.
 * Every heuristic here degrades gracefully; the only fatal condition is a tree
 * with no `.tex` files at all.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::errors::AnalysisError;
use crate::file_utils::{FileManager, TEX_EXTENSION};

use super::structure::{FileRole, PaperStructure, SourceFile};

static DOCUMENT_CLASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\documentclass[\[{]").expect("Invalid documentclass regex")
});

static BEGIN_DOCUMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\s*\{document\}").expect("Invalid begin-document regex")
});

static INPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:input|include)\s*\{([^}]+)\}").expect("Invalid input regex")
});

static PROVIDES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:ProvidesPackage|ProvidesClass|ProvidesFile)\b").expect("Invalid provides regex")
});

static MACRO_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:\\(?:newcommand|renewcommand|providecommand|newenvironment|renewenvironment|def|let|DeclareMathOperator)\b|%)",
    )
    .expect("Invalid macro line regex")
});

/// Conventional entry-point names, most preferred first
const PRIORITY_NAMES: [&str; 4] = ["main.tex", "ms.tex", "paper.tex", "article.tex"];

/// A file is macro-only when more than this share of its non-blank lines are definitions
const MACRO_LINE_THRESHOLD: f64 = 0.6;

/// Analyzes an arXiv LaTeX source directory and returns a [`PaperStructure`]
pub struct PaperAnalyzer {
    source_dir: PathBuf,
}

impl PaperAnalyzer {
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: FileManager::absolute(source_dir),
        }
    }

    pub fn analyze(&self) -> Result<PaperStructure, AnalysisError> {
        info!("Analyzing paper structure in: {:?}", self.source_dir);

        let all_tex = self.discover()?;
        if all_tex.is_empty() {
            return Err(AnalysisError::NoSourceFiles(self.source_dir.clone()));
        }
        info!("Found {} .tex files total", all_tex.len());

        let contents: HashMap<PathBuf, String> = all_tex
            .iter()
            .map(|path| {
                let text = FileManager::read_lossy(path).unwrap_or_else(|e| {
                    warn!("Could not read {:?}, treating as empty: {:#}", path, e);
                    String::new()
                });
                (path.clone(), text)
            })
            .collect();
        let known: HashSet<&Path> = all_tex.iter().map(PathBuf::as_path).collect();

        let root = self.find_entry_point(&all_tex, &contents);
        info!("Entry point identified: {:?}", self.relative(&root));

        let inputs: HashMap<&Path, Vec<PathBuf>> = all_tex
            .iter()
            .map(|path| (path.as_path(), self.resolved_inputs(path, &contents[path], &known)))
            .collect();
        let reachable = reachable_from(&root, &inputs);

        let mut files = BTreeMap::new();
        for path in &all_tex {
            let content = &contents[path];
            let mut info = SourceFile {
                path: path.clone(),
                relative_path: self.relative(path),
                role: FileRole::Indeterminate,
                has_document_class: DOCUMENT_CLASS_REGEX.is_match(content),
                has_begin_document: BEGIN_DOCUMENT_REGEX.is_match(content),
                is_macro_only: is_macro_file(content),
                is_style_provider: PROVIDES_REGEX.is_match(content),
                inputs: inputs[path.as_path()].clone(),
            };
            info.role = classify(&info, &root, &reachable);
            if info.role == FileRole::Indeterminate {
                warn!("Could not classify {:?}, translating it conservatively", info.relative_path);
            } else {
                debug!("  {:?} -> {}", info.relative_path, info.role);
            }
            files.insert(path.clone(), info);
        }

        let preamble = extract_preamble(&contents[&root]);

        let structure = PaperStructure {
            source_dir: self.source_dir.clone(),
            root,
            preamble,
            files,
        };

        info!(
            "Classification: {} entry, {} sub, {} macros, {} style, {} standalone, {} indeterminate",
            structure.count_role(FileRole::EntryPoint),
            structure.count_role(FileRole::SubDocument),
            structure.count_role(FileRole::MacroDefinitions),
            structure.count_role(FileRole::StyleProvider),
            structure.count_role(FileRole::Standalone),
            structure.count_role(FileRole::Indeterminate),
        );
        info!(
            "Will translate: {} files | Will skip: {} files",
            structure.files_to_translate().len(),
            structure.files_to_skip().len()
        );

        Ok(structure)
    }

    fn discover(&self) -> Result<Vec<PathBuf>, AnalysisError> {
        if !FileManager::dir_exists(&self.source_dir) {
            return Ok(Vec::new());
        }
        let found = FileManager::find_files(&self.source_dir, TEX_EXTENSION).map_err(|e| {
            AnalysisError::Io(std::io::Error::other(format!("{:#}", e)))
        })?;
        Ok(found.into_iter().map(FileManager::absolute).collect())
    }

    /// Pick the entry point. `all_tex` is sorted, so the choice does not
    /// depend on filesystem enumeration order.
    fn find_entry_point(&self, all_tex: &[PathBuf], contents: &HashMap<PathBuf, String>) -> PathBuf {
        let candidates: Vec<&PathBuf> = all_tex
            .iter()
            .filter(|p| {
                let c = &contents[*p];
                DOCUMENT_CLASS_REGEX.is_match(c) && BEGIN_DOCUMENT_REGEX.is_match(c)
            })
            .collect();

        match candidates.as_slice() {
            [] => {
                warn!("No file with both \\documentclass and \\begin{{document}} found. Falling back to heuristic.");
                all_tex
                    .iter()
                    .find(|p| p.parent() == Some(self.source_dir.as_path()) && DOCUMENT_CLASS_REGEX.is_match(&contents[*p]))
                    .unwrap_or(&all_tex[0])
                    .clone()
            }
            [only] => (*only).clone(),
            many => {
                warn!("{} candidate entry points found, choosing by name and depth", many.len());
                for name in PRIORITY_NAMES {
                    if let Some(found) = many.iter().find(|p| {
                        p.file_name()
                            .map(|f| f.to_string_lossy().eq_ignore_ascii_case(name))
                            .unwrap_or(false)
                    }) {
                        return (*found).clone();
                    }
                }
                // min_by_key keeps the first of equal depths, i.e. the smallest path
                many.iter()
                    .min_by_key(|p| p.components().count())
                    .map(|p| (*p).clone())
                    .unwrap_or_else(|| many[0].clone())
            }
        }
    }

    fn resolved_inputs(&self, path: &Path, content: &str, known: &HashSet<&Path>) -> Vec<PathBuf> {
        let from_dir = path.parent().unwrap_or(&self.source_dir);
        INPUT_REGEX
            .captures_iter(content)
            .filter_map(|cap| {
                let reference = cap[1].trim();
                let resolved = self.resolve_input(reference, from_dir);
                match resolved {
                    Some(p) if known.contains(p.as_path()) => Some(p),
                    _ => {
                        debug!("Dropping unresolvable input '{}' in {:?}", reference, self.relative(path));
                        None
                    }
                }
            })
            .collect()
    }

    /// Resolve `\input{reference}` relative to the including file, then the root
    fn resolve_input(&self, reference: &str, from_dir: &Path) -> Option<PathBuf> {
        let with_ext = format!("{}.{}", reference, TEX_EXTENSION);
        [
            from_dir.join(reference),
            from_dir.join(&with_ext),
            self.source_dir.join(reference),
            self.source_dir.join(&with_ext),
        ]
        .into_iter()
        .find(|c| c.is_file())
        .map(FileManager::absolute)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.source_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Convenience wrapper around [`PaperAnalyzer::analyze`]
pub fn analyze<P: AsRef<Path>>(source_dir: P) -> Result<PaperStructure, AnalysisError> {
    PaperAnalyzer::new(source_dir).analyze()
}

/// Worklist traversal of the inclusion graph; self-includes and cycles are
/// absorbed by the visited set.
fn reachable_from(root: &Path, inputs: &HashMap<&Path, Vec<PathBuf>>) -> HashSet<PathBuf> {
    let mut visited = HashSet::new();
    let mut worklist = vec![root.to_path_buf()];

    while let Some(current) = worklist.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if let Some(deps) = inputs.get(current.as_path()) {
            worklist.extend(deps.iter().filter(|d| !visited.contains(*d)).cloned());
        }
    }

    visited
}

/// First matching rule wins
fn classify(info: &SourceFile, root: &Path, reachable: &HashSet<PathBuf>) -> FileRole {
    if info.path == root {
        FileRole::EntryPoint
    } else if info.is_style_provider {
        FileRole::StyleProvider
    } else if info.is_macro_only {
        FileRole::MacroDefinitions
    } else if reachable.contains(&info.path) {
        FileRole::SubDocument
    } else if info.has_document_class && info.has_begin_document {
        FileRole::Standalone
    } else {
        FileRole::Indeterminate
    }
}

fn is_macro_file(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let macro_lines = lines.iter().filter(|l| MACRO_LINE_REGEX.is_match(l)).count();
    macro_lines as f64 / lines.len() as f64 > MACRO_LINE_THRESHOLD
}

fn extract_preamble(content: &str) -> String {
    BEGIN_DOCUMENT_REGEX
        .find(content)
        .map(|m| content[..m.start()].to_string())
        .unwrap_or_default()
}
