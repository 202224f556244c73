use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::analysis::{self, FileRole, PaperStructure};
use crate::app_config::Config;
use crate::extraction::{reintegrate, NodeExtractor};
use crate::file_utils::FileManager;
use crate::translation::{NodeTranslationStats, NodeTranslator, Translator};
use crate::validation::{IntegrityValidator, LabelRegistry};

// @module: Pipeline controller for a whole source tree

/// What happened to one translatable file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Reconstructed text passed validation and was written
    Translated,
    /// No translatable nodes; the copied original stands
    Unchanged,
    /// Reconstructed text failed validation; the copied original stands
    Rejected,
    /// The file could not be processed at all
    Failed,
}

/// Per-file result of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Path relative to the source root
    pub path: PathBuf,
    pub role: FileRole,
    pub status: FileStatus,
    pub stats: NodeTranslationStats,
    /// Validation or I/O failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Summary of a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Relative path of the entry point
    pub entry_point: PathBuf,
    /// Outcomes in processing order: entry point first, then by path
    pub files: Vec<FileOutcome>,
    /// Files copied verbatim into the output tree
    pub copied: usize,
    /// Node counters over all files
    pub totals: NodeTranslationStats,
    /// Duplicate labels removed by the post-pass
    pub labels_removed: usize,
    pub duration: Duration,
}

impl RunReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// True when no file was rejected or failed
    pub fn is_clean(&self) -> bool {
        self.count(FileStatus::Rejected) == 0 && self.count(FileStatus::Failed) == 0
    }
}

/// Main application controller for source tree translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    translator: Arc<dyn Translator>,
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config, translator: Arc<dyn Translator>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            translator,
            show_progress: true,
        })
    }

    /// Enable or hide the progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze `source_dir`, mirror it into `output_dir`, translate every
    /// translatable file and write the ones that pass validation
    pub async fn run(&self, source_dir: &Path, output_dir: &Path) -> Result<RunReport> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(source_dir) {
            return Err(anyhow::anyhow!("Source directory does not exist: {:?}", source_dir));
        }

        let structure = analysis::analyze(source_dir)?;
        let entry_point = Self::relative(&structure, &structure.root);
        info!(
            "Analyzed {:?}: entry point {:?}, {} files",
            source_dir,
            entry_point,
            structure.files.len()
        );

        if FileManager::absolute(output_dir).starts_with(&structure.source_dir) {
            return Err(anyhow::anyhow!(
                "Output directory {:?} must not be inside the source tree {:?}",
                output_dir,
                structure.source_dir
            ));
        }
        FileManager::ensure_dir(output_dir)?;
        let copied = FileManager::copy_tree(&structure.source_dir, output_dir)
            .with_context(|| format!("Failed to mirror {:?} into {:?}", structure.source_dir, output_dir))?;
        debug!("Copied {} files into {:?}", copied, output_dir);

        let environments = structure.theorem_environments();
        let files: Vec<PathBuf> = structure
            .files_to_translate()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        let progress_bar = self.progress_bar(files.len() as u64);
        let running = Arc::new(Mutex::new(NodeTranslationStats::default()));
        let semaphore = Arc::new(Semaphore::new(self.config.translation.max_batch_concurrency));

        let mut indexed: Vec<(usize, FileOutcome)> = stream::iter(files.iter().enumerate())
            .map(|(order, path)| {
                let structure = &structure;
                let environments = environments.as_slice();
                let semaphore = semaphore.clone();
                let running = running.clone();
                let progress_bar = progress_bar.clone();
                async move {
                    let outcome = self
                        .process_file(structure, path, environments, semaphore, output_dir)
                        .await;
                    let snapshot = {
                        let mut totals = running.lock();
                        totals.merge(&outcome.stats);
                        *totals
                    };
                    progress_bar.set_message(format!("{}/{} nodes", snapshot.translated, snapshot.total));
                    progress_bar.inc(1);
                    (order, outcome)
                }
            })
            .buffer_unordered(self.config.translation.max_concurrent_files)
            .collect()
            .await;
        indexed.sort_by_key(|(order, _)| *order);
        let outcomes: Vec<FileOutcome> = indexed.into_iter().map(|(_, outcome)| outcome).collect();

        progress_bar.finish_with_message("done");

        let labels_removed = self.deduplicate_labels(&outcomes, output_dir)?;
        let totals = *running.lock();

        let report = RunReport {
            entry_point,
            files: outcomes,
            copied,
            totals,
            labels_removed,
            duration: start_time.elapsed(),
        };

        info!(
            "Finished in {}: {} translated, {} unchanged, {} rejected, {} failed ({} of {} nodes translated)",
            Self::format_duration(report.duration),
            report.count(FileStatus::Translated),
            report.count(FileStatus::Unchanged),
            report.count(FileStatus::Rejected),
            report.count(FileStatus::Failed),
            report.totals.translated,
            report.totals.total
        );
        Ok(report)
    }

    async fn process_file(
        &self,
        structure: &PaperStructure,
        path: &Path,
        environments: &[String],
        semaphore: Arc<Semaphore>,
        output_dir: &Path,
    ) -> FileOutcome {
        let relative = Self::relative(structure, path);
        let role = structure.role_of(path).unwrap_or(FileRole::Indeterminate);
        let mut outcome = FileOutcome {
            path: relative.clone(),
            role,
            status: FileStatus::Unchanged,
            stats: NodeTranslationStats::default(),
            reason: None,
        };

        let original = match FileManager::read_lossy(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read {:?}: {:#}", path, e);
                outcome.status = FileStatus::Failed;
                outcome.reason = Some(format!("{:#}", e));
                return outcome;
            }
        };

        let mut extraction = NodeExtractor::new(&self.config.extraction).extract(&original, environments);
        if extraction.nodes.is_empty() {
            info!("No translatable text nodes in {:?}, skipping", relative);
            return outcome;
        }

        let translator = NodeTranslator::with_semaphore(
            self.translator.clone(),
            self.config.translation.clone(),
            semaphore,
        );
        outcome.stats = translator.translate_nodes(&mut extraction.nodes).await;

        let mut candidate = reintegrate(&original, &extraction.nodes);
        let untranslated = outcome.stats.untranslated();
        if untranslated > 0 {
            warn!("[{}] {} nodes kept in the source language", relative.display(), untranslated);
            if self.config.translation.warn_on_failed_nodes {
                candidate = format!("{}{}", failed_nodes_banner(untranslated), candidate);
            }
        }

        let filename = relative.to_string_lossy();
        let is_main_file = path == structure.root;
        let verdict = IntegrityValidator::new(self.config.validation.clone())
            .validate(&original, &candidate, &filename, is_main_file);
        if !verdict.accepted {
            outcome.status = FileStatus::Rejected;
            outcome.reason = Some(verdict.reason);
            return outcome;
        }

        match FileManager::write_to_file(output_dir.join(&relative), &candidate) {
            Ok(()) => outcome.status = FileStatus::Translated,
            Err(e) => {
                error!("Failed to write {:?}: {:#}", relative, e);
                outcome.status = FileStatus::Failed;
                outcome.reason = Some(format!("{:#}", e));
            }
        }
        outcome
    }

    /// Remove labels repeated across written files, first occurrence wins
    fn deduplicate_labels(&self, outcomes: &[FileOutcome], output_dir: &Path) -> Result<usize> {
        let mut registry = LabelRegistry::new();
        for outcome in outcomes.iter().filter(|o| o.status == FileStatus::Translated) {
            let target = output_dir.join(&outcome.path);
            let content = FileManager::read_lossy(&target)?;
            let deduplicated = registry.deduplicate(&content, &outcome.path.to_string_lossy());
            if deduplicated != content {
                FileManager::write_to_file(&target, &deduplicated)?;
            }
        }
        Ok(registry.removed())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        if !self.show_progress {
            progress_bar.set_draw_target(ProgressDrawTarget::hidden());
            return progress_bar;
        }
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating files");
        progress_bar
    }

    fn relative(structure: &PaperStructure, path: &Path) -> PathBuf {
        structure
            .files
            .get(path)
            .map(|f| f.relative_path.clone())
            .unwrap_or_else(|| path.strip_prefix(&structure.source_dir).unwrap_or(path).to_path_buf())
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// LaTeX comment block prepended to files that keep untranslated nodes
pub fn failed_nodes_banner(count: usize) -> String {
    format!(
        "% ============================================================\n\
         % TRANSLATION WARNING: {} text segment(s) could not be\n\
         %    translated and remain in the source language.\n\
         % ============================================================\n",
        count
    )
}
