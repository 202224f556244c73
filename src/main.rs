// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arxlate::app_config::{self, Config};
use arxlate::errors::AppError;
use arxlate::extraction::NodeExtractor;
use arxlate::file_utils::FileManager;
use arxlate::translation::IdentityTranslator;
use arxlate::validation::IntegrityValidator;
use arxlate::{analyze, Controller, FileStatus};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every .tex file of a source tree and print the structure as JSON
    Analyze {
        /// Source directory of the submission
        #[arg(value_name = "DIR")]
        source_dir: PathBuf,
    },

    /// Print the text nodes and skip spans of one file as JSON
    Extract {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Additional environments to preserve verbatim
        #[arg(short, long = "env", value_name = "NAME")]
        environments: Vec<String>,
    },

    /// Check a candidate file against its original (exit code 1 on reject)
    Validate {
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        #[arg(value_name = "CANDIDATE")]
        candidate: PathBuf,

        /// Treat the file as the entry point of the document
        #[arg(long)]
        main: bool,
    },

    /// Run the full pipeline with a pass-through translator
    Roundtrip {
        #[arg(value_name = "DIR")]
        source_dir: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Generate shell completions for arxlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// arxlate - structure-safe translation core for arXiv LaTeX sources
#[derive(Parser, Debug)]
#[command(name = "arxlate")]
#[command(version)]
#[command(about = "Structure-safe prose extraction and integrity checks for arXiv LaTeX sources")]
#[command(long_about = "arxlate finds the translatable prose in a LaTeX source tree, leaves math, commands and bibliography untouched, and rejects damaged output before it is written.

EXAMPLES:
    arxlate analyze paper/                     # Show file roles and the entry point
    arxlate extract paper/main.tex             # Show text nodes and skip spans
    arxlate validate main.tex main.fr.tex --main
    arxlate roundtrip paper/ -o out/           # Prove the tree survives a round-trip
    arxlate completions bash > arxlate.bash    # Generate bash completions

CONFIGURATION:
    Thresholds are read from the JSON file given with --config. If the file
    doesn't exist, a default one is created there.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ARXLATE_CONFIG")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // The logger accepts everything; the effective level is set via max_level below
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Err(e) = run(cli).await {
        let error = AppError::from(e);
        error!("{}", error);
        std::process::exit(error.exit_code());
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "arxlate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref(), cli.log_level.clone())?;
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Analyze { source_dir } => run_analyze(&source_dir),
        Commands::Extract { file, environments } => run_extract(&config, &file, &environments),
        Commands::Validate { original, candidate, main } => run_validate(&config, &original, &candidate, main),
        Commands::Roundtrip { source_dir, output, quiet } => run_roundtrip(config, &source_dir, &output, quiet).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load the config file (creating a default one if missing) and apply CLI overrides
fn load_config(path: Option<&Path>, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = match path {
        Some(path) if path.exists() => Config::from_file(path)?,
        Some(path) => {
            warn!("Config file not found at {:?}, creating default config.", path);
            let config = Config::default();
            config.save(path)?;
            config
        }
        None => Config::default(),
    };

    if let Some(log_level) = log_level {
        config.log_level = log_level.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn run_analyze(source_dir: &Path) -> Result<()> {
    let structure = analyze(source_dir)?;
    if let Some(entry) = structure.entry_point() {
        info!("Entry point: {:?}", entry.relative_path);
    }
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

fn run_extract(config: &Config, file: &Path, environments: &[String]) -> Result<()> {
    let text = FileManager::read_lossy(file)?;
    let extraction = NodeExtractor::new(&config.extraction).extract(&text, environments);
    info!(
        "{:?}: {} text nodes, {} skip spans",
        file,
        extraction.nodes.len(),
        extraction.skip_spans.len()
    );
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

fn run_validate(config: &Config, original: &Path, candidate: &Path, is_main_file: bool) -> Result<()> {
    let original_text = FileManager::read_lossy(original)?;
    let candidate_text = FileManager::read_lossy(candidate)?;
    let filename = candidate.to_string_lossy();

    let verdict = IntegrityValidator::new(config.validation.clone())
        .validate(&original_text, &candidate_text, &filename, is_main_file);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if !verdict.accepted {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_roundtrip(config: Config, source_dir: &Path, output: &Path, quiet: bool) -> Result<()> {
    let controller = Controller::with_config(config, Arc::new(IdentityTranslator))?.with_progress(!quiet);
    let report = controller.run(source_dir, output).await?;

    for outcome in &report.files {
        match &outcome.reason {
            Some(reason) => println!("{:?} [{}] {:?}: {}", outcome.path, outcome.role, outcome.status, reason),
            None => println!("{:?} [{}] {:?}", outcome.path, outcome.role, outcome.status),
        }
    }

    if report.count(FileStatus::Rejected) + report.count(FileStatus::Failed) > 0 {
        std::process::exit(1);
    }
    Ok(())
}
