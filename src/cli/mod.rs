//! # CLI Module
//!
//! Command-line interface for the photo import engine.
//!
//! ## Usage
//! ```bash
//! # Point photostat at a repository
//! photostat config --repository ~/Photos
//!
//! # Import a memory card, tagging everything
//! photostat import -p /media/card/DCIM --visibility private --tags holiday,2023
//!
//! # See what would happen without touching anything
//! photostat import -p ~/Downloads --visibility public --dry
//!
//! # JSON output
//! photostat import -p ~/Downloads --visibility public --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photostat::config::Settings;
use photostat::core::catalog::{
    CatalogBackend, CatalogStats, InMemoryCatalog, SqliteCatalog, Visibility,
};
use photostat::core::import::{CancellationToken, ImportReport, ImportStatus, Importer};
use photostat::core::materialize::MaterializeMode;
use photostat::error::{ConfigError, Result, ValidationError};
use photostat::events::{Event, EventChannel, ImportEvent, PipelineEvent, ScanEvent};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use tracing::{debug, warn};

/// Exit status for a run stopped with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// photostat - Import photos into a deduplicated, date-organized repository
#[derive(Parser, Debug)]
#[command(name = "photostat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file to use instead of the default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the settings file and create the repository
    Config {
        /// Repository root (default: ~/Photos)
        #[arg(long, value_name = "DIR")]
        repository: Option<PathBuf>,

        /// Catalog database (default: <repository>/.photostat/catalog.db)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },

    /// Import photos and movies from a directory tree
    Import {
        /// Directory to import from
        #[arg(short = 'p', long, value_name = "DIR")]
        path: PathBuf,

        /// Who may see the imported items
        #[arg(long, value_enum)]
        visibility: VisibilityArg,

        /// Tags to attach to every imported item (comma separated)
        #[arg(short, long, value_delimiter = ',', num_args = 1..)]
        tags: Vec<String>,

        /// Move files instead of copying them
        #[arg(long = "move")]
        move_files: bool,

        /// Symlink files instead of copying them (wins over --move)
        #[arg(long)]
        link: bool,

        /// Record each file's directory relative to BASE
        #[arg(long = "keeppath", value_name = "BASE")]
        keep_path: Option<PathBuf>,

        /// Record each file's original name
        #[arg(long = "keepname")]
        keep_name: bool,

        /// Regex of file paths to leave out
        #[arg(long, value_name = "PATTERN", num_args = 1..)]
        exclude: Vec<String>,

        /// Regex of directory paths not to descend into
        #[arg(long = "excludedir", value_name = "PATTERN", num_args = 1..)]
        exclude_dir: Vec<String>,

        /// Show what would be done without changing anything
        #[arg(long)]
        dry: bool,

        /// Repository root, overriding the settings file
        #[arg(long, value_name = "DIR")]
        repository: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show catalog statistics
    Stats {
        /// Repository root, overriding the settings file
        #[arg(long, value_name = "DIR")]
        repository: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VisibilityArg {
    /// Only the owner
    Private,
    /// Friends and family
    Protected,
    /// Everyone
    Public,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Private => Visibility::Private,
            VisibilityArg::Protected => Visibility::Protected,
            VisibilityArg::Public => Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Options of the `import` command after parsing
struct ImportArgs {
    path: PathBuf,
    visibility: Visibility,
    tags: Vec<String>,
    mode: MaterializeMode,
    keep_path: Option<PathBuf>,
    keep_name: bool,
    exclude: Vec<String>,
    exclude_dir: Vec<String>,
    dry: bool,
    repository: Option<PathBuf>,
    output: OutputFormat,
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    photostat::init_tracing(cli.verbose);

    let term = Term::stderr();
    let verbose = cli.verbose;
    let config = cli.config;

    let result = match cli.command {
        Commands::Config {
            repository,
            catalog,
        } => run_config(&term, config, repository, catalog),
        Commands::Import {
            path,
            visibility,
            tags,
            move_files,
            link,
            keep_path,
            keep_name,
            exclude,
            exclude_dir,
            dry,
            repository,
            output,
        } => run_import(
            &term,
            config,
            ImportArgs {
                path,
                visibility: visibility.into(),
                tags,
                mode: MaterializeMode::from_flags(move_files, link),
                keep_path,
                keep_name,
                exclude,
                exclude_dir,
                dry,
                repository,
                output,
            },
            verbose,
        ),
        Commands::Stats { repository, output } => run_stats(&term, config, repository, output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            ExitCode::FAILURE
        }
    }
}

fn settings_path(config: Option<PathBuf>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path),
        None => Ok(Settings::default_path()?),
    }
}

/// Settings for a command, with `--repository` taking precedence
fn resolve_settings(config: Option<PathBuf>, repository: Option<PathBuf>) -> Result<Settings> {
    if let Some(repository) = repository {
        return Ok(Settings::new(repository));
    }

    let path = settings_path(config)?;
    match Settings::load(&path)? {
        Some(settings) => Ok(settings),
        None => Err(ValidationError::MissingRepository.into()),
    }
}

fn run_config(
    term: &Term,
    config: Option<PathBuf>,
    repository: Option<PathBuf>,
    catalog: Option<PathBuf>,
) -> Result<ExitCode> {
    let path = settings_path(config)?;
    let mut settings = Settings::load(&path)?.unwrap_or_default();

    if let Some(repository) = repository {
        settings.repository_path = std::path::absolute(&repository).unwrap_or(repository);
    }
    if catalog.is_some() {
        settings.catalog_path = catalog;
    }

    std::fs::create_dir_all(&settings.repository_path).map_err(|e| ConfigError::Write {
        path: settings.repository_path.clone(),
        reason: e.to_string(),
    })?;
    settings.save(&path)?;

    term.write_line(&format!(
        "{} Settings saved to {}",
        style("✓").green().bold(),
        path.display()
    ))
    .ok();
    term.write_line(&format!(
        "  repository: {}",
        style(settings.repository_path.display()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  catalog:    {}",
        style(settings.catalog_path().display()).cyan()
    ))
    .ok();

    Ok(ExitCode::SUCCESS)
}

/// Open the catalog for an import.
///
/// A dry run never creates a database: it reads an existing one or
/// starts from an empty in-memory catalog.
fn open_catalog(path: &Path, dry_run: bool) -> Result<Box<dyn CatalogBackend>> {
    if dry_run && !path.exists() {
        debug!(path = %path.display(), "no catalog yet, dry run uses an empty one");
        return Ok(Box::new(InMemoryCatalog::new()));
    }
    Ok(Box::new(SqliteCatalog::open(path)?))
}

fn run_import(
    term: &Term,
    config: Option<PathBuf>,
    args: ImportArgs,
    verbose: bool,
) -> Result<ExitCode> {
    let settings = resolve_settings(config, args.repository.clone())?;

    let builder = Importer::builder()
        .source(&args.path)
        .repository(&settings.repository_path)
        .visibility(args.visibility)
        .tags(args.tags)
        .mode(args.mode)
        .keep_path(args.keep_path)
        .keep_name(args.keep_name)
        .exclude_files(args.exclude)
        .exclude_dirs(args.exclude_dir)
        .dry_run(args.dry);

    // Bad arguments must not leave a fresh repository or catalog behind
    builder.validate()?;
    let catalog = open_catalog(&settings.catalog_path(), args.dry)?;
    let importer = builder.catalog(catalog).build()?;

    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("photostat").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} -> {}{}",
            args.path.display(),
            importer.repository().display(),
            if args.dry {
                style(" (dry run)").yellow().to_string()
            } else {
                String::new()
            }
        ))
        .ok();
        term.write_line("").ok();
    }

    // Ctrl-C stops the run between two files
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let (sender, receiver) = EventChannel::bounded(1024);

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if !verbose {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Scan(ScanEvent::Error { path, message }) => {
                    pb.println(format!(
                        "{} {}: {}",
                        style("!").yellow(),
                        path.display(),
                        message
                    ));
                }
                Event::Import(ImportEvent::Progress(p)) => {
                    pb.set_position(p.processed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Import(ImportEvent::Error { path, message }) => {
                    pb.println(format!(
                        "{} {}: {}",
                        style("✗").red(),
                        path.display(),
                        message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled { .. })
                | Event::Pipeline(PipelineEvent::NothingToDo)
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the import
    let result = importer.run_with_events(&sender, &cancel);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;

    match args.output {
        OutputFormat::Pretty => print_pretty_report(term, &report, verbose),
        OutputFormat::Json => print_json(&report),
    }

    Ok(match report.status {
        ImportStatus::Completed | ImportStatus::NothingToDo => ExitCode::SUCCESS,
        ImportStatus::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
    })
}

fn print_pretty_report(term: &Term, report: &ImportReport, verbose: bool) {
    match report.status {
        ImportStatus::NothingToDo => {
            term.write_line(" - nothing to do").ok();
            return;
        }
        ImportStatus::Interrupted => {
            term.write_line(&format!(
                "{} interrupted by user ({} of {} files processed)",
                style("!").yellow().bold(),
                report.processed,
                report.total_files
            ))
            .ok();
        }
        ImportStatus::Completed => {
            let title = if report.dry_run {
                "Dry Run Complete"
            } else {
                "Import Complete"
            };
            term.write_line(&format!("{} {}", style("✓").green().bold(), title))
                .ok();
        }
    }
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} files processed in {:.1}s",
        style(report.processed).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} new items cataloged",
        style(report.imported).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} already in the catalog",
        style(report.duplicates).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} files placed in the repository",
        style(report.materialized).cyan()
    ))
    .ok();

    if report.already_present > 0 {
        term.write_line(&format!(
            "  {} already in place",
            style(report.already_present).dim()
        ))
        .ok();
    }
    if report.tags_added > 0 {
        term.write_line(&format!("  {} tags added", style(report.tags_added).dim()))
            .ok();
    }

    if !report.warnings.is_empty() {
        term.write_line(&format!(
            "  {} warnings",
            style(report.warnings.len()).yellow()
        ))
        .ok();
        if verbose {
            for warning in &report.warnings {
                term.write_line(&format!("    {}", style(warning).dim())).ok();
            }
        }
    }

    if !report.errors.is_empty() {
        term.write_line(&format!(
            "  {} files skipped because of errors",
            style(report.errors.len()).red()
        ))
        .ok();
        for error in &report.errors {
            term.write_line(&format!("    {}", error)).ok();
        }
    }

    if report.dry_run {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("Dry run: the catalog and repository were not changed.").dim()
        ))
        .ok();
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Could not serialize output: {}", e),
    }
}

fn run_stats(
    term: &Term,
    config: Option<PathBuf>,
    repository: Option<PathBuf>,
    output: OutputFormat,
) -> Result<ExitCode> {
    let settings = resolve_settings(config, repository)?;
    let catalog_path = settings.catalog_path();

    let stats = if catalog_path.exists() {
        SqliteCatalog::open(&catalog_path)?.stats()?
    } else {
        CatalogStats::default()
    };

    match output {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Pretty => {
            term.write_line(&format!(
                "{} {}",
                style("Catalog").bold(),
                style(catalog_path.display()).dim()
            ))
            .ok();
            term.write_line(&format!(
                "  {} items",
                style(stats.total_entries).cyan()
            ))
            .ok();
            term.write_line(&format!(
                "  {} tags ({} distinct)",
                style(stats.total_tags).cyan(),
                stats.distinct_tags
            ))
            .ok();
        }
    }

    Ok(ExitCode::SUCCESS)
}
