//! Import execution implementation.

use super::provenance::{original_name, relative_origin};
use crate::core::catalog::{CatalogBackend, InMemoryCatalog, NewCatalogEntry, PhotoId, Visibility};
use crate::core::fingerprint::fingerprint;
use crate::core::identity::Identity;
use crate::core::materialize::{MaterializeMode, Materializer, Plan};
use crate::core::metadata::capture_time;
use crate::core::scanner::{MediaScanner, MediaType, ScanConfig, WalkDirScanner};
use crate::error::{FingerprintError, PhotostatError, ProvenanceWarning, ValidationError};
use crate::events::{
    null_sender, Event, EventSender, ImportEvent, ImportPhase, ImportProgress, PipelineEvent,
    PipelineSummary,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Token for cooperative cancellation.
///
/// Clones share the same flag. The import loop checks it before each file,
/// never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How an import run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// Every candidate file was processed
    Completed,
    /// The source tree held no candidate files
    NothingToDo,
    /// Stopped early by a cancellation request
    Interrupted,
}

/// Result of an import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub status: ImportStatus,
    /// Nothing was written to the catalog or the repository
    pub dry_run: bool,
    /// Candidate files found by the scan
    pub total_files: usize,
    /// Files handled before the run ended
    pub processed: usize,
    /// New catalog entries (would-be entries in a dry run)
    pub imported: usize,
    /// Files whose UID was already cataloged
    pub duplicates: usize,
    /// Tags attached to entries
    pub tags_added: usize,
    /// Files copied, moved or linked into the repository
    pub materialized: usize,
    /// Files whose destination already existed
    pub already_present: usize,
    /// Non-fatal warnings (e.g. provenance could not be derived)
    pub warnings: Vec<String>,
    /// Per-file errors; those files were skipped
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ImportReport {
    fn new(dry_run: bool, total_files: usize) -> Self {
        Self {
            status: ImportStatus::Completed,
            dry_run,
            total_files,
            processed: 0,
            imported: 0,
            duplicates: 0,
            tags_added: 0,
            materialized: 0,
            already_present: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            processed: self.processed,
            imported: self.imported,
            duplicates: self.duplicates,
            materialized: self.materialized,
            duration_ms: self.duration_ms,
        }
    }
}

/// Configuration for an import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Directory tree to import from
    pub source: PathBuf,
    /// Repository root
    pub repository: Option<PathBuf>,
    pub visibility: Visibility,
    /// Tags attached to every imported item
    pub tags: Vec<String>,
    pub mode: MaterializeMode,
    /// Record each file's directory relative to this base
    pub keep_path: Option<PathBuf>,
    /// Record each file's original name
    pub keep_name: bool,
    /// Scanner configuration (exclusion patterns)
    pub scan_config: ScanConfig,
    /// Look everything up but write nothing
    pub dry_run: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            repository: None,
            visibility: Visibility::Private,
            tags: Vec::new(),
            mode: MaterializeMode::Copy,
            keep_path: None,
            keep_name: false,
            scan_config: ScanConfig::default(),
            dry_run: false,
        }
    }
}

/// Builder for import configuration
pub struct ImporterBuilder {
    config: ImportConfig,
    materializer: Option<Materializer>,
    catalog: Option<Box<dyn CatalogBackend>>,
}

impl ImporterBuilder {
    /// Create a new importer builder
    pub fn new() -> Self {
        Self {
            config: ImportConfig::default(),
            materializer: None,
            catalog: None,
        }
    }

    /// Set the directory to import from
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Set the repository root
    pub fn repository(mut self, repository: impl Into<PathBuf>) -> Self {
        self.config.repository = Some(repository.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.config.visibility = visibility;
        self
    }

    /// Tags to attach; blank names are dropped
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags = tags
            .into_iter()
            .map(Into::into)
            .map(|tag: String| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    pub fn mode(mut self, mode: MaterializeMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn keep_path(mut self, base: Option<PathBuf>) -> Self {
        self.config.keep_path = base;
        self
    }

    pub fn keep_name(mut self, keep: bool) -> Self {
        self.config.keep_name = keep;
        self
    }

    /// Patterns for files to leave out
    pub fn exclude_files(mut self, patterns: Vec<String>) -> Self {
        self.config.scan_config.exclude_files = patterns;
        self
    }

    /// Patterns for directories to prune
    pub fn exclude_dirs(mut self, patterns: Vec<String>) -> Self {
        self.config.scan_config.exclude_dirs = patterns;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set the catalog backend
    pub fn catalog(mut self, catalog: Box<dyn CatalogBackend>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use a specific materializer instead of one built from the mode
    #[cfg(test)]
    pub(crate) fn materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = Some(materializer);
        self
    }

    /// Check the configuration without building anything.
    ///
    /// [`ImporterBuilder::build`] runs the same checks; call this first when
    /// opening the catalog has side effects.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check().map(|_| ())
    }

    fn check(&self) -> Result<(PathBuf, WalkDirScanner), ValidationError> {
        let config = &self.config;

        if !config.source.is_dir() {
            return Err(ValidationError::SourceNotDirectory {
                path: config.source.clone(),
            });
        }

        let repository = config
            .repository
            .clone()
            .ok_or(ValidationError::MissingRepository)?;
        let repository = std::path::absolute(&repository).unwrap_or(repository);

        let scanner = WalkDirScanner::new(config.scan_config.clone())?;
        Ok((repository, scanner))
    }

    /// Validate the configuration and build the importer
    pub fn build(self) -> Result<Importer, ValidationError> {
        let (repository, scanner) = self.check()?;
        let config = self.config;

        Ok(Importer {
            repository,
            scanner,
            materializer: self
                .materializer
                .unwrap_or_else(|| Materializer::new(config.mode)),
            catalog: self
                .catalog
                .unwrap_or_else(|| Box::new(InMemoryCatalog::new())),
            config,
        })
    }
}

impl Default for ImporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Imports a directory tree into the repository and catalog
pub struct Importer {
    config: ImportConfig,
    repository: PathBuf,
    scanner: WalkDirScanner,
    materializer: Materializer,
    catalog: Box<dyn CatalogBackend>,
}

/// What happened to one file
enum FileOutcome {
    Done,
    Skipped(String),
}

/// Catalog entry that tags are attached to
#[derive(Clone, Copy)]
enum TagTarget {
    Stored(PhotoId),
    /// Would be created by this dry run
    New,
    /// Already counted earlier in this dry run
    Planned,
}

/// What a dry run would have written so far
#[derive(Default)]
struct DryRunLedger {
    uids: HashSet<String>,
    destinations: HashSet<PathBuf>,
}

impl Importer {
    /// Create a new importer builder
    pub fn builder() -> ImporterBuilder {
        ImporterBuilder::new()
    }

    /// Absolute repository root
    pub fn repository(&self) -> &Path {
        &self.repository
    }

    /// The catalog this importer writes to
    pub fn catalog(&self) -> &dyn CatalogBackend {
        self.catalog.as_ref()
    }

    /// Run the import without events or cancellation
    pub fn run(&self) -> Result<ImportReport, PhotostatError> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run the import with event reporting and cooperative cancellation
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, PhotostatError> {
        let result = self.execute(events, cancel);
        if let Err(e) = &result {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, PhotostatError> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: ImportPhase::Idle,
        }));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: ImportPhase::Scanning,
        }));

        let scan_result = self
            .scanner
            .scan_with_events(&self.config.source, events)?;
        let files = scan_result.files;

        let mut report = ImportReport::new(self.config.dry_run, files.len());
        report
            .errors
            .extend(scan_result.errors.iter().map(|e| e.to_string()));

        if files.is_empty() {
            report.status = ImportStatus::NothingToDo;
            report.duration_ms = start_time.elapsed().as_millis() as u64;
            info!(source = %self.config.source.display(), "nothing to do");
            events.send(Event::Pipeline(PipelineEvent::NothingToDo));
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: ImportPhase::Completed,
            }));
            return Ok(report);
        }

        if !self.config.dry_run {
            self.materializer.ensure_link_support(&self.repository)?;
        }

        // Phase 2: Importing, one file at a time
        let mut ledger = DryRunLedger::default();
        events.send(Event::Import(ImportEvent::Started {
            total_files: files.len(),
        }));

        for (index, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                report.status = ImportStatus::Interrupted;
                break;
            }

            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: ImportPhase::Importing { index },
            }));

            if let FileOutcome::Skipped(message) = self.import_file(path, events, &mut report, &mut ledger)? {
                warn!(path = %path.display(), "{}", message);
                events.send(Event::Import(ImportEvent::Error {
                    path: path.clone(),
                    message: message.clone(),
                }));
                report.errors.push(format!("{}: {}", path.display(), message));
            }

            report.processed += 1;
            events.send(Event::Import(ImportEvent::Progress(ImportProgress {
                processed: report.processed,
                total: report.total_files,
                current_path: path.clone(),
            })));
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;

        if report.status == ImportStatus::Interrupted {
            info!(
                processed = report.processed,
                total = report.total_files,
                "import interrupted"
            );
            events.send(Event::Pipeline(PipelineEvent::Cancelled {
                processed: report.processed,
                total: report.total_files,
            }));
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: ImportPhase::Interrupted,
            }));
        } else {
            info!(
                processed = report.processed,
                imported = report.imported,
                duplicates = report.duplicates,
                materialized = report.materialized,
                dry_run = report.dry_run,
                "import completed"
            );
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: ImportPhase::Completed,
            }));
            events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: report.summary(),
            }));
        }

        Ok(report)
    }

    /// Catalog and materialize a single file.
    ///
    /// Per-file problems come back as `FileOutcome::Skipped`; catalog
    /// failures and unsupported links are returned as errors.
    fn import_file(
        &self,
        path: &Path,
        events: &EventSender,
        report: &mut ImportReport,
        ledger: &mut DryRunLedger,
    ) -> Result<FileOutcome, PhotostatError> {
        let Some(media_type) = MediaType::from_path(path) else {
            let err = FingerprintError::UnsupportedMedia {
                path: path.to_path_buf(),
            };
            return Ok(FileOutcome::Skipped(err.to_string()));
        };

        let digest = match fingerprint(path) {
            Ok(digest) => digest,
            Err(e) => return Ok(FileOutcome::Skipped(e.to_string())),
        };
        let captured = match capture_time(path, media_type) {
            Ok(captured) => captured,
            Err(e) => return Ok(FileOutcome::Skipped(e.to_string())),
        };

        let identity = Identity::resolve(captured.at, media_type, &digest);
        debug!(
            path = %path.display(),
            uid = %identity.uid,
            time_source = ?captured.source,
            "resolved identity"
        );

        let known = match self.catalog.find_by_uid(&identity.uid)? {
            Some(id) => Some(TagTarget::Stored(id)),
            None if ledger.uids.contains(&identity.uid) => Some(TagTarget::Planned),
            None => None,
        };

        let target = match known {
            Some(target) => {
                report.duplicates += 1;
                debug!(path = %path.display(), uid = %identity.uid, "already cataloged");
                events.send(Event::Import(ImportEvent::Duplicate {
                    path: path.to_path_buf(),
                    uid: identity.uid.clone(),
                }));
                target
            }
            None => {
                let entry = self.new_entry(path, &identity, events, report);
                let target = if self.config.dry_run {
                    ledger.uids.insert(identity.uid.clone());
                    TagTarget::New
                } else {
                    TagTarget::Stored(self.catalog.insert(&entry)?)
                };
                report.imported += 1;
                events.send(Event::Import(ImportEvent::Cataloged {
                    path: path.to_path_buf(),
                    uid: identity.uid.clone(),
                }));
                target
            }
        };

        self.apply_tags(target, report)?;

        let destination = identity.destination(&self.repository);
        match self.materializer.plan(path, &destination) {
            Plan::Skip(reason) => {
                report.already_present += 1;
                debug!(destination = %destination.display(), ?reason, "already in repository");
            }
            Plan::Needed if self.config.dry_run => {
                if ledger.destinations.insert(destination.clone()) {
                    report.materialized += 1;
                    debug!(destination = %destination.display(), "would materialize");
                } else {
                    report.already_present += 1;
                    debug!(destination = %destination.display(), "would already be in repository");
                }
            }
            Plan::Needed => match self.materializer.materialize(path, &destination) {
                Ok(()) => {
                    report.materialized += 1;
                    debug!(
                        source = %path.display(),
                        destination = %destination.display(),
                        mode = ?self.materializer.mode(),
                        "materialized"
                    );
                    events.send(Event::Import(ImportEvent::Materialized {
                        source: path.to_path_buf(),
                        destination,
                    }));
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => return Ok(FileOutcome::Skipped(e.to_string())),
            },
        }

        Ok(FileOutcome::Done)
    }

    /// Catalog fields for a UID seen for the first time
    fn new_entry(
        &self,
        path: &Path,
        identity: &Identity,
        events: &EventSender,
        report: &mut ImportReport,
    ) -> NewCatalogEntry {
        let original_path = self.config.keep_path.as_deref().and_then(|base| {
            let origin = relative_origin(path, base);
            if origin.is_none() {
                let warning = ProvenanceWarning {
                    path: path.to_path_buf(),
                    base: base.to_path_buf(),
                };
                warn!("{}", warning);
                events.send(Event::Import(ImportEvent::Warning {
                    path: path.to_path_buf(),
                    message: warning.to_string(),
                }));
                report.warnings.push(warning.to_string());
            }
            origin
        });

        let original_name = if self.config.keep_name {
            original_name(path)
        } else {
            None
        };

        NewCatalogEntry {
            uid: identity.uid.clone(),
            media_type: identity.media_type,
            local_path: identity.local_path.clone(),
            visibility: self.config.visibility,
            original_path,
            original_name,
            created_at: identity.captured_at,
        }
    }

    /// Attach the configured tags; in a dry run only count what would change
    fn apply_tags(&self, target: TagTarget, report: &mut ImportReport) -> Result<(), PhotostatError> {
        for tag in &self.config.tags {
            let added = match (target, self.config.dry_run) {
                (TagTarget::Stored(id), false) => self.catalog.ensure_tag(tag, id)?,
                (TagTarget::Stored(id), true) => !self.catalog.tag_exists(tag, id)?,
                (TagTarget::New, _) => true,
                (TagTarget::Planned, _) => false,
            };
            if added {
                report.tags_added += 1;
            }
        }
        Ok(())
    }
}
