//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the import pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source tree walk events
    Scan(ScanEvent),
    /// Per-file import events
    Import(ImportEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A candidate file passed the filters
    FileFound { path: PathBuf },
    /// A directory was pruned by an exclusion pattern
    DirectoryExcluded { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events while importing individual files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Import loop has started
    Started { total_files: usize },
    /// Progress update, sent once per file
    Progress(ImportProgress),
    /// A new catalog entry was created (or would be, in a dry run)
    Cataloged { path: PathBuf, uid: String },
    /// The UID was already in the catalog
    Duplicate { path: PathBuf, uid: String },
    /// The file was placed in the repository
    Materialized { source: PathBuf, destination: PathBuf },
    /// A non-fatal warning for a single file
    Warning { path: PathBuf, message: String },
    /// A file failed and was skipped
    Error { path: PathBuf, message: String },
}

/// Progress information during importing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Number of files processed so far, including the current one
    pub processed: usize,
    /// Total number of candidate files
    pub total: usize,
    /// File being processed
    pub current_path: PathBuf,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: ImportPhase },
    /// There were no candidate files
    NothingToDo,
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was stopped by a cancellation request
    Cancelled { processed: usize, total: usize },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// States of the import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportPhase {
    Idle,
    Scanning,
    Importing { index: usize },
    Completed,
    Interrupted,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Files processed
    pub processed: usize,
    /// New catalog entries
    pub imported: usize,
    /// Files whose UID was already known
    pub duplicates: usize,
    /// Files placed in the repository
    pub materialized: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportPhase::Idle => write!(f, "Idle"),
            ImportPhase::Scanning => write!(f, "Scanning"),
            ImportPhase::Importing { index } => write!(f, "Importing #{}", index + 1),
            ImportPhase::Completed => write!(f, "Completed"),
            ImportPhase::Interrupted => write!(f, "Interrupted"),
        }
    }
}
