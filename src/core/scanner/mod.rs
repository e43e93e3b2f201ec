//! # Scanner Module
//!
//! Discovers importable media files under a source directory.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg) - imported as `jpg`
//! - QuickTime (.mov) - imported as `mov`
//!
//! Extensions are matched case-insensitively. Files and directories can be
//! excluded with lists of regular expressions matched against the absolute
//! path; an excluded directory is pruned before the walk descends into it.
//!
//! ## Example
//! ```rust,ignore
//! use photostat::core::scanner::{MediaScanner, ScanConfig, WalkDirScanner};
//!
//! let config = ScanConfig {
//!     exclude_dirs: vec!["/\\.thumbnails$".into()],
//!     ..Default::default()
//! };
//! let scanner = WalkDirScanner::new(config)?;
//! let result = scanner.scan(Path::new("/Volumes/CARD/DCIM"))?;
//! ```

mod filter;
mod walker;

pub use filter::{MediaFilter, PatternSet};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::{CatalogError, ScanError};
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of media the repository stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image (JPEG)
    Jpg,
    /// Movie (QuickTime)
    Mov,
}

impl MediaType {
    /// Detect media type from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpg),
            "mov" => Some(MediaType::Mov),
            _ => None,
        }
    }

    /// Detect media type from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension used in UIDs and the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpg => "jpg",
            MediaType::Mov => "mov",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Jpg)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" => Ok(MediaType::Jpg),
            "mov" => Ok(MediaType::Mov),
            other => Err(CatalogError::InvalidRow {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Absolute paths of files to import, in walk order
    pub files: Vec<PathBuf>,
    /// Directories skipped because they matched an exclusion pattern
    pub excluded_dirs: usize,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for media scanners
pub trait MediaScanner: Send + Sync {
    /// Walk `root` and return the files to import
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// Walk `root`, reporting what was found via events
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}
