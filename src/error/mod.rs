//! # Error Module
//!
//! Error types for the photostat import engine.
//!
//! ## Severity
//! - **Fatal** - `Validation`, `Catalog`, `Config` and `MaterializeError::LinkUnsupported`
//!   abort the whole run
//! - **Per item** - `Scan`, `Fingerprint`, other `MaterializeError`s and
//!   `ProvenanceWarning` are reported and the batch continues
//!
//! Cancellation is not an error; see `ImportStatus::Interrupted`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PhotostatError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Materialization error: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Bad user input, detected before any file is touched
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Source path must be a valid directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Visibility '{value}' is invalid. Choices are: private, protected and public")]
    InvalidVisibility { value: String },

    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No repository path configured. Run `photostat config --repository <DIR>` first")]
    MissingRepository,
}

/// Errors that occur while walking the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while fingerprinting or dating a file
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Digest '{digest}' is not at least 6 hex characters")]
    InvalidDigest { digest: String },

    #[error("Unsupported media file: {path}")]
    UnsupportedMedia { path: PathBuf },
}

/// Errors from the catalog store
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Catalog query failed: {0}")]
    QueryFailed(String),

    #[error("Catalog lock poisoned at {path}")]
    Poisoned { path: PathBuf },

    #[error("Catalog row has an unknown {field}: {value}")]
    InvalidRow { field: &'static str, value: String },
}

/// Errors that occur while placing a file in the repository
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("symlink is not supported in {path} ({reason}); --link cannot be used")]
    LinkUnsupported { path: PathBuf, reason: String },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to place {source_path} at {destination}: {source}")]
    Io {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MaterializeError {
    /// Whether this error must stop the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, MaterializeError::LinkUnsupported { .. })
    }
}

/// Errors loading or saving the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory for this platform")]
    NoConfigDir,

    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write config {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// The source file's directory could not be expressed relative to the base
#[derive(Error, Debug, Clone)]
#[error("Could not build relative path of {path} from {base}")]
pub struct ProvenanceWarning {
    pub path: PathBuf,
    pub base: PathBuf,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotostatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_visibility_choices() {
        let error = ValidationError::InvalidVisibility {
            value: "secret".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("secret"));
        assert!(message.contains("private, protected and public"));
    }

    #[test]
    fn fingerprint_error_includes_path() {
        let error = FingerprintError::Read {
            path: PathBuf::from("/photos/broken.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.to_string().contains("/photos/broken.jpg"));
    }

    #[test]
    fn only_link_unsupported_is_fatal() {
        let unsupported = MaterializeError::LinkUnsupported {
            path: PathBuf::from("/repo"),
            reason: "operation not permitted".to_string(),
        };
        let io = MaterializeError::Io {
            source_path: PathBuf::from("/a.jpg"),
            destination: PathBuf::from("/repo/a.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(unsupported.is_fatal());
        assert!(!io.is_fatal());
        assert!(unsupported.to_string().contains("--link cannot be used"));
    }

    #[test]
    fn provenance_warning_names_both_paths() {
        let warning = ProvenanceWarning {
            path: PathBuf::from("/src/a/IMG_1.JPG"),
            base: PathBuf::from("/elsewhere"),
        };
        let message = warning.to_string();
        assert!(message.contains("/src/a/IMG_1.JPG"));
        assert!(message.contains("/elsewhere"));
    }
}
