//! # Core Module
//!
//! The front-end-agnostic import engine.
//!
//! ## Modules
//! - `scanner` - Walks the source tree and filters candidate files
//! - `fingerprint` - Content digest of a file
//! - `metadata` - Capture time from EXIF or the filesystem
//! - `identity` - UID and repository path of an item
//! - `catalog` - Persists known items and their tags
//! - `materialize` - Copies, moves or links files into the repository
//! - `import` - Orchestrates the full workflow

pub mod catalog;
pub mod fingerprint;
pub mod identity;
pub mod import;
pub mod materialize;
pub mod metadata;
pub mod scanner;

// Re-export commonly used types
pub use catalog::{CatalogBackend, CatalogEntry, Visibility};
pub use fingerprint::Digest;
pub use identity::Identity;
pub use import::{CancellationToken, ImportReport, ImportStatus, Importer};
pub use materialize::MaterializeMode;
pub use scanner::MediaType;
