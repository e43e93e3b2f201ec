//! # Catalog Module
//!
//! Persistent record of every item in the repository and its tags.
//!
//! The import engine only talks to the catalog through [`CatalogBackend`]:
//! look up by UID, insert, check for a tag, add a tag. Each call stands on
//! its own; nothing relies on a transaction spanning calls.
//!
//! ## Backends
//! - `SqliteCatalog` - Persistent storage using SQLite
//! - `InMemoryCatalog` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;
pub use traits::CatalogBackend;

use crate::core::scanner::MediaType;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Row id of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhotoId(pub i64);

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who may see an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "protected" => Ok(Visibility::Protected),
            "public" => Ok(Visibility::Public),
            other => Err(ValidationError::InvalidVisibility {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied when an item is first cataloged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub uid: String,
    pub media_type: MediaType,
    pub local_path: String,
    pub visibility: Visibility,
    /// Source directory relative to the `--keeppath` base
    pub original_path: Option<String>,
    /// Source file name
    pub original_name: Option<String>,
    /// Capture time, UTC
    pub created_at: DateTime<Utc>,
}

/// A stored catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: PhotoId,
    pub uid: String,
    pub media_type: MediaType,
    pub local_path: String,
    pub visibility: Visibility,
    pub original_path: Option<String>,
    pub original_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Reserved for an upload collaborator; import never sets it
    pub upload_flag: bool,
}

impl CatalogEntry {
    fn from_new(id: PhotoId, entry: &NewCatalogEntry) -> Self {
        Self {
            id,
            uid: entry.uid.clone(),
            media_type: entry.media_type,
            local_path: entry.local_path.clone(),
            visibility: entry.visibility,
            original_path: entry.original_path.clone(),
            original_name: entry.original_name.clone(),
            created_at: entry.created_at,
            upload_flag: false,
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Number of cataloged items
    pub total_entries: usize,
    /// Number of (tag, item) pairs
    pub total_tags: usize,
    /// Number of distinct tag names
    pub distinct_tags: usize,
}
