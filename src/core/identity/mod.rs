//! # Identity Module
//!
//! Derives the UID and repository location of a media file.
//!
//! ```text
//! uid        = 20230501100000-abc123.jpg
//!              |              |      '-- media type
//!              |              '-- first 6 digest chars
//!              '-- capture time, UTC
//! local_path = 2023-05/20230501100000-abc123.jpg   (images)
//!              movies/20230501100000-abc123.mov    (movies)
//! ```
//!
//! Resolution is pure: the same (time, digest, type) always gives the same
//! identity, whatever the local timezone.

use crate::core::fingerprint::Digest;
use crate::core::scanner::MediaType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bucket that holds every movie
pub const MOVIES_BUCKET: &str = "movies";

/// Where a media file lives in the repository and how the catalog knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub media_type: MediaType,
    pub bucket: String,
    /// `<bucket>/<uid>`, always `/`-separated
    pub local_path: String,
    pub captured_at: DateTime<Utc>,
}

impl Identity {
    /// Compute the identity for a capture time, media type and digest
    pub fn resolve(captured_at: DateTime<Utc>, media_type: MediaType, digest: &Digest) -> Self {
        let uid = format!(
            "{}-{}.{}",
            captured_at.format("%Y%m%d%H%M%S"),
            digest.short(),
            media_type.as_str()
        );

        let bucket = if media_type.is_image() {
            captured_at.format("%Y-%m").to_string()
        } else {
            MOVIES_BUCKET.to_string()
        };

        let local_path = format!("{}/{}", bucket, uid);

        Self {
            uid,
            media_type,
            bucket,
            local_path,
            captured_at,
        }
    }

    /// Directory inside `repository` that holds this item
    pub fn destination_dir(&self, repository: &Path) -> PathBuf {
        repository.join(&self.bucket)
    }

    /// Full destination path inside `repository`
    pub fn destination(&self, repository: &Path) -> PathBuf {
        self.destination_dir(repository).join(&self.uid)
    }
}
