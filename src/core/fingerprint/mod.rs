//! # Fingerprint Module
//!
//! Content digests for disambiguating files that share a capture second.
//!
//! Only the head of the file is read (see [`PREFIX_SIZE`]); the file length
//! is mixed in so truncated copies don't collide with the original. UIDs use
//! just the first 6 hex characters, so two different files can end up with
//! the same UID. They are then treated as the same photo.

use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Bytes read from the start of each file (64KB)
pub const PREFIX_SIZE: u64 = 64 * 1024;

/// Number of digest characters that go into a UID
pub const UID_DIGEST_LEN: usize = 6;

/// A 128-bit content digest rendered as 32 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(String);

impl Digest {
    /// Wrap an existing hex digest, e.g. one stored elsewhere
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, FingerprintError> {
        let hex = hex.into().to_lowercase();
        if hex.len() < UID_DIGEST_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FingerprintError::InvalidDigest { digest: hex });
        }
        Ok(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The prefix used in UIDs
    pub fn short(&self) -> &str {
        &self.0[..UID_DIGEST_LEN]
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the partial-content digest of a file.
pub fn fingerprint(path: &Path) -> Result<Digest, FingerprintError> {
    let read_error = |e| FingerprintError::Read {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();

    let mut buffer = Vec::with_capacity(PREFIX_SIZE.min(len) as usize);
    file.take(PREFIX_SIZE)
        .read_to_end(&mut buffer)
        .map_err(read_error)?;

    Ok(digest_head(&buffer, len))
}

/// Digest of a file's leading bytes and its total length
pub(crate) fn digest_head(head: &[u8], len: u64) -> Digest {
    let mut hasher = Xxh3::new();
    hasher.update(head);
    hasher.update(&len.to_le_bytes());
    Digest(format!("{:032x}", hasher.digest128()))
}
