//! # Materialize Module
//!
//! Puts a source file at its repository path by copying, moving or
//! symlinking it. Existing destinations are never overwritten.

use crate::error::MaterializeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a file reaches the repository
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaterializeMode {
    /// Copy files to the repository (keep originals)
    #[default]
    Copy,
    /// Move files to the repository
    Move,
    /// Symlink repository paths to the originals
    Link,
}

impl MaterializeMode {
    /// Pick a mode from the `--move`/`--link` flags. Link wins.
    pub fn from_flags(move_files: bool, link: bool) -> Self {
        if link {
            MaterializeMode::Link
        } else if move_files {
            MaterializeMode::Move
        } else {
            MaterializeMode::Copy
        }
    }
}

/// Why nothing needs to be done for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Something is already at the destination
    AlreadyExists,
    /// The source already is the destination
    SameFile,
}

/// Outcome of the no-op checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Skip(SkipReason),
    Needed,
}

/// Creates a symlink at `link` pointing to `target`
pub(crate) type LinkFn = fn(&Path, &Path) -> io::Result<()>;

/// Places files in the repository
#[derive(Clone, Copy)]
pub struct Materializer {
    mode: MaterializeMode,
    link: LinkFn,
}

impl std::fmt::Debug for Materializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer").field("mode", &self.mode).finish()
    }
}

impl Materializer {
    pub fn new(mode: MaterializeMode) -> Self {
        Self {
            mode,
            link: symlink,
        }
    }

    /// Materializer whose symlinks are made by `link`
    #[cfg(test)]
    pub(crate) fn with_link(mode: MaterializeMode, link: LinkFn) -> Self {
        Self { mode, link }
    }

    pub fn mode(&self) -> MaterializeMode {
        self.mode
    }

    /// Run the no-op checks without touching the filesystem
    pub fn plan(&self, source: &Path, destination: &Path) -> Plan {
        // symlink_metadata so a dangling link still counts as occupied
        if fs::symlink_metadata(destination).is_ok() {
            return Plan::Skip(SkipReason::AlreadyExists);
        }
        if same_file(source, destination) {
            return Plan::Skip(SkipReason::SameFile);
        }
        Plan::Needed
    }

    /// Check once, before a batch, that symlinks can be created in `repository`.
    ///
    /// Only does anything in link mode.
    pub fn ensure_link_support(&self, repository: &Path) -> Result<(), MaterializeError> {
        if self.mode != MaterializeMode::Link {
            return Ok(());
        }

        fs::create_dir_all(repository).map_err(|e| MaterializeError::CreateDir {
            path: repository.to_path_buf(),
            source: e,
        })?;

        let probe = repository.join(format!(".photostat-link-probe-{}", std::process::id()));
        let _ = fs::remove_file(&probe);

        (self.link)(repository, &probe).map_err(|e| {
            if link_unsupported(&e) {
                MaterializeError::LinkUnsupported {
                    path: repository.to_path_buf(),
                    reason: e.to_string(),
                }
            } else {
                MaterializeError::Io {
                    source_path: repository.to_path_buf(),
                    destination: probe.clone(),
                    source: e,
                }
            }
        })?;
        let _ = fs::remove_file(&probe);

        debug!(repository = %repository.display(), "symlinks supported");
        Ok(())
    }

    /// Make `destination` exist with the content of `source`.
    ///
    /// Callers should check [`Materializer::plan`] first; this refuses to
    /// overwrite and fails if `destination` exists.
    pub fn materialize(&self, source: &Path, destination: &Path) -> Result<(), MaterializeError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| MaterializeError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let io_error = |e| MaterializeError::Io {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source: e,
        };

        match self.mode {
            MaterializeMode::Copy => copy_new(source, destination).map_err(io_error),
            MaterializeMode::Move => move_file(source, destination).map_err(io_error),
            MaterializeMode::Link => {
                let target = fs::canonicalize(source).map_err(io_error)?;
                (self.link)(&target, destination).map_err(|e| {
                    if link_unsupported(&e) {
                        MaterializeError::LinkUnsupported {
                            path: destination.to_path_buf(),
                            reason: e.to_string(),
                        }
                    } else {
                        io_error(e)
                    }
                })
            }
        }
    }
}

/// OS error a symlink call fails with when the filesystem or account
/// cannot create links: EPERM on unix, ERROR_PRIVILEGE_NOT_HELD on Windows
#[cfg(unix)]
const LINK_NOT_PERMITTED: Option<i32> = Some(1);
#[cfg(windows)]
const LINK_NOT_PERMITTED: Option<i32> = Some(1314);
#[cfg(not(any(unix, windows)))]
const LINK_NOT_PERMITTED: Option<i32> = None;

/// Whether a failed symlink means links cannot be made here at all.
///
/// `PermissionDenied` alone is not enough: on unix it also covers EACCES,
/// which is an ordinary per-file permission problem.
fn link_unsupported(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Unsupported
        || (LINK_NOT_PERMITTED.is_some() && e.raw_os_error() == LINK_NOT_PERMITTED)
}

/// Whether two paths name the same file
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => absolute(a) == absolute(b),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Copy without ever replacing an existing destination
fn copy_new(source: &Path, destination: &Path) -> io::Result<()> {
    let mut from = fs::File::open(source)?;
    let mut to = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut from, &mut to).and_then(|_| to.sync_all());
    if let Err(e) = copied {
        drop(to);
        let _ = fs::remove_file(destination);
        return Err(e);
    }

    if let Ok(metadata) = from.metadata() {
        let _ = to.set_permissions(metadata.permissions());
        if let Ok(modified) = metadata.modified() {
            let _ = to.set_modified(modified);
        }
    }
    Ok(())
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    fs::rename(source, destination).or_else(|_| {
        // rename fails across filesystems, fall back to copy+delete
        // with size verification before deleting source
        let source_size = fs::metadata(source)?.len();
        copy_new(source, destination)?;

        let dest_size = fs::metadata(destination)?.len();
        if dest_size != source_size {
            let _ = fs::remove_file(destination);
            return Err(io::Error::other(format!(
                "Copy verification failed: source {} bytes, dest {} bytes",
                source_size, dest_size
            )));
        }

        fs::remove_file(source)
    })
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not available on this platform",
    ))
}
