//! Directory walking implementation using walkdir.

use super::{filter::MediaFilter, MediaScanner, ScanResult};
use crate::error::{ScanError, ValidationError};
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links to directories
    pub follow_symlinks: bool,
    /// Patterns for files to leave out
    pub exclude_files: Vec<String>,
    /// Patterns for directories to prune
    pub exclude_dirs: Vec<String>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: MediaFilter,
}

impl WalkDirScanner {
    /// Create a new scanner, compiling the exclusion patterns
    pub fn new(config: ScanConfig) -> Result<Self, ValidationError> {
        let filter = MediaFilter::new()
            .with_excluded_files(&config.exclude_files)?
            .with_excluded_dirs(&config.exclude_dirs)?;

        Ok(Self { config, filter })
    }

    fn walk(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let root = std::path::absolute(root).map_err(|e| ScanError::ReadDirectory {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut excluded_dirs = 0;

        let walker = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // The root is always walked, even if it matches
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                if self.filter.should_descend(entry.path()) {
                    return true;
                }
                debug!(path = %entry.path().display(), "pruning excluded directory");
                events.send(Event::Scan(ScanEvent::DirectoryExcluded {
                    path: entry.path().to_path_buf(),
                }));
                excluded_dirs += 1;
                false
            });

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    // Symlinked files count when they point at a file
                    if entry.file_type().is_dir() || !path.is_file() {
                        continue;
                    }

                    if !self.filter.should_include(path) {
                        continue;
                    }

                    events.send(Event::Scan(ScanEvent::FileFound {
                        path: path.to_path_buf(),
                    }));
                    files.push(path.to_path_buf());
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), error = %error, "skipping unreadable entry");
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));

                    errors.push(error);
                }
            }
        }

        Ok(ScanResult {
            files,
            excluded_dirs,
            errors,
        })
    }
}

impl MediaScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: PathBuf::from(root),
        }));

        let result = self.walk(root, events)?;

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: result.files.len(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_media(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(&path).unwrap();
        // Minimal JPEG header
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn names(result: &ScanResult, root: &Path) -> Vec<String> {
        let root = std::path::absolute(root).unwrap();
        result
            .files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();

        let result = scanner.scan(temp_dir.path()).unwrap();

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_returns_absolute_paths_in_lexicographic_order() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "b/IMG_0002.JPG");
        create_media(temp_dir.path(), "a/IMG_0003.jpg");
        create_media(temp_dir.path(), "a/IMG_0001.jpeg");
        create_media(temp_dir.path(), "clip.mov");

        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert!(result.files.iter().all(|p| p.is_absolute()));
        assert_eq!(
            names(&result, temp_dir.path()),
            vec!["a/IMG_0001.jpeg", "a/IMG_0003.jpg", "b/IMG_0002.JPG", "clip.mov"]
        );
    }

    #[test]
    fn scan_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["z.jpg", "m/1.jpg", "m/0.mov", "a.jpg"] {
            create_media(temp_dir.path(), name);
        }
        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();

        let first = scanner.scan(temp_dir.path()).unwrap();
        let second = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(first.files, second.files);
    }

    #[test]
    fn scan_skips_unsupported_files() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "photo.jpg");
        File::create(temp_dir.path().join("notes.txt")).unwrap();
        File::create(temp_dir.path().join("photo.png")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(names(&result, temp_dir.path()), vec!["photo.jpg"]);
    }

    #[test]
    fn excluded_directory_is_never_visited() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "keep/IMG_1.jpg");
        create_media(temp_dir.path(), "trash/IMG_2.jpg");
        create_media(temp_dir.path(), "trash/deep/IMG_3.jpg");

        let config = ScanConfig {
            exclude_dirs: vec!["trash$".to_string()],
            ..Default::default()
        };
        let scanner = WalkDirScanner::new(config).unwrap();
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(names(&result, temp_dir.path()), vec!["keep/IMG_1.jpg"]);
        assert_eq!(result.excluded_dirs, 1);
    }

    #[test]
    fn excluded_files_are_left_out() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "IMG_1.jpg");
        create_media(temp_dir.path(), "IMG_1-edited.jpg");

        let config = ScanConfig {
            exclude_files: vec!["-edited".to_string()],
            ..Default::default()
        };
        let scanner = WalkDirScanner::new(config).unwrap();
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(names(&result, temp_dir.path()), vec!["IMG_1.jpg"]);
    }

    #[test]
    fn root_matching_directory_pattern_is_still_walked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("trash");
        create_media(&root, "IMG_1.jpg");

        let config = ScanConfig {
            exclude_dirs: vec!["trash$".to_string()],
            ..Default::default()
        };
        let scanner = WalkDirScanner::new(config).unwrap();
        let result = scanner.scan(&root).unwrap();

        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_rejected_up_front() {
        let config = ScanConfig {
            exclude_files: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(WalkDirScanner::new(config).is_err());
    }

    #[test]
    fn scan_nonexistent_directory_returns_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();
        let result = scanner.scan(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_reported_and_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "ok/IMG_1.jpg");
        let locked = temp_dir.path().join("locked");
        create_media(&locked, "IMG_2.jpg");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits, nothing to observe
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let scanner = WalkDirScanner::new(ScanConfig::default()).unwrap();
        let result = scanner.scan(temp_dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(names(&result, temp_dir.path()), vec!["ok/IMG_1.jpg"]);
        assert_eq!(result.errors.len(), 1);
    }
}
