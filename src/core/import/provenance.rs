//! Where an imported file came from, relative to a user-chosen base.

use std::fs;
use std::path::Path;

const SEPARATORS: &[char] = &['/', '\\'];

/// Directory of `file` relative to `base`, as a string.
///
/// Tries the paths as given and canonicalized, in the order (file, base),
/// (file, canonical base), (canonical file, base), (canonical file,
/// canonical base). The first pair where the file's directory starts with
/// the base wins. Leading and trailing separators are stripped from the
/// remainder, so a file directly inside `base` yields `Some("")`.
///
/// The comparison is on strings: base `/a/b` also matches `/a/bc`.
pub fn relative_origin(file: &Path, base: &Path) -> Option<String> {
    let file_dir = file.parent().unwrap_or(file);
    let canonical_dir = fs::canonicalize(file_dir).ok();
    let canonical_base = fs::canonicalize(base).ok();

    let dirs = [Some(file_dir.to_path_buf()), canonical_dir];
    let bases = [Some(base.to_path_buf()), canonical_base];

    dirs.iter()
        .flatten()
        .flat_map(|dir| bases.iter().flatten().map(move |base| (dir, base)))
        .find_map(|(dir, base)| {
            let dir = dir.to_string_lossy();
            let base = base.to_string_lossy();
            dir.strip_prefix(&*base)
                .map(|rest| rest.trim_matches(SEPARATORS).to_string())
        })
}

/// Base name of the source file
pub fn original_name(file: &Path) -> Option<String> {
    file.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn nested_directory_is_relative_to_base() {
        let origin = relative_origin(
            Path::new("/media/card/DCIM/holiday/day1/IMG_1.JPG"),
            Path::new("/media/card/DCIM"),
        );
        assert_eq!(origin.as_deref(), Some("holiday/day1"));
    }

    #[test]
    fn trailing_separator_on_base_is_ignored() {
        let origin = relative_origin(
            Path::new("/media/card/DCIM/holiday/IMG_1.JPG"),
            Path::new("/media/card/DCIM/"),
        );
        assert_eq!(origin.as_deref(), Some("holiday"));
    }

    #[test]
    fn file_directly_in_base_gives_empty_path() {
        let origin = relative_origin(Path::new("/media/card/IMG_1.JPG"), Path::new("/media/card"));
        assert_eq!(origin.as_deref(), Some(""));
    }

    #[test]
    fn unrelated_base_gives_none() {
        let origin = relative_origin(Path::new("/media/card/IMG_1.JPG"), Path::new("/home/user"));
        assert!(origin.is_none());
    }

    #[test]
    fn prefix_match_is_string_based() {
        let origin = relative_origin(Path::new("/data/photos2/a/IMG.JPG"), Path::new("/data/photos"));
        assert_eq!(origin.as_deref(), Some("2/a"));
    }

    #[cfg(unix)]
    #[test]
    fn canonical_paths_are_tried() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        std::fs::create_dir_all(real.join("trip")).unwrap();
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        // File seen through the symlink, base given as the real directory
        let file: PathBuf = alias.join("trip").join("IMG_1.JPG");
        let base = std::fs::canonicalize(&real).unwrap();
        assert_eq!(relative_origin(&file, &base).as_deref(), Some("trip"));
    }

    #[test]
    fn original_name_is_base_name() {
        assert_eq!(
            original_name(Path::new("/a/b/IMG_0001.JPG")).as_deref(),
            Some("IMG_0001.JPG")
        );
    }
}
