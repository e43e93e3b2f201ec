//! Tests that run the `photostat` binary.
//!
//! Argument errors must be reported before the repository or its catalog
//! is created.

use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::{Command, Output};

fn photostat(config_home: &assert_fs::TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_photostat"))
        .args(args)
        .env("RUST_LOG", "off")
        .env("HOME", config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path())
        .output()
        .unwrap()
}

fn path_str(path: &std::path::Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn missing_source_creates_no_repository() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("newrepo");
    let missing = temp.child("nonexistent/src");

    let output = photostat(
        &temp,
        &[
            "import",
            "-p",
            path_str(missing.path()),
            "--visibility",
            "private",
            "--repository",
            path_str(repo.path()),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Source path must be a valid directory"));
    repo.assert(predicate::path::missing());
}

#[test]
fn bad_pattern_creates_no_catalog() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("src");
    source.create_dir_all().unwrap();
    let repo = temp.child("repo");
    repo.create_dir_all().unwrap();

    let output = photostat(
        &temp,
        &[
            "import",
            "-p",
            path_str(source.path()),
            "--visibility",
            "private",
            "--excludedir",
            "(",
            "--repository",
            path_str(repo.path()),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid exclusion pattern"));
    repo.child(".photostat").assert(predicate::path::missing());
}

#[test]
fn dry_run_creates_no_catalog() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("src");
    source.create_dir_all().unwrap();
    let repo = temp.child("repo");

    let output = photostat(
        &temp,
        &[
            "import",
            "-p",
            path_str(source.path()),
            "--visibility",
            "public",
            "--dry",
            "--repository",
            path_str(repo.path()),
        ],
    );

    assert!(output.status.success());
    repo.assert(predicate::path::missing());
}
