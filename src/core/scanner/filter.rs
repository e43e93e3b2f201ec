//! Inclusion and exclusion rules for the scanner.

use super::MediaType;
use crate::error::ValidationError;
use regex::RegexSet;
use std::path::Path;

/// Any-of matcher over a list of regular expressions.
///
/// Every pattern is compiled on its own; they are never joined into one
/// alternation.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: RegexSet,
}

impl PatternSet {
    /// Compile a pattern list. Returns `None` for an empty list.
    pub fn new(patterns: &[String]) -> Result<Option<Self>, ValidationError> {
        if patterns.is_empty() {
            return Ok(None);
        }

        // Compile one by one first so the error names the offending pattern
        for pattern in patterns {
            regex::Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        let set = RegexSet::new(patterns).map_err(|e| ValidationError::InvalidPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Some(Self { set }))
    }

    /// True if any pattern matches somewhere in the path
    pub fn is_match(&self, path: &Path) -> bool {
        self.set.is_match(&path.to_string_lossy())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Decides which files are imported and which directories are walked
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    exclude_files: Option<PatternSet>,
    exclude_dirs: Option<PatternSet>,
}

impl MediaFilter {
    /// Create a filter that accepts every supported media file
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude files whose path matches any of the patterns
    pub fn with_excluded_files(mut self, patterns: &[String]) -> Result<Self, ValidationError> {
        self.exclude_files = PatternSet::new(patterns)?;
        Ok(self)
    }

    /// Prune directories whose path matches any of the patterns
    pub fn with_excluded_dirs(mut self, patterns: &[String]) -> Result<Self, ValidationError> {
        self.exclude_dirs = PatternSet::new(patterns)?;
        Ok(self)
    }

    /// Check if a file should be imported
    pub fn should_include(&self, path: &Path) -> bool {
        if MediaType::from_path(path).is_none() {
            return false;
        }

        match &self.exclude_files {
            Some(patterns) => !patterns.is_match(path),
            None => true,
        }
    }

    /// Check if the walk should descend into a directory
    pub fn should_descend(&self, dir: &Path) -> bool {
        match &self.exclude_dirs {
            Some(patterns) => !patterns.is_match(dir),
            None => true,
        }
    }
}
