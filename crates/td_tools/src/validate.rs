//! Level file validation.
//!
//! Checks a single level file, or every `.ron` / `.json` level in a
//! directory, against the level rules.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use td_core::data::{LevelConfig, LevelFormat};

/// Error type for validation runs that could not look at the levels at all.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// Path does not exist.
    #[error("Path not found: {0}")]
    NotFound(String),
    /// Directory could not be listed.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        /// Directory.
        path: String,
        /// Cause.
        source: std::io::Error,
    },
}

/// Validation result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Every problem found; empty when the file is valid.
    pub issues: Vec<String>,
}

impl FileReport {
    /// Whether the file passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validation result for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// One entry per file, in path order.
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    /// Whether every file passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.files.iter().all(FileReport::is_valid)
    }

    /// Files that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_valid())
    }
}

fn is_level_file(path: &Path) -> bool {
    LevelFormat::from_path(path).is_some()
}

/// Parse level text by extension.
fn parse(path: &Path, contents: &str) -> Result<LevelConfig, String> {
    let format = LevelFormat::from_path(path)
        .ok_or_else(|| "unsupported extension (expected .ron or .json)".to_string())?;
    LevelConfig::parse(contents, format).map_err(|e| e.to_string())
}

/// Validate one level file.
///
/// Read and parse failures are reported as issues, not errors.
#[must_use]
pub fn validate_level_file(path: &Path) -> FileReport {
    let issues = match fs::read_to_string(path) {
        Err(e) => vec![format!("cannot read file: {e}")],
        Ok(contents) => match parse(path, &contents) {
            Err(e) => vec![e],
            Ok(level) => level.validate(),
        },
    };

    for issue in &issues {
        warn!(path = %path.display(), %issue, "Level issue");
    }
    if issues.is_empty() {
        debug!(path = %path.display(), "Level valid");
    }

    FileReport {
        path: path.to_path_buf(),
        issues,
    }
}

/// Validate a level file, or every level file in a directory.
///
/// Directory entries that are not `.ron` or `.json` files are skipped.
///
/// # Errors
///
/// Returns an error if the path does not exist or the directory cannot be
/// listed.
pub fn validate_path(path: &Path) -> Result<ValidationReport, ValidateError> {
    if !path.exists() {
        return Err(ValidateError::NotFound(path.display().to_string()));
    }

    if path.is_file() {
        return Ok(ValidationReport {
            files: vec![validate_level_file(path)],
        });
    }

    let read_err = |source| ValidateError::ReadDir {
        path: path.display().to_string(),
        source,
    };
    let mut candidates = Vec::new();
    for entry in fs::read_dir(path).map_err(read_err)? {
        let entry_path = entry.map_err(read_err)?.path();
        if entry_path.is_file() && is_level_file(&entry_path) {
            candidates.push(entry_path);
        }
    }
    candidates.sort();

    if candidates.is_empty() {
        warn!(path = %path.display(), "No level files found");
    }

    let report = ValidationReport {
        files: candidates.iter().map(|p| validate_level_file(p)).collect(),
    };
    info!(
        files = report.files.len(),
        failed = report.failures().count(),
        "Validation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_test_utils::fixtures::green_plains;

    #[test]
    fn test_valid_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plains.json");
        fs::write(&path, green_plains().to_json_string().unwrap()).unwrap();

        let report = validate_level_file(&path);
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    #[test]
    fn test_unparseable_file_is_an_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(id: ").unwrap();

        let report = validate_level_file(&path);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_unknown_extension_is_an_issue() {
        let dir = tempfile::tempdir().unwrap();
        let as_text = dir.path().join("plains.txt");
        fs::write(&as_text, green_plains().to_json_string().unwrap()).unwrap();

        let report = validate_level_file(&as_text);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("unsupported extension"));
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            validate_path(Path::new("/no/such/levels")),
            Err(ValidateError::NotFound(_))
        ));
    }

    #[test]
    fn test_extension_filter() {
        assert!(is_level_file(Path::new("a.ron")));
        assert!(is_level_file(Path::new("a.json")));
        assert!(!is_level_file(Path::new("a.txt")));
        assert!(!is_level_file(Path::new("ron")));
    }
}
