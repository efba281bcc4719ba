//! Level file loading.
//!
//! Levels are authored as RON or JSON; the format is picked from the file
//! extension. Every loaded level is validated before it is handed out.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use td_core::data::{LevelConfig, LevelFormat};
use td_core::error::GameError;

/// Error type for level loading.
#[derive(Error, Debug)]
pub enum LevelLoadError {
    /// File not found.
    #[error("Level file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read level file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Extension is neither `.ron` nor `.json`.
    #[error("Unsupported level format: {0} (expected .ron or .json)")]
    UnsupportedFormat(String),
    /// The text is not a level.
    #[error("Failed to parse level: {0}")]
    ParseError(#[from] GameError),
    /// The level parsed but breaks the level rules.
    #[error("Level {path} is invalid:\n  {}", issues.join("\n  "))]
    Invalid {
        /// File the level came from.
        path: String,
        /// Every rule the level breaks.
        issues: Vec<String>,
    },
}

/// Parse level text without validating it.
pub fn parse_level(text: &str, format: LevelFormat) -> Result<LevelConfig, LevelLoadError> {
    Ok(LevelConfig::parse(text, format)?)
}

/// Read, parse and validate a level file.
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<LevelConfig, LevelLoadError> {
    let path = path.as_ref();
    let level = read_level(path)?;

    let issues = level.validate();
    if !issues.is_empty() {
        for issue in &issues {
            warn!(path = %path.display(), %issue, "Level rule broken");
        }
        return Err(LevelLoadError::Invalid {
            path: path.display().to_string(),
            issues,
        });
    }

    debug!(
        path = %path.display(),
        level = level.id,
        waves = level.waves.len(),
        "Loaded level"
    );
    Ok(level)
}

/// Read and parse a level file without validating it.
pub fn read_level(path: &Path) -> Result<LevelConfig, LevelLoadError> {
    if !path.exists() {
        return Err(LevelLoadError::FileNotFound(path.display().to_string()));
    }
    let format = LevelFormat::from_path(path)
        .ok_or_else(|| LevelLoadError::UnsupportedFormat(path.display().to_string()))?;
    let contents = fs::read_to_string(path)?;
    parse_level(&contents, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use td_test_utils::fixtures::green_plains;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_level() {
        let json = green_plains().to_json_string().unwrap();
        let file = write_temp(".json", &json);
        let level = load_level(file.path()).unwrap();
        assert_eq!(level, green_plains());
    }

    #[test]
    fn test_missing_file() {
        let err = load_level("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, LevelLoadError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".yaml", "id: 1");
        let err = load_level(file.path()).unwrap_err();
        assert!(matches!(err, LevelLoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let file = write_temp(".json", "{ not json");
        let err = load_level(file.path()).unwrap_err();
        assert!(matches!(err, LevelLoadError::ParseError(_)));
    }

    #[test]
    fn test_invalid_level_lists_issues() {
        let mut level = green_plains();
        level.lives = 0;
        level.map.path.truncate(1);
        let file = write_temp(".json", &level.to_json_string().unwrap());

        match load_level(file.path()).unwrap_err() {
            LevelLoadError::Invalid { issues, .. } => assert!(issues.len() >= 2),
            other => panic!("expected Invalid, got {other}"),
        }
    }
}
