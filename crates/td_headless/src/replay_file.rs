//! Replay files on disk.
//!
//! The core only knows replay bytes; this module puts them in files.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use td_core::error::GameError;
use td_core::replay::Replay;

/// Error type for replay file operations.
#[derive(Error, Debug)]
pub enum ReplayFileError {
    /// File not found.
    #[error("Replay file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write the file.
    #[error("Replay file IO failed: {0}")]
    Io(#[from] std::io::Error),
    /// The bytes are not a replay this build can play.
    #[error("Bad replay: {0}")]
    Format(#[from] GameError),
}

/// Write a replay to `path`.
pub fn save_replay<P: AsRef<Path>>(replay: &Replay, path: P) -> Result<(), ReplayFileError> {
    let path = path.as_ref();
    let bytes = replay.to_bytes()?;
    fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved replay");
    Ok(())
}

/// Read a replay from `path`.
pub fn load_replay<P: AsRef<Path>>(path: P) -> Result<Replay, ReplayFileError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReplayFileError::FileNotFound(path.display().to_string()));
    }
    let bytes = fs::read(path)?;
    Ok(Replay::from_bytes(&bytes)?)
}
