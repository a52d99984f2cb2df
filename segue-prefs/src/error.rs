use std::io;
use thiserror::Error;

/// Errors reading or writing the preferences file
#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid preferences: {0}")]
    Json(#[from] serde_json::Error),
}
