//! Error types for SkyNote.

use thiserror::Error;

/// Result type alias using SkyNote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SkyNote operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Index snapshot exists but could not be parsed or validated
    #[error("Persistence corrupt: {0}")]
    PersistenceCorrupt(String),

    /// Index snapshot could not be written
    #[error("Persistence write failed: {0}")]
    PersistenceWriteFailed(String),

    /// Content store rejected or failed an upload
    #[error("Store upload failed: {0}")]
    StoreUploadFailed(String),

    /// Content store download failed (network error or unknown skylink)
    #[error("Store download failed: {0}")]
    StoreDownloadFailed(String),

    /// Reading or writing a local working copy failed
    #[error("Local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// Note is not present in the local index
    #[error("Note not tracked: {0}")]
    NoteNotTracked(String),

    /// Title does not match `[a-zA-Z0-9]+`
    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::PersistenceCorrupt(e.to_string())
    }
}
