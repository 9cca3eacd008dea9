//! Core traits for SkyNote abstractions.

use std::path::Path;

use async_trait::async_trait;

use crate::{Result, Skylink};

/// Content-addressed storage network the note bodies are pushed to.
///
/// Both operations work on local file paths rather than in-memory buffers,
/// which is why notes keep a working copy on disk.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload the file at `local_path` and return its content identifier.
    async fn upload(&self, local_path: &Path) -> Result<Skylink>;

    /// Materialize the content behind `skylink` at `destination`.
    async fn download(&self, skylink: &Skylink, destination: &Path) -> Result<()>;
}
