//! Note persistence: pushes edited notes to the content store and keeps the
//! index pointing at the latest skylink for each note.
//!
//! Saving a note whose body is byte-identical to the tracked content skips the
//! upload after one download-and-compare.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use skynote_core::{copy_location, ContentStore, Error, Index, Note, Result, Skylink, Title};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Removes the comparison download when dropped, whatever path the save took.
struct TempDownload {
    path: PathBuf,
}

impl TempDownload {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDownload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    subsystem = "service",
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temporary download"
                );
            }
        }
    }
}

/// Mediates between note edits, the content store, and the index.
///
/// A single lock guards the index for the whole of each `save`/`load`, so
/// concurrent requests for the same note cannot lose updates or interleave
/// writes to its working copy. `list` waits on the same lock, so it blocks
/// while a save is uploading.
pub struct NoteService {
    store: Arc<dyn ContentStore>,
    index: Mutex<Index>,
}

impl NoteService {
    /// `index` must already be loaded.
    pub fn new(store: Arc<dyn ContentStore>, index: Index) -> Self {
        Self {
            store,
            index: Mutex::new(index),
        }
    }

    /// Persist `body` under `title`. Empty bodies are ignored.
    pub async fn save(&self, title: &Title, body: &[u8]) -> Result<()> {
        if body.is_empty() {
            debug!(subsystem = "service", op = "save", title = %title, "Empty body, nothing to save");
            return Ok(());
        }

        let mut index = self.index.lock().await;
        let location = title.location(index.persist_dir());
        write_working_copy(&location, body).await?;

        if let Some(current) = index.get(&location).cloned() {
            if self.is_unchanged(&current, &location, body).await? {
                debug!(
                    subsystem = "service",
                    op = "save",
                    title = %title,
                    skylink = %current,
                    "Content unchanged, skipping upload"
                );
                return Ok(());
            }
        }

        let skylink = self.store.upload(&location).await?;
        let now = chrono::Utc::now().timestamp();
        index.record(location, skylink.clone(), now).await?;

        info!(
            subsystem = "service",
            op = "save",
            title = %title,
            skylink = %skylink,
            bytes = body.len(),
            "Note saved"
        );
        Ok(())
    }

    /// Download the tracked content for `title` into its working copy and
    /// return it. Untracked titles fail without touching the store.
    pub async fn load(&self, title: &Title) -> Result<Note> {
        let index = self.index.lock().await;
        let location = title.location(index.persist_dir());
        let skylink = index
            .get(&location)
            .cloned()
            .ok_or_else(|| Error::NoteNotTracked(title.to_string()))?;

        self.store.download(&skylink, &location).await?;
        let body = fs::read(&location).await?;

        debug!(
            subsystem = "service",
            op = "load",
            title = %title,
            skylink = %skylink,
            bytes = body.len(),
            "Note loaded"
        );
        Ok(Note::new(title.clone(), body))
    }

    /// Tracked note titles, sorted.
    pub async fn list(&self) -> Vec<String> {
        self.index.lock().await.titles()
    }

    /// Skylink currently tracked for `title`.
    pub async fn skylink(&self, title: &Title) -> Option<Skylink> {
        let index = self.index.lock().await;
        index.get(&title.location(index.persist_dir())).cloned()
    }

    async fn is_unchanged(
        &self,
        current: &Skylink,
        location: &Path,
        body: &[u8],
    ) -> Result<bool> {
        let copy = TempDownload::new(copy_location(location));
        self.store.download(current, copy.path()).await?;
        let tracked = fs::read(copy.path()).await?;
        Ok(tracked == body)
    }
}

async fn write_working_copy(location: &Path, body: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(location).await?;
    file.write_all(body).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skynote_portal::mock::{MockCall, MockContentStore};
    use tempfile::TempDir;

    async fn service(tmp: &TempDir) -> (NoteService, MockContentStore) {
        let mut index = Index::new(tmp.path());
        index.load().await.unwrap();
        let store = MockContentStore::new();
        (NoteService::new(Arc::new(store.clone()), index), store)
    }

    fn title(s: &str) -> Title {
        Title::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_save_uploads_and_tracks() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;

        svc.save(&title("Home"), b"hello").await.unwrap();

        assert_eq!(store.upload_count(), 1);
        let link = svc.skylink(&title("Home")).await.unwrap();
        assert_eq!(store.content(&link).unwrap(), b"hello");
        assert_eq!(std::fs::read(tmp.path().join("Home")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_identical_save_uploads_once() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;

        svc.save(&title("Home"), b"hello").await.unwrap();
        svc.save(&title("Home"), b"hello").await.unwrap();

        assert_eq!(store.upload_count(), 1);
        assert_eq!(store.download_count(), 1);
        assert!(!tmp.path().join("Home_copy").exists());
    }

    #[tokio::test]
    async fn test_unchanged_save_keeps_audit_trail() {
        let tmp = TempDir::new().unwrap();
        let (svc, _store) = service(&tmp).await;
        let snapshot = tmp.path().join("skynotes.json");

        svc.save(&title("Home"), b"hello").await.unwrap();
        let id1 = svc.skylink(&title("Home")).await.unwrap();
        let before = std::fs::read(&snapshot).unwrap();

        // Cross a second boundary so a fresh timestamp would differ.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        svc.save(&title("Home"), b"hello").await.unwrap();

        assert_eq!(std::fs::read(&snapshot).unwrap(), before);
        let mut reloaded = Index::new(tmp.path());
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get(&tmp.path().join("Home")), Some(&id1));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_title_saves_stay_consistent() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        let svc = Arc::new(svc);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let svc = Arc::clone(&svc);
                tokio::spawn(async move {
                    let body: &[u8] = if i % 2 == 0 { b"even" } else { b"odd" };
                    svc.save(&title("Home"), body).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let link = svc.skylink(&title("Home")).await.unwrap();
        let working_copy = std::fs::read(tmp.path().join("Home")).unwrap();
        assert_eq!(store.content(&link).unwrap(), working_copy);

        let mut reloaded = Index::new(tmp.path());
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get(&tmp.path().join("Home")), Some(&link));
        assert!(!tmp.path().join("Home_copy").exists());
    }

    #[tokio::test]
    async fn test_working_copy_failure_makes_no_store_calls() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        std::fs::create_dir(tmp.path().join("Home")).unwrap();

        let err = svc.save(&title("Home"), b"hello").await.unwrap_err();

        assert!(matches!(err, Error::LocalIo(_)));
        assert!(store.calls().is_empty());
        assert!(svc.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_surfaces_download_failure() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        svc.save(&title("Home"), b"hello").await.unwrap();
        let tracked = svc.skylink(&title("Home")).await;
        store.fail_downloads(true);

        let err = svc.load(&title("Home")).await.unwrap_err();

        assert!(matches!(err, Error::StoreDownloadFailed(_)));
        assert_eq!(svc.skylink(&title("Home")).await, tracked);
    }

    #[tokio::test]
    async fn test_changed_save_uploads_again() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;

        svc.save(&title("Home"), b"first").await.unwrap();
        svc.save(&title("Home"), b"second").await.unwrap();

        assert_eq!(store.upload_count(), 2);
        let link = svc.skylink(&title("Home")).await.unwrap();
        assert_eq!(link.as_str(), "sia://mock-2");
        assert!(!tmp.path().join("Home_copy").exists());
    }

    #[tokio::test]
    async fn test_empty_body_is_noop() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;

        svc.save(&title("Home"), b"").await.unwrap();

        assert!(store.calls().is_empty());
        assert!(svc.list().await.is_empty());
        assert!(!tmp.path().join("Home").exists());
    }

    #[tokio::test]
    async fn test_load_untracked_makes_no_store_calls() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;

        let err = svc.load(&title("Missing")).await.unwrap_err();

        assert!(matches!(err, Error::NoteNotTracked(t) if t == "Missing"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_downloads_into_working_copy() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        svc.save(&title("Home"), b"hello").await.unwrap();
        std::fs::write(tmp.path().join("Home"), b"stale local edit").unwrap();

        let note = svc.load(&title("Home")).await.unwrap();

        assert_eq!(note.body, b"hello");
        assert_eq!(note.title, title("Home"));
        assert_eq!(std::fs::read(tmp.path().join("Home")).unwrap(), b"hello");
        assert!(matches!(store.calls().last(), Some(MockCall::Download(..))));
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_index_untouched() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        store.fail_uploads(true);

        let err = svc.save(&title("Home"), b"hello").await.unwrap_err();

        assert!(matches!(err, Error::StoreUploadFailed(_)));
        assert!(svc.skylink(&title("Home")).await.is_none());
        let mut reloaded = Index::new(tmp.path());
        reloaded.load().await.unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_aborts_save_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        svc.save(&title("Home"), b"hello").await.unwrap();
        let before = svc.skylink(&title("Home")).await.unwrap();
        store.forget(&before);

        let err = svc.save(&title("Home"), b"changed").await.unwrap_err();

        assert!(matches!(err, Error::StoreDownloadFailed(_)));
        assert_eq!(store.upload_count(), 1);
        assert_eq!(svc.skylink(&title("Home")).await, Some(before));
        assert!(!tmp.path().join("Home_copy").exists());
    }

    #[tokio::test]
    async fn test_index_persist_failure_surfaces_and_keeps_memory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("skynote");
        let mut index = Index::new(&dir);
        index.load().await.unwrap();
        let store = MockContentStore::new();
        let svc = NoteService::new(Arc::new(store.clone()), index);
        svc.save(&title("Home"), b"hello").await.unwrap();
        let before = svc.skylink(&title("Home")).await;

        // Index snapshot path is now a directory, so the rename fails.
        std::fs::remove_file(dir.join("skynotes.json")).unwrap();
        std::fs::create_dir(dir.join("skynotes.json")).unwrap();

        let err = svc.save(&title("Home"), b"changed").await.unwrap_err();
        assert!(matches!(err, Error::PersistenceWriteFailed(_)));
        assert_eq!(svc.skylink(&title("Home")).await, before);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let tmp = TempDir::new().unwrap();
        let (svc, _store) = service(&tmp).await;
        for t in ["Zeta", "Alpha", "Mid"] {
            svc.save(&title(t), t.as_bytes()).await.unwrap();
        }
        assert_eq!(svc.list().await, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[tokio::test]
    async fn test_home_scenario() {
        let tmp = TempDir::new().unwrap();
        let (svc, store) = service(&tmp).await;
        let home = title("Home");

        svc.save(&home, b"hello").await.unwrap();
        let id1 = svc.skylink(&home).await.unwrap();

        svc.save(&home, b"hello").await.unwrap();
        assert_eq!(store.upload_count(), 1);
        assert_eq!(svc.skylink(&home).await.unwrap(), id1);

        svc.save(&home, b"world").await.unwrap();
        let id2 = svc.skylink(&home).await.unwrap();
        assert_eq!(store.upload_count(), 2);
        assert_ne!(id1, id2);

        let mut reloaded = Index::new(tmp.path());
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get(&tmp.path().join("Home")), Some(&id2));
        assert!(reloaded.timestamp(&id1).is_some());
        assert!(reloaded.timestamp(&id2).is_some());
    }
}
