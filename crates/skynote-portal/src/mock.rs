//! In-memory content store for deterministic testing.
//!
//! Every upload is assigned a fresh identifier `sia://mock-<n>` and every
//! call is logged so tests can assert on upload/download counts.
//!
//! ```rust,ignore
//! use skynote_portal::mock::MockContentStore;
//!
//! let store = MockContentStore::new();
//! let link = store.upload(&path).await?;
//! assert_eq!(store.upload_count(), 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use skynote_core::{ContentStore, Error, Result, Skylink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Upload(PathBuf),
    Download(Skylink, PathBuf),
}

#[derive(Default)]
struct MockState {
    contents: HashMap<Skylink, Vec<u8>>,
    next_id: u64,
    calls: Vec<MockCall>,
    fail_uploads: bool,
    fail_downloads: bool,
}

/// Mock content store. Clones share state.
#[derive(Clone, Default)]
pub struct MockContentStore {
    state: Arc<Mutex<MockState>>,
}

impl MockContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with `StoreUploadFailed`.
    pub fn fail_uploads(&self, fail: bool) {
        self.state.lock().unwrap().fail_uploads = fail;
    }

    /// Make every subsequent download fail with `StoreDownloadFailed`.
    pub fn fail_downloads(&self, fail: bool) {
        self.state.lock().unwrap().fail_downloads = fail;
    }

    /// Drop stored content, as if it had been removed upstream.
    pub fn forget(&self, skylink: &Skylink) {
        self.state.lock().unwrap().contents.remove(skylink);
    }

    pub fn content(&self, skylink: &Skylink) -> Option<Vec<u8>> {
        self.state.lock().unwrap().contents.get(skylink).cloned()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Upload(_)))
            .count()
    }

    pub fn download_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Download(..)))
            .count()
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn upload(&self, local_path: &Path) -> Result<Skylink> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Upload(local_path.to_path_buf()));

        let data = tokio::fs::read(local_path).await?;

        let mut state = self.state.lock().unwrap();
        if state.fail_uploads {
            return Err(Error::StoreUploadFailed("simulated failure".to_string()));
        }
        state.next_id += 1;
        let skylink = Skylink::new(format!("sia://mock-{}", state.next_id));
        state.contents.insert(skylink.clone(), data);
        Ok(skylink)
    }

    async fn download(&self, skylink: &Skylink, destination: &Path) -> Result<()> {
        let data = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(MockCall::Download(
                skylink.clone(),
                destination.to_path_buf(),
            ));
            if state.fail_downloads {
                return Err(Error::StoreDownloadFailed("simulated failure".to_string()));
            }
            state
                .contents
                .get(skylink)
                .cloned()
                .ok_or_else(|| Error::StoreDownloadFailed(format!("unknown skylink {}", skylink)))?
        };
        tokio::fs::write(destination, data).await?;
        Ok(())
    }
}
