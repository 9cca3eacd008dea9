//! Persistent index of tracked notes.
//!
//! Maps each note location to the skylink currently representing it, and
//! each skylink to the unix timestamp of the upload that produced it. The
//! index is snapshotted to `<persist-dir>/skynotes.json`:
//!
//! ```json
//! {
//!   "header": "SkyNotes Persistence",
//!   "version": "v0.1.0",
//!   "files": [ {"skylink": "sia://...", "filename": "/home/me/.skynote/Home"} ],
//!   "links": [ {"timestamp": 1600000000, "skylink": "sia://..."} ]
//! }
//! ```
//!
//! Snapshots are written to a temp file, synced, and renamed into place so a
//! reader never observes a partially written file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::defaults::{PERSIST_FILE_NAME, PERSIST_HEADER, PERSIST_VERSION};
use crate::{Error, Result, Skylink};

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFile {
    skylink: Skylink,
    filename: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedLink {
    timestamp: i64,
    skylink: Skylink,
}

/// On-disk snapshot. `files`/`links` may be `null` in snapshots written by
/// older clients that serialized empty lists that way.
#[derive(Debug, Serialize, Deserialize)]
struct Persistence {
    header: String,
    version: String,
    #[serde(default)]
    files: Option<Vec<PersistedFile>>,
    #[serde(default)]
    links: Option<Vec<PersistedLink>>,
}

impl Persistence {
    fn from_maps(files: &HashMap<PathBuf, Skylink>, links: &HashMap<Skylink, i64>) -> Self {
        let mut files: Vec<_> = files
            .iter()
            .map(|(filename, skylink)| PersistedFile {
                skylink: skylink.clone(),
                filename: filename.clone(),
            })
            .collect();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));

        let mut links: Vec<_> = links
            .iter()
            .map(|(skylink, timestamp)| PersistedLink {
                timestamp: *timestamp,
                skylink: skylink.clone(),
            })
            .collect();
        links.sort_by(|a, b| a.skylink.cmp(&b.skylink));

        Self {
            header: PERSIST_HEADER.to_string(),
            version: PERSIST_VERSION.to_string(),
            files: Some(files),
            links: Some(links),
        }
    }
}

/// In-memory index plus the directory its snapshot lives in.
#[derive(Debug)]
pub struct Index {
    persist_dir: PathBuf,
    files: HashMap<PathBuf, Skylink>,
    links: HashMap<Skylink, i64>,
}

impl Index {
    /// Create an empty index rooted at `persist_dir`. Call [`Index::load`] before use.
    pub fn new(persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            files: HashMap::new(),
            links: HashMap::new(),
        }
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.persist_dir.join(PERSIST_FILE_NAME)
    }

    /// Load the snapshot from disk.
    ///
    /// A missing snapshot is a first run: the persistence directory is created
    /// and an empty snapshot written. A snapshot that fails to parse, or whose
    /// header/version do not match, is `PersistenceCorrupt`.
    pub async fn load(&mut self) -> Result<()> {
        let path = self.snapshot_path();
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    subsystem = "index",
                    op = "load",
                    index_path = %path.display(),
                    "No index snapshot found, initializing empty index"
                );
                create_persist_dir(&self.persist_dir).await?;
                self.files.clear();
                self.links.clear();
                return self.save().await;
            }
            Err(e) => return Err(Error::LocalIo(e)),
        };

        let data: Persistence = serde_json::from_slice(&raw)?;
        if data.header != PERSIST_HEADER {
            return Err(Error::PersistenceCorrupt(format!(
                "unexpected header {:?} in {}",
                data.header,
                path.display()
            )));
        }
        if data.version != PERSIST_VERSION {
            return Err(Error::PersistenceCorrupt(format!(
                "unsupported version {:?} in {}",
                data.version,
                path.display()
            )));
        }

        // Duplicate keys should not occur; when they do the last entry wins.
        let files: HashMap<_, _> = data
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| (f.filename, f.skylink))
            .collect();
        let links: HashMap<_, _> = data
            .links
            .unwrap_or_default()
            .into_iter()
            .map(|l| (l.skylink, l.timestamp))
            .collect();

        info!(
            subsystem = "index",
            op = "load",
            index_path = %path.display(),
            note_count = files.len(),
            link_count = links.len(),
            "Index loaded"
        );
        self.files = files;
        self.links = links;
        Ok(())
    }

    /// Write the current in-memory state to the snapshot file.
    pub async fn save(&self) -> Result<()> {
        let snapshot = Persistence::from_maps(&self.files, &self.links);
        write_snapshot(&self.snapshot_path(), &snapshot).await
    }

    pub fn get(&self, location: &Path) -> Option<&Skylink> {
        self.files.get(location)
    }

    /// Upload timestamp recorded for `skylink`.
    pub fn timestamp(&self, skylink: &Skylink) -> Option<i64> {
        self.links.get(skylink).copied()
    }

    /// Insert or overwrite the mapping for `location`. Does not persist.
    pub fn set(&mut self, location: PathBuf, skylink: Skylink, timestamp: i64) {
        self.links.insert(skylink.clone(), timestamp);
        self.files.insert(location, skylink);
    }

    /// Persist the mapping first and apply it in memory only once the
    /// snapshot is on disk. On failure the in-memory index is unchanged.
    pub async fn record(
        &mut self,
        location: PathBuf,
        skylink: Skylink,
        timestamp: i64,
    ) -> Result<()> {
        let mut files = self.files.clone();
        let mut links = self.links.clone();
        links.insert(skylink.clone(), timestamp);
        files.insert(location, skylink);

        write_snapshot(&self.snapshot_path(), &Persistence::from_maps(&files, &links)).await?;

        self.files = files;
        self.links = links;
        Ok(())
    }

    /// Titles of all tracked notes, sorted.
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .files
            .keys()
            .filter_map(|loc| loc.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect();
        titles.sort();
        titles
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

async fn create_persist_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await.map_err(|e| {
        Error::PersistenceWriteFailed(format!("create_dir_all({}): {}", dir.display(), e))
    })
}

async fn write_snapshot(path: &Path, snapshot: &Persistence) -> Result<()> {
    let data = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| Error::PersistenceWriteFailed(e.to_string()))?;
    let temp_path = path.with_extension("json.tmp");
    let write_failed = |step: &str, p: &Path, e: std::io::Error| {
        Error::PersistenceWriteFailed(format!("{}({}): {}", step, p.display(), e))
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(&temp_path)
        .await
        .map_err(|e| write_failed("create", &temp_path, e))?;
    file.write_all(&data)
        .await
        .map_err(|e| write_failed("write", &temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| write_failed("sync", &temp_path, e))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path).await {
        warn!(
            subsystem = "index",
            from = %temp_path.display(),
            to = %path.display(),
            error = %e,
            "index: rename failed"
        );
        let _ = fs::remove_file(&temp_path).await;
        return Err(write_failed("rename", path, e));
    }

    debug!(
        subsystem = "index",
        op = "save",
        index_path = %path.display(),
        bytes = data.len(),
        "Index snapshot written"
    );
    Ok(())
}
