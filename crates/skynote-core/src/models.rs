//! Domain models shared by the index, the portal client, and the HTTP layer.

use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults::{COPY_SUFFIX, SKYLINK_SCHEME};
use crate::{Error, Result};

static VALID_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// A note title, restricted to ASCII letters and digits.
///
/// The restriction keeps `<persist-dir>/<title>` injective and free of path
/// separators, so no title can collide with another note or escape the
/// persistence directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Title(String);

impl Title {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if VALID_TITLE.is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(Error::InvalidTitle(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local working-copy path for this note.
    pub fn location(&self, persist_dir: &Path) -> PathBuf {
        persist_dir.join(&self.0)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path the currently tracked content is downloaded to for comparison.
pub fn copy_location(location: &Path) -> PathBuf {
    let mut name = location.as_os_str().to_os_string();
    name.push(COPY_SUFFIX);
    PathBuf::from(name)
}

/// Opaque content identifier returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skylink(String);

impl Skylink {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without its `sia://` scheme, as used in portal URLs.
    pub fn without_scheme(&self) -> &str {
        self.0.strip_prefix(SKYLINK_SCHEME).unwrap_or(&self.0)
    }
}

impl fmt::Display for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Skylink {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A note as presented to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: Title,
    pub body: Vec<u8>,
}

impl Note {
    pub fn new(title: Title, body: impl Into<Vec<u8>>) -> Self {
        Self {
            title,
            body: body.into(),
        }
    }

    /// Body decoded for display; invalid UTF-8 is replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
