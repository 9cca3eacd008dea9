//! Centralized default constants for SkyNote.
//!
//! All crates reference these constants instead of defining their own
//! magic strings and numbers.

use std::path::PathBuf;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Header written into (and required from) every index snapshot.
pub const PERSIST_HEADER: &str = "SkyNotes Persistence";

/// Snapshot format version.
pub const PERSIST_VERSION: &str = "v0.1.0";

/// File name of the index snapshot inside the persistence directory.
pub const PERSIST_FILE_NAME: &str = "skynotes.json";

/// Suffix appended to a note location for the compare-before-upload download.
pub const COPY_SUFFIX: &str = "_copy";

/// Directory name used under the platform data directory.
pub const APP_DIR_NAME: &str = "SkyNote";

/// Directory name used under `$HOME` on Linux and other Unix-likes.
pub const UNIX_DIR_NAME: &str = ".skynote";

// =============================================================================
// PORTAL
// =============================================================================

/// Default Skynet portal.
pub const PORTAL_URL: &str = "https://siasky.net";

/// Upload endpoint path on the portal.
pub const PORTAL_UPLOAD_PATH: &str = "/skynet/skyfile";

/// Multipart field name carrying the uploaded file.
pub const PORTAL_FILE_FIELD: &str = "file";

/// User agent portals expect from Sia clients.
pub const PORTAL_USER_AGENT: &str = "Sia-Agent";

/// Scheme prefix on skylinks returned from uploads.
pub const SKYLINK_SCHEME: &str = "sia://";

/// Per-request timeout for portal calls, in seconds.
pub const PORTAL_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const SERVER_PORT: u16 = 8080;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_SKYNOTE_DIR: &str = "SKYNOTE_DIR";
pub const ENV_PORTAL_URL: &str = "SKYNET_PORTAL_URL";
pub const ENV_PORTAL_TIMEOUT_SECS: &str = "SKYNET_TIMEOUT_SECS";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";

/// Per-user directory holding the index snapshot and note working copies.
///
/// Windows: `%LOCALAPPDATA%\SkyNote`, macOS: `~/Library/Application Support/SkyNote`,
/// everything else: `~/.skynote`. Falls back to the current directory when no
/// home directory can be resolved.
pub fn default_persist_dir() -> PathBuf {
    let base = if cfg!(windows) {
        dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join(APP_DIR_NAME))
    } else {
        dirs::home_dir().map(|d| d.join(UNIX_DIR_NAME))
    };
    base.unwrap_or_else(|| PathBuf::from(UNIX_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persist_dir_is_app_specific() {
        let dir = default_persist_dir();
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name == APP_DIR_NAME || name == UNIX_DIR_NAME);
    }

    #[test]
    fn test_portal_defaults() {
        assert!(PORTAL_URL.starts_with("https://"));
        assert!(PORTAL_UPLOAD_PATH.starts_with('/'));
        assert!(SKYLINK_SCHEME.ends_with("://"));
    }
}
