//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use skynote_core::defaults::{
    default_persist_dir, ENV_HOST, ENV_PORT, ENV_SKYNOTE_DIR, SERVER_HOST, SERVER_PORT,
};
use skynote_core::{Error, Result};
use skynote_portal::PortalConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the index snapshot and note working copies.
    ///
    /// Tracked locations are stored as absolute paths, so after pointing
    /// `SKYNOTE_DIR` somewhere new, notes indexed under the old directory
    /// are still listed but load as not tracked.
    pub persist_dir: PathBuf,
    pub portal: PortalConfig,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Build from environment variables. Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        let persist_dir = std::env::var_os(ENV_SKYNOTE_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_persist_dir);
        let host = std::env::var(ENV_HOST).unwrap_or_else(|_| SERVER_HOST.to_string());
        let port: u16 = std::env::var(ENV_PORT)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(SERVER_PORT);

        Self {
            persist_dir,
            portal: PortalConfig::from_env(),
            host,
            port,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| Error::Config(format!("invalid bind address {}: {}", addr, e)))
    }
}
