// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "topsongs";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix the song identifier is appended to
    pub song_page_base: String,
    /// Catalog API endpoint serving ranked listings
    pub listing_api_base: String,
    /// Sent with every request; the catalog rejects unknown clients
    pub user_agent: String,
    /// Listing language when none is given
    pub default_language: String,
    /// Number of ranked tracks requested
    pub listing_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            song_page_base: "https://gaana.com/song/".into(),
            listing_api_base: "http://api.gaana.com/".into(),
            user_agent: "Mozilla/5.0".into(),
            default_language: "telugu".into(),
            listing_limit: 100,
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Default location (`~/.config/topsongs/config.json` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
