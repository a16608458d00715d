//! Configuration file at ~/.location-picker/config.json.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use crate::location::geocoder::{DEFAULT_USER_AGENT, NOMINATIM_REVERSE_URL};
use crate::location::geolocation::IP_GEOLOCATION_URL;
use crate::location::{Coordinate, DEFAULT_COORDINATE};
use crate::picker::map::OSM_TILE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nominatim_url: String,
    pub ip_geolocation_url: String,
    pub user_agent: String,
    /// BCP 47 tag; detected from the environment when absent.
    pub locale: Option<String>,
    pub default_lat: f64,
    pub default_lng: f64,
    pub geolocation_timeout_ms: u64,
    pub geocode_timeout_ms: u64,
    pub tile_url: String,
    /// Note store location; defaults to ~/.location-picker/notes.json.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominatim_url: NOMINATIM_REVERSE_URL.to_string(),
            ip_geolocation_url: IP_GEOLOCATION_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: None,
            default_lat: DEFAULT_COORDINATE.latitude,
            default_lng: DEFAULT_COORDINATE.longitude,
            geolocation_timeout_ms: 10_000,
            geocode_timeout_ms: 15_000,
            tile_url: OSM_TILE_URL.to_string(),
            store_path: None,
        }
    }
}

impl Config {
    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".location-picker")
    }

    fn default_path() -> PathBuf {
        Self::base_dir().join("config.json")
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| Self::base_dir().join("notes.json"))
    }

    /// The configured fallback coordinate, or the built-in one if out of range.
    pub fn default_coordinate(&self) -> Coordinate {
        Coordinate::new(self.default_lat, self.default_lng).unwrap_or_else(|e| {
            log::warn!("Ignoring configured default coordinate: {}", e);
            DEFAULT_COORDINATE
        })
    }

    /// Configured locale, else the environment's, else `en`.
    pub fn locale(&self) -> String {
        self.locale.clone().unwrap_or_else(|| {
            let env = ["LC_ALL", "LC_MESSAGES", "LANG"]
                .iter()
                .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()));
            locale_from_env(env.as_deref())
        })
    }
}

/// `zh_CN.UTF-8` → `zh-CN`. `C`/`POSIX`/unset → `en`.
pub fn locale_from_env(value: Option<&str>) -> String {
    let raw = value.unwrap_or("");
    let tag = raw.split(['.', '@']).next().unwrap_or("");
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return "en".to_string();
    }
    tag.replace('_', "-")
}
