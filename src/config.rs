//! API configuration types and loading logic.
//!
//! `Config` is a direct mapping of `config.toml`.  Every field has a default
//! so the file is entirely optional: without it, requests go to
//! `https://sourcegraph.com` anonymously.
//!
//! # File format
//!
//! ```toml
//! endpoint     = "https://sourcegraph.example.com"
//! access_token = "sgp_..."
//!
//! [additional_headers]
//! X-Team = "search"
//! ```
//!
//! # Environment
//!
//! Environment variables win over the file on a per-field basis:
//!
//! | Variable             | Field                      |
//! |----------------------|----------------------------|
//! | `SRC_ENDPOINT`       | `endpoint`                 |
//! | `SRC_ACCESS_TOKEN`   | `access_token`             |
//! | `SRC_HEADER_<NAME>`  | `additional_headers[NAME]` |

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, FileError};

pub const ENDPOINT_ENV: &str = "SRC_ENDPOINT";
pub const ACCESS_TOKEN_ENV: &str = "SRC_ACCESS_TOKEN";
pub const HEADER_ENV_PREFIX: &str = "SRC_HEADER_";

/// Root configuration object, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Sourcegraph instance, without a trailing slash.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Access token sent as `Authorization: token <access_token>`.
    ///
    /// **Do not commit real tokens to version control.**  Prefer
    /// `SRC_ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Extra headers added to every API request.
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
            additional_headers: BTreeMap::new(),
        }
    }
}

pub fn default_endpoint() -> String {
    "https://sourcegraph.com".into()
}

/// `<config dir>/src-rs/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|d| d.join("src-rs").join("config.toml"))
}

impl Config {
    /// Apply overrides from `vars`, typically `std::env::vars()`.
    ///
    /// Empty values are ignored, so `SRC_ACCESS_TOKEN=` does not clear a
    /// token configured in the file.
    #[must_use]
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if value.is_empty() {
                continue;
            }
            if name == ENDPOINT_ENV {
                self.endpoint = value;
            } else if name == ACCESS_TOKEN_ENV {
                self.access_token = Some(value);
            } else if let Some(header) = name.strip_prefix(HEADER_ENV_PREFIX) {
                if !header.is_empty() {
                    self.additional_headers
                        .insert(header.replace('_', "-"), value);
                }
            }
        }
        self
    }

    /// Trim trailing slashes so paths can be appended with `/`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let trimmed = self.endpoint.trim_end_matches('/').len();
        self.endpoint.truncate(trimmed);
        self
    }
}

/// Read and parse a `Config` from `path`.
///
/// A missing file yields the defaults.  A file that exists but cannot be
/// read or is not valid TOML is an error.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let wrap = |source: FileError| Error::Config {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    toml::from_str(&text).map_err(|e| wrap(e.into()))
}

/// Load the config file (explicit path or the default location), then apply
/// environment overrides.
pub fn load(explicit: Option<&Path>) -> Result<Config, Error> {
    let file = match explicit {
        Some(p) => load_config(p)?,
        None => match default_path() {
            Some(p) => load_config(&p)?,
            None => Config::default(),
        },
    };
    Ok(file.with_env(std::env::vars()).normalized())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
