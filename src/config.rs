//! Application configuration.
//!
//! All fields have serviceable defaults so `Config::default()` is a
//! working development configuration, apart from the secret key: without
//! one the application generates a random signing key at startup and
//! sessions will not survive a restart.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The session cookie name of the default wire format. Deployments can
/// override it through [`Config::cookie_name`].
pub(crate) const DEFAULT_SESSION_COOKIE: &str = "session_id";

/// Tunables for the request pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The server secret that keys identifier signing. `None` means a
    /// random key is drawn at startup.
    pub secret_key: Option<String>,

    /// How long a fresh session lives, in seconds.
    pub session_expiry_secs: u64,

    /// Sessions older than this have their id rotated, in seconds.
    /// Rotation bounds the lifetime of any single exposed identifier.
    pub session_rotation_secs: u64,

    /// Failed credential checks before an identity is locked.
    pub max_failed_attempts: u32,

    /// The name of the session cookie.
    pub cookie_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: None,
            session_expiry_secs: 3600,
            session_rotation_secs: 1800,
            max_failed_attempts: 3,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Ok(toml::from_str(toml)?)
    }

    /// Load and parse a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
