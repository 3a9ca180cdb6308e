//! Shortcut manager configuration.
//!
//! Configuration is optional and stored as TOML:
//! - Linux: `$XDG_CONFIG_HOME/deckstore/shortcuts.toml`, falling back to
//!   `~/.config/deckstore/shortcuts.toml`
//! - Windows: `%APPDATA%/deckstore/shortcuts.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use deckstore_steam::DEFAULT_TAG_PREFIX;
use serde::{Deserialize, Serialize};

/// Shortcut manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix of the ownership tag written into each shortcut.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Executable used when `--exe` is not given.
    #[serde(default = "default_exe")]
    pub default_exe: String,

    /// Userdata directory to use instead of detecting the active user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userdata_dir: Option<PathBuf>,

    /// Watermark used when `--deckstore_logo_path` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<PathBuf>,

    /// Extra Steam installation roots, searched before the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steam_roots: Vec<PathBuf>,
}

fn default_tag_prefix() -> String {
    DEFAULT_TAG_PREFIX.into()
}

fn default_exe() -> String {
    "/usr/bin/flatpak".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_prefix: default_tag_prefix(),
            default_exe: default_exe(),
            userdata_dir: None,
            watermark: None,
            steam_roots: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path();
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                    return Ok(Config::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("deckstore").join("shortcuts.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
                PathBuf::from(home).join(".config")
            });
        base.join("deckstore").join("shortcuts.toml")
    }
}
