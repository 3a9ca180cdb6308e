use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::SteamError;

/// Extensions Steam accepts for custom grid artwork.
pub const ARTWORK_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Type of Steam artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtworkType {
    /// 920x430 library header capsule.
    Grid,
    /// 1920x620 header.
    Hero,
    /// Transparent logo.
    Logo,
    /// Square icon.
    Icon,
    /// 600x900 vertical grid.
    Portrait,
}

impl ArtworkType {
    /// Returns all artwork types.
    pub fn all() -> &'static [ArtworkType] {
        &[
            ArtworkType::Grid,
            ArtworkType::Hero,
            ArtworkType::Logo,
            ArtworkType::Icon,
            ArtworkType::Portrait,
        ]
    }

    /// Returns the filename suffix for this artwork type.
    fn suffix(&self) -> &'static str {
        match self {
            ArtworkType::Grid => "",
            ArtworkType::Hero => "_hero",
            ArtworkType::Logo => "_logo",
            ArtworkType::Icon => "_icon",
            ArtworkType::Portrait => "p",
        }
    }
}

impl fmt::Display for ArtworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkType::Grid => write!(f, "grid"),
            ArtworkType::Hero => write!(f, "hero"),
            ArtworkType::Logo => write!(f, "logo"),
            ArtworkType::Icon => write!(f, "icon"),
            ArtworkType::Portrait => write!(f, "portrait"),
        }
    }
}

/// Paths inside one Steam user's directory (`userdata/<account id>`).
#[derive(Debug, Clone)]
pub struct UserdataPaths {
    root: PathBuf,
}

impl UserdataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the user directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the config directory for the user.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Returns the path to shortcuts.vdf.
    pub fn shortcuts_path(&self) -> PathBuf {
        self.config_dir().join("shortcuts.vdf")
    }

    /// Returns the grid artwork directory.
    pub fn grid_dir(&self) -> PathBuf {
        self.config_dir().join("grid")
    }

    /// Creates the grid directory if it doesn't exist.
    pub fn ensure_grid_dir(&self) -> Result<(), SteamError> {
        fs::create_dir_all(self.grid_dir())
            .map_err(|e| SteamError::Io(format!("failed to create grid dir: {e}")))
    }

    /// Returns the path for a specific artwork type.
    pub fn artwork_path(&self, short_id: u32, art_type: ArtworkType, ext: &str) -> PathBuf {
        self.grid_dir()
            .join(artwork_filename(short_id, art_type, ext))
    }

    /// Returns every artwork path Steam may look up for a shortcut.
    pub fn artwork_candidates(&self, short_id: u32) -> Vec<PathBuf> {
        ArtworkType::all()
            .iter()
            .flat_map(|&art_type| {
                ARTWORK_EXTENSIONS
                    .into_iter()
                    .map(move |ext| self.artwork_path(short_id, art_type, ext))
            })
            .collect()
    }
}

/// Generates the filename for artwork based on type.
pub fn artwork_filename(short_id: u32, art_type: ArtworkType, ext: &str) -> String {
    let ext = if ext.is_empty() { "png" } else { ext };
    format!("{}{}.{}", short_id, art_type.suffix(), ext)
}

/// Returns the Steam installation roots to search, most specific first.
pub fn steam_root_candidates() -> Vec<PathBuf> {
    platform_root_candidates()
}

#[cfg(target_os = "linux")]
fn platform_root_candidates() -> Vec<PathBuf> {
    crate::paths_linux::root_candidates()
}

#[cfg(not(target_os = "linux"))]
fn platform_root_candidates() -> Vec<PathBuf> {
    Vec::new()
}
