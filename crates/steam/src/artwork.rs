//! Seam between the shortcut store and artwork generation.

use std::path::{Path, PathBuf};

use crate::SteamError;

/// Produces the grid artwork set for a shortcut.
///
/// Implementations write files named after `short_id` (see
/// [`crate::paths::artwork_filename`]) into `grid_dir` and return the paths
/// they created.
pub trait ArtworkRenderer {
    fn render(
        &self,
        short_id: u32,
        source: &Path,
        grid_dir: &Path,
        watermark: Option<&Path>,
    ) -> Result<Vec<PathBuf>, SteamError>;
}
