//! Error types for artwork generation.

use std::path::PathBuf;

use deckstore_steam::SteamError;

/// Errors produced while rendering artwork.
#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
    #[error("source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<ArtworkError> for SteamError {
    fn from(e: ArtworkError) -> Self {
        SteamError::Artwork(e.to_string())
    }
}
