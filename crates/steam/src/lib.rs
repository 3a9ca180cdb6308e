pub mod app_id;
pub mod artwork;
pub mod paths;
#[cfg(target_os = "linux")]
mod paths_linux;
pub mod shortcuts;
pub mod users;
pub mod vdf;
pub mod vdf_text;

// Re-export primary types.
pub use app_id::{crc32, preliminary_id, short_artwork_id, strip_quotes, vdf_entry_app_id};
pub use artwork::ArtworkRenderer;
pub use paths::{ArtworkType, UserdataPaths};
pub use shortcuts::{
    AddOutcome, DEFAULT_TAG_PREFIX, RemoveOutcome, ShortcutInfo, ShortcutSpec, ShortcutStore,
};
pub use users::{User, locate_active_userdata_root, locate_active_userdata_root_in};
pub use vdf::{Document, Map, Value};

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,

    #[error("steam user not found")]
    UserNotFound,

    #[error("malformed VDF document: {0}")]
    MalformedDocument(String),

    #[error("schema mismatch: '{key}' is {found}, expected {expected}")]
    SchemaMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("artwork error: {0}")]
    Artwork(String),
}
