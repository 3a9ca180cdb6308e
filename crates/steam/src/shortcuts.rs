use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::SteamError;
use crate::app_id::{short_artwork_id, strip_quotes, vdf_entry_app_id};
use crate::artwork::ArtworkRenderer;
use crate::paths::{ArtworkType, UserdataPaths};
use crate::vdf::{self, Document, Map, Value};

/// Prefix of the ownership tag written into every shortcut this tool adds.
pub const DEFAULT_TAG_PREFIX: &str = "DeckStore";

const SHORTCUTS_KEY: &str = "shortcuts";
const TAGS_KEY: &str = "tags";
/// Entry field holding the owning application's id (e.g. a Flatpak app id).
const OWNER_FIELD: &str = "FlatpakAppID";

/// A shortcut to be added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutSpec {
    /// Identifier of the owning application, e.g. `org.mozilla.firefox`.
    pub owner_tag: String,
    pub name: String,
    pub exe: String,
    pub launch_options: String,
    /// Source image for generated artwork. No icon, no artwork.
    pub icon_source: Option<PathBuf>,
    /// Optional branding overlay for generated artwork.
    pub watermark: Option<PathBuf>,
}

/// Result of [`ShortcutStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added {
        key: String,
        short_id: u32,
        app_id: i32,
        /// Set when the entry was written but artwork generation failed.
        artwork_error: Option<String>,
    },
    AlreadyPresent {
        key: String,
    },
}

/// Result of [`ShortcutStore::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed {
        key: String,
        /// `None` when the entry lacked `Exe`/`AppName` to derive the id from.
        short_id: Option<u32>,
        deleted_artwork: Vec<PathBuf>,
    },
    NotFound,
}

/// Summary of an existing shortcut entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutInfo {
    pub key: String,
    pub app_id: u32,
    pub name: String,
    pub exe: String,
    pub start_dir: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub launch_options: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub last_played: i64,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

impl ShortcutInfo {
    fn from_entry(key: &str, entry: &Map) -> Result<Self, SteamError> {
        let text = |field: &str| -> Result<String, SteamError> {
            Ok(entry.get_text(field)?.unwrap_or_default().into_owned())
        };
        let tags = match entry.get_map(TAGS_KEY)? {
            Some(tags) => tags
                .values()
                .filter_map(Value::to_string_lossy)
                .map(Cow::into_owned)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            key: key.to_owned(),
            app_id: entry.get_i32("appid")?.unwrap_or_default() as u32,
            name: text("AppName")?,
            exe: text("Exe")?,
            start_dir: text("StartDir")?,
            launch_options: text("LaunchOptions")?,
            tags,
            last_played: i64::from(entry.get_i32("LastPlayTime")?.unwrap_or_default() as u32),
        })
    }
}

/// A decoded shortcuts.vdf split into its collection and the rest of the root.
struct ShortcutsFile {
    root: Document,
    collection: Map,
    /// Whether the collection lives under the `shortcuts` key.
    wrapped: bool,
}

impl ShortcutsFile {
    fn empty() -> Self {
        Self {
            root: Document::new(),
            collection: Map::new(),
            wrapped: true,
        }
    }

    fn from_document(mut root: Document) -> Self {
        if !root.contains_key(SHORTCUTS_KEY) {
            return Self {
                root: Document::new(),
                collection: root,
                wrapped: false,
            };
        }

        let collection = match root.get_mut(SHORTCUTS_KEY) {
            Some(Value::Map(m)) => std::mem::take(m),
            Some(other) => {
                tracing::warn!(
                    found = other.type_name(),
                    "'shortcuts' is not a map, treating it as empty"
                );
                Map::new()
            }
            None => Map::new(),
        };

        Self {
            root,
            collection,
            wrapped: true,
        }
    }

    fn into_document(self) -> Document {
        if !self.wrapped {
            return self.collection;
        }
        let mut root = self.root;
        root.insert(SHORTCUTS_KEY, self.collection);
        root
    }
}

/// Adds, removes and looks up tagged shortcuts in one user's shortcuts.vdf.
pub struct ShortcutStore {
    paths: UserdataPaths,
    tag_prefix: String,
    renderer: Option<Box<dyn ArtworkRenderer>>,
}

impl ShortcutStore {
    /// Creates a store for the given `userdata/<account id>` directory.
    pub fn new(userdata_root: impl Into<PathBuf>) -> Self {
        Self {
            paths: UserdataPaths::new(userdata_root),
            tag_prefix: DEFAULT_TAG_PREFIX.into(),
            renderer: None,
        }
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    pub fn with_renderer(mut self, renderer: impl ArtworkRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn paths(&self) -> &UserdataPaths {
        &self.paths
    }

    /// Returns the ownership tag stored in `tags["0"]`: `<prefix>_<owner_tag>`.
    pub fn full_tag(&self, owner_tag: &str) -> String {
        format!("{}_{owner_tag}", self.tag_prefix)
    }

    /// Adds a shortcut unless one with the same ownership tag already exists.
    ///
    /// A missing or undecodable shortcuts.vdf is replaced by a new document.
    /// Artwork is generated after the entry is written; a rendering failure
    /// is reported in the outcome, not as an error.
    pub fn add(&self, spec: &ShortcutSpec) -> Result<AddOutcome, SteamError> {
        let shortcuts_path = self.paths.shortcuts_path();
        let full_tag = self.full_tag(&spec.owner_tag);

        let mut file = match self.read_document() {
            Ok(Some(doc)) => ShortcutsFile::from_document(doc),
            Ok(None) => {
                tracing::info!(path = %shortcuts_path.display(), "shortcuts.vdf does not exist, creating new");
                ShortcutsFile::empty()
            }
            Err(SteamError::MalformedDocument(reason)) => {
                tracing::warn!(
                    path = %shortcuts_path.display(),
                    %reason,
                    "failed to decode shortcuts.vdf, starting with an empty list"
                );
                ShortcutsFile::empty()
            }
            Err(e) => return Err(e),
        };

        if let Some(key) = find_by_tag(&file.collection, &full_tag) {
            tracing::info!(tag = %full_tag, key = %key, "shortcut already exists, skipping");
            return Ok(AddOutcome::AlreadyPresent {
                key: key.to_owned(),
            });
        }

        let exe = strip_quotes(&spec.exe);
        let name = strip_quotes(&spec.name);
        let short_id = short_artwork_id(exe, name);
        let app_id = vdf_entry_app_id(exe, name);
        tracing::debug!(short_id, app_id, "generated shortcut ids");

        let icon = match spec.icon_source {
            Some(_) => self
                .paths
                .artwork_path(short_id, ArtworkType::Icon, "png")
                .to_string_lossy()
                .into_owned(),
            None => String::new(),
        };

        let key = next_key(&file.collection)?;
        file.collection
            .insert(key.clone(), build_entry(spec, app_id, &icon, &full_tag));
        vdf::save(&shortcuts_path, &file.into_document())?;
        tracing::info!(key = %key, name = %spec.name, short_id, "shortcut added");

        let artwork_error = match &spec.icon_source {
            Some(source) => self.render_artwork(short_id, source, spec.watermark.as_deref()),
            None => None,
        };

        Ok(AddOutcome::Added {
            key,
            short_id,
            app_id,
            artwork_error,
        })
    }

    /// Removes the shortcut carrying the ownership tag and its artwork.
    ///
    /// A missing file or tag is not an error. A file that cannot be decoded
    /// holds no match and is left as it is.
    pub fn remove(&self, owner_tag: &str) -> Result<RemoveOutcome, SteamError> {
        let full_tag = self.full_tag(owner_tag);
        tracing::info!(tag = %full_tag, "removing shortcut");

        let doc = match self.read_document() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::debug!("shortcuts.vdf does not exist, nothing to remove");
                return Ok(RemoveOutcome::NotFound);
            }
            Err(SteamError::MalformedDocument(reason)) => {
                tracing::warn!(
                    path = %self.paths.shortcuts_path().display(),
                    %reason,
                    "failed to decode shortcuts.vdf, nothing to remove"
                );
                return Ok(RemoveOutcome::NotFound);
            }
            Err(e) => return Err(e),
        };
        let mut file = ShortcutsFile::from_document(doc);

        let Some(key) = find_by_tag(&file.collection, &full_tag).map(str::to_owned) else {
            tracing::info!(tag = %full_tag, "no shortcut with this tag");
            return Ok(RemoveOutcome::NotFound);
        };

        let identity = file
            .collection
            .remove(&key)
            .as_ref()
            .and_then(Value::as_map)
            .and_then(artwork_identity);

        vdf::save(&self.paths.shortcuts_path(), &file.into_document())?;
        tracing::info!(key = %key, "shortcut removed");

        let (short_id, deleted_artwork) = match identity {
            Some((exe, name)) => {
                let short_id = short_artwork_id(&exe, &name);
                (Some(short_id), self.delete_artwork(short_id))
            }
            None => (None, Vec::new()),
        };

        Ok(RemoveOutcome::Removed {
            key,
            short_id,
            deleted_artwork,
        })
    }

    /// Returns whether a shortcut with the ownership tag exists.
    ///
    /// An unreadable or undecodable file counts as "not found".
    pub fn exists(&self, owner_tag: &str) -> bool {
        let full_tag = self.full_tag(owner_tag);
        match self.read_document() {
            Ok(Some(doc)) => {
                let file = ShortcutsFile::from_document(doc);
                find_by_tag(&file.collection, &full_tag).is_some()
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read shortcuts.vdf");
                false
            }
        }
    }

    /// Lists every shortcut entry in the collection.
    pub fn list(&self) -> Result<Vec<ShortcutInfo>, SteamError> {
        let Some(doc) = self.read_document()? else {
            return Ok(Vec::new());
        };
        let file = ShortcutsFile::from_document(doc);

        let mut shortcuts = Vec::new();
        for (key, value) in file.collection.iter() {
            let Some(entry) = value.as_map() else {
                continue;
            };
            match ShortcutInfo::from_entry(key, entry) {
                Ok(info) => shortcuts.push(info),
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable shortcut entry"),
            }
        }
        Ok(shortcuts)
    }

    /// Reads shortcuts.vdf, returning `None` when the file does not exist.
    fn read_document(&self) -> Result<Option<Document>, SteamError> {
        let path = self.paths.shortcuts_path();
        if !path.is_file() {
            return Ok(None);
        }
        vdf::load(&path).map(Some)
    }

    fn render_artwork(&self, short_id: u32, source: &Path, watermark: Option<&Path>) -> Option<String> {
        let Some(renderer) = &self.renderer else {
            tracing::warn!("no artwork renderer configured, skipping artwork");
            return Some("no artwork renderer configured".into());
        };

        match renderer.render(short_id, source, &self.paths.grid_dir(), watermark) {
            Ok(files) => {
                tracing::info!(short_id, count = files.len(), "artwork generated");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to generate artwork, shortcut was added anyway");
                Some(e.to_string())
            }
        }
    }

    /// Deletes every artwork file Steam may use for `short_id`.
    fn delete_artwork(&self, short_id: u32) -> Vec<PathBuf> {
        let mut deleted = Vec::new();
        for path in self.paths.artwork_candidates(short_id) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "deleted artwork");
                    deleted.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete artwork")
                }
            }
        }
        deleted
    }
}

/// Returns the key of the first entry whose `tags` contain `full_tag`.
fn find_by_tag<'a>(collection: &'a Map, full_tag: &str) -> Option<&'a str> {
    collection
        .iter()
        .find(|(_, entry)| has_tag(entry, full_tag))
        .map(|(key, _)| key)
}

fn has_tag(entry: &Value, full_tag: &str) -> bool {
    entry
        .as_map()
        .and_then(|m| m.get(TAGS_KEY))
        .and_then(Value::as_map)
        .is_some_and(|tags| tags.values().any(|t| t.as_str() == Some(full_tag)))
}

/// Returns one past the largest numeric key, or "0".
///
/// Keys too large to parse are ignored; they can never equal the result.
fn next_key(collection: &Map) -> Result<String, SteamError> {
    let max = collection
        .keys()
        .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|k| k.parse::<u128>().ok())
        .max();
    match max {
        None => Ok("0".into()),
        Some(max) => max.checked_add(1).map(|k| k.to_string()).ok_or_else(|| {
            SteamError::MalformedDocument(format!("no shortcut key left after {max}"))
        }),
    }
}

/// Returns the quote-stripped `Exe` and `AppName` an entry's artwork id derives from.
fn artwork_identity(entry: &Map) -> Option<(String, String)> {
    let field = |key: &str| match entry.get_str(key) {
        Ok(value) => value
            .map(|s| strip_quotes(s).to_owned())
            .filter(|s| !s.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "cannot derive artwork id");
            None
        }
    };
    Some((field("Exe")?, field("AppName")?))
}

fn build_entry(spec: &ShortcutSpec, app_id: i32, icon: &str, full_tag: &str) -> Map {
    let mut tags = Map::new();
    tags.insert("0", full_tag);

    let mut entry = Map::new();
    entry.insert("appid", app_id);
    entry.insert("AppName", spec.name.as_str());
    entry.insert("Exe", spec.exe.as_str());
    entry.insert("StartDir", start_dir(&spec.exe));
    entry.insert("icon", icon);
    entry.insert("ShortcutPath", "");
    entry.insert("LaunchOptions", spec.launch_options.as_str());
    entry.insert("IsHidden", 0);
    entry.insert("AllowDesktopConfig", 1);
    entry.insert("AllowOverlay", 1);
    entry.insert("OpenVR", 0);
    entry.insert("Devkit", 0);
    entry.insert("DevkitGameID", "");
    entry.insert("DevkitOverrideAppID", 0);
    entry.insert("LastPlayTime", 0);
    entry.insert(OWNER_FIELD, spec.owner_tag.as_str());
    entry.insert(TAGS_KEY, tags);
    entry
}

/// Directory of an absolute exe path, "." otherwise.
///
/// Everything before the last `/`, with trailing slashes trimmed unless the
/// directory is the root: `/opt/app/` gives `/opt/app`, `/run` gives `/`.
fn start_dir(exe: &str) -> String {
    if !Path::new(exe).is_absolute() {
        tracing::warn!(exe, "exe path is not absolute, StartDir set to '.'");
        return ".".into();
    }
    let head = &exe[..exe.rfind('/').map_or(0, |i| i + 1)];
    match head.trim_end_matches('/') {
        "" => head.to_owned(),
        dir => dir.to_owned(),
    }
}
