//! Binary VDF codec used by `shortcuts.vdf`.
//!
//! The format is a tree of typed key/value entries. Every entry starts with a
//! type marker followed by a NUL-terminated key; maps are closed by an end
//! marker. The whole file is an implicit root map, so a well-formed document
//! ends with two end markers (one for the top-level named map, one for the
//! root).

use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::SteamError;

/// Binary VDF type markers used in shortcuts.vdf.
const VDF_TYPE_OBJECT: u8 = 0x00;
const VDF_TYPE_STRING: u8 = 0x01;
const VDF_TYPE_INT32: u8 = 0x02;
const VDF_TYPE_END: u8 = 0x08;

/// Maximum nesting depth accepted by the decoder.
const MAX_DEPTH: usize = 64;

/// A decoded binary VDF file: the implicit root map.
pub type Document = Map;

/// A typed VDF value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Map(Map),
    String(String),
    /// A string value that is not valid UTF-8, kept verbatim so that it is
    /// written back unchanged.
    Bytes(Vec<u8>),
    Int32(i32),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns a string value for display, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b)),
            _ => None,
        }
    }

    /// Short type name used in schema mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Map(_) => "map",
            Value::String(_) => "string",
            Value::Bytes(_) => "non-UTF-8 string",
            Value::Int32(_) => "int32",
        }
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

/// An insertion-ordered map with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts a value, replacing an existing key in place or appending a new one.
    ///
    /// Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns a string field, or `SchemaMismatch` if the key holds another type.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, SteamError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch(key, "string", other)),
        }
    }

    /// Returns a string field for display, replacing invalid UTF-8.
    pub fn get_text(&self, key: &str) -> Result<Option<Cow<'_, str>>, SteamError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .to_string_lossy()
                .map(Some)
                .ok_or_else(|| mismatch(key, "string", value)),
        }
    }

    /// Returns an int32 field, or `SchemaMismatch` if the key holds another type.
    pub fn get_i32(&self, key: &str) -> Result<Option<i32>, SteamError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Int32(v)) => Ok(Some(*v)),
            Some(other) => Err(mismatch(key, "int32", other)),
        }
    }

    /// Returns a nested map, or `SchemaMismatch` if the key holds another type.
    pub fn get_map(&self, key: &str) -> Result<Option<&Map>, SteamError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Map(m)) => Ok(Some(m)),
            Some(other) => Err(mismatch(key, "map", other)),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> SteamError {
    SteamError::SchemaMismatch {
        key: key.to_owned(),
        expected,
        found: found.type_name(),
    }
}

/// Reads and decodes a binary VDF file.
pub fn load(path: &Path) -> Result<Document, SteamError> {
    let data = fs::read(path)
        .map_err(|e| SteamError::Io(format!("failed to read {}: {e}", path.display())))?;
    decode(&data)
}

/// Encodes a document and replaces `path` with it.
///
/// The bytes are written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partial file. An
/// existing file's permissions carry over.
pub fn save(path: &Path, doc: &Document) -> Result<(), SteamError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .map_err(|e| SteamError::Io(format!("failed to create {}: {e}", dir.display())))?;

    let data = encode(doc);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| SteamError::Io(format!("failed to create temp file: {e}")))?;
    tmp.write_all(&data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SteamError::Io(format!("failed to write {}: {e}", path.display())))?;

    // The temp file is created 0600; keep the mode of the file it replaces.
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| SteamError::Io(format!("failed to set permissions: {e}")))?;
    }
    tmp.persist(path)
        .map_err(|e| SteamError::Io(format!("failed to replace {}: {}", path.display(), e.error)))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote VDF document");
    Ok(())
}

/// Decodes binary VDF data into a document.
pub fn decode(data: &[u8]) -> Result<Document, SteamError> {
    if data.is_empty() {
        return Err(SteamError::MalformedDocument("empty document".into()));
    }

    let (root, pos) = parse_map(data, 0, 0)?;
    if pos != data.len() {
        return Err(SteamError::MalformedDocument(format!(
            "{} trailing bytes after root terminator at pos {pos}",
            data.len() - pos
        )));
    }
    Ok(root)
}

/// Encodes a document into binary VDF.
///
/// Keys and strings are written as-is; they must not contain NUL bytes.
pub fn encode(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    write_map(&mut out, doc);
    out
}

/// Parses map entries up to and including the map's end marker.
fn parse_map(data: &[u8], mut pos: usize, depth: usize) -> Result<(Map, usize), SteamError> {
    if depth > MAX_DEPTH {
        return Err(SteamError::MalformedDocument(format!(
            "nesting deeper than {MAX_DEPTH} at pos {pos}"
        )));
    }

    let mut map = Map::new();

    while pos < data.len() {
        let type_byte = data[pos];
        pos += 1;

        if type_byte == VDF_TYPE_END {
            return Ok((map, pos));
        }

        if !matches!(
            type_byte,
            VDF_TYPE_OBJECT | VDF_TYPE_STRING | VDF_TYPE_INT32
        ) {
            return Err(SteamError::MalformedDocument(format!(
                "unknown type marker 0x{type_byte:02x} at pos {}",
                pos - 1
            )));
        }

        let (key, new_pos) = read_cstr(data, pos)?;
        let key = String::from_utf8_lossy(key).into_owned();
        pos = new_pos;

        let value = match type_byte {
            VDF_TYPE_OBJECT => {
                let (child, new_pos) = parse_map(data, pos, depth + 1)?;
                pos = new_pos;
                Value::Map(child)
            }
            VDF_TYPE_STRING => {
                let (val, new_pos) = read_cstr(data, pos)?;
                pos = new_pos;
                match String::from_utf8(val.to_vec()) {
                    Ok(s) => Value::String(s),
                    Err(e) => Value::Bytes(e.into_bytes()),
                }
            }
            _ => {
                let bytes: [u8; 4] = data
                    .get(pos..pos + 4)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| {
                        SteamError::MalformedDocument(format!(
                            "unexpected end of data reading int32 for '{key}'"
                        ))
                    })?;
                pos += 4;
                Value::Int32(i32::from_le_bytes(bytes))
            }
        };

        map.insert(key, value);
    }

    Err(SteamError::MalformedDocument(
        "unexpected end of data: map not terminated".into(),
    ))
}

/// Reads a null-terminated byte string from data starting at pos.
fn read_cstr(data: &[u8], pos: usize) -> Result<(&[u8], usize), SteamError> {
    let rest = data.get(pos..).unwrap_or_default();
    match rest.iter().position(|&b| b == 0x00) {
        Some(len) => Ok((&rest[..len], pos + len + 1)),
        None => Err(SteamError::MalformedDocument(format!(
            "unterminated string starting at pos {pos}"
        ))),
    }
}

fn write_map(out: &mut Vec<u8>, map: &Map) {
    for (key, value) in map.iter() {
        match value {
            Value::Map(child) => {
                out.push(VDF_TYPE_OBJECT);
                write_cstr(out, key.as_bytes());
                write_map(out, child);
            }
            Value::String(s) => {
                out.push(VDF_TYPE_STRING);
                write_cstr(out, key.as_bytes());
                write_cstr(out, s.as_bytes());
            }
            Value::Bytes(b) => {
                out.push(VDF_TYPE_STRING);
                write_cstr(out, key.as_bytes());
                write_cstr(out, b);
            }
            Value::Int32(v) => {
                out.push(VDF_TYPE_INT32);
                write_cstr(out, key.as_bytes());
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    out.push(VDF_TYPE_END);
}

fn write_cstr(out: &mut Vec<u8>, s: &[u8]) {
    out.extend_from_slice(s);
    out.push(0x00);
}
