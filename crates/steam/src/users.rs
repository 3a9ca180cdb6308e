use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::SteamError;
use crate::paths::steam_root_candidates;
use crate::vdf::{Map, Value};
use crate::vdf_text;

/// Offset between a 32-bit account id and its SteamID64.
pub const STEAM_ID64_BASE: u64 = 76_561_197_960_265_728;

/// A Steam user directory under `<steam root>/userdata`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Account id, the directory name.
    pub id: String,
    pub path: PathBuf,
    pub steam_root: PathBuf,
    pub has_shortcuts: bool,
    /// Modification time of `config/localconfig.vdf`.
    pub config_modified: SystemTime,
}

/// Returns the userdata directory of the active Steam user.
pub fn locate_active_userdata_root() -> Result<PathBuf, SteamError> {
    locate_active_userdata_root_in(&steam_root_candidates())
}

/// Like [`locate_active_userdata_root`], searching the given Steam roots.
///
/// Fails with [`SteamError::NotFound`] when no root has a `userdata`
/// directory, and [`SteamError::UserNotFound`] when none holds a user.
pub fn locate_active_userdata_root_in(steam_roots: &[PathBuf]) -> Result<PathBuf, SteamError> {
    if !steam_roots.iter().any(|root| root.join("userdata").is_dir()) {
        return Err(SteamError::NotFound);
    }
    let users = find_users(steam_roots);
    let user = select_active_user(&users).ok_or(SteamError::UserNotFound)?;
    Ok(user.path.clone())
}

/// Returns every user directory that has a `config/localconfig.vdf`.
///
/// A directory reachable from several roots (symlinked installs) is listed
/// once, under the first root.
pub fn find_users(steam_roots: &[PathBuf]) -> Vec<User> {
    let mut seen = HashSet::new();
    let mut users = Vec::new();

    for root in steam_roots {
        let Ok(entries) = fs::read_dir(root.join("userdata")) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();

            // Verify it's a numeric user ID
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            // "0" is a placeholder Steam creates before login
            if name == "0" {
                continue;
            }

            let config_dir = path.join("config");
            let config_modified = match fs::metadata(config_dir.join("localconfig.vdf")) {
                Ok(meta) if meta.is_file() => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                _ => continue,
            };

            let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(canonical) {
                continue;
            }

            users.push(User {
                id: name.into_owned(),
                has_shortcuts: config_dir.join("shortcuts.vdf").is_file(),
                path,
                steam_root: root.clone(),
                config_modified,
            });
        }
    }

    users
}

/// Picks the active user.
///
/// The user with the latest login `Timestamp` in `loginusers.vdf` wins;
/// without one, the user whose `localconfig.vdf` changed most recently.
pub fn select_active_user(users: &[User]) -> Option<&User> {
    let mut by_recent: Vec<&User> = users.iter().collect();
    by_recent.sort_by(|a, b| b.config_modified.cmp(&a.config_modified));

    let mut login_files: HashMap<&Path, Option<Map>> = HashMap::new();
    let mut best: Option<(&User, u64)> = None;

    for &user in &by_recent {
        let login_users = login_files
            .entry(user.steam_root.as_path())
            .or_insert_with(|| read_login_users(&user.steam_root));
        let Some(timestamp) = login_users
            .as_ref()
            .and_then(|m| login_timestamp(m, &user.id))
        else {
            continue;
        };
        if timestamp > best.map_or(0, |(_, t)| t) {
            best = Some((user, timestamp));
        }
    }

    if let Some((user, timestamp)) = best {
        tracing::info!(path = %user.path.display(), timestamp, "active Steam user found via loginusers.vdf");
        return Some(user);
    }

    let user = by_recent.first().copied()?;
    tracing::info!(path = %user.path.display(), "using most recently active Steam user (localconfig.vdf)");
    Some(user)
}

/// Converts an account id to its SteamID64.
pub fn account_id_to_steam_id64(account_id: u32) -> u64 {
    STEAM_ID64_BASE + u64::from(account_id)
}

fn read_login_users(steam_root: &Path) -> Option<Map> {
    let path = steam_root.join("config").join("loginusers.vdf");
    if !path.is_file() {
        return None;
    }
    match vdf_text::load(&path) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not process loginusers.vdf");
            None
        }
    }
}

/// Returns the login timestamp recorded for an account id.
///
/// `loginusers.vdf` is keyed by SteamID64; a plain account id key is accepted
/// too.
fn login_timestamp(login_users: &Map, account_id: &str) -> Option<u64> {
    let users = login_users.get("users").and_then(Value::as_map)?;
    let steam_id64 = account_id
        .parse::<u32>()
        .ok()
        .map(|id| account_id_to_steam_id64(id).to_string());

    let details = users
        .get(account_id)
        .or_else(|| steam_id64.as_deref().and_then(|id| users.get(id)))
        .and_then(Value::as_map)?;

    details
        .get("Timestamp")
        .and_then(Value::as_str)
        .and_then(|t| t.trim().parse().ok())
}
