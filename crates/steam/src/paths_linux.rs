use std::path::PathBuf;

/// Returns the Steam roots used by native, Debian-style and Flatpak installs.
pub(crate) fn root_candidates() -> Vec<PathBuf> {
    let Some(home) = home_dir() else {
        return Vec::new();
    };

    vec![
        home.join(".steam").join("root"),
        home.join(".local").join("share").join("Steam"),
        home.join(".steam").join("steam"),
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join("data")
            .join("Steam"),
    ]
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
