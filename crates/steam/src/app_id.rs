//! Shortcut identifiers as Steam derives them.
//!
//! Steam recomputes these values on its own to find artwork in the grid
//! directory, so they must match bit for bit.

use crc32fast::Hasher;

/// High bit forced on every non-Steam shortcut id.
const SHORTCUT_HIGH_BIT: u32 = 0x8000_0000;

/// Low-order tag of the 64-bit id marking a non-Steam shortcut.
const SHORTCUT_TYPE_TAG: u64 = 0x0200_0000;

/// CRC-32/ISO-HDLC (reflected, polynomial 0xEDB88320).
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Returns the full 64-bit shortcut id (the one used in `steam://rungameid/`).
///
/// The hash input is the executable wrapped in double quotes followed by the
/// app name, with no separator.
pub fn preliminary_id(exe: &str, name: &str) -> u64 {
    let key = format!("\"{exe}\"{name}");
    let top = crc32(key.as_bytes()) | SHORTCUT_HIGH_BIT;
    (u64::from(top) << 32) | SHORTCUT_TYPE_TAG
}

/// Returns the 32-bit id used to name artwork files in the grid directory.
pub fn short_artwork_id(exe: &str, name: &str) -> u32 {
    (preliminary_id(exe, name) >> 32) as u32
}

/// Returns the signed `appid` stored in the shortcut entry.
pub fn vdf_entry_app_id(exe: &str, name: &str) -> i32 {
    (i64::from(short_artwork_id(exe, name)) - 0x1_0000_0000) as i32
}

/// Removes wrapping double quotes, as Steam stores quoted `Exe` values.
pub fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_values() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(
            crc32(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn short_artwork_id_golden() {
        assert_eq!(
            short_artwork_id("/usr/bin/flatpak", "Example App"),
            2_685_396_198
        );
        assert_eq!(short_artwork_id("/usr/bin/game", "My Game"), 3_117_443_181);
        assert_eq!(short_artwork_id("/usr/bin/flatpak", "Firefox"), 4_201_274_167);
    }

    #[test]
    fn vdf_entry_app_id_golden() {
        assert_eq!(
            vdf_entry_app_id("/usr/bin/flatpak", "Example App"),
            -1_609_571_098
        );
        assert_eq!(vdf_entry_app_id("/usr/bin/flatpak", "Firefox"), -93_693_129);
    }

    #[test]
    fn preliminary_id_layout() {
        let id = preliminary_id("/usr/bin/flatpak", "Example App");
        assert_eq!(id, (2_685_396_198u64 << 32) | 0x0200_0000);
    }

    #[test]
    fn ids_deterministic() {
        let a = short_artwork_id("/usr/bin/game", "My Game");
        let b = short_artwork_id("/usr/bin/game", "My Game");
        assert_eq!(a, b);
        assert_ne!(a, short_artwork_id("/usr/bin/game", "My Game 2"));
    }

    #[test]
    fn high_bit_always_set() {
        for (exe, name) in [("/bin/test", "Test"), ("", ""), ("/opt/x", "Ünïcödé")] {
            assert_ne!(short_artwork_id(exe, name) & SHORTCUT_HIGH_BIT, 0);
            assert!(vdf_entry_app_id(exe, name) < 0);
        }
    }

    #[test]
    fn entry_id_is_bitcast_of_short_id() {
        for (exe, name) in [
            ("/usr/bin/flatpak", "Example App"),
            ("/bin/a", "Game A"),
            ("C:\\Games\\x.exe", "X"),
        ] {
            let short = short_artwork_id(exe, name);
            let entry = vdf_entry_app_id(exe, name);
            assert_eq!(entry, (i64::from(short) - 0x1_0000_0000) as i32);
            assert_eq!(entry as u32, short);
        }
    }

    #[test]
    fn strip_quotes_variants() {
        assert_eq!(strip_quotes("\"/usr/bin/flatpak\""), "/usr/bin/flatpak");
        assert_eq!(strip_quotes("\"\"quoted\"\""), "quoted");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("a \"b\" c"), "a \"b\" c");
    }
}
