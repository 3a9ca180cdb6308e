//! Action dispatch for the command line.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use deckstore_artwork::GradientRenderer;
use deckstore_steam::paths::steam_root_candidates;
use deckstore_steam::{
    AddOutcome, RemoveOutcome, ShortcutSpec, ShortcutStore, locate_active_userdata_root_in,
};
use tracing::{info, warn};

use crate::cli::{Action, Cli};
use crate::config::Config;

/// Runs the requested action. `Ok(false)` means "not found" for `check`.
pub fn run(cli: &Cli) -> anyhow::Result<bool> {
    let stdout = io::stdout();
    run_with_output(cli, &mut stdout.lock())
}

fn run_with_output(cli: &Cli, out: &mut impl Write) -> anyhow::Result<bool> {
    let config = Config::load(cli.config.as_deref())?;
    let userdata = resolve_userdata(cli, &config)?;
    info!(path = %userdata.display(), "using Steam userdata directory");

    let store = ShortcutStore::new(userdata)
        .with_tag_prefix(config.tag_prefix.clone())
        .with_renderer(GradientRenderer::new());

    match cli.action {
        Action::Add => add(&store, cli, &config),
        Action::Remove => remove(&store, required_tag(cli)?),
        Action::Check => Ok(check(&store, required_tag(cli)?)),
        Action::List => list(&store, cli.json, out),
    }
}

/// `--userdata`, then the configured directory, then the active Steam user.
fn resolve_userdata(cli: &Cli, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli.userdata.as_ref().or(config.userdata_dir.as_ref()) {
        return Ok(dir.clone());
    }

    let mut roots = config.steam_roots.clone();
    roots.extend(steam_root_candidates());
    locate_active_userdata_root_in(&roots).context("Steam userdata directory not found")
}

fn required_tag(cli: &Cli) -> anyhow::Result<&str> {
    match cli.appid_tag.as_deref() {
        Some(tag) => Ok(tag),
        None => bail!("--appid_tag is required for this action"),
    }
}

fn add(store: &ShortcutStore, cli: &Cli, config: &Config) -> anyhow::Result<bool> {
    let (Some(name), Some(icon), Some(params)) = (&cli.name, &cli.icon, &cli.params) else {
        bail!("--name, --icon and --params are required for add");
    };

    let spec = ShortcutSpec {
        owner_tag: required_tag(cli)?.to_owned(),
        name: name.clone(),
        exe: cli.exe.clone().unwrap_or_else(|| config.default_exe.clone()),
        launch_options: params.clone(),
        icon_source: Some(icon.clone()),
        watermark: cli
            .deckstore_logo_path
            .clone()
            .or_else(|| config.watermark.clone()),
    };

    match store.add(&spec)? {
        AddOutcome::Added {
            artwork_error: Some(e),
            ..
        } => warn!(error = %e, "artwork could not be saved, but the shortcut was added"),
        AddOutcome::Added { .. } | AddOutcome::AlreadyPresent { .. } => {}
    }
    Ok(true)
}

fn remove(store: &ShortcutStore, tag: &str) -> anyhow::Result<bool> {
    match store.remove(tag)? {
        RemoveOutcome::Removed {
            deleted_artwork, ..
        } => info!(files = deleted_artwork.len(), "artwork deleted"),
        RemoveOutcome::NotFound => {}
    }
    Ok(true)
}

fn check(store: &ShortcutStore, tag: &str) -> bool {
    let found = store.exists(tag);
    info!(tag, found, "checked shortcut");
    found
}

fn list(store: &ShortcutStore, json: bool, out: &mut impl Write) -> anyhow::Result<bool> {
    let shortcuts = store.list()?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &shortcuts)?;
        writeln!(out)?;
    } else {
        for s in &shortcuts {
            writeln!(out, "{}\t{}\t{}\t{}", s.key, s.app_id, s.name, s.tags.join(","))?;
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    struct Fixture {
        _tmp: tempfile::TempDir,
        userdata: PathBuf,
        config: PathBuf,
        icon: PathBuf,
    }

    fn fixture(config: &str) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let userdata = tmp.path().join("userdata").join("42");
        let config_path = tmp.path().join("shortcuts.toml");
        std::fs::write(&config_path, config).unwrap();
        let icon = tmp.path().join("firefox.png");
        image::RgbaImage::from_pixel(64, 32, image::Rgba([255, 120, 0, 255]))
            .save(&icon)
            .unwrap();
        Fixture {
            userdata,
            config: config_path,
            icon,
            _tmp: tmp,
        }
    }

    fn exec(f: &Fixture, args: &[&str]) -> (anyhow::Result<bool>, String) {
        let mut argv = vec![
            "deckstore-shortcuts".to_owned(),
            "--userdata".to_owned(),
            f.userdata.display().to_string(),
            "--config".to_owned(),
            f.config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut out = Vec::new();
        let result = run_with_output(&cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn add_firefox(f: &Fixture) -> anyhow::Result<bool> {
        let icon = f.icon.display().to_string();
        exec(
            f,
            &[
                "--action",
                "add",
                "--appid_tag",
                "org.mozilla.firefox",
                "--name",
                "Firefox",
                "--icon",
                &icon,
                "--params",
                "run org.mozilla.firefox",
            ],
        )
        .0
    }

    fn grid_file(userdata: &Path, name: &str) -> PathBuf {
        userdata.join("config").join("grid").join(name)
    }

    #[test]
    fn add_check_remove_cycle() {
        let f = fixture("");
        assert!(add_firefox(&f).unwrap());
        assert!(f.userdata.join("config/shortcuts.vdf").is_file());
        assert!(grid_file(&f.userdata, "4201274167_icon.png").is_file());
        assert!(grid_file(&f.userdata, "4201274167p.png").is_file());

        let (found, _) = exec(&f, &["--action", "check", "--appid_tag", "org.mozilla.firefox"]);
        assert!(found.unwrap());

        let (removed, _) = exec(&f, &["--action", "remove", "--appid_tag", "org.mozilla.firefox"]);
        assert!(removed.unwrap());

        let (found, _) = exec(&f, &["--action", "check", "--appid_tag", "org.mozilla.firefox"]);
        assert!(!found.unwrap());
        assert!(!grid_file(&f.userdata, "4201274167_icon.png").exists());
        assert!(!grid_file(&f.userdata, "4201274167.png").exists());
    }

    #[test]
    fn add_twice_keeps_one_entry() {
        let f = fixture("");
        assert!(add_firefox(&f).unwrap());
        assert!(add_firefox(&f).unwrap());

        let (listed, out) = exec(&f, &["--action", "list"]);
        assert!(listed.unwrap());
        assert_eq!(out.lines().count(), 1);
        assert_eq!(out, "0\t4201274167\tFirefox\tDeckStore_org.mozilla.firefox\n");
    }

    #[test]
    fn list_as_json() {
        let f = fixture("");
        add_firefox(&f).unwrap();

        let (_, out) = exec(&f, &["--action", "list", "--json"]);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "Firefox");
        assert_eq!(entries[0]["appId"], 4201274167u64);
        assert_eq!(entries[0]["exe"], "/usr/bin/flatpak");
        assert_eq!(entries[0]["startDir"], "/usr/bin");
    }

    #[test]
    fn config_overrides_prefix_and_exe() {
        let f = fixture("tag_prefix = \"MyStore\"\ndefault_exe = \"/usr/bin/game\"\n");
        add_firefox(&f).unwrap();

        let (_, out) = exec(&f, &["--action", "list"]);
        assert!(out.contains("MyStore_org.mozilla.firefox"));

        let (found, _) = exec(&f, &["--action", "check", "--appid_tag", "org.mozilla.firefox"]);
        assert!(found.unwrap());
        let (_, json) = exec(&f, &["--action", "list", "--json"]);
        assert!(json.contains("\"/usr/bin/game\""));
    }

    #[test]
    fn missing_shortcuts_file() {
        let f = fixture("");
        let (found, _) = exec(&f, &["--action", "check", "--appid_tag", "x"]);
        assert!(!found.unwrap());
        let (removed, _) = exec(&f, &["--action", "remove", "--appid_tag", "x"]);
        assert!(removed.unwrap());
        let (listed, out) = exec(&f, &["--action", "list"]);
        assert!(listed.unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn remove_of_corrupt_file_leaves_it_alone() {
        let f = fixture("");
        let vdf = f.userdata.join("config/shortcuts.vdf");
        std::fs::create_dir_all(vdf.parent().unwrap()).unwrap();
        std::fs::write(&vdf, b"\x07garbage").unwrap();

        let (removed, _) = exec(&f, &["--action", "remove", "--appid_tag", "x"]);
        assert!(removed.unwrap());
        assert_eq!(std::fs::read(&vdf).unwrap(), b"\x07garbage");
    }

    #[test]
    fn malformed_config_fails() {
        let f = fixture("tag_prefix = [");
        let (result, _) = exec(&f, &["--action", "check", "--appid_tag", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn userdata_flag_beats_config() {
        let config = Config {
            userdata_dir: Some("/from/config".into()),
            ..Config::default()
        };
        let cli = Cli::try_parse_from(["deckstore-shortcuts", "--action", "list"]).unwrap();
        assert_eq!(resolve_userdata(&cli, &config).unwrap(), PathBuf::from("/from/config"));

        let cli = Cli::try_parse_from([
            "deckstore-shortcuts",
            "--action",
            "list",
            "--userdata",
            "/from/flag",
        ])
        .unwrap();
        assert_eq!(resolve_userdata(&cli, &config).unwrap(), PathBuf::from("/from/flag"));
    }
}
