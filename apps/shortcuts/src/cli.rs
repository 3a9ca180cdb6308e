use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "deckstore-shortcuts",
    about = "Manage DeckStore apps as non-Steam shortcuts, with generated artwork",
    version
)]
pub struct Cli {
    /// Operation to perform.
    #[arg(long, value_enum)]
    pub action: Action,

    /// Unique tag of the app, e.g. its Flatpak app id.
    #[arg(
        long = "appid_tag",
        alias = "appid-tag",
        value_name = "TAG",
        required_if_eq_any([("action", "add"), ("action", "remove"), ("action", "check")])
    )]
    pub appid_tag: Option<String>,

    /// Display name of the app in Steam.
    #[arg(long, required_if_eq("action", "add"))]
    pub name: Option<String>,

    /// Source image for the generated artwork.
    #[arg(long, value_name = "PATH", required_if_eq("action", "add"))]
    pub icon: Option<PathBuf>,

    /// Launch options passed to the executable.
    #[arg(long, allow_hyphen_values = true, required_if_eq("action", "add"))]
    pub params: Option<String>,

    /// Executable to launch [default: from config, /usr/bin/flatpak]
    #[arg(long, value_name = "PATH")]
    pub exe: Option<String>,

    /// Watermark image drawn onto the generated artwork.
    #[arg(long = "deckstore_logo_path", alias = "deckstore-logo-path", value_name = "PATH")]
    pub deckstore_logo_path: Option<PathBuf>,

    /// Steam userdata directory of the user to modify (skips detection).
    #[arg(long, value_name = "DIR")]
    pub userdata: Option<PathBuf>,

    /// Configuration file [default: ~/.config/deckstore/shortcuts.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print `list` output as JSON.
    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Add,
    Remove,
    Check,
    List,
}
