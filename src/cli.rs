//! Command-line surface.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Update Docker Compose containers whose images changed in the registry.
#[derive(Parser, Debug)]
#[command(
    name = "compose-autoupdate",
    version,
    about,
    after_help = "Examples:\n  \
        compose-autoupdate                                 # Update all containers with label\n  \
        compose-autoupdate --update mycontainer            # Update only mycontainer (if labelled)\n  \
        compose-autoupdate --update mycontainer --force    # Force update mycontainer (bypass label)\n  \
        compose-autoupdate --force                         # Force update all compose containers\n  \
        compose-autoupdate --cleanup                       # Update all and clean dangling images\n  \
        compose-autoupdate --update mycontainer --cleanup  # Update one and remove its old image"
)]
pub struct Cli {
    /// Label selecting containers to update [default: autoupdate.enable=true].
    #[arg(long, value_name = "KEY=VALUE")]
    pub label: Option<String>,

    /// Update only the named container.
    #[arg(long, value_name = "CONTAINER")]
    pub update: Option<String>,

    /// Bypass the label check and the digest comparison.
    #[arg(long)]
    pub force: bool,

    /// Remove old images afterwards (the replaced image with --update,
    /// all dangling images otherwise).
    #[arg(long)]
    pub cleanup: bool,

    /// Answer yes to the --force confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Additional TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// `--force` without a target touches every compose container.
    pub fn needs_confirmation(&self) -> bool {
        self.force && self.update.is_none() && !self.yes
    }

    /// Flags given on the command line win over every config layer.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(label) = &self.label {
            cfg.label = label.clone();
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = Some(level.clone());
        }
    }
}

/// Prints `prompt` and reads one answer; only `y` confirms.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> io::Result<bool> {
    write!(out, "{} (y/N): ", prompt)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
