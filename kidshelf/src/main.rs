//! kidshelf - curation pipeline for children's media
//!
//! Candidates move through four staged, resumable steps before entering the
//! catalog: discover, enrich, assess, review. Each stage persists its output
//! as a JSON file, so any step can be re-run without losing prior work.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Catalog + staging: $XDG_DATA_HOME/kidshelf/ (~/.local/share/kidshelf/)
//! - Logs: $XDG_STATE_HOME/kidshelf/kidshelf.log (~/.local/state/kidshelf/kidshelf.log)
//! - Config: $XDG_CONFIG_HOME/kidshelf/config.toml (~/.config/kidshelf/config.toml)

mod commands;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kidshelf_core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kidshelf")]
#[command(about = "Discover, vet, and catalog children's shows and movies")]
#[command(version)]
struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find new candidate titles from the metadata provider
    Discover,
    /// Fetch full metadata for discovered candidates
    Enrich,
    /// Run the AI safety assessment over enriched candidates
    Assess,
    /// Review assessed candidates (interactive unless --auto)
    Review {
        /// Accept every AI verdict without prompting
        #[arg(long)]
        auto: bool,
    },
    /// Merge reviewed candidates into the catalog
    Import {
        /// Replace matching catalog entries instead of keeping them
        #[arg(long)]
        overwrite: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-run the safety check on catalog entries rated Unsafe
    Reassess {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete the intermediate stage files
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard =
        kidshelf_core::logging::init(&config.logging).context("failed to initialize logging")?;

    match cli.command {
        Command::Discover => commands::discover::run(&config),
        Command::Enrich => commands::enrich::run(&config),
        Command::Assess => commands::assess::run(&config),
        Command::Review { auto } => commands::review::run(&config, auto),
        Command::Import { overwrite, yes } => commands::import::run(&config, overwrite, yes),
        Command::Reassess { yes } => commands::reassess::run(&config, yes),
        Command::Reset { yes } => commands::reset::run(&config, yes),
    }
}
