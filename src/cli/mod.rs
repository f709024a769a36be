pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Fetch research papers: direct download first, browser second", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/quarry/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every paper listed in a results catalog
    Fetch {
        /// Catalog file (Title: / Main Link: / [PDF]: / ---)
        catalog: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Pause in the browser so you can sign in or solve captchas
        #[arg(long, conflicts_with = "headless")]
        interactive: bool,

        /// Never pause; run the browser headless
        #[arg(long)]
        headless: bool,

        /// Browser profile directory kept between runs
        #[arg(long)]
        profile_dir: Option<PathBuf>,

        /// Write outcomes as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Download every URL listed in a file, one per line
    Download {
        /// File with one URL per line
        list: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the references parsed from a catalog
    Parse {
        /// Catalog file
        catalog: PathBuf,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct OutputArgs {
    /// Directory documents are saved into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Connect/idle timeout for downloads in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl OutputArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output {
            config.fetch.output_dir = dir.clone();
        }
        if let Some(secs) = self.timeout {
            config.fetch.direct_timeout_secs = secs;
        }
    }
}

/// Fold `fetch` flags into the loaded config; flags win.
pub fn apply_fetch_flags(
    config: &mut Config,
    output: &OutputArgs,
    interactive: bool,
    headless: bool,
    profile_dir: Option<&PathBuf>,
) {
    output.apply(config);
    if interactive {
        config.fetch.interactive = true;
    }
    if headless {
        config.fetch.interactive = false;
    }
    if let Some(dir) = profile_dir {
        config.browser.profile_dir = Some(dir.clone());
    }
}
