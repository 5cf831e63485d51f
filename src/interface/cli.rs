use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Commands
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the version token found in a file name
    Parse {
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the next version path (no disk access)
    Next {
        path: PathBuf,
    },
    /// Print the first version above PATH that is free on disk
    Resolve {
        path: PathBuf,

        /// Give up after this many occupied candidates
        #[arg(short, long)]
        budget: Option<u64>,
    },
    /// List the versions of a file present on disk
    Versions {
        path: PathBuf,
    },
    /// Publish a work file and roll it to the next version
    Publish {
        /// Work file to publish
        path: PathBuf,

        /// JSON publish configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input file the work file depends on (repeatable)
        #[arg(short = 'D', long = "dep")]
        deps: Vec<PathBuf>,

        /// Publish ledger (overrides the config)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// If the next version exists, save to the next free one first
        #[arg(long)]
        save_next: bool,

        /// Log what would happen without writing anything
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Show earlier publishes
    History {
        /// Only publishes of this path
        path: Option<PathBuf>,

        #[arg(long)]
        ledger: Option<PathBuf>,
    },
}
