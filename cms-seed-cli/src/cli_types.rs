//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use cms_seed_core::{EntityKind, ErrorPolicy};

#[derive(Parser)]
#[command(name = "cms-seed")]
#[command(about = "Seed a Strapi CMS from exported datasets", long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to <config dir>/cms-seed/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub(crate) struct LoadArgs {
    /// Datasets to load (e.g., macroareas,areas,sedes); all by default
    #[arg(short, long, value_delimiter = ',')]
    pub kinds: Option<Vec<EntityKind>>,

    /// Directory holding the exported <dataset>.json files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Geocoded coordinates file for sedes
    #[arg(long)]
    pub coordinates: Option<PathBuf>,

    /// What to do when the CMS rejects a record: skip or abort
    #[arg(long)]
    pub on_error: Option<ErrorPolicy>,

    /// Don't purge previously seeded content before loading
    #[arg(long)]
    pub no_clean: bool,

    /// Write a per-record report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Load datasets into the CMS
    Load {
        #[command(flatten)]
        args: LoadArgs,
    },

    /// Purge previously seeded content from the CMS
    Clean,

    /// Export tables from SeaTable as <table>.json files
    Fetch {
        /// Tables to export (defaults to every dataset)
        #[arg(value_delimiter = ',')]
        tables: Vec<String>,

        /// Output directory (defaults to the configured data directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Geocode sede addresses into a coordinates file
    Geocode {
        /// Sedes export to read (defaults to <data dir>/sedes.json)
        #[arg(long)]
        sedes: Option<PathBuf>,

        /// Output file (defaults to the configured coordinates path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Lookups in flight at once
        #[arg(long, default_value_t = cms_seed_remote::geocode::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show resolved settings and where each came from
    Show,

    /// Print the config file path
    Path,

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
