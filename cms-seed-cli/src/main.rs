//! cms-seed CLI
//!
//! Command-line interface for exporting, geocoding and loading the
//! organization and sede datasets into a Strapi CMS.

mod cli_types;
mod commands;
mod error;
mod logging;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use cms_seed_remote::Config;

use crate::cli_types::{Cli, Commands, ConfigAction};
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.quiet, cli.logfile.as_deref()) {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!(
            "{}",
            "cms-seed failed".if_supports_color(Stderr, |t| t.red())
        );
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_override = cli.config.as_deref();

    match cli.command {
        Commands::Load { args } => {
            let config = Config::load(config_override)?;
            commands::load::run_load(config, args, cli.quiet)
        }
        Commands::Clean => {
            let config = Config::load(config_override)?;
            commands::clean::run_clean(&config, cli.quiet)
        }
        Commands::Fetch { tables, out_dir } => {
            let config = Config::load(config_override)?;
            commands::fetch::run_fetch(&config, tables, out_dir, cli.quiet)
        }
        Commands::Geocode {
            sedes,
            output,
            concurrency,
        } => {
            let config = Config::load(config_override)?;
            commands::geocode::run_geocode(&config, sedes, output, concurrency, cli.quiet)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(config_override),
            ConfigAction::Path => commands::config::run_config_path(config_override),
            ConfigAction::Init { force } => {
                commands::config::run_config_init(config_override, force)
            }
        },
    }
}
