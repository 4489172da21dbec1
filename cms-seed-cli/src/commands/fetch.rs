use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cms_seed_core::EntityKind;
use cms_seed_remote::{Config, SeaTableClient};

use crate::commands::{runtime, spinner};
use crate::error::CliError;

/// Export SeaTable tables into `<table>.json` files.
pub(crate) fn run_fetch(
    config: &Config,
    tables: Vec<String>,
    out_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let tables: Vec<String> = if tables.is_empty() {
        EntityKind::load_order()
            .iter()
            .map(|k| k.short_name().to_string())
            .collect()
    } else {
        tables
    };
    let out_dir = out_dir.unwrap_or_else(|| config.load.data_dir.clone());
    let client = SeaTableClient::new(&config.seatable)?;

    let table_refs: Vec<&str> = tables.iter().map(String::as_str).collect();
    let pb = spinner(quiet, format!("Exporting {} tables...", table_refs.len()));
    let result = runtime()?.block_on(client.export_tables(&table_refs, &out_dir));
    pb.finish_and_clear();

    let written = result?;
    for path in &written {
        log::info!(
            "{} {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            path.display()
        );
    }
    Ok(())
}
