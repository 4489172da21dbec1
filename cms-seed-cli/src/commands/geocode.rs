use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cms_seed_core::EntityKind;
use cms_seed_import::read_rows;
use cms_seed_remote::{Config, Geocoder, write_coordinates};

use crate::commands::{runtime, spinner};
use crate::error::CliError;

/// Geocode every sede address and write the coordinates file the loader reads.
pub(crate) fn run_geocode(
    config: &Config,
    sedes: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: usize,
    quiet: bool,
) -> Result<(), CliError> {
    let sedes_path = sedes.unwrap_or_else(|| config.load.dataset_path(EntityKind::Sede));
    let output = output.unwrap_or_else(|| config.load.coordinates_path());

    let records = read_rows(&sedes_path, &config.load.source_id_field)?;
    let geocoder = Geocoder::new(&config.mapbox)?;

    let pb = spinner(quiet, format!("Geocoding {} sedes...", records.len()));
    let coordinates = runtime()?.block_on(geocoder.geocode_sedes(&records, concurrency));
    pb.finish_and_clear();

    write_coordinates(&output, &coordinates)?;
    log::info!(
        "{} Located {} of {} sedes; saved to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        coordinates.len(),
        records.len(),
        output.display()
    );
    Ok(())
}
