use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cms_seed_core::EntityKind;
use cms_seed_import::{
    CoordinateIndex, Datasets, LoadOptions, LoadProgress, LoadReport, Loader, read_rows,
};
use cms_seed_remote::{Config, StrapiClient};

use crate::cli_types::LoadArgs;
use crate::commands::clean::clean_cms;
use crate::commands::runtime;
use crate::error::CliError;

/// Per-stage progress bar.
struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::with_template("  {prefix:>14.cyan} [{bar:30}] {pos}/{len} {msg}")
                    .expect("static pattern")
                    .progress_chars("=> "),
            );
            pb
        };
        Self { pb }
    }
}

impl LoadProgress for BarProgress {
    fn on_stage(&self, kind: EntityKind, total: usize) {
        self.pb.reset();
        self.pb.set_length(total as u64);
        self.pb.set_prefix(kind.display_name());
        self.pb.set_message("");
    }

    fn on_record(&self, current: usize, _total: usize, source_id: &str) {
        self.pb.set_position(current as u64);
        self.pb.set_message(source_id.to_string());
    }

    fn on_stage_done(&self, kind: EntityKind, message: &str) {
        self.pb.suspend(|| {
            log::info!(
                "{} {}: {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                kind,
                message
            );
        });
    }
}

/// Read the datasets to load plus any dataset their label lookups read from.
fn read_datasets(
    config: &Config,
    options: &LoadOptions,
    kinds: &[EntityKind],
) -> Result<Datasets, CliError> {
    let id_field = &config.load.source_id_field;
    let mut datasets = Datasets::read(kinds, id_field, |k| config.load.dataset_path(k))?;

    for kind in kinds {
        for lookup in options.profile(*kind).label_lookups {
            if datasets.contains(lookup.source) {
                continue;
            }
            let path = config.load.dataset_path(lookup.source);
            match read_rows(&path, id_field) {
                Ok(records) => datasets.insert(lookup.source, records),
                Err(e) => log::warn!("{} names unavailable: {}", lookup.source, e),
            }
        }
    }
    Ok(datasets)
}

fn read_coordinates(config: &Config) -> Option<CoordinateIndex> {
    let path = config.load.coordinates_path();
    if !path.exists() {
        log::warn!(
            "No coordinates file at {}; sedes load without geodata",
            path.display()
        );
        return None;
    }
    match CoordinateIndex::read(&path) {
        Ok(index) => {
            log::debug!("Read {} coordinates from {}", index.len(), path.display());
            Some(index)
        }
        Err(e) => {
            log::warn!("{}; sedes load without geodata", e);
            None
        }
    }
}

fn write_report(report: &LoadReport, path: &Path) -> Result<(), CliError> {
    report.write_to_file(path)?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

pub(crate) fn run_load(mut config: Config, args: LoadArgs, quiet: bool) -> Result<(), CliError> {
    let LoadArgs {
        kinds,
        data_dir,
        coordinates: coordinates_path,
        on_error,
        no_clean,
        report,
    } = args;

    if let Some(dir) = data_dir {
        config.load.data_dir = dir;
    }
    if let Some(path) = coordinates_path {
        config.load.coordinates = Some(path);
    }

    let mut options = LoadOptions::from_config(&config);
    if let Some(policy) = on_error {
        options = options.with_policy(policy);
    }

    let kinds = kinds.unwrap_or_else(|| EntityKind::load_order().to_vec());
    let datasets = read_datasets(&config, &options, &kinds)?;
    log::info!(
        "Read {} records from {}",
        datasets.total_records(),
        config.load.data_dir.display()
    );

    let coordinates = if kinds
        .iter()
        .any(|k| options.profile(*k).attach_coordinates)
    {
        read_coordinates(&config)
    } else {
        None
    };

    if config.strapi.token.is_none() {
        log::warn!(
            "No API token set (${}); requests are sent unauthenticated",
            cms_seed_remote::config::ENV_STRAPI_TOKEN
        );
    }
    let client = StrapiClient::new(&config.strapi)?;

    runtime()?.block_on(async {
        if no_clean {
            log::debug!("Skipping cleanup");
        } else {
            clean_cms(&client, quiet).await?;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        {
            let cancel = Arc::clone(&cancel);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted; stopping after the current record");
                    cancel.store(true, Ordering::Relaxed);
                }
            });
        }

        let progress = BarProgress::new(quiet);
        let mut loader = Loader::new(&client, &options)
            .with_progress(&progress)
            .with_cancel_flag(&cancel);
        if let Some(index) = &coordinates {
            loader = loader.with_coordinates(index);
        }

        let outcome = loader.load(&datasets, &kinds).await;
        progress.pb.finish_and_clear();
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(path) = &report {
                    write_report(e.report(), path)?;
                }
                return Err(e.into());
            }
        };

        let totals = outcome.totals();
        log::info!("");
        log::info!(
            "{} {} created, {} skipped, {} failed, {} relations dropped, {} translations failed",
            if outcome.cancelled {
                "Stopped:".if_supports_color(Stdout, |t| t.yellow()).to_string()
            } else {
                "Done:".if_supports_color(Stdout, |t| t.green()).to_string()
            },
            totals.created,
            totals.skipped,
            totals.failed,
            totals.relation_gaps,
            totals.translations_failed,
        );

        if let Some(path) = &report {
            write_report(&outcome.report, path)?;
        }
        Ok::<(), CliError>(())
    })
}
