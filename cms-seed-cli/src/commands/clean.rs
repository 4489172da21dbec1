use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cms_seed_remote::{Config, StrapiClient};

use crate::commands::{runtime, spinner};
use crate::error::CliError;

/// Purge previously seeded content through the CMS cleanup route.
pub(crate) async fn clean_cms(client: &StrapiClient, quiet: bool) -> Result<(), CliError> {
    let pb = spinner(quiet, format!("Cleaning {}...", client.base_url()));
    let result = client.clean_loaded_data().await;
    pb.finish_and_clear();
    result?;
    log::info!(
        "{} Cleaned previously loaded data",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
    );
    Ok(())
}

pub(crate) fn run_clean(config: &Config, quiet: bool) -> Result<(), CliError> {
    let client = StrapiClient::new(&config.strapi)?;
    runtime()?.block_on(clean_cms(&client, quiet))
}
