use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cms_seed_core::EntityKind;
use cms_seed_remote::{Config, ValueSource};

use crate::error::CliError;

fn mask_value(s: &str) -> String {
    if s.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", s.chars().take(4).collect::<String>())
    }
}

fn resolved_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(cms_seed_remote::config_path)
}

fn show_field(name: &str, value: Option<String>, source: Option<&ValueSource>) {
    let source_str = source.map(|s| format!("({})", s)).unwrap_or_default();
    let label = format!("{}:", name);
    match value {
        Some(v) => log::info!(
            "  {} {} {}",
            label.if_supports_color(Stdout, |t| t.cyan()),
            v,
            source_str.if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => log::info!(
            "  {} {} {}",
            label.if_supports_color(Stdout, |t| t.cyan()),
            "not set".if_supports_color(Stdout, |t| t.yellow()),
            source_str.if_supports_color(Stdout, |t| t.dimmed()),
        ),
    }
}

/// Show resolved settings and their sources.
pub(crate) fn run_config_show(explicit: Option<&Path>) -> Result<(), CliError> {
    log::info!(
        "{}",
        "cms-seed Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    match resolved_path(explicit) {
        Some(p) if p.exists() => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        Some(p) => log::info!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => log::info!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    log::info!("");

    let config = Config::load(explicit)?;
    let sources = &config.sources;

    show_field(
        "strapi.url",
        Some(config.strapi.url.clone()),
        Some(&sources.strapi_url),
    );
    show_field(
        "strapi.token",
        config.strapi.token.as_deref().map(mask_value),
        Some(&sources.strapi_token),
    );
    show_field(
        "seatable.app_token",
        config.seatable.app_token.as_deref().map(mask_value),
        Some(&sources.seatable_token),
    );
    show_field(
        "mapbox.access_token",
        config.mapbox.access_token.as_deref().map(mask_value),
        Some(&sources.mapbox_token),
    );
    show_field(
        "locales",
        Some(config.locales.all().collect::<Vec<_>>().join(", ")),
        None,
    );
    show_field(
        "load.on_record_error",
        Some(config.load.on_record_error.to_string()),
        None,
    );
    show_field(
        "load.data_dir",
        Some(config.load.data_dir.display().to_string()),
        None,
    );

    log::info!("");
    for kind in EntityKind::load_order() {
        log::info!(
            "  {:<16} /api/{:<16} {}",
            kind.short_name(),
            config.strapi.endpoint(*kind),
            config
                .load
                .dataset_path(*kind)
                .display()
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}

/// Print the config file path.
pub(crate) fn run_config_path(explicit: Option<&Path>) -> Result<(), CliError> {
    match resolved_path(explicit) {
        Some(p) => {
            println!("{}", p.display());
            Ok(())
        }
        None => Err(CliError::config("Could not determine config directory")),
    }
}

/// Write a starter config file.
pub(crate) fn run_config_init(explicit: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = resolved_path(explicit)
        .ok_or_else(|| CliError::config("Could not determine config directory"))?;
    if path.exists() && !force {
        return Err(CliError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    cms_seed_remote::write_template(&path)?;
    log::info!(
        "{} Wrote {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display()
    );
    log::info!(
        "  Secrets are read from ${}, ${} and ${}",
        cms_seed_remote::config::ENV_STRAPI_TOKEN,
        cms_seed_remote::config::ENV_SEATABLE_TOKEN,
        cms_seed_remote::config::ENV_MAPBOX_TOKEN,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_value_keeps_short_prefix() {
        assert_eq!(mask_value("abcdef123"), "abcd****");
        assert_eq!(mask_value("abc"), "****");
        assert_eq!(mask_value("ñandú-token"), "ñand****");
    }
}
