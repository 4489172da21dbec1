use std::collections::HashMap;

use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |var| map.get(var).cloned()
}

#[test]
fn test_defaults_without_file_or_env() {
    let config = Config::from_toml_str("", no_env).unwrap();
    assert_eq!(config.strapi.url, DEFAULT_STRAPI_URL);
    assert_eq!(config.strapi.token, None);
    assert_eq!(config.locales.default, "es");
    assert_eq!(config.locales.extra, vec!["en", "ar", "fr"]);
    assert_eq!(config.load.on_record_error, ErrorPolicy::Skip);
    assert_eq!(config.load.source_id_field, "_id");
    assert_eq!(config.sources.strapi_url, ValueSource::Default);
    assert_eq!(config.sources.strapi_token, ValueSource::Missing);
}

#[test]
fn test_file_values_are_read() {
    let text = r#"
        [strapi]
        url = "https://cms.example.org/"
        token = "file-token"

        [strapi.endpoints]
        organizaciones = "organizations"

        [locales]
        default = "en"
        extra = ["es"]

        [load]
        on_record_error = "abort"
        data_dir = "/data"
        coordinates = "geo/coords.json"
    "#;
    let config = Config::from_toml_str(text, no_env).unwrap();
    assert_eq!(config.strapi.url, "https://cms.example.org");
    assert_eq!(config.strapi.token.as_deref(), Some("file-token"));
    assert_eq!(config.sources.strapi_token, ValueSource::ConfigFile);
    assert_eq!(config.strapi.endpoint(EntityKind::Organizacion), "organizations");
    assert_eq!(config.strapi.endpoint(EntityKind::Sede), "sedes");
    assert_eq!(config.locales, LocaleSet::new("en", vec!["es".to_string()]));
    assert_eq!(config.load.on_record_error, ErrorPolicy::Abort);
    assert_eq!(
        config.load.coordinates_path(),
        PathBuf::from("/data/geo/coords.json")
    );
    assert_eq!(
        config.load.dataset_path(EntityKind::Area),
        PathBuf::from("/data/areas.json")
    );
}

#[test]
fn test_env_overrides_file() {
    let text = r#"
        [strapi]
        url = "https://cms.example.org"
        token = "file-token"
    "#;
    let env = env_of(&[
        (ENV_STRAPI_TOKEN, "env-token"),
        (ENV_MAPBOX_TOKEN, "pk.abc"),
    ]);
    let config = Config::from_toml_str(text, env).unwrap();
    assert_eq!(config.strapi.token.as_deref(), Some("env-token"));
    assert_eq!(config.sources.strapi_token, ValueSource::EnvVar(ENV_STRAPI_TOKEN));
    assert_eq!(config.strapi.url, "https://cms.example.org");
    assert_eq!(config.sources.strapi_url, ValueSource::ConfigFile);
    assert_eq!(config.mapbox.access_token.as_deref(), Some("pk.abc"));
}

#[test]
fn test_empty_env_value_is_ignored() {
    let env = env_of(&[(ENV_STRAPI_URL, "")]);
    let config = Config::from_toml_str("", env).unwrap();
    assert_eq!(config.strapi.url, DEFAULT_STRAPI_URL);
    assert_eq!(config.sources.strapi_url, ValueSource::Default);
}

#[test]
fn test_unknown_endpoint_kind_is_rejected() {
    let text = r#"
        [strapi.endpoints]
        planets = "x"
    "#;
    let err = Config::from_toml_str(text, no_env).unwrap_err();
    assert!(matches!(err, CmsError::Config(_)));
}

#[test]
fn test_endpoint_keys_accept_kind_aliases() {
    let text = r#"
        [strapi.endpoints]
        venues = "centros"
    "#;
    let config = Config::from_toml_str(text, no_env).unwrap();
    assert_eq!(config.strapi.endpoint(EntityKind::Sede), "centros");
}

#[test]
fn test_default_locale_listed_as_extra_is_rejected() {
    let text = r#"
        [locales]
        default = "es"
        extra = ["en", "es"]
    "#;
    assert!(Config::from_toml_str(text, no_env).is_err());
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let err = Config::from_toml_str("[strapi\nurl = 1", no_env).unwrap_err();
    assert!(matches!(err, CmsError::Config(_)));
}

#[test]
fn test_profile_override_replaces_required_fields() {
    let text = r#"
        [profiles.organizaciones]
        required_fields = ["nombre"]
    "#;
    let config = Config::from_toml_str(text, no_env).unwrap();
    let profile = config.profile(EntityKind::Organizacion);
    assert_eq!(profile.required_fields, vec!["nombre"]);
    assert!(!profile.localized_fields.is_empty());
    assert_eq!(
        config.profile(EntityKind::Sede),
        EntityProfile::for_kind(EntityKind::Sede)
    );
}

#[test]
fn test_template_round_trips_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    write_template(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("token ="));

    let config = Config::from_toml_str(&text, no_env).unwrap();
    assert_eq!(config.strapi.url, DEFAULT_STRAPI_URL);
    assert_eq!(config.seatable.view, DEFAULT_SEATABLE_VIEW);
    assert_eq!(config.mapbox.country, "es");
}

#[test]
fn test_load_reports_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
