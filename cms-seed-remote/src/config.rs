//! Run configuration.
//!
//! Everything a run needs (CMS location and token, locales, dataset paths,
//! error policy, export and geocoding credentials) is read once into a
//! [`Config`] and passed down by reference.
//!
//! Priority for each value: environment variable > config file > default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cms_seed_core::{EntityKind, EntityProfile, ErrorPolicy, LocaleSet};
use serde::{Deserialize, Serialize};

use crate::error::CmsError;

pub const DEFAULT_STRAPI_URL: &str = "http://localhost:1337";
pub const DEFAULT_SEATABLE_URL: &str = "https://cloud.seatable.io";
pub const DEFAULT_SEATABLE_VIEW: &str = "Default View";
pub const DEFAULT_GEOCODING_COUNTRY: &str = "es";

pub const ENV_STRAPI_URL: &str = "STRAPI_URL";
pub const ENV_STRAPI_TOKEN: &str = "STRAPI_API_TOKEN";
pub const ENV_SEATABLE_TOKEN: &str = "SEATABLE_APP_TOKEN";
pub const ENV_MAPBOX_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Built-in default.
    Default,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of the values most likely to need debugging.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub strapi_url: ValueSource,
    pub strapi_token: ValueSource,
    pub seatable_token: ValueSource,
    pub mapbox_token: ValueSource,
}

/// CMS connection settings.
#[derive(Debug, Clone)]
pub struct StrapiSettings {
    pub url: String,
    pub token: Option<String>,
    endpoints: BTreeMap<EntityKind, String>,
}

impl StrapiSettings {
    /// REST collection name for `kind`.
    pub fn endpoint(&self, kind: EntityKind) -> &str {
        self.endpoints
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_endpoint())
    }
}

/// Dataset and transform settings.
#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub data_dir: PathBuf,
    /// Geocoded coordinates for sedes (`[{id, longitude, latitude}]`).
    pub coordinates: Option<PathBuf>,
    pub on_record_error: ErrorPolicy,
    pub source_id_field: String,
    pub email_fields: Vec<String>,
    files: BTreeMap<EntityKind, PathBuf>,
}

impl LoadSettings {
    /// Export file for `kind`, relative paths resolved against `data_dir`.
    pub fn dataset_path(&self, kind: EntityKind) -> PathBuf {
        match self.files.get(&kind) {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.data_dir.join(p),
            None => self.data_dir.join(kind.default_file_name()),
        }
    }

    /// Coordinates file, relative paths resolved against `data_dir`.
    pub fn coordinates_path(&self) -> PathBuf {
        match &self.coordinates {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.data_dir.join(p),
            None => self.data_dir.join("coordinates.json"),
        }
    }
}

/// SeaTable export settings.
#[derive(Debug, Clone)]
pub struct SeaTableSettings {
    pub server_url: String,
    pub app_token: Option<String>,
    pub view: String,
}

/// Mapbox geocoding settings.
#[derive(Debug, Clone)]
pub struct MapboxSettings {
    pub access_token: Option<String>,
    pub country: String,
}

/// Per-kind overrides of the built-in transform profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,
}

impl ProfileOverride {
    pub fn apply(&self, profile: &mut EntityProfile) {
        if let Some(fields) = &self.localized_fields {
            profile.localized_fields = fields.clone();
        }
        if let Some(fields) = &self.required_fields {
            profile.required_fields = fields.clone();
        }
    }
}

/// The complete configuration of a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub strapi: StrapiSettings,
    pub locales: LocaleSet,
    pub load: LoadSettings,
    pub seatable: SeaTableSettings,
    pub mapbox: MapboxSettings,
    profiles: BTreeMap<EntityKind, ProfileOverride>,
    pub sources: ConfigSources,
}

/// TOML config file format.
#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strapi: Option<StrapiSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locales: Option<LocaleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    load: Option<LoadSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seatable: Option<SeaTableSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mapbox: Option<MapboxSection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    profiles: BTreeMap<String, ProfileOverride>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct StrapiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct LoadSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_record_error: Option<ErrorPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_id_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    files: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct SeaTableSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct MapboxSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

impl Config {
    /// Load configuration from `path` (or the default location) and the
    /// process environment.
    ///
    /// An explicitly given path must exist; a missing default file just
    /// means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CmsError> {
        let file = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    CmsError::config(format!("Cannot read config file {}: {}", p.display(), e))
                })?;
                parse_file(&content)?
            }
            None => match config_path() {
                Some(p) if p.exists() => parse_file(&std::fs::read_to_string(&p)?)?,
                _ => ConfigFile::default(),
            },
        };
        Self::from_file(file, |var| std::env::var(var).ok())
    }

    /// Build a configuration from TOML text, with `env` standing in for the
    /// process environment.
    pub fn from_toml_str(
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CmsError> {
        Self::from_file(parse_file(content)?, env)
    }

    fn from_file(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self, CmsError> {
        let strapi_section = file.strapi.unwrap_or_default();
        let load_section = file.load.unwrap_or_default();
        let seatable_section = file.seatable.unwrap_or_default();
        let mapbox_section = file.mapbox.unwrap_or_default();

        let (strapi_url, strapi_url_src) = resolve(
            &env,
            ENV_STRAPI_URL,
            strapi_section.url,
            Some(DEFAULT_STRAPI_URL.to_string()),
        );
        let (strapi_token, strapi_token_src) =
            resolve(&env, ENV_STRAPI_TOKEN, strapi_section.token, None);
        let (seatable_token, seatable_token_src) =
            resolve(&env, ENV_SEATABLE_TOKEN, seatable_section.app_token, None);
        let (mapbox_token, mapbox_token_src) =
            resolve(&env, ENV_MAPBOX_TOKEN, mapbox_section.access_token, None);

        let locales = file.locales.unwrap_or_default();
        if locales.default.trim().is_empty() {
            return Err(CmsError::config("locales.default must not be empty"));
        }
        if locales.extra.contains(&locales.default) {
            return Err(CmsError::config(format!(
                "locale '{}' is both default and extra",
                locales.default
            )));
        }

        let profiles = file
            .profiles
            .into_iter()
            .map(|(key, value)| Ok((parse_kind(&key)?, value)))
            .collect::<Result<BTreeMap<_, _>, CmsError>>()?;

        Ok(Self {
            strapi: StrapiSettings {
                url: strapi_url
                    .unwrap_or_else(|| DEFAULT_STRAPI_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                token: strapi_token,
                endpoints: keyed_by_kind(strapi_section.endpoints)?,
            },
            locales,
            load: LoadSettings {
                data_dir: load_section.data_dir.unwrap_or_else(|| PathBuf::from(".")),
                coordinates: load_section.coordinates,
                on_record_error: load_section.on_record_error.unwrap_or_default(),
                source_id_field: load_section
                    .source_id_field
                    .unwrap_or_else(|| cms_seed_core::DEFAULT_SOURCE_ID_FIELD.to_string()),
                email_fields: load_section
                    .email_fields
                    .unwrap_or_else(|| cms_seed_core::SanitizeOptions::default().email_fields),
                files: keyed_by_kind(load_section.files)?,
            },
            seatable: SeaTableSettings {
                server_url: seatable_section
                    .server_url
                    .unwrap_or_else(|| DEFAULT_SEATABLE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                app_token: seatable_token,
                view: seatable_section
                    .view
                    .unwrap_or_else(|| DEFAULT_SEATABLE_VIEW.to_string()),
            },
            mapbox: MapboxSettings {
                access_token: mapbox_token,
                country: mapbox_section
                    .country
                    .unwrap_or_else(|| DEFAULT_GEOCODING_COUNTRY.to_string()),
            },
            profiles,
            sources: ConfigSources {
                strapi_url: strapi_url_src,
                strapi_token: strapi_token_src,
                seatable_token: seatable_token_src,
                mapbox_token: mapbox_token_src,
            },
        })
    }

    /// Transform profile for `kind`, with any config overrides applied.
    pub fn profile(&self, kind: EntityKind) -> EntityProfile {
        let mut profile = EntityProfile::for_kind(kind);
        if let Some(over) = self.profiles.get(&kind) {
            over.apply(&mut profile);
        }
        profile
    }

    /// Sanitizer options derived from the load settings.
    pub fn sanitize_options(&self) -> cms_seed_core::SanitizeOptions {
        cms_seed_core::SanitizeOptions {
            email_fields: self.load.email_fields.clone(),
            ..Default::default()
        }
    }
}

fn parse_file(content: &str) -> Result<ConfigFile, CmsError> {
    toml::from_str(content).map_err(|e| CmsError::config(format!("Invalid config file: {}", e)))
}

fn parse_kind(key: &str) -> Result<EntityKind, CmsError> {
    key.parse()
        .map_err(|e: cms_seed_core::EntityKindParseError| CmsError::config(e.to_string()))
}

fn keyed_by_kind<V>(map: BTreeMap<String, V>) -> Result<BTreeMap<EntityKind, V>, CmsError> {
    map.into_iter()
        .map(|(key, value)| Ok((parse_kind(&key)?, value)))
        .collect()
}

fn resolve(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    from_file: Option<String>,
    default: Option<String>,
) -> (Option<String>, ValueSource) {
    if let Some(v) = env(var).filter(|v| !v.is_empty()) {
        return (Some(v), ValueSource::EnvVar(var));
    }
    if let Some(v) = from_file.filter(|v| !v.is_empty()) {
        return (Some(v), ValueSource::ConfigFile);
    }
    match default {
        Some(v) => (Some(v), ValueSource::Default),
        None => (None, ValueSource::Missing),
    }
}

/// Return the path to the default config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cms-seed").join("config.toml"))
}

/// Write a starter config file with every default spelled out and no
/// secrets. Parent directories are created as needed.
pub fn write_template(path: &Path) -> Result<(), CmsError> {
    let file = ConfigFile {
        strapi: Some(StrapiSection {
            url: Some(DEFAULT_STRAPI_URL.to_string()),
            token: None,
            endpoints: EntityKind::load_order()
                .iter()
                .map(|k| (k.short_name().to_string(), k.default_endpoint().to_string()))
                .collect(),
        }),
        locales: Some(LocaleSet::default()),
        load: Some(LoadSection {
            data_dir: Some(PathBuf::from(".")),
            coordinates: Some(PathBuf::from("coordinates.json")),
            on_record_error: Some(ErrorPolicy::Skip),
            source_id_field: Some(cms_seed_core::DEFAULT_SOURCE_ID_FIELD.to_string()),
            email_fields: Some(cms_seed_core::SanitizeOptions::default().email_fields),
            files: BTreeMap::new(),
        }),
        seatable: Some(SeaTableSection {
            server_url: Some(DEFAULT_SEATABLE_URL.to_string()),
            app_token: None,
            view: Some(DEFAULT_SEATABLE_VIEW.to_string()),
        }),
        mapbox: Some(MapboxSection {
            access_token: None,
            country: Some(DEFAULT_GEOCODING_COUNTRY.to_string()),
        }),
        profiles: BTreeMap::new(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&file)
        .map_err(|e| CmsError::config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
