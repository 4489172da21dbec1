//! Address geocoding for sedes through the Mapbox forward-geocoding API.

use std::path::Path;

use cms_seed_core::RawRecord;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::time::Duration;

use crate::config::MapboxSettings;
use crate::error::CmsError;
use crate::types::{Coordinate, GeocodeResponse};

pub const MAPBOX_GEOCODING_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Default number of lookups in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the free-text query for a sede's postal address.
///
/// Returns `None` when `direccion`, `localidad` or `provincia` is missing;
/// `tipo_calle`, `numero` and `cp` are optional.
pub fn address_query(sede: &RawRecord) -> Option<String> {
    let direccion = text_field(sede, "direccion")?;
    let localidad = text_field(sede, "localidad")?;
    let provincia = text_field(sede, "provincia")?;

    let street = [text_field(sede, "tipo_calle"), Some(direccion), text_field(sede, "numero")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let region = match text_field(sede, "cp") {
        Some(cp) => format!("{} {}", provincia, cp),
        None => provincia,
    };

    Some(format!("{}, {}, {}", street, localidad, region))
}

fn text_field(record: &RawRecord, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Mapbox geocoding client.
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    country: String,
}

impl Geocoder {
    pub fn new(settings: &MapboxSettings) -> Result<Self, CmsError> {
        let access_token = settings.access_token.clone().ok_or_else(|| {
            CmsError::config(format!(
                "No Mapbox access token. Set ${} or [mapbox] access_token",
                crate::config::ENV_MAPBOX_TOKEN
            ))
        })?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: MAPBOX_GEOCODING_URL.to_string(),
            access_token,
            country: settings.country.clone(),
        })
    }

    /// Resolve `query` to `(longitude, latitude)` of the best match.
    pub async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>, CmsError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CmsError::config(format!("Invalid geocoding URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CmsError::config("Geocoding URL cannot take a path"))?
            .push(&format!("{}.json", query));

        let resp = self
            .http
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("country", self.country.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CmsError::InvalidCredentials(
                "Mapbox rejected the access token".to_string(),
            ));
        }
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CmsError::from_response(status.as_u16(), &text));
        }

        let parsed: GeocodeResponse = serde_json::from_str(&text)?;
        Ok(parsed.features.first().map(|f| (f.center[0], f.center[1])))
    }

    /// Geocode every sede with a complete address, `concurrency` lookups at
    /// a time. Results keep the input order; sedes that can't be located are
    /// logged and left out.
    pub async fn geocode_sedes(&self, sedes: &[RawRecord], concurrency: usize) -> Vec<Coordinate> {
        let jobs: Vec<(usize, String, String)> = sedes
            .iter()
            .enumerate()
            .filter_map(|(idx, sede)| {
                let Some(id) = text_field(sede, "id") else {
                    log::warn!("Skipping sede {}: no id column", sede.source_id);
                    return None;
                };
                match address_query(sede) {
                    Some(query) => Some((idx, id, query)),
                    None => {
                        log::info!("Skipping sede {} due to incomplete address information", id);
                        None
                    }
                }
            })
            .collect();

        let mut found: Vec<(usize, Coordinate)> = stream::iter(jobs)
            .map(|(idx, id, query)| async move {
                match self.lookup(&query).await {
                    Ok(Some((longitude, latitude))) => Some((
                        idx,
                        Coordinate {
                            id,
                            longitude,
                            latitude,
                        },
                    )),
                    Ok(None) => {
                        log::warn!("No coordinates found for sede {}", id);
                        None
                    }
                    Err(e) => {
                        log::error!("Error getting coordinates for sede {}: {}", id, e);
                        None
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .filter_map(|r| async move { r })
            .collect()
            .await;

        found.sort_by_key(|(idx, _)| *idx);
        found.into_iter().map(|(_, c)| c).collect()
    }
}

/// Write coordinates as a pretty-printed JSON array.
pub fn write_coordinates(path: &Path, coordinates: &[Coordinate]) -> Result<(), CmsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(coordinates)?)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/geocode_tests.rs"]
mod tests;
