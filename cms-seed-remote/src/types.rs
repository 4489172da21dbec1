use serde::{Deserialize, Serialize};

/// Envelope Strapi wraps around every single-entry response.
#[derive(Debug, Deserialize)]
pub struct StrapiEnvelope<T> {
    pub data: T,
}

/// The part of a created entry the loader cares about.
#[derive(Debug, Deserialize)]
pub struct StrapiEntry {
    pub id: u64,
    #[serde(default, rename = "documentId")]
    pub document_id: Option<String>,
}

/// Request body Strapi expects for create and update.
#[derive(Debug, Serialize)]
pub struct StrapiPayload<'a> {
    pub data: &'a serde_json::Value,
}

/// Response of SeaTable's app-access-token exchange.
#[derive(Debug, Deserialize)]
pub struct SeaTableAccess {
    pub access_token: String,
    pub dtable_uuid: String,
    #[serde(default)]
    pub dtable_server: Option<String>,
}

/// Mapbox forward-geocoding response, trimmed to what is read.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeFeature {
    /// `[longitude, latitude]`
    pub center: [f64; 2],
    #[serde(default)]
    pub place_name: Option<String>,
}

/// One geocoded sede, keyed by its human-readable `id` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {}",
            other
        ))),
    }
}
