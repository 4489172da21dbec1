//! Network side of cms-seed: the Strapi sink, the SeaTable exporter, the
//! Mapbox geocoder and run configuration.

pub mod client;
pub mod config;
pub mod error;
pub mod geocode;
pub mod seatable;
pub mod types;

pub use client::StrapiClient;
pub use config::{
    Config, ConfigSources, LoadSettings, MapboxSettings, ProfileOverride, SeaTableSettings,
    StrapiSettings, ValueSource, config_path, write_template,
};
pub use error::CmsError;
pub use geocode::{Geocoder, address_query, write_coordinates};
pub use seatable::SeaTableClient;
pub use types::Coordinate;
