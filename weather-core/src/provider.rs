use crate::{
    Config,
    model::{Coordinate, CurrentConditions, ForecastPoint, Query},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// One geocoding match, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

/// The three upstream calls the pipeline is built from.
///
/// Implementations report transport and decoding problems as plain
/// `anyhow` errors; classifying them is the caller's job.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// At most `limit` candidates for a place name. An empty list means no match.
    async fn geocode(&self, query: &Query, limit: u8) -> anyhow::Result<Vec<GeoCandidate>>;

    async fn current(&self, coord: Coordinate) -> anyhow::Result<CurrentConditions>;

    /// Forecast points ordered by `dt` ascending.
    async fn forecast(&self, coord: Coordinate) -> anyhow::Result<Vec<ForecastPoint>>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.endpoints.clone(),
        config.request_timeout(),
    )?;
    Ok(Arc::new(provider))
}
