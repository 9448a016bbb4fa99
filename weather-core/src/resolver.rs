use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::PipelineError,
    model::{Coordinate, Query},
    provider::WeatherProvider,
};

/// Turns a place name into coordinates with a single geocoding lookup.
#[derive(Debug, Clone)]
pub struct Resolver {
    provider: Arc<dyn WeatherProvider>,
}

impl Resolver {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// First candidate the provider returns, or `LocationNotFound` when there is none.
    pub async fn resolve(&self, query: &Query) -> Result<Coordinate, PipelineError> {
        let candidates = self
            .provider
            .geocode(query, 1)
            .await
            .map_err(|e| PipelineError::network(&e))?;

        let Some(top) = candidates.into_iter().next() else {
            debug!(%query, "geocoding returned no candidates");
            return Err(PipelineError::LocationNotFound(query.to_string()));
        };

        debug!(%query, name = %top.name, lat = top.latitude, lon = top.longitude, "resolved location");

        Coordinate::new(top.latitude, top.longitude).ok_or_else(|| {
            warn!(%query, lat = top.latitude, lon = top.longitude, "geocoder returned out-of-range coordinates");
            PipelineError::NetworkFailure(format!(
                "geocoding returned invalid coordinates ({}, {}) for '{}'",
                top.latitude, top.longitude, query
            ))
        })
    }
}
