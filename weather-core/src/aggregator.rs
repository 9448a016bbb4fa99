use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::{
    config::ForecastSettings,
    derive,
    error::PipelineError,
    model::{Coordinate, CurrentConditions, ForecastPoint, Snapshot},
    provider::WeatherProvider,
};

/// Fetches current conditions and the forecast for a coordinate and builds
/// the derived views.
#[derive(Debug, Clone)]
pub struct Aggregator {
    provider: Arc<dyn WeatherProvider>,
    settings: ForecastSettings,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: ForecastSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn aggregate(&self, coord: Coordinate) -> Result<Snapshot, PipelineError> {
        self.aggregate_at(coord, Utc::now().timestamp()).await
    }

    /// Same as [`aggregate`](Self::aggregate) with an explicit "now" in epoch seconds.
    pub async fn aggregate_at(&self, coord: Coordinate, now: i64) -> Result<Snapshot, PipelineError> {
        let (current, series) = tokio::try_join!(
            self.provider.current(coord),
            self.provider.forecast(coord),
        )
        .map_err(|e| PipelineError::network(&e))?;

        debug!(
            location = %current.location_name,
            points = series.len(),
            "fetched current conditions and forecast"
        );

        Ok(assemble(current, series, now, &self.settings))
    }
}

/// Build a snapshot from already-fetched data.
pub fn assemble(
    current: CurrentConditions,
    forecast_series: Vec<ForecastPoint>,
    now: i64,
    settings: &ForecastSettings,
) -> Snapshot {
    let next_hours = derive::next_hours(&forecast_series, now, settings.horizon_hours);
    let daily_samples = derive::daily_samples(
        &forecast_series,
        settings.daily_sampling,
        current.timezone_offset,
    );

    Snapshot {
        current,
        forecast_series,
        next_hours,
        daily_samples,
    }
}
