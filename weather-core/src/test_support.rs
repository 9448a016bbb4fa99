use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicUsize, Ordering},
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    model::{
        Condition, Coordinate, CurrentConditions, ForecastPoint, Query, Temperatures, Wind,
    },
    provider::{GeoCandidate, WeatherProvider},
};

/// In-memory provider that counts calls and can hold a query until released.
#[derive(Debug, Default)]
pub struct FakeProvider {
    candidates: Vec<GeoCandidate>,
    places: HashMap<String, GeoCandidate>,
    current: Option<CurrentConditions>,
    forecast: Vec<ForecastPoint>,
    fail_geocode: bool,
    fail_current: bool,
    fail_forecast: bool,
    gates: HashMap<String, Arc<Notify>>,
    geocode_calls: AtomicUsize,
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    last_limit: AtomicU8,
}

impl FakeProvider {
    pub fn candidate(name: &str, latitude: f64, longitude: f64) -> GeoCandidate {
        GeoCandidate {
            name: name.to_string(),
            latitude,
            longitude,
            country: None,
            state: None,
        }
    }

    /// A provider that resolves anything to one place and returns a full forecast.
    pub fn working(location_name: &str, start_dt: i64, points: usize) -> Self {
        Self::default()
            .with_candidates(vec![Self::candidate(location_name, 52.52, 13.40)])
            .with_current(sample_current(location_name))
            .with_forecast((0..points).map(|i| sample_point(start_dt + i as i64 * 10_800)).collect())
    }

    pub fn with_candidates(mut self, candidates: Vec<GeoCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// `query` resolves to its own coordinates, and current conditions fetched
    /// there carry `query` as the location name.
    pub fn with_place(mut self, query: &str, latitude: f64, longitude: f64) -> Self {
        self.places
            .insert(query.to_string(), Self::candidate(query, latitude, longitude));
        self
    }

    pub fn with_current(mut self, current: CurrentConditions) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_forecast(mut self, forecast: Vec<ForecastPoint>) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn failing_geocode(mut self) -> Self {
        self.fail_geocode = true;
        self
    }

    pub fn failing_current(mut self) -> Self {
        self.fail_current = true;
        self
    }

    pub fn failing_forecast(mut self) -> Self {
        self.fail_forecast = true;
        self
    }

    /// Geocoding for `query` waits until the returned handle is notified.
    pub fn gate(&mut self, query: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.insert(query.to_string(), notify.clone());
        notify
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.geocode_calls() + self.current_calls() + self.forecast_calls()
    }

    pub fn last_limit(&self) -> Option<u8> {
        match self.last_limit.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(&self, query: &Query, limit: u8) -> anyhow::Result<Vec<GeoCandidate>> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);

        if let Some(gate) = self.gates.get(query.as_str()) {
            gate.notified().await;
        }
        if self.fail_geocode {
            return Err(anyhow!("geocoding transport error"));
        }

        if let Some(place) = self.places.get(query.as_str()) {
            return Ok(vec![place.clone()]);
        }
        Ok(self.candidates.iter().take(limit as usize).cloned().collect())
    }

    async fn current(&self, coord: Coordinate) -> anyhow::Result<CurrentConditions> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_current {
            return Err(anyhow!("current weather transport error"));
        }
        let mut current = self
            .current
            .clone()
            .ok_or_else(|| anyhow!("no current conditions configured"))?;

        if let Some(place) = self
            .places
            .values()
            .find(|p| p.latitude == coord.latitude && p.longitude == coord.longitude)
        {
            current.location_name = place.name.clone();
        }
        Ok(current)
    }

    async fn forecast(&self, _coord: Coordinate) -> anyhow::Result<Vec<ForecastPoint>> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_forecast {
            return Err(anyhow!("forecast transport error"));
        }
        Ok(self.forecast.clone())
    }
}

pub fn sample_temperatures() -> Temperatures {
    Temperatures {
        temp: 300.0,
        temp_min: 295.15,
        temp_max: 303.15,
        feels_like: 301.0,
    }
}

pub fn sample_current(location_name: &str) -> CurrentConditions {
    CurrentConditions {
        location_name: location_name.to_string(),
        temperatures: sample_temperatures(),
        humidity_pct: 40,
        pressure_hpa: Some(1013.0),
        wind: Some(Wind {
            speed: 3.5,
            direction: Some(180.0),
        }),
        cloudiness_pct: Some(20),
        visibility_m: Some(10_000),
        sunrise: 1_700_000_000,
        sunset: 1_700_036_000,
        timezone_offset: 3600,
        condition: Condition {
            icon: "01d".to_string(),
            description: "clear sky".to_string(),
            main: Some("Clear".to_string()),
        },
    }
}

pub fn sample_point(dt: i64) -> ForecastPoint {
    ForecastPoint {
        dt,
        temperatures: sample_temperatures(),
        humidity_pct: 55,
        condition: Condition {
            icon: "02d".to_string(),
            description: "few clouds".to_string(),
            main: Some("Clouds".to_string()),
        },
    }
}
