use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{derive, error::PipelineError};

/// A validated, trimmed location query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Trim the raw input and reject it if nothing is left.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` when either component is outside its geographic range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }
}

/// Temperature fields as reported by the provider, in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
}

impl Temperatures {
    /// The same readings converted to celsius, rounded to two decimals.
    pub fn celsius(&self) -> Temperatures {
        Temperatures {
            temp: derive::kelvin_to_celsius(self.temp),
            temp_min: derive::kelvin_to_celsius(self.temp_min),
            temp_max: derive::kelvin_to_celsius(self.temp_max),
            feels_like: derive::kelvin_to_celsius(self.feels_like),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub icon: String,
    pub description: String,
    pub main: Option<String>,
}

impl Condition {
    pub fn unknown() -> Self {
        Self {
            icon: String::new(),
            description: "Unknown".to_string(),
            main: None,
        }
    }

    pub fn icon_url(&self, icon_base: &str, size: derive::IconSize) -> String {
        derive::icon_url(icon_base, &self.icon, size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Metres per second.
    pub speed: f64,
    /// Meteorological degrees.
    pub direction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub temperatures: Temperatures,
    pub humidity_pct: u8,
    pub pressure_hpa: Option<f64>,
    pub wind: Option<Wind>,
    pub cloudiness_pct: Option<u8>,
    pub visibility_m: Option<u32>,
    /// UTC epoch seconds.
    pub sunrise: i64,
    /// UTC epoch seconds.
    pub sunset: i64,
    /// Shift from UTC in seconds for the queried location.
    pub timezone_offset: i32,
    pub condition: Condition,
}

impl CurrentConditions {
    pub fn sunrise_local(&self) -> Option<NaiveDateTime> {
        derive::local_wall_clock(self.sunrise, self.timezone_offset)
    }

    pub fn sunset_local(&self) -> Option<NaiveDateTime> {
        derive::local_wall_clock(self.sunset, self.timezone_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// UTC epoch seconds.
    pub dt: i64,
    pub temperatures: Temperatures,
    pub humidity_pct: u8,
    pub condition: Condition,
}

/// Everything one pipeline run produces. Replaced wholesale by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current: CurrentConditions,
    pub forecast_series: Vec<ForecastPoint>,
    pub next_hours: Vec<ForecastPoint>,
    pub daily_samples: Vec<ForecastPoint>,
}
