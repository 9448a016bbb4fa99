use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::Endpoints,
    model::{
        Condition, Coordinate, CurrentConditions, ForecastPoint, Query, Temperatures, Wind,
    },
};

use super::{GeoCandidate, WeatherProvider};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            endpoints,
            http,
        })
    }

    /// GET `url` with `params` plus the credential, and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        debug!(endpoint = what, url, "requesting OpenWeather");

        let res = self
            .http
            .get(url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }
}

fn coord_params(coord: Coordinate) -> [(&'static str, String); 2] {
    [
        ("lat", coord.latitude.to_string()),
        ("lon", coord.longitude.to_string()),
    ]
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, query: &Query, limit: u8) -> Result<Vec<GeoCandidate>> {
        let params = [
            ("q", query.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let parsed: Vec<OwGeoEntry> = self
            .get_json("geocoding", &self.endpoints.geocoding, &params)
            .await?;

        Ok(parsed.into_iter().map(GeoCandidate::from).collect())
    }

    async fn current(&self, coord: Coordinate) -> Result<CurrentConditions> {
        let parsed: OwCurrentResponse = self
            .get_json("current weather", &self.endpoints.current, &coord_params(coord))
            .await?;

        Ok(parsed.into())
    }

    async fn forecast(&self, coord: Coordinate) -> Result<Vec<ForecastPoint>> {
        let parsed: OwForecastResponse = self
            .get_json("5-day forecast", &self.endpoints.forecast, &coord_params(coord))
            .await?;

        let mut points: Vec<ForecastPoint> =
            parsed.list.into_iter().map(ForecastPoint::from).collect();
        points.sort_by_key(|p| p.dt);
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

impl From<OwGeoEntry> for GeoCandidate {
    fn from(e: OwGeoEntry) -> Self {
        GeoCandidate {
            name: e.name,
            latitude: e.lat,
            longitude: e.lon,
            country: e.country,
            state: e.state,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    feels_like: f64,
    humidity: u8,
    pressure: Option<f64>,
}

impl OwMain {
    fn temperatures(&self) -> Temperatures {
        Temperatures {
            temp: self.temp,
            temp_min: self.temp_min,
            temp_max: self.temp_max,
            feels_like: self.feels_like,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
    description: String,
    main: Option<String>,
}

fn first_condition(weather: Vec<OwWeather>) -> Condition {
    weather
        .into_iter()
        .next()
        .map(|w| Condition {
            icon: w.icon,
            description: w.description,
            main: w.main,
        })
        .unwrap_or_else(Condition::unknown)
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    visibility: Option<u32>,
    sys: OwSys,
    timezone: i32,
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(r: OwCurrentResponse) -> Self {
        CurrentConditions {
            location_name: r.name,
            temperatures: r.main.temperatures(),
            humidity_pct: r.main.humidity,
            pressure_hpa: r.main.pressure,
            wind: r.wind.map(|w| Wind {
                speed: w.speed,
                direction: w.deg,
            }),
            cloudiness_pct: r.clouds.map(|c| c.all),
            visibility_m: r.visibility,
            sunrise: r.sys.sunrise,
            sunset: r.sys.sunset,
            timezone_offset: r.timezone,
            condition: first_condition(r.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

impl From<OwForecastEntry> for ForecastPoint {
    fn from(e: OwForecastEntry) -> Self {
        ForecastPoint {
            dt: e.dt,
            temperatures: e.main.temperatures(),
            humidity_pct: e.main.humidity,
            condition: first_condition(e.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
