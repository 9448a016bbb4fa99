//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind the `WeatherProvider` trait
//! - The geocode → fetch → derive pipeline and its snapshot model
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod config;
pub mod derive;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use config::{Config, Endpoints, ForecastSettings};
pub use derive::{DailySampling, IconSize};
pub use error::PipelineError;
pub use model::{
    Condition, Coordinate, CurrentConditions, ForecastPoint, Query, Snapshot, Temperatures, Wind,
};
pub use pipeline::{Pipeline, Published, RunTicket, SnapshotSlot};
pub use provider::{GeoCandidate, WeatherProvider};
