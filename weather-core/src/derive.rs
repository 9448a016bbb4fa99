//! Pure derivations over provider data: unit conversion, local wall-clock
//! time, forecast windows and daily sampling.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::ForecastPoint;

/// Points per day at the provider's 3-hour cadence.
pub const DEFAULT_DAILY_STRIDE: usize = 8;
pub const DEFAULT_HORIZON_HOURS: u32 = 12;

const ABSOLUTE_ZERO_C: f64 = 273.15;

/// Kelvin to celsius, rounded half-up to two decimals.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    ((kelvin - ABSOLUTE_ZERO_C) * 100.0 + 0.5).floor() / 100.0
}

/// Wall-clock time at the location for a UTC instant.
///
/// The offset is added to the instant and the result is read back as a naive
/// datetime, so nothing about the machine's own zone leaks in.
pub fn local_wall_clock(utc_epoch_secs: i64, timezone_offset_secs: i32) -> Option<NaiveDateTime> {
    let shifted = utc_epoch_secs.checked_add(i64::from(timezone_offset_secs))?;
    DateTime::from_timestamp(shifted, 0).map(|dt| dt.naive_utc())
}

pub fn format_wall_time(wall: NaiveDateTime) -> String {
    wall.format("%H:%M:%S").to_string()
}

pub fn format_wall_date(wall: NaiveDateTime) -> String {
    wall.format("%Y-%m-%d").to_string()
}

/// Points whose `dt` falls in `[now, now + horizon]`, both ends included.
pub fn next_hours(series: &[ForecastPoint], now: i64, horizon_hours: u32) -> Vec<ForecastPoint> {
    let end = now.saturating_add(i64::from(horizon_hours) * 3600);
    series
        .iter()
        .filter(|p| (now..=end).contains(&p.dt))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DailySampling {
    /// Every 8th point from index 0. Assumes the 3-hour cadence holds.
    #[default]
    Stride,
    /// First point of each calendar day in the location's zone.
    LocalDay,
}

impl std::str::FromStr for DailySampling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stride" => Ok(DailySampling::Stride),
            "local-day" | "local_day" => Ok(DailySampling::LocalDay),
            _ => Err(anyhow::anyhow!(
                "Unknown daily sampling '{s}'. Supported: stride, local-day."
            )),
        }
    }
}

pub fn daily_samples(
    series: &[ForecastPoint],
    sampling: DailySampling,
    timezone_offset_secs: i32,
) -> Vec<ForecastPoint> {
    match sampling {
        DailySampling::Stride => stride_samples(series, DEFAULT_DAILY_STRIDE),
        DailySampling::LocalDay => first_per_local_day(series, timezone_offset_secs),
    }
}

pub fn stride_samples(series: &[ForecastPoint], stride: usize) -> Vec<ForecastPoint> {
    series.iter().step_by(stride.max(1)).cloned().collect()
}

fn first_per_local_day(series: &[ForecastPoint], timezone_offset_secs: i32) -> Vec<ForecastPoint> {
    let mut last_day: Option<NaiveDate> = None;
    let mut out = Vec::new();

    for point in series {
        let Some(day) = local_wall_clock(point.dt, timezone_offset_secs).map(|w| w.date()) else {
            continue;
        };
        if last_day != Some(day) {
            last_day = Some(day);
            out.push(point.clone());
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    Small,
    Large,
}

impl IconSize {
    fn suffix(self) -> u8 {
        match self {
            IconSize::Small => 2,
            IconSize::Large => 4,
        }
    }
}

pub fn icon_url(icon_base: &str, icon: &str, size: IconSize) -> String {
    format!("{}/{}@{}x.png", icon_base.trim_end_matches('/'), icon, size.suffix())
}
