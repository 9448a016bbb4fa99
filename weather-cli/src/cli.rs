use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use weather_core::{
    Config, DailySampling, IconSize, Pipeline, Snapshot,
    derive::{format_wall_date, format_wall_time, local_wall_clock},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather and forecast for a location.
    Show {
        /// Address or location name.
        location: String,

        /// Forecast horizon in hours for the near-term view.
        #[arg(long)]
        hours: Option<u32>,

        /// How to pick one forecast point per day: "stride" or "local-day".
        #[arg(long)]
        daily: Option<DailySampling>,

        /// Print the raw snapshot as JSON (temperatures in kelvin).
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                location,
                hours,
                daily,
                json,
            } => show(&location, hours, daily, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    cfg.set_api_key(api_key.trim().to_string());
    cfg.save()?;

    println!(
        "Saved API key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(
    location: &str,
    hours: Option<u32>,
    daily: Option<DailySampling>,
    json: bool,
) -> anyhow::Result<()> {
    let mut cfg = Config::load()?.with_env_overrides();
    if let Some(hours) = hours {
        cfg.forecast.horizon_hours = hours;
    }
    if let Some(daily) = daily {
        cfg.forecast.daily_sampling = daily;
    }

    let pipeline = Pipeline::from_config(&cfg)?;

    match pipeline.run(location).await {
        Ok(snapshot) if json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Ok(snapshot) => print!("{}", render(&snapshot, &cfg)),
        Err(err) => anyhow::bail!("{}", err.user_message()),
    }

    Ok(())
}

fn wall_time(epoch: i64, offset: i32) -> String {
    local_wall_clock(epoch, offset)
        .map(format_wall_time)
        .unwrap_or_else(|| "--:--:--".to_string())
}

fn render(snapshot: &Snapshot, cfg: &Config) -> String {
    let current = &snapshot.current;
    let c = current.temperatures.celsius();
    let offset = current.timezone_offset;
    let icon_base = &cfg.endpoints.icon_base;

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", current.location_name, current.condition.description));
    out.push_str(&format!(
        "  Temperature: {:.2}°C (Min: {:.2}°C, Max: {:.2}°C, Feels: {:.2}°C)\n",
        c.temp, c.temp_min, c.temp_max, c.feels_like
    ));
    out.push_str(&format!("  Humidity:    {}%\n", current.humidity_pct));
    if let Some(wind) = current.wind {
        out.push_str(&format!("  Wind:        {} m/s\n", wind.speed));
    }
    if let Some(clouds) = current.cloudiness_pct {
        out.push_str(&format!("  Clouds:      {clouds}%\n"));
    }
    if let Some(visibility) = current.visibility_m {
        out.push_str(&format!("  Visibility:  {visibility} m\n"));
    }
    for (label, wall) in [("Sunrise", current.sunrise_local()), ("Sunset", current.sunset_local())] {
        let shown = wall.map(format_wall_time).unwrap_or_else(|| "--:--:--".to_string());
        out.push_str(&format!("  {:<12} {}\n", format!("{label}:"), shown));
    }
    out.push_str(&format!(
        "  Icon:        {}\n",
        current.condition.icon_url(icon_base, IconSize::Large)
    ));

    out.push_str(&format!("\nNext {} hours:\n", cfg.forecast.horizon_hours));
    if snapshot.next_hours.is_empty() {
        out.push_str("  (no forecast points in range)\n");
    }
    for point in &snapshot.next_hours {
        out.push_str(&format!(
            "  {}  {:>7.2}°C  {:>3}%  {}\n",
            wall_time(point.dt, offset),
            point.temperatures.celsius().temp,
            point.humidity_pct,
            point.condition.description,
        ));
    }

    out.push_str("\nDaily:\n");
    for point in &snapshot.daily_samples {
        let date = local_wall_clock(point.dt, offset)
            .map(format_wall_date)
            .unwrap_or_default();
        out.push_str(&format!(
            "  {}  {:>7.2}°C  {:>3}%  {}\n",
            date,
            point.temperatures.celsius().temp,
            point.humidity_pct,
            point.condition.icon_url(icon_base, IconSize::Small),
        ));
    }

    out
}
