//! Explicit run configuration.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "data_dir": "data/cleaned",
//!   "output_path": "data/final_prepared_data.csv",
//!   "city_weather_granularity": "hourly",
//!   "degenerate_policy": "empty"
//! }
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PrepareError;

/// Policy applied when rounding leaves a trip's departure after its arrival.
pub const DEFAULT_DEGENERATE_POLICY: DegeneratePolicy = DegeneratePolicy::SingleBucket;

/// Step between generated bucket timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    SixHourly,
}

impl Granularity {
    pub fn step(self) -> Duration {
        match self {
            Granularity::Hourly => Duration::hours(1),
            Granularity::SixHourly => Duration::hours(6),
        }
    }

    fn step_secs(self) -> i64 {
        self.step().num_seconds()
    }

    /// Rounds down to a multiple of the step, counted from the Unix epoch.
    pub fn floor(self, ts: NaiveDateTime) -> NaiveDateTime {
        let secs = ts.and_utc().timestamp();
        let rem = secs.rem_euclid(self.step_secs());
        ts - Duration::seconds(rem)
    }

    /// Rounds up to a multiple of the step; exact multiples are unchanged.
    pub fn ceil(self, ts: NaiveDateTime) -> NaiveDateTime {
        let floored = self.floor(ts);
        if floored == ts {
            ts
        } else {
            floored + self.step()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Emit one bucket at the departure timestamp.
    SingleBucket,
    /// Emit no buckets; the trip keeps null aggregates.
    Empty,
}

/// File name of each input table, relative to `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub traffic: String,
    pub truck_schedule: String,
    pub city_weather: String,
    pub trucks: String,
    pub drivers: String,
    pub routes: String,
    pub routes_weather: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            traffic: "cleaned_traffic.csv".into(),
            truck_schedule: "cleaned_truck_schedule.csv".into(),
            city_weather: "cleaned_city_weather.csv".into(),
            trucks: "cleaned_trucks.csv".into(),
            drivers: "cleaned_drivers.csv".into(),
            routes: "cleaned_routes.csv".into(),
            routes_weather: "cleaned_routes_weather.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub data_dir: PathBuf,
    pub output_path: PathBuf,
    pub files: TableFiles,
    pub rounding: Granularity,
    pub city_weather_granularity: Granularity,
    pub route_weather_granularity: Granularity,
    pub traffic_granularity: Granularity,
    pub degenerate_policy: DegeneratePolicy,
    pub gzip_output: bool,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/cleaned"),
            output_path: PathBuf::from("data/final_prepared_data.csv"),
            files: TableFiles::default(),
            rounding: Granularity::SixHourly,
            city_weather_granularity: Granularity::Hourly,
            route_weather_granularity: Granularity::SixHourly,
            traffic_granularity: Granularity::Hourly,
            degenerate_policy: DEFAULT_DEGENERATE_POLICY,
            gzip_output: false,
        }
    }
}

impl PrepareConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PrepareError::io(path, e))?;
        let config: PrepareConfig = serde_json::from_str(&content)
            .map_err(|e| PrepareError::Config(e.to_string()))
            .with_context(|| format!("reading config '{path}'"))?;
        Ok(config)
    }

    /// Full path of a table file under `data_dir`.
    pub fn table_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}
