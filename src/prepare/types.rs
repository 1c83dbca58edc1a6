//! Data types produced by the preparation pipeline.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Mean readings and modal description over one trip's buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSummary {
    pub avg_temp: Option<f64>,
    pub avg_wind_speed: Option<f64>,
    pub avg_precip: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_visibility: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficSummary {
    pub avg_no_of_vehicles: Option<f64>,
    pub accident: bool,
}

/// One row per (truck_id, route_id), before static attributes are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAggregate {
    pub truck_id: String,
    pub route_id: String,
    pub departure_date: Option<NaiveDateTime>,
    pub estimated_arrival: Option<NaiveDateTime>,
    pub route_weather: WeatherSummary,
    pub origin_weather: WeatherSummary,
    pub destination_weather: WeatherSummary,
    pub traffic: TrafficSummary,
}

fn datetime_cell<S: Serializer>(value: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => s.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => s.serialize_none(),
    }
}

/// The output row: aggregates, static attributes and the midnight flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalRecord {
    pub truck_id: String,
    pub route_id: String,
    #[serde(serialize_with = "datetime_cell")]
    pub departure_date: Option<NaiveDateTime>,
    #[serde(serialize_with = "datetime_cell")]
    pub estimated_arrival: Option<NaiveDateTime>,

    // route weather
    pub route_avg_temp: Option<f64>,
    pub route_avg_wind_speed: Option<f64>,
    pub route_avg_precip: Option<f64>,
    pub route_avg_humidity: Option<f64>,
    pub route_avg_visibility: Option<f64>,
    pub route_avg_pressure: Option<f64>,

    // origin city weather
    pub origin_avg_temp: Option<f64>,
    pub origin_avg_wind_speed: Option<f64>,
    pub origin_avg_precip: Option<f64>,
    pub origin_avg_humidity: Option<f64>,
    pub origin_avg_visibility: Option<f64>,
    pub origin_avg_pressure: Option<f64>,
    pub origin_description: Option<String>,

    // destination city weather
    pub destination_avg_temp: Option<f64>,
    pub destination_avg_wind_speed: Option<f64>,
    pub destination_avg_precip: Option<f64>,
    pub destination_avg_humidity: Option<f64>,
    pub destination_avg_visibility: Option<f64>,
    pub destination_avg_pressure: Option<f64>,
    pub destination_description: Option<String>,

    // traffic
    pub avg_no_of_vehicles: Option<f64>,
    pub accident: u8,

    // truck
    pub truck_age: Option<f64>,
    pub load_capacity_pounds: Option<f64>,
    pub mileage_mpg: Option<f64>,
    pub fuel_type: Option<String>,
    pub vehicle_no: Option<String>,

    // driver
    pub driver_id: Option<String>,
    pub age: Option<f64>,
    pub experience: Option<f64>,
    pub ratings: Option<f64>,
    pub average_speed_mph: Option<f64>,
    pub gender: Option<String>,
    pub driving_style: Option<String>,

    // route
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    pub distance: Option<f64>,
    pub average_hours: Option<f64>,

    pub is_midnight: u8,
}
