//! Typed rows for the seven input tables.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One scheduled truck movement over a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub truck_id: String,
    pub route_id: String,
    pub departure_date: Option<NaiveDateTime>,
    pub estimated_arrival: Option<NaiveDateTime>,
}

/// Numeric weather readings shared by city and route observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReadings {
    pub temp: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precip: Option<f64>,
    pub humidity: Option<f64>,
    pub visibility: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub city_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub readings: WeatherReadings,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteWeatherObservation {
    pub route_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub readings: WeatherReadings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficObservation {
    pub route_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub no_of_vehicles: Option<f64>,
    pub accident: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Truck {
    pub truck_id: String,
    pub truck_age: Option<f64>,
    pub load_capacity_pounds: Option<f64>,
    pub mileage_mpg: Option<f64>,
    pub fuel_type: Option<String>,
    pub vehicle_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub driver_id: String,
    pub vehicle_no: Option<String>,
    pub age: Option<f64>,
    pub experience: Option<f64>,
    pub ratings: Option<f64>,
    pub average_speed_mph: Option<f64>,
    pub gender: Option<String>,
    pub driving_style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub route_id: String,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    pub distance: Option<f64>,
    pub average_hours: Option<f64>,
}

/// All inputs of one preparation run, owned by that run.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub traffic: Vec<TrafficObservation>,
    pub truck_schedule: Vec<Trip>,
    pub city_weather: Vec<WeatherObservation>,
    pub trucks: Vec<Truck>,
    pub drivers: Vec<Driver>,
    pub routes: Vec<Route>,
    pub routes_weather: Vec<RouteWeatherObservation>,
}
