//! Merges static truck, driver and route attributes onto route aggregates.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::info;

use crate::prepare::join::RouteLookup;
use crate::prepare::types::{FinalRecord, RouteAggregate};
use crate::types::{Driver, Truck};

/// 1 when departure and arrival fall on different calendar dates, else 0.
///
/// Unknown timestamps count as not crossing midnight.
pub fn is_midnight(departure: Option<NaiveDateTime>, arrival: Option<NaiveDateTime>) -> u8 {
    match (departure, arrival) {
        (Some(d), Some(a)) => u8::from(d.date() != a.date()),
        _ => 0,
    }
}

/// Counts of static attributes that could not be matched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeMisses {
    pub trucks: usize,
    pub drivers: usize,
    pub routes: usize,
}

/// Left-joins the static tables; never drops a row.
#[tracing::instrument(skip_all, fields(rows = aggregates.len()))]
pub fn finalize(
    aggregates: Vec<RouteAggregate>,
    trucks: &[Truck],
    drivers: &[Driver],
    routes: &RouteLookup,
) -> (Vec<FinalRecord>, MergeMisses) {
    let mut truck_by_id: HashMap<&str, &Truck> = HashMap::new();
    for truck in trucks {
        truck_by_id.entry(truck.truck_id.as_str()).or_insert(truck);
    }
    // Drivers attach through the vehicle number they share with a truck.
    let mut driver_by_vehicle: HashMap<&str, &Driver> = HashMap::new();
    for driver in drivers {
        if let Some(vehicle_no) = driver.vehicle_no.as_deref() {
            driver_by_vehicle.entry(vehicle_no).or_insert(driver);
        }
    }

    let mut misses = MergeMisses::default();
    let records: Vec<FinalRecord> = aggregates
        .into_iter()
        .map(|agg| {
            let truck = truck_by_id.get(agg.truck_id.as_str()).copied();
            let driver = truck
                .and_then(|t| t.vehicle_no.as_deref())
                .and_then(|v| driver_by_vehicle.get(v).copied());
            let route = routes.get(&agg.route_id);

            misses.trucks += usize::from(truck.is_none());
            misses.drivers += usize::from(driver.is_none());
            misses.routes += usize::from(route.is_none());

            let RouteAggregate {
                truck_id,
                route_id,
                departure_date,
                estimated_arrival,
                route_weather,
                origin_weather,
                destination_weather,
                traffic,
            } = agg;

            FinalRecord {
                truck_id,
                route_id,
                departure_date,
                estimated_arrival,

                route_avg_temp: route_weather.avg_temp,
                route_avg_wind_speed: route_weather.avg_wind_speed,
                route_avg_precip: route_weather.avg_precip,
                route_avg_humidity: route_weather.avg_humidity,
                route_avg_visibility: route_weather.avg_visibility,
                route_avg_pressure: route_weather.avg_pressure,

                origin_avg_temp: origin_weather.avg_temp,
                origin_avg_wind_speed: origin_weather.avg_wind_speed,
                origin_avg_precip: origin_weather.avg_precip,
                origin_avg_humidity: origin_weather.avg_humidity,
                origin_avg_visibility: origin_weather.avg_visibility,
                origin_avg_pressure: origin_weather.avg_pressure,
                origin_description: origin_weather.description,

                destination_avg_temp: destination_weather.avg_temp,
                destination_avg_wind_speed: destination_weather.avg_wind_speed,
                destination_avg_precip: destination_weather.avg_precip,
                destination_avg_humidity: destination_weather.avg_humidity,
                destination_avg_visibility: destination_weather.avg_visibility,
                destination_avg_pressure: destination_weather.avg_pressure,
                destination_description: destination_weather.description,

                avg_no_of_vehicles: traffic.avg_no_of_vehicles,
                accident: u8::from(traffic.accident),

                truck_age: truck.and_then(|t| t.truck_age),
                load_capacity_pounds: truck.and_then(|t| t.load_capacity_pounds),
                mileage_mpg: truck.and_then(|t| t.mileage_mpg),
                fuel_type: truck.and_then(|t| t.fuel_type.clone()),
                vehicle_no: truck.and_then(|t| t.vehicle_no.clone()),

                driver_id: driver.map(|d| d.driver_id.clone()),
                age: driver.and_then(|d| d.age),
                experience: driver.and_then(|d| d.experience),
                ratings: driver.and_then(|d| d.ratings),
                average_speed_mph: driver.and_then(|d| d.average_speed_mph),
                gender: driver.and_then(|d| d.gender.clone()),
                driving_style: driver.and_then(|d| d.driving_style.clone()),

                origin_id: route.and_then(|r| r.origin_id.clone()),
                destination_id: route.and_then(|r| r.destination_id.clone()),
                distance: route.and_then(|r| r.distance),
                average_hours: route.and_then(|r| r.average_hours),

                is_midnight: is_midnight(departure_date, estimated_arrival),
            }
        })
        .collect();

    info!(
        missing_trucks = misses.trucks,
        missing_drivers = misses.drivers,
        missing_routes = misses.routes,
        "Static attributes merged"
    );

    (records, misses)
}
