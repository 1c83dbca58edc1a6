//! The data-preparation core.
//!
//! Trips are rounded, exploded into time buckets, left-joined against city
//! weather (origin and destination), route weather and traffic, aggregated
//! back to one row per (truck_id, route_id), and finally merged with the
//! static truck, driver and route tables.

pub mod aggregate;
pub mod expand;
pub mod finalize;
pub mod join;
pub mod types;
pub mod utility;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::PrepareConfig;
use crate::prepare::aggregate::{Grouping, JoinedTargets, aggregate_routes};
use crate::prepare::expand::{explode, is_degenerate, round_trip};
use crate::prepare::finalize::finalize;
use crate::prepare::join::{JoinSpec, ObservationIndex, RouteLookup, temporal_left_join};
use crate::prepare::types::FinalRecord;
use crate::stats::PrepareStats;
use crate::types::{Tables, Trip};

/// Output of one preparation run.
#[derive(Debug)]
pub struct Prepared {
    pub records: Vec<FinalRecord>,
    pub stats: PrepareStats,
}

/// Runs the whole core over already loaded tables. Deterministic for equal inputs.
#[tracing::instrument(skip_all, fields(trips = tables.truck_schedule.len()))]
pub fn prepare(tables: &Tables, config: &PrepareConfig) -> Prepared {
    let trips: Vec<Trip> = tables
        .truck_schedule
        .iter()
        .map(|t| round_trip(t, config.rounding))
        .collect();

    let mut stats = PrepareStats {
        timestamp: Utc::now(),
        trips: trips.len(),
        untimed_trips: trips
            .iter()
            .filter(|t| t.departure_date.is_none() || t.estimated_arrival.is_none())
            .count(),
        degenerate_trips: trips.iter().filter(|t| is_degenerate(t)).count(),
        ..Default::default()
    };
    if stats.degenerate_trips > 0 {
        info!(
            degenerate = stats.degenerate_trips,
            policy = ?config.degenerate_policy,
            "Trips with departure after arrival"
        );
    }

    let routes = RouteLookup::new(&tables.routes);
    let city_index = ObservationIndex::build(&tables.city_weather);
    let route_weather_index = ObservationIndex::build(&tables.routes_weather);
    let traffic_index = ObservationIndex::build(&tables.traffic);

    let origin_spec = JoinSpec::origin_weather(config.city_weather_granularity);
    let destination_spec = JoinSpec::destination_weather(config.city_weather_granularity);
    let route_spec = JoinSpec::route_weather(config.route_weather_granularity);
    let traffic_spec = JoinSpec::traffic(config.traffic_granularity);

    let buckets_for = |spec: &JoinSpec| explode(&trips, spec.granularity, config.degenerate_policy);

    let (origin, origin_stats) = temporal_left_join(
        &buckets_for(&origin_spec),
        &trips,
        &routes,
        &origin_spec,
        &city_index,
    );
    let (destination, destination_stats) = temporal_left_join(
        &buckets_for(&destination_spec),
        &trips,
        &routes,
        &destination_spec,
        &city_index,
    );
    let (route_weather, route_stats) = temporal_left_join(
        &buckets_for(&route_spec),
        &trips,
        &routes,
        &route_spec,
        &route_weather_index,
    );
    let (traffic, traffic_stats) = temporal_left_join(
        &buckets_for(&traffic_spec),
        &trips,
        &routes,
        &traffic_spec,
        &traffic_index,
    );

    for (spec, join_stats) in [
        (&origin_spec, origin_stats),
        (&destination_spec, destination_stats),
        (&route_spec, route_stats),
        (&traffic_spec, traffic_stats),
    ] {
        stats.joins.insert(spec.target.to_string(), join_stats);
    }

    let grouping = Grouping::from_trips(&trips);
    if grouping.is_empty() {
        warn!("Schedule has no trips; output will be empty");
    }
    stats.groups = grouping.len();
    let aggregates = aggregate_routes(
        &trips,
        &grouping,
        &JoinedTargets {
            origin_weather: &origin,
            destination_weather: &destination,
            route_weather: &route_weather,
            traffic: &traffic,
        },
    );

    let (records, misses) = finalize(aggregates, &tables.trucks, &tables.drivers, &routes);
    stats.missing_trucks = misses.trucks;
    stats.missing_drivers = misses.drivers;
    stats.missing_routes = misses.routes;
    stats.midnight_trips = records.iter().filter(|r| r.is_midnight == 1).count();

    info!(
        records = records.len(),
        groups = stats.groups,
        midnight_trips = stats.midnight_trips,
        "Preparation complete"
    );

    Prepared { records, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DegeneratePolicy, Granularity};
    use crate::types::{Route, WeatherObservation, WeatherReadings};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn single_trip_tables() -> Tables {
        Tables {
            truck_schedule: vec![Trip {
                truck_id: "1".into(),
                route_id: "9".into(),
                departure_date: Some(dt("2019-01-30 00:00")),
                estimated_arrival: Some(dt("2019-01-30 06:00")),
            }],
            routes: vec![Route {
                route_id: "9".into(),
                origin_id: Some("C-1".into()),
                destination_id: Some("C-2".into()),
                distance: Some(120.0),
                average_hours: Some(6.0),
            }],
            city_weather: vec![WeatherObservation {
                city_id: "C-1".into(),
                timestamp: Some(dt("2019-01-30 00:00")),
                readings: WeatherReadings {
                    temp: Some(5.0),
                    ..Default::default()
                },
                description: Some("clear".into()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_single_trip_origin_weather() {
        let config = PrepareConfig {
            city_weather_granularity: Granularity::SixHourly,
            ..Default::default()
        };
        let prepared = prepare(&single_trip_tables(), &config);

        assert_eq!(prepared.records.len(), 1);
        let record = &prepared.records[0];
        assert_eq!(record.origin_avg_temp, Some(5.0));
        assert_eq!(record.origin_description.as_deref(), Some("clear"));
        assert_eq!(record.destination_avg_temp, None);
        assert_eq!(record.is_midnight, 0);
        assert_eq!(prepared.stats.joins["origin_weather"].buckets, 2);
        assert_eq!(prepared.stats.joins["origin_weather"].matched, 1);
    }

    #[test]
    fn test_one_record_per_truck_route() {
        let mut tables = single_trip_tables();
        let repeat = Trip {
            departure_date: Some(dt("2019-02-01 00:00")),
            estimated_arrival: Some(dt("2019-02-01 12:00")),
            ..tables.truck_schedule[0].clone()
        };
        tables.truck_schedule.push(repeat);
        tables.truck_schedule.push(Trip {
            truck_id: "2".into(),
            route_id: "9".into(),
            departure_date: None,
            estimated_arrival: None,
        });

        let prepared = prepare(&tables, &PrepareConfig::default());

        assert_eq!(prepared.records.len(), 2);
        assert_eq!(prepared.stats.untimed_trips, 1);
        assert_eq!(prepared.records[1].truck_id, "2");
        assert_eq!(prepared.records[1].origin_avg_temp, None);
    }

    #[test]
    fn test_degenerate_trip_never_fails() {
        let mut tables = single_trip_tables();
        tables.truck_schedule[0].departure_date = Some(dt("2019-01-30 13:00"));
        tables.truck_schedule[0].estimated_arrival = Some(dt("2019-01-30 02:00"));

        for policy in [DegeneratePolicy::SingleBucket, DegeneratePolicy::Empty] {
            let config = PrepareConfig {
                degenerate_policy: policy,
                ..Default::default()
            };
            let prepared = prepare(&tables, &config);
            assert_eq!(prepared.records.len(), 1);
            assert_eq!(prepared.stats.degenerate_trips, 1);
            let expected = usize::from(policy == DegeneratePolicy::SingleBucket);
            assert_eq!(prepared.stats.joins["traffic"].buckets, expected);
        }
    }

    #[test]
    fn test_empty_schedule_yields_no_records() {
        let mut tables = single_trip_tables();
        tables.truck_schedule.clear();
        let prepared = prepare(&tables, &PrepareConfig::default());
        assert!(prepared.records.is_empty());
        assert_eq!(prepared.stats.groups, 0);
    }

    #[test]
    fn test_rerun_is_identical() {
        let tables = single_trip_tables();
        let config = PrepareConfig::default();
        assert_eq!(prepare(&tables, &config).records, prepare(&tables, &config).records);
    }
}
