use std::collections::HashMap;

use crate::prepare::join::Matched;
use crate::prepare::types::{RouteAggregate, TrafficSummary, WeatherSummary};
use crate::prepare::utility::{MeanAcc, ModeAcc};
use crate::types::{RouteWeatherObservation, TrafficObservation, Trip, WeatherObservation, WeatherReadings};

/// Observations that carry weather readings.
pub trait WeatherLike {
    fn readings(&self) -> &WeatherReadings;

    fn description(&self) -> Option<&str> {
        None
    }
}

impl WeatherLike for WeatherObservation {
    fn readings(&self) -> &WeatherReadings {
        &self.readings
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl WeatherLike for RouteWeatherObservation {
    fn readings(&self) -> &WeatherReadings {
        &self.readings
    }
}

/// Maps trips to (truck_id, route_id) groups in first-seen order.
///
/// Groups come from the schedule itself, so a trip that produced no buckets
/// still owns a group.
#[derive(Debug)]
pub struct Grouping {
    keys: Vec<(String, String)>,
    /// First trip of each group; its timestamps represent the group.
    representatives: Vec<usize>,
    trip_group: Vec<usize>,
}

impl Grouping {
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut representatives = Vec::new();
        let mut trip_group = Vec::with_capacity(trips.len());

        for (i, trip) in trips.iter().enumerate() {
            let key = (trip.truck_id.as_str(), trip.route_id.as_str());
            let group = *index.entry(key).or_insert_with(|| {
                keys.push((trip.truck_id.clone(), trip.route_id.clone()));
                representatives.push(i);
                keys.len() - 1
            });
            trip_group.push(group);
        }

        Self {
            keys,
            representatives,
            trip_group,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn group_of(&self, trip: usize) -> usize {
        self.trip_group[trip]
    }
}

#[derive(Debug, Default, Clone)]
struct WeatherAcc {
    temp: MeanAcc,
    wind_speed: MeanAcc,
    precip: MeanAcc,
    humidity: MeanAcc,
    visibility: MeanAcc,
    pressure: MeanAcc,
    description: ModeAcc,
}

impl WeatherAcc {
    fn push<R: WeatherLike>(&mut self, obs: &R) {
        let r = obs.readings();
        self.temp.push(r.temp);
        self.wind_speed.push(r.wind_speed);
        self.precip.push(r.precip);
        self.humidity.push(r.humidity);
        self.visibility.push(r.visibility);
        self.pressure.push(r.pressure);
        self.description.push(obs.description());
    }

    fn summary(&self) -> WeatherSummary {
        WeatherSummary {
            avg_temp: self.temp.mean(),
            avg_wind_speed: self.wind_speed.mean(),
            avg_precip: self.precip.mean(),
            avg_humidity: self.humidity.mean(),
            avg_visibility: self.visibility.mean(),
            avg_pressure: self.pressure.mean(),
            description: self.description.mode(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct TrafficAcc {
    vehicles: MeanAcc,
    accident: bool,
}

/// Reduces one weather join to a summary per group.
pub fn summarize_weather<R: WeatherLike>(
    grouping: &Grouping,
    joined: &[Matched<'_, R>],
) -> Vec<WeatherSummary> {
    let mut accs = vec![WeatherAcc::default(); grouping.len()];
    for row in joined {
        if let Some(obs) = row.observation {
            accs[grouping.group_of(row.trip)].push(obs);
        }
    }
    accs.iter().map(WeatherAcc::summary).collect()
}

/// Reduces the traffic join: mean vehicle count, OR of accident flags.
pub fn summarize_traffic(
    grouping: &Grouping,
    joined: &[Matched<'_, TrafficObservation>],
) -> Vec<TrafficSummary> {
    let mut accs = vec![TrafficAcc::default(); grouping.len()];
    for row in joined {
        if let Some(obs) = row.observation {
            let acc = &mut accs[grouping.group_of(row.trip)];
            acc.vehicles.push(obs.no_of_vehicles);
            acc.accident |= obs.accident == Some(true);
        }
    }
    accs.iter()
        .map(|acc| TrafficSummary {
            avg_no_of_vehicles: acc.vehicles.mean(),
            accident: acc.accident,
        })
        .collect()
}

/// Joined rows for each target, in the order the pipeline produces them.
pub struct JoinedTargets<'a> {
    pub origin_weather: &'a [Matched<'a, WeatherObservation>],
    pub destination_weather: &'a [Matched<'a, WeatherObservation>],
    pub route_weather: &'a [Matched<'a, RouteWeatherObservation>],
    pub traffic: &'a [Matched<'a, TrafficObservation>],
}

/// Collapses all joined rows back to exactly one [`RouteAggregate`] per group.
#[tracing::instrument(skip_all, fields(groups = grouping.len()))]
pub fn aggregate_routes(
    trips: &[Trip],
    grouping: &Grouping,
    joined: &JoinedTargets,
) -> Vec<RouteAggregate> {
    let origin = summarize_weather(grouping, joined.origin_weather);
    let destination = summarize_weather(grouping, joined.destination_weather);
    let route = summarize_weather(grouping, joined.route_weather);
    let traffic = summarize_traffic(grouping, joined.traffic);

    grouping
        .keys
        .iter()
        .zip(&grouping.representatives)
        .zip(origin.into_iter().zip(destination))
        .zip(route.into_iter().zip(traffic))
        .map(
            |((((truck_id, route_id), &rep), (origin_weather, destination_weather)), (route_weather, traffic))| {
                let trip = &trips[rep];
                RouteAggregate {
                    truck_id: truck_id.clone(),
                    route_id: route_id.clone(),
                    departure_date: trip.departure_date,
                    estimated_arrival: trip.estimated_arrival,
                    route_weather,
                    origin_weather,
                    destination_weather,
                    traffic,
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn trip(truck: &str, route: &str) -> Trip {
        Trip {
            truck_id: truck.into(),
            route_id: route.into(),
            departure_date: Some(dt("2019-01-30 00:00")),
            estimated_arrival: Some(dt("2019-01-30 03:00")),
        }
    }

    fn traffic(accident: Option<bool>, vehicles: Option<f64>) -> TrafficObservation {
        TrafficObservation {
            route_id: "R-1".into(),
            timestamp: Some(dt("2019-01-30 00:00")),
            no_of_vehicles: vehicles,
            accident,
        }
    }

    fn weather(temp: Option<f64>, description: Option<&str>) -> WeatherObservation {
        WeatherObservation {
            city_id: "C-1".into(),
            timestamp: Some(dt("2019-01-30 00:00")),
            readings: WeatherReadings {
                temp,
                ..Default::default()
            },
            description: description.map(str::to_string),
        }
    }

    fn matched<R>(trip: usize, observation: Option<&R>) -> Matched<'_, R> {
        Matched {
            trip,
            timestamp: dt("2019-01-30 00:00"),
            observation,
        }
    }

    #[test]
    fn test_grouping_preserves_distinct_keys() {
        let trips = vec![trip("1", "R-1"), trip("2", "R-1"), trip("1", "R-1"), trip("1", "R-2")];
        let grouping = Grouping::from_trips(&trips);
        assert_eq!(grouping.len(), 3);
        assert_eq!(grouping.group_of(0), grouping.group_of(2));
        assert_ne!(grouping.group_of(0), grouping.group_of(3));
    }

    #[test]
    fn test_accident_is_or_reduced() {
        let trips = vec![trip("1", "R-1")];
        let grouping = Grouping::from_trips(&trips);
        let obs: Vec<_> = [false, false, true, false]
            .into_iter()
            .map(|a| traffic(Some(a), Some(10.0)))
            .collect();
        let joined: Vec<_> = obs.iter().map(|o| matched(0, Some(o))).collect();

        let summary = summarize_traffic(&grouping, &joined);
        assert!(summary[0].accident);
        assert_eq!(summary[0].avg_no_of_vehicles, Some(10.0));
    }

    #[test]
    fn test_weather_mean_and_mode() {
        let trips = vec![trip("1", "R-1")];
        let grouping = Grouping::from_trips(&trips);
        let obs = vec![
            weather(Some(10.0), Some("clear")),
            weather(Some(20.0), Some("clear")),
            weather(None, Some("rain")),
        ];
        let joined: Vec<_> = obs.iter().map(|o| matched(0, Some(o))).collect();

        let summary = summarize_weather(&grouping, &joined);
        assert_eq!(summary[0].avg_temp, Some(15.0));
        assert_eq!(summary[0].description.as_deref(), Some("clear"));
    }

    #[test]
    fn test_group_without_matches_has_null_aggregates() {
        let trips = vec![trip("1", "R-1"), trip("2", "R-2")];
        let grouping = Grouping::from_trips(&trips);
        let obs = traffic(Some(true), Some(5.0));
        let w = weather(Some(3.0), None);
        let traffic_rows = vec![matched(0, Some(&obs)), matched::<TrafficObservation>(1, None)];
        let weather_rows = vec![matched(0, Some(&w))];

        let joined = JoinedTargets {
            origin_weather: &weather_rows,
            destination_weather: &[],
            route_weather: &[],
            traffic: &traffic_rows,
        };
        let aggregates = aggregate_routes(&trips, &grouping, &joined);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].origin_weather.avg_temp, Some(3.0));
        assert_eq!(aggregates[1].origin_weather, WeatherSummary::default());
        assert_eq!(aggregates[1].traffic.avg_no_of_vehicles, None);
        assert!(!aggregates[1].traffic.accident);
        assert_eq!(aggregates[1].truck_id, "2");
    }
}
