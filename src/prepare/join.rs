//! Temporal left join of exploded buckets against time-indexed observations.
//!
//! Every join is keyed on (location, timestamp). The location of a bucket is
//! resolved from its trip through a [`LocationKey`]: the trip's route itself,
//! or the origin/destination city of that route.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::Granularity;
use crate::prepare::expand::Bucket;
use crate::stats::JoinStats;
use crate::types::{
    Route, RouteWeatherObservation, TrafficObservation, Trip, WeatherObservation,
};

/// A row of a time-indexed reference table.
pub trait Observation {
    fn location(&self) -> &str;
    fn observed_at(&self) -> Option<NaiveDateTime>;
}

impl Observation for WeatherObservation {
    fn location(&self) -> &str {
        &self.city_id
    }

    fn observed_at(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

impl Observation for RouteWeatherObservation {
    fn location(&self) -> &str {
        &self.route_id
    }

    fn observed_at(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

impl Observation for TrafficObservation {
    fn location(&self) -> &str {
        &self.route_id
    }

    fn observed_at(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

/// Which identifier of a trip is matched against the observation location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKey {
    Origin,
    Destination,
    Route,
}

/// A named join target: how to locate a bucket and how finely to sample it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    pub target: &'static str,
    pub location: LocationKey,
    pub granularity: Granularity,
}

impl JoinSpec {
    pub fn origin_weather(granularity: Granularity) -> Self {
        Self {
            target: "origin_weather",
            location: LocationKey::Origin,
            granularity,
        }
    }

    pub fn destination_weather(granularity: Granularity) -> Self {
        Self {
            target: "destination_weather",
            location: LocationKey::Destination,
            granularity,
        }
    }

    pub fn route_weather(granularity: Granularity) -> Self {
        Self {
            target: "route_weather",
            location: LocationKey::Route,
            granularity,
        }
    }

    pub fn traffic(granularity: Granularity) -> Self {
        Self {
            target: "traffic",
            location: LocationKey::Route,
            granularity,
        }
    }
}

/// Routes by route_id; the first row wins on duplicates.
pub struct RouteLookup<'a> {
    routes: HashMap<&'a str, &'a Route>,
}

impl<'a> RouteLookup<'a> {
    pub fn new(routes: &'a [Route]) -> Self {
        let mut map = HashMap::new();
        for route in routes {
            map.entry(route.route_id.as_str()).or_insert(route);
        }
        Self { routes: map }
    }

    pub fn get(&self, route_id: &str) -> Option<&'a Route> {
        self.routes.get(route_id).copied()
    }

    /// The location id a trip exposes under `key`.
    pub fn locate<'t>(&self, trip: &'t Trip, key: LocationKey) -> Option<&'t str>
    where
        'a: 't,
    {
        match key {
            LocationKey::Route => Some(trip.route_id.as_str()),
            LocationKey::Origin => self.get(&trip.route_id)?.origin_id.as_deref(),
            LocationKey::Destination => self.get(&trip.route_id)?.destination_id.as_deref(),
        }
    }
}

/// (location, timestamp) → first observation in file order.
pub struct ObservationIndex<'a, R> {
    by_location: HashMap<&'a str, HashMap<NaiveDateTime, &'a R>>,
    duplicates: usize,
}

impl<'a, R: Observation> ObservationIndex<'a, R> {
    /// Rows without a timestamp can never match and are left out.
    pub fn build(rows: &'a [R]) -> Self {
        let mut by_location: HashMap<&'a str, HashMap<NaiveDateTime, &'a R>> = HashMap::new();
        let mut duplicates = 0;
        for row in rows {
            let Some(ts) = row.observed_at() else { continue };
            let slot = by_location.entry(row.location()).or_default();
            if slot.contains_key(&ts) {
                duplicates += 1;
            } else {
                slot.insert(ts, row);
            }
        }
        Self {
            by_location,
            duplicates,
        }
    }

    pub fn get(&self, location: &str, timestamp: NaiveDateTime) -> Option<&'a R> {
        self.by_location.get(location)?.get(&timestamp).copied()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// One left-joined bucket. `observation` is `None` when nothing matched.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'a, R> {
    pub trip: usize,
    pub timestamp: NaiveDateTime,
    pub observation: Option<&'a R>,
}

/// Left-joins `buckets` against `index`, keeping every bucket exactly once.
#[tracing::instrument(skip_all, fields(target = spec.target, buckets = buckets.len()))]
pub fn temporal_left_join<'a, R: Observation>(
    buckets: &[Bucket],
    trips: &[Trip],
    routes: &RouteLookup,
    spec: &JoinSpec,
    index: &ObservationIndex<'a, R>,
) -> (Vec<Matched<'a, R>>, JoinStats) {
    let mut stats = JoinStats {
        buckets: buckets.len(),
        duplicate_observations: index.duplicates(),
        ..Default::default()
    };

    let joined: Vec<Matched<'a, R>> = buckets
        .iter()
        .map(|bucket| {
            let observation = trips
                .get(bucket.trip)
                .and_then(|trip| routes.locate(trip, spec.location))
                .and_then(|location| index.get(location, bucket.timestamp));
            if observation.is_some() {
                stats.matched += 1;
            } else {
                stats.unmatched += 1;
            }
            Matched {
                trip: bucket.trip,
                timestamp: bucket.timestamp,
                observation,
            }
        })
        .collect();

    if stats.duplicate_observations > 0 {
        debug!(
            duplicates = stats.duplicate_observations,
            "Duplicate observations ignored; first in file order kept"
        );
    }
    info!(
        matched = stats.matched,
        unmatched = stats.unmatched,
        match_pct = stats.match_pct(),
        "Temporal join complete"
    );

    (joined, stats)
}
