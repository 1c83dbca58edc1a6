//! Interval expansion: one trip becomes one bucket per time step.

use chrono::NaiveDateTime;

use crate::config::{DegeneratePolicy, Granularity};
use crate::types::Trip;

/// One exploded trip row: the trip (by index) at a generated timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub trip: usize,
    pub timestamp: NaiveDateTime,
}

/// Floors the departure and ceils the arrival to `rounding`.
pub fn round_trip(trip: &Trip, rounding: Granularity) -> Trip {
    Trip {
        truck_id: trip.truck_id.clone(),
        route_id: trip.route_id.clone(),
        departure_date: trip.departure_date.map(|t| rounding.floor(t)),
        estimated_arrival: trip.estimated_arrival.map(|t| rounding.ceil(t)),
    }
}

pub fn is_degenerate(trip: &Trip) -> bool {
    matches!(
        (trip.departure_date, trip.estimated_arrival),
        (Some(start), Some(end)) if start > end
    )
}

/// `start, start+g, …` up to and including `end`.
pub fn bucket_times(
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
    policy: DegeneratePolicy,
) -> Vec<NaiveDateTime> {
    if start > end {
        return match policy {
            DegeneratePolicy::SingleBucket => vec![start],
            DegeneratePolicy::Empty => Vec::new(),
        };
    }

    let step = granularity.step();
    let mut times = Vec::new();
    let mut current = start;
    while current <= end {
        times.push(current);
        current += step;
    }
    times
}

/// Explodes every trip, in trip order then time order. Untimed trips yield nothing.
pub fn explode(trips: &[Trip], granularity: Granularity, policy: DegeneratePolicy) -> Vec<Bucket> {
    trips
        .iter()
        .enumerate()
        .filter_map(|(i, trip)| Some((i, trip.departure_date?, trip.estimated_arrival?)))
        .flat_map(|(i, start, end)| {
            bucket_times(start, end, granularity, policy)
                .into_iter()
                .map(move |timestamp| Bucket { trip: i, timestamp })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn trip(dep: &str, arr: &str) -> Trip {
        Trip {
            truck_id: "1".into(),
            route_id: "R-9".into(),
            departure_date: Some(dt(dep)),
            estimated_arrival: Some(dt(arr)),
        }
    }

    #[test]
    fn test_inclusive_endpoint() {
        let times = bucket_times(
            dt("2019-01-30 00:00"),
            dt("2019-01-30 06:00"),
            Granularity::SixHourly,
            DegeneratePolicy::Empty,
        );
        assert_eq!(times, vec![dt("2019-01-30 00:00"), dt("2019-01-30 06:00")]);
    }

    #[test]
    fn test_steps_are_multiples_of_granularity() {
        let start = dt("2019-01-30 01:00");
        let end = dt("2019-01-30 05:30");
        let times = bucket_times(start, end, Granularity::Hourly, DegeneratePolicy::Empty);

        assert_eq!(times.first(), Some(&start));
        assert!(*times.last().unwrap() <= end);
        for (k, t) in times.iter().enumerate() {
            assert_eq!(*t - start, Duration::hours(k as i64));
        }
        assert_eq!(times.len(), 5);
    }

    #[test]
    fn test_zero_length_interval_has_one_bucket() {
        let t = dt("2019-01-30 06:00");
        let times = bucket_times(t, t, Granularity::Hourly, DegeneratePolicy::Empty);
        assert_eq!(times, vec![t]);
    }

    #[test]
    fn test_degenerate_policies() {
        let start = dt("2019-01-30 12:00");
        let end = dt("2019-01-30 06:00");
        assert_eq!(
            bucket_times(start, end, Granularity::Hourly, DegeneratePolicy::SingleBucket),
            vec![start]
        );
        assert!(bucket_times(start, end, Granularity::Hourly, DegeneratePolicy::Empty).is_empty());
    }

    #[test]
    fn test_round_trip_floors_and_ceils() {
        let rounded = round_trip(&trip("2019-01-30 22:00", "2019-01-31 03:00"), Granularity::SixHourly);
        assert_eq!(rounded.departure_date, Some(dt("2019-01-30 18:00")));
        assert_eq!(rounded.estimated_arrival, Some(dt("2019-01-31 06:00")));
        assert!(!is_degenerate(&rounded));
    }

    #[test]
    fn test_explode_skips_untimed_trips() {
        let mut untimed = trip("2019-01-30 00:00", "2019-01-30 00:00");
        untimed.estimated_arrival = None;
        let trips = vec![untimed, trip("2019-01-30 00:00", "2019-01-30 02:00")];

        let buckets = explode(&trips, Granularity::Hourly, DegeneratePolicy::SingleBucket);

        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.trip == 1));
        assert_eq!(buckets[2].timestamp, dt("2019-01-30 02:00"));
    }
}
