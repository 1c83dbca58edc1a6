//! Dataset loading for the seven cleaned input tables.
//!
//! Structural problems (missing file, missing column, broken CSV framing)
//! abort the load. Bad individual values are coerced to null and counted in
//! the table's [`TableStats`].

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::PrepareConfig;
use crate::error::PrepareError;
use crate::schema::{self, Header, TableSchema, TimeColumns};
use crate::stats::{LoadReport, TableStats};
use crate::types::{
    Driver, Route, RouteWeatherObservation, Tables, TrafficObservation, Trip, Truck,
    WeatherObservation, WeatherReadings,
};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses a datetime in any of the accepted layouts. A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Dates may carry a midnight time component, e.g. "2019-01-30 00:00:00".
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
}

/// Combines a date with an HHMM hour such as `300` (03:00) or `1500` (15:00).
pub fn combine_date_hour(date: &str, hour: &str) -> Option<NaiveDateTime> {
    let date = parse_date(date)?;
    let hhmm = hour.trim().parse::<f64>().ok()?;
    if !hhmm.is_finite() || hhmm < 0.0 {
        return None;
    }
    let hhmm = hhmm as i64;
    let (h, m) = (hhmm / 100, hhmm % 100);
    if h > 23 || m > 59 {
        return None;
    }
    Some(date.and_hms_opt(0, 0, 0)? + Duration::hours(h) + Duration::minutes(m))
}

/// Parses the 0/1 accident flag. Accepts integer, float and boolean spellings.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

/// Field accessor for one CSV record that counts coerced values.
pub struct RowReader<'a> {
    header: &'a Header,
    record: &'a StringRecord,
    stats: &'a mut TableStats,
}

impl<'a> RowReader<'a> {
    fn raw(&self, column: &str) -> Option<&'a str> {
        let record: &'a StringRecord = self.record;
        self.header
            .position(column)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.raw(column).map(str::to_string)
    }

    pub fn number(&mut self, column: &str) -> Option<f64> {
        let raw = self.raw(column)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.stats.coerced_numbers += 1;
                None
            }
        }
    }

    pub fn flag(&mut self, column: &str) -> Option<bool> {
        let raw = self.raw(column)?;
        let parsed = parse_flag(raw);
        if parsed.is_none() {
            self.stats.coerced_numbers += 1;
        }
        parsed
    }

    pub fn datetime(&mut self, column: &str) -> Option<NaiveDateTime> {
        let raw = self.raw(column)?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            self.stats.coerced_dates += 1;
        }
        parsed
    }

    /// The observation timestamp, wherever the header says it lives.
    pub fn observed_at(&mut self) -> Option<NaiveDateTime> {
        let record: &'a StringRecord = self.record;
        match self.header.time? {
            TimeColumns::Single(i) => {
                let raw = record.get(i).map(str::trim).filter(|s| !s.is_empty())?;
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    self.stats.coerced_dates += 1;
                }
                parsed
            }
            TimeColumns::DateHour { date, hour } => {
                let d = record.get(date).map(str::trim).unwrap_or("");
                let h = record.get(hour).map(str::trim).unwrap_or("");
                if d.is_empty() || h.is_empty() {
                    return None;
                }
                let parsed = combine_date_hour(d, h);
                if parsed.is_none() {
                    self.stats.coerced_dates += 1;
                }
                parsed
            }
        }
    }
}

/// A row type readable from one of the input tables.
pub trait FromRow: Sized {
    const SCHEMA: &'static TableSchema;

    /// Returns `None` when the row has no usable key.
    fn from_row(row: &mut RowReader) -> Option<Self>;
}

impl FromRow for TrafficObservation {
    const SCHEMA: &'static TableSchema = &schema::TRAFFIC;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(TrafficObservation {
            route_id: row.text("route_id")?,
            timestamp: row.observed_at(),
            no_of_vehicles: row.number("no_of_vehicles"),
            accident: row.flag("accident"),
        })
    }
}

impl FromRow for Trip {
    const SCHEMA: &'static TableSchema = &schema::TRUCK_SCHEDULE;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(Trip {
            truck_id: row.text("truck_id")?,
            route_id: row.text("route_id")?,
            departure_date: row.datetime("departure_date"),
            estimated_arrival: row.datetime("estimated_arrival"),
        })
    }
}

fn weather_readings(row: &mut RowReader) -> WeatherReadings {
    WeatherReadings {
        temp: row.number("temp"),
        wind_speed: row.number("wind_speed"),
        precip: row.number("precip"),
        humidity: row.number("humidity"),
        visibility: row.number("visibility"),
        pressure: row.number("pressure"),
    }
}

impl FromRow for WeatherObservation {
    const SCHEMA: &'static TableSchema = &schema::CITY_WEATHER;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(WeatherObservation {
            city_id: row.text("city_id")?,
            timestamp: row.observed_at(),
            readings: weather_readings(row),
            description: row.text("description"),
        })
    }
}

impl FromRow for RouteWeatherObservation {
    const SCHEMA: &'static TableSchema = &schema::ROUTES_WEATHER;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(RouteWeatherObservation {
            route_id: row.text("route_id")?,
            timestamp: row.observed_at(),
            readings: weather_readings(row),
        })
    }
}

impl FromRow for Truck {
    const SCHEMA: &'static TableSchema = &schema::TRUCKS;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(Truck {
            truck_id: row.text("truck_id")?,
            truck_age: row.number("truck_age"),
            load_capacity_pounds: row.number("load_capacity_pounds"),
            mileage_mpg: row.number("mileage_mpg"),
            fuel_type: row.text("fuel_type"),
            vehicle_no: row.text("vehicle_no"),
        })
    }
}

impl FromRow for Driver {
    const SCHEMA: &'static TableSchema = &schema::DRIVERS;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(Driver {
            driver_id: row.text("driver_id")?,
            vehicle_no: row.text("vehicle_no"),
            age: row.number("age"),
            experience: row.number("experience"),
            ratings: row.number("ratings"),
            average_speed_mph: row.number("average_speed_mph"),
            gender: row.text("gender"),
            driving_style: row.text("driving_style"),
        })
    }
}

impl FromRow for Route {
    const SCHEMA: &'static TableSchema = &schema::ROUTES;

    fn from_row(row: &mut RowReader) -> Option<Self> {
        Some(Route {
            route_id: row.text("route_id")?,
            origin_id: row.text("origin_id"),
            destination_id: row.text("destination_id"),
            distance: row.number("distance"),
            average_hours: row.number("average_hours"),
        })
    }
}

/// Reads typed rows from any CSV source, validating the header first.
pub fn read_rows<T: FromRow, R: Read>(reader: R, stats: &mut TableStats) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(PrepareError::from)?.clone();
    let header = Header::resolve(T::SCHEMA, &headers)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(PrepareError::from)?;
        let mut row = RowReader {
            header: &header,
            record: &record,
            stats: &mut *stats,
        };
        match T::from_row(&mut row) {
            Some(value) => rows.push(value),
            None => stats.keyless_rows += 1,
        }
    }
    stats.rows = rows.len();

    Ok(rows)
}

/// Opens a table file, gunzipping it when the name ends in `.gz`.
pub fn read_table<T: FromRow>(path: &Path, stats: &mut TableStats) -> Result<Vec<T>> {
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|e| PrepareError::io(&path_str, e))?;
    debug!(path = %path_str, table = T::SCHEMA.name, "Reading table");

    let rows = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        read_rows(GzDecoder::new(file), stats)?
    } else {
        read_rows(file, stats)?
    };
    Ok(rows)
}

/// Keeps the first row for each key, returning how many were dropped.
pub fn dedup_by_key<T, K, F>(rows: &mut Vec<T>, key: F) -> usize
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let before = rows.len();
    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(key(row)));
    before - rows.len()
}

fn load_one<T: FromRow>(config: &PrepareConfig, file: &str, report: &mut LoadReport) -> Result<Vec<T>> {
    let mut stats = TableStats::default();
    let rows = read_table::<T>(&config.table_path(file), &mut stats)?;
    report.tables.insert(T::SCHEMA.name.to_string(), stats);
    Ok(rows)
}

fn record_duplicates(report: &mut LoadReport, table: &str, removed: usize) {
    if let Some(stats) = report.tables.get_mut(table) {
        stats.duplicates = removed;
        stats.rows -= removed;
    }
}

/// Loads every input table named by `config`.
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn load_tables(config: &PrepareConfig) -> Result<(Tables, LoadReport)> {
    let mut report = LoadReport::default();
    let files = &config.files;

    let mut tables = Tables {
        traffic: load_one(config, &files.traffic, &mut report)?,
        truck_schedule: load_one(config, &files.truck_schedule, &mut report)?,
        city_weather: load_one(config, &files.city_weather, &mut report)?,
        trucks: load_one(config, &files.trucks, &mut report)?,
        drivers: load_one(config, &files.drivers, &mut report)?,
        routes: load_one(config, &files.routes, &mut report)?,
        routes_weather: load_one(config, &files.routes_weather, &mut report)?,
    };

    let removed = dedup_by_key(&mut tables.truck_schedule, |t| {
        (t.truck_id.clone(), t.route_id.clone(), t.departure_date)
    });
    record_duplicates(&mut report, schema::TRUCK_SCHEDULE.name, removed);
    let removed = dedup_by_key(&mut tables.trucks, |t| t.truck_id.clone());
    record_duplicates(&mut report, schema::TRUCKS.name, removed);
    let removed = dedup_by_key(&mut tables.drivers, |d| d.driver_id.clone());
    record_duplicates(&mut report, schema::DRIVERS.name, removed);
    let removed = dedup_by_key(&mut tables.routes, |r| r.route_id.clone());
    record_duplicates(&mut report, schema::ROUTES.name, removed);

    for (name, stats) in &report.tables {
        info!(
            table = %name,
            rows = stats.rows,
            duplicates = stats.duplicates,
            coerced_dates = stats.coerced_dates,
            coerced_numbers = stats.coerced_numbers,
            keyless_rows = stats.keyless_rows,
            "Table loaded"
        );
        if stats.coerced_dates > 0 {
            warn!(table = %name, coerced = stats.coerced_dates, "Unparseable timestamps set to null");
        }
    }

    Ok((tables, report))
}
