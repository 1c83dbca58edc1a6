//! Statically declared input schemas, checked once against each CSV header.

use csv::StringRecord;
use std::collections::HashMap;

use crate::error::PrepareError;

/// Required columns of one input table.
#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    /// Whether the table carries an observation timestamp.
    pub time_indexed: bool,
}

pub const TRAFFIC: TableSchema = TableSchema {
    name: "traffic",
    columns: &["route_id", "no_of_vehicles", "accident"],
    time_indexed: true,
};

pub const TRUCK_SCHEDULE: TableSchema = TableSchema {
    name: "truck_schedule",
    columns: &["truck_id", "route_id", "departure_date", "estimated_arrival"],
    time_indexed: false,
};

pub const CITY_WEATHER: TableSchema = TableSchema {
    name: "city_weather",
    columns: &[
        "city_id",
        "temp",
        "wind_speed",
        "humidity",
        "pressure",
        "precip",
        "visibility",
        "description",
    ],
    time_indexed: true,
};

pub const TRUCKS: TableSchema = TableSchema {
    name: "trucks",
    columns: &[
        "truck_id",
        "truck_age",
        "load_capacity_pounds",
        "mileage_mpg",
        "fuel_type",
        "vehicle_no",
    ],
    time_indexed: false,
};

pub const DRIVERS: TableSchema = TableSchema {
    name: "drivers",
    columns: &[
        "driver_id",
        "vehicle_no",
        "age",
        "experience",
        "ratings",
        "average_speed_mph",
        "gender",
        "driving_style",
    ],
    time_indexed: false,
};

pub const ROUTES: TableSchema = TableSchema {
    name: "routes",
    columns: &[
        "route_id",
        "origin_id",
        "destination_id",
        "distance",
        "average_hours",
    ],
    time_indexed: false,
};

pub const ROUTES_WEATHER: TableSchema = TableSchema {
    name: "routes_weather",
    columns: &[
        "route_id",
        "temp",
        "wind_speed",
        "precip",
        "humidity",
        "visibility",
        "pressure",
    ],
    time_indexed: true,
};

/// Where an observation's timestamp lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumns {
    /// A single datetime column (`timestamp` or `date_time`).
    Single(usize),
    /// A `date` column plus an `hour` column in HHMM form.
    DateHour { date: usize, hour: usize },
}

/// A header resolved against a [`TableSchema`].
#[derive(Debug)]
pub struct Header {
    pub table: &'static str,
    index: HashMap<String, usize>,
    pub time: Option<TimeColumns>,
}

impl Header {
    /// Fails with [`PrepareError::MissingColumn`] on the first absent column.
    pub fn resolve(schema: &TableSchema, headers: &StringRecord) -> Result<Self, PrepareError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();

        for column in schema.columns {
            if !index.contains_key(*column) {
                return Err(PrepareError::missing_column(schema.name, column));
            }
        }

        let time = if schema.time_indexed {
            let single = ["timestamp", "date_time"]
                .iter()
                .find_map(|c| index.get(*c).copied());
            match (single, index.get("date"), index.get("hour")) {
                (Some(i), _, _) => Some(TimeColumns::Single(i)),
                (None, Some(&date), Some(&hour)) => Some(TimeColumns::DateHour { date, hour }),
                _ => return Err(PrepareError::missing_column(schema.name, "timestamp")),
            }
        } else {
            None
        };

        Ok(Self {
            table: schema.name,
            index,
            time,
        })
    }

    /// Position of a column declared in the schema.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}
