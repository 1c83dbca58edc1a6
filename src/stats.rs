use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Load-time counters for one input table.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub rows: usize,
    pub coerced_dates: usize,
    pub coerced_numbers: usize,
    pub keyless_rows: usize,
    pub duplicates: usize,
}

/// Per-table counters for a whole load, keyed by table name.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    pub tables: BTreeMap<String, TableStats>,
}

impl LoadReport {
    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.get(name)
    }

    pub fn total_coerced_dates(&self) -> usize {
        self.tables.values().map(|t| t.coerced_dates).sum()
    }

    pub fn total_coerced_numbers(&self) -> usize {
        self.tables.values().map(|t| t.coerced_numbers).sum()
    }
}

/// Outcome of one temporal left join.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct JoinStats {
    pub buckets: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_observations: usize,
}

impl JoinStats {
    pub fn match_pct(&self) -> f64 {
        pct(self.matched, self.buckets)
    }
}

/// Counters surfaced at the end of a preparation run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PrepareStats {
    pub timestamp: DateTime<Utc>,
    pub trips: usize,
    pub untimed_trips: usize,
    pub degenerate_trips: usize,
    pub groups: usize,
    pub joins: BTreeMap<String, JoinStats>,
    pub missing_trucks: usize,
    pub missing_drivers: usize,
    pub missing_routes: usize,
    pub midnight_trips: usize,
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_match_pct() {
        let stats = JoinStats {
            buckets: 8,
            matched: 6,
            unmatched: 2,
            duplicate_observations: 0,
        };
        assert_eq!(stats.match_pct(), 75.0);
    }

    #[test]
    fn test_load_report_totals() {
        let mut report = LoadReport::default();
        report.tables.insert(
            "traffic".into(),
            TableStats {
                coerced_dates: 2,
                coerced_numbers: 1,
                ..Default::default()
            },
        );
        report.tables.insert(
            "city_weather".into(),
            TableStats {
                coerced_dates: 3,
                ..Default::default()
            },
        );
        assert_eq!(report.total_coerced_dates(), 5);
        assert_eq!(report.total_coerced_numbers(), 1);
        assert!(report.table("routes").is_none());
    }
}
