//! Flight plan output formatting
//!
//! JSON for downstream tooling and CSV for quick inspection. Vendor mission
//! formats are produced outside this crate from either of these.

use crate::core::types::{FlightPlan, Waypoint};
use serde::{Deserialize, Serialize};

/// Waypoint with its position in the flight order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexedWaypoint {
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl IndexedWaypoint {
    fn from_waypoint(index: usize, waypoint: &Waypoint) -> Self {
        Self {
            index,
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            altitude: waypoint.altitude,
        }
    }
}

/// Flight plan as an ordered list of indexed waypoints
pub fn indexed_waypoints(plan: &FlightPlan) -> Vec<IndexedWaypoint> {
    plan.iter()
        .enumerate()
        .map(|(index, waypoint)| IndexedWaypoint::from_waypoint(index, waypoint))
        .collect()
}

/// Renders a flight plan as text
pub trait WaypointFormatter {
    fn format_plan(&self, plan: &FlightPlan) -> Result<String, serde_json::Error>;
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    /// Pretty print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Serialize any report-like value with the same settings
    pub fn format_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

impl WaypointFormatter for JsonFormatter {
    fn format_plan(&self, plan: &FlightPlan) -> Result<String, serde_json::Error> {
        self.format_json(&indexed_waypoints(plan))
    }
}

/// CSV formatter, one waypoint per row
#[derive(Debug, Clone, Copy)]
pub struct CsvFormatter {
    /// Include header row
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &'static str {
        "index,latitude,longitude,altitude"
    }

    pub fn format_row(&self, waypoint: &IndexedWaypoint) -> String {
        format!(
            "{},{:.9},{:.9},{:.3}",
            waypoint.index, waypoint.latitude, waypoint.longitude, waypoint.altitude
        )
    }

    pub fn format_csv(&self, plan: &FlightPlan) -> String {
        let mut output = String::new();
        if self.include_header {
            output.push_str(self.header());
            output.push('\n');
        }
        for waypoint in indexed_waypoints(plan) {
            output.push_str(&self.format_row(&waypoint));
            output.push('\n');
        }
        output
    }
}

impl WaypointFormatter for CsvFormatter {
    fn format_plan(&self, plan: &FlightPlan) -> Result<String, serde_json::Error> {
        Ok(self.format_csv(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> FlightPlan {
        FlightPlan {
            waypoints: vec![
                Waypoint { latitude: 49.0990, longitude: 12.1809, altitude: 10.0 },
                Waypoint { latitude: 49.0991, longitude: 12.1810, altitude: 10.0 },
                Waypoint { latitude: 49.0991, longitude: 12.1810, altitude: 8.5 },
            ],
        }
    }

    #[test]
    fn test_csv_output() {
        let csv = CsvFormatter::new().format_csv(&plan());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "index,latitude,longitude,altitude");
        assert_eq!(lines[1], "0,49.099000000,12.180900000,10.000");
        assert_eq!(lines[3], "2,49.099100000,12.181000000,8.500");
    }

    #[test]
    fn test_csv_without_header() {
        let formatter = CsvFormatter { include_header: false };
        let csv = formatter.format_plan(&FlightPlan::default()).unwrap();
        assert!(csv.is_empty());
    }

    #[test]
    fn test_json_output_is_indexed() {
        let json = JsonFormatter::new().format_plan(&plan()).unwrap();
        let parsed: Vec<IndexedWaypoint> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2].index, 2);
        assert_eq!(parsed[2].altitude, 8.5);
        assert!(!json.contains('\n'));

        let pretty = JsonFormatter::pretty().format_plan(&plan()).unwrap();
        assert!(pretty.contains('\n'));
    }
}
