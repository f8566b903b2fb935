//! Drone Object Geolocation
//!
//! Locates a detected object from two drone photographs by triangulation and
//! plans a close-range inspection path in front of it.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{BoundingBox, CameraTelemetry, Detection, EcefPosition, FlightPlan, GeoPosition, ImageObservation, TriangulatedPoint, Waypoint};
pub use algorithms::camera::{CameraModel, IntrinsicsSource};
pub use algorithms::distortion::BrownConrady;
pub use algorithms::flight_plan::{generate_plan, FlightPlanner};
pub use algorithms::geodetic::{to_ecef, to_geodetic, GeodeticFrame};
pub use algorithms::triangulation::Triangulator;
pub use processing::pipeline::{collect_observations, GeolocationPipeline, GeolocationReport, TargetRegion};
pub use processing::telemetry::{TagMapTelemetryReader, TelemetryReader};
pub use validation::error::{GeoResult, GeolocationError, ImageFailure, PairFailure};
pub use utils::config::{ConfigError, PipelineConfig};
pub use api::{CsvFormatter, InputDocument, JsonFormatter, ObjectDetector, PrecomputedDetections, WaypointFormatter};
