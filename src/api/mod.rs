//! Collaborator contracts, input documents and output formatting

pub mod formatting;
pub mod types;

pub use formatting::{CsvFormatter, IndexedWaypoint, JsonFormatter, WaypointFormatter};
pub use types::{ImageInput, InputDocument, ObjectDetector, PrecomputedDetections};
