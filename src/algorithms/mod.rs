//! Geometry: coordinate frames, camera model, triangulation, path planning

pub mod geodetic;
pub mod distortion;
pub mod camera;
pub mod triangulation;
pub mod flight_plan;

pub use camera::{CameraModel, IntrinsicsSource};
pub use distortion::BrownConrady;
pub use flight_plan::{FlightPlanner, TargetQuad};
pub use geodetic::GeodeticFrame;
pub use triangulation::Triangulator;
