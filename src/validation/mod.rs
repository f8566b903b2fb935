//! Error taxonomy and input validation

pub mod data;
pub mod error;

pub use data::{validate_detection, validate_geodetic, validate_telemetry};
pub use error::{GeoResult, GeolocationError, ImageFailure, PairFailure};
