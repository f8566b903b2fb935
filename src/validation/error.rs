//! Error classification for the geolocation pipeline
//!
//! Geometric and numeric failures are scoped to a single image pair, metadata
//! failures to a single image. Neither aborts a batch on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used throughout the crate
pub type GeoResult<T> = Result<T, GeolocationError>;

/// Errors raised by the geolocation core
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GeolocationError {
    /// Latitude/longitude outside the valid range or not finite
    #[error("Invalid coordinate {field}: {value}")]
    InvalidCoordinate { field: String, value: f64 },

    /// Degenerate intrinsics or orientation
    #[error("Invalid camera model: {reason}")]
    InvalidCameraModel { reason: String },

    /// A required telemetry tag is absent from every probed namespace
    #[error("Missing metadata tag '{tag}' in {image}")]
    MissingMetadata { image: String, tag: String },

    /// A telemetry tag is present but cannot be parsed
    #[error("Invalid metadata tag '{tag}': '{value}'")]
    InvalidMetadata { tag: String, value: String },

    /// Viewing rays too close to parallel, or a plane that cannot be built
    #[error("Degenerate geometry: {reason} (condition number {condition_number:.3e})")]
    DegenerateGeometry { condition_number: f64, reason: String },

    /// Detection with a confidence outside [0, 1] or a non-finite box
    #[error("Invalid detection: {reason}")]
    InvalidDetection { reason: String },

    /// Caller-supplied parameter out of range
    #[error("Invalid parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },
}

impl GeolocationError {
    /// Whether the error only invalidates one image pair
    pub fn is_pair_scoped(&self) -> bool {
        matches!(
            self,
            GeolocationError::InvalidCameraModel { .. } | GeolocationError::DegenerateGeometry { .. }
        )
    }

    /// Whether the error makes an image unusable
    pub fn is_image_scoped(&self) -> bool {
        matches!(
            self,
            GeolocationError::MissingMetadata { .. } | GeolocationError::InvalidMetadata { .. }
        )
    }
}

/// Failure of a single candidate pair during a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub pair_id: usize,
    pub images: (String, String),
    pub error: GeolocationError,
}

/// Failure of a single image while collecting observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFailure {
    pub image_path: String,
    pub error: GeolocationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GeolocationError::MissingMetadata {
            image: "DJI_0053.jpeg".to_string(),
            tag: "drone-dji:GpsLatitude".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing metadata tag 'drone-dji:GpsLatitude' in DJI_0053.jpeg"
        );

        let error = GeolocationError::DegenerateGeometry {
            condition_number: 25000.0,
            reason: "viewing rays nearly parallel".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Degenerate geometry: viewing rays nearly parallel (condition number 2.500e4)"
        );
    }

    #[test]
    fn test_error_scope() {
        let geometry = GeolocationError::DegenerateGeometry {
            condition_number: f64::INFINITY,
            reason: "parallel".to_string(),
        };
        assert!(geometry.is_pair_scoped());
        assert!(!geometry.is_image_scoped());

        let metadata = GeolocationError::MissingMetadata {
            image: "a.jpeg".to_string(),
            tag: "exif:FocalLength".to_string(),
        };
        assert!(metadata.is_image_scoped());
        assert!(!metadata.is_pair_scoped());
    }

    #[test]
    fn test_pair_failure_serializes() {
        let failure = PairFailure {
            pair_id: 3,
            images: ("a.jpeg".to_string(), "b.jpeg".to_string()),
            error: GeolocationError::InvalidCameraModel {
                reason: "zero focal length".to_string(),
            },
        };
        let json = serde_json::to_string(&failure).unwrap();
        let back: PairFailure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, failure);
    }
}
