//! Input validation for positions, detections and telemetry

use crate::core::types::{invalid_detection, CameraTelemetry, Detection, GeoPosition};
use crate::validation::error::{GeoResult, GeolocationError};

/// Validate WGS84 geodetic coordinates
pub fn validate_geodetic(position: &GeoPosition) -> GeoResult<()> {
    if !position.latitude.is_finite() || position.latitude < -90.0 || position.latitude > 90.0 {
        return Err(GeolocationError::InvalidCoordinate {
            field: "latitude".to_string(),
            value: position.latitude,
        });
    }

    if !position.longitude.is_finite() || position.longitude < -180.0 || position.longitude > 180.0 {
        return Err(GeolocationError::InvalidCoordinate {
            field: "longitude".to_string(),
            value: position.longitude,
        });
    }

    if !position.altitude.is_finite() {
        return Err(GeolocationError::InvalidCoordinate {
            field: "altitude".to_string(),
            value: position.altitude,
        });
    }

    Ok(())
}

/// Validate a detector box and its confidence
pub fn validate_detection(detection: &Detection) -> GeoResult<()> {
    if !detection.bbox.is_finite() {
        return Err(invalid_detection("bounding box has non-finite corners"));
    }

    if !(0.0..=1.0).contains(&detection.confidence) {
        return Err(invalid_detection(format!(
            "confidence {} outside [0, 1]",
            detection.confidence
        )));
    }

    Ok(())
}

/// Validate telemetry fields that do not depend on the intrinsics source
pub fn validate_telemetry(telemetry: &CameraTelemetry) -> GeoResult<()> {
    validate_geodetic(&telemetry.position)?;

    for (field, value) in [
        ("yaw", telemetry.yaw),
        ("pitch", telemetry.pitch),
        ("roll", telemetry.roll),
    ] {
        if !value.is_finite() {
            return Err(GeolocationError::InvalidCameraModel {
                reason: format!("gimbal {} is not finite", field),
            });
        }
    }

    if telemetry.image_width == 0 || telemetry.image_height == 0 {
        return Err(GeolocationError::InvalidCameraModel {
            reason: format!(
                "image dimensions {}x{} are empty",
                telemetry.image_width, telemetry.image_height
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BoundingBox;

    #[test]
    fn test_coordinate_validation() {
        let valid = GeoPosition { latitude: 49.099376103, longitude: 12.180945684, altitude: 420.0 };
        assert!(validate_geodetic(&valid).is_ok());

        let bad_lat = GeoPosition { latitude: -90.5, ..valid };
        assert!(matches!(
            validate_geodetic(&bad_lat),
            Err(GeolocationError::InvalidCoordinate { ref field, .. }) if field == "latitude"
        ));

        let bad_lon = GeoPosition { longitude: 180.01, ..valid };
        assert!(matches!(
            validate_geodetic(&bad_lon),
            Err(GeolocationError::InvalidCoordinate { ref field, .. }) if field == "longitude"
        ));

        let nan = GeoPosition { latitude: f64::NAN, ..valid };
        assert!(validate_geodetic(&nan).is_err());

        let edges = GeoPosition { latitude: 90.0, longitude: -180.0, altitude: 0.0 };
        assert!(validate_geodetic(&edges).is_ok());
    }

    #[test]
    fn test_detection_validation() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(Detection::new(bbox, 1.0).is_ok());
        assert!(Detection::new(bbox, 0.0).is_ok());
        assert!(Detection::new(bbox, 1.2).is_err());
        assert!(Detection::new(bbox, f64::NAN).is_err());
        assert!(Detection::new(BoundingBox::new(0.0, f64::INFINITY, 1.0, 1.0), 0.5).is_err());
    }

    #[test]
    fn test_telemetry_validation() {
        let mut telemetry = CameraTelemetry {
            position: GeoPosition { latitude: 49.0, longitude: 12.0, altitude: 400.0 },
            relative_altitude: Some(30.0),
            yaw: 10.0,
            pitch: -30.0,
            roll: 0.0,
            focal_length_mm: 24.0,
            image_width: 4032,
            image_height: 3024,
        };
        assert!(validate_telemetry(&telemetry).is_ok());

        telemetry.image_height = 0;
        assert!(matches!(
            validate_telemetry(&telemetry),
            Err(GeolocationError::InvalidCameraModel { .. })
        ));
    }
}
