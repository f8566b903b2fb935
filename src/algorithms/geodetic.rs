//! WGS84 geodetic <-> ECEF conversions
//!
//! Every conversion returns a new value in the target frame. Both directions
//! round-trip to well below a millimeter for terrestrial heights.

use crate::core::constants::{WGS84_ECCENTRICITY_SQUARED, WGS84_SEMI_MAJOR_AXIS};
use crate::core::types::{EcefPosition, GeoPosition};
use crate::validation::data::validate_geodetic;
use crate::validation::error::{GeoResult, GeolocationError};
use nalgebra::Matrix3;

/// Fixed-point iterations for the geodetic latitude
const MAX_LATITUDE_ITERATIONS: usize = 16;

/// Latitude convergence threshold (radians)
const LATITUDE_TOLERANCE: f64 = 1e-15;

/// Ellipsoid used for frame conversions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticFrame {
    /// Semi-major axis in meters
    pub semi_major_axis: f64,
    /// First eccentricity squared
    pub eccentricity_squared: f64,
}

impl Default for GeodeticFrame {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl GeodeticFrame {
    pub fn wgs84() -> Self {
        Self {
            semi_major_axis: WGS84_SEMI_MAJOR_AXIS,
            eccentricity_squared: WGS84_ECCENTRICITY_SQUARED,
        }
    }

    /// Radius of curvature in the prime vertical
    fn prime_vertical_radius(&self, lat_rad: f64) -> f64 {
        self.semi_major_axis / (1.0 - self.eccentricity_squared * lat_rad.sin().powi(2)).sqrt()
    }

    /// Convert geodetic latitude/longitude/height to ECEF
    pub fn to_ecef(&self, position: &GeoPosition) -> GeoResult<EcefPosition> {
        validate_geodetic(position)?;

        let lat_rad = position.latitude.to_radians();
        let lon_rad = position.longitude.to_radians();
        let height = position.altitude;
        let n = self.prime_vertical_radius(lat_rad);

        Ok(EcefPosition::new(
            (n + height) * lat_rad.cos() * lon_rad.cos(),
            (n + height) * lat_rad.cos() * lon_rad.sin(),
            (n * (1.0 - self.eccentricity_squared) + height) * lat_rad.sin(),
        ))
    }

    /// Convert ECEF to geodetic latitude/longitude/height
    pub fn to_geodetic(&self, ecef: &EcefPosition) -> GeoResult<GeoPosition> {
        for (field, value) in [("x", ecef.x), ("y", ecef.y), ("z", ecef.z)] {
            if !value.is_finite() {
                return Err(GeolocationError::InvalidCoordinate {
                    field: format!("ecef.{}", field),
                    value,
                });
            }
        }

        let p = ecef.x.hypot(ecef.y);
        if p == 0.0 && ecef.z == 0.0 {
            return Err(GeolocationError::InvalidCoordinate {
                field: "ecef".to_string(),
                value: 0.0,
            });
        }

        let e2 = self.eccentricity_squared;
        let longitude = ecef.y.atan2(ecef.x);

        let mut lat = ecef.z.atan2(p * (1.0 - e2));
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let sin_lat = lat.sin();
            let n = self.prime_vertical_radius(lat);
            let next = (ecef.z + e2 * n * sin_lat).atan2(p);
            let delta = (next - lat).abs();
            lat = next;
            if delta < LATITUDE_TOLERANCE {
                break;
            }
        }

        // Stable at every latitude, including the poles
        let n = self.prime_vertical_radius(lat);
        let height = p * lat.cos() + ecef.z * lat.sin() - self.semi_major_axis.powi(2) / n;

        Ok(GeoPosition {
            latitude: lat.to_degrees(),
            longitude: longitude.to_degrees(),
            altitude: height,
        })
    }

    /// Rotation mapping ECEF vectors into the local North-East-Down frame
    pub fn ecef_to_ned_rotation(&self, position: &GeoPosition) -> Matrix3<f64> {
        let (sin_lat, cos_lat) = position.latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = position.longitude.to_radians().sin_cos();

        Matrix3::new(
            -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
            -sin_lon, cos_lon, 0.0,
            -cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat,
        )
    }
}

/// WGS84 geodetic to ECEF
pub fn to_ecef(position: &GeoPosition) -> GeoResult<EcefPosition> {
    GeodeticFrame::wgs84().to_ecef(position)
}

/// ECEF to WGS84 geodetic
pub fn to_geodetic(ecef: &EcefPosition) -> GeoResult<GeoPosition> {
    GeodeticFrame::wgs84().to_geodetic(ecef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = to_ecef(&GeoPosition { latitude: 0.0, longitude: 0.0, altitude: 0.0 }).unwrap();
        assert_abs_diff_eq!(ecef.x, WGS84_SEMI_MAJOR_AXIS, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let pole = GeoPosition { latitude: 90.0, longitude: 0.0, altitude: 100.0 };
        let ecef = to_ecef(&pole).unwrap();
        let polar_radius = WGS84_SEMI_MAJOR_AXIS * (1.0 - crate::core::constants::WGS84_FLATTENING);
        assert_abs_diff_eq!(ecef.z, polar_radius + 100.0, epsilon = 1e-6);

        let back = to_geodetic(&ecef).unwrap();
        assert_abs_diff_eq!(back.latitude, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back.altitude, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            (49.099376103, 12.180945684, 452.318),
            (-33.8688, 151.2093, 58.0),
            (0.0, -179.999999, -50.0),
            (89.5, 45.0, 8848.0),
            (-89.9, -120.0, 10.0),
            (37.7749, -122.4194, 0.0),
        ];

        for (lat, lon, alt) in samples {
            let original = GeoPosition { latitude: lat, longitude: lon, altitude: alt };
            let back = to_geodetic(&to_ecef(&original).unwrap()).unwrap();
            assert_abs_diff_eq!(back.latitude, lat, epsilon = 1e-6);
            assert_abs_diff_eq!(back.longitude, lon, epsilon = 1e-6);
            assert_abs_diff_eq!(back.altitude, alt, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_twelve_digit_precision_survives() {
        // A 1e-9 degree step is ~0.1 mm on the ground and must not collapse
        let a = GeoPosition { latitude: 49.099376103, longitude: 12.180945684, altitude: 400.0 };
        let b = GeoPosition { latitude: 49.099376104, ..a };
        let distance = to_ecef(&a).unwrap().distance_to(&to_ecef(&b).unwrap());
        assert!(distance > 5e-5 && distance < 2e-4, "distance {}", distance);
    }

    #[test]
    fn test_invalid_input() {
        let bad = GeoPosition { latitude: 0.0, longitude: 181.0, altitude: 0.0 };
        assert!(matches!(to_ecef(&bad), Err(GeolocationError::InvalidCoordinate { .. })));
        assert!(to_geodetic(&EcefPosition::new(0.0, 0.0, 0.0)).is_err());
        assert!(to_geodetic(&EcefPosition::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_ned_rotation_is_orthonormal() {
        let frame = GeodeticFrame::wgs84();
        let position = GeoPosition { latitude: 49.1, longitude: 12.2, altitude: 400.0 };
        let r = frame.ecef_to_ned_rotation(&position);
        assert_abs_diff_eq!((r * r.transpose() - Matrix3::identity()).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);

        // Down points toward the ellipsoid interior
        let ecef = frame.to_ecef(&position).unwrap().to_vector();
        let down = r.row(2).transpose();
        assert!(down.dot(&ecef) < 0.0);
    }
}
