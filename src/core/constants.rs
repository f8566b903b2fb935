//! Physical constants and system parameters

/// WGS84 semi-major axis (m)
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// WGS84 first eccentricity squared
pub const WGS84_ECCENTRICITY_SQUARED: f64 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);

/// Calibrated focal length of the survey camera (px)
pub const CALIBRATED_FOCAL_LENGTH_PX: f64 = 2804.051;

/// Calibrated principal point (px)
pub const CALIBRATED_CX_PX: f64 = 2010.41;
pub const CALIBRATED_CY_PX: f64 = 1512.734;

/// Calibrated Brown-Conrady coefficients in `[k1, k2, p1, p2, k3]` order
pub const CALIBRATED_DISTORTION: [f64; 5] = [
    0.116413456,
    -0.202624237,
    0.136982457,
    0.000004293,
    -0.000216595,
];

/// Reciprocal rank fusion smoothing constant
pub const DEFAULT_RRF_K: f64 = 60.0;

/// Camera-to-camera distance window for candidate pairs (m)
pub const DEFAULT_MIN_PAIR_DISTANCE_M: f64 = 0.0;
pub const DEFAULT_MAX_PAIR_DISTANCE_M: f64 = 10.0;

/// Largest accepted 1/sin(ray angle) before triangulation is refused
pub const DEFAULT_MAX_CONDITION_NUMBER: f64 = 1.0e4;

/// Distance kept between the inspection path and the target plane (m)
pub const DEFAULT_STANDOFF_DISTANCE_M: f64 = 3.0;

/// Altitude dropped after each inspection row (m)
pub const DEFAULT_DESCEND_STEP_M: f64 = 1.5;

/// Significant digits retained when parsing decimal-degree strings
pub const DEFAULT_COORDINATE_PRECISION: usize = 12;
