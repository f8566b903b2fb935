//! Core data types for the geolocation pipeline

use crate::validation::error::{GeoResult, GeolocationError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Reference frame a position is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// WGS84 ellipsoidal latitude/longitude/height
    Wgs84,
    /// Earth-centered, earth-fixed cartesian
    Ecef,
}

/// Geodetic position on the WGS84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Height above the ellipsoid in meters
    pub altitude: f64,
}

impl GeoPosition {
    /// Create a validated geodetic position
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> GeoResult<Self> {
        let position = Self { latitude, longitude, altitude };
        crate::validation::data::validate_geodetic(&position)?;
        Ok(position)
    }

    pub fn frame(&self) -> ReferenceFrame {
        ReferenceFrame::Wgs84
    }
}

/// Cartesian position in the ECEF frame (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcefPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EcefPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Straight-line distance to another ECEF position
    pub fn distance_to(&self, other: &EcefPosition) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn frame(&self) -> ReferenceFrame {
        ReferenceFrame::Ecef
    }
}

/// Axis-aligned pixel box `[x_min, y_min, x_max, y_max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Pixel area; inverted boxes count as empty
    pub fn area(&self) -> f64 {
        (self.x_max - self.x_min).max(0.0) * (self.y_max - self.y_min).max(0.0)
    }

    pub fn top_left(&self) -> (f64, f64) {
        (self.x_min, self.y_min)
    }

    pub fn bottom_right(&self) -> (f64, f64) {
        (self.x_max, self.y_max)
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite() && self.y_min.is_finite() && self.x_max.is_finite() && self.y_max.is_finite()
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(b: [f64; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// One detector output box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> GeoResult<Self> {
        let detection = Self { bbox, confidence };
        crate::validation::data::validate_detection(&detection)?;
        Ok(detection)
    }
}

/// Per-photograph camera telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraTelemetry {
    /// Camera position (absolute altitude)
    pub position: GeoPosition,
    /// Altitude above the take-off point, when reported
    pub relative_altitude: Option<f64>,
    /// Gimbal yaw in degrees
    pub yaw: f64,
    /// Gimbal pitch in degrees
    pub pitch: f64,
    /// Gimbal roll in degrees
    pub roll: f64,
    /// Lens focal length in millimeters
    pub focal_length_mm: f64,
    pub image_width: u32,
    pub image_height: u32,
}

/// Detections of one photograph together with its telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObservation {
    pub image_path: String,
    pub detections: Vec<Detection>,
    pub telemetry: CameraTelemetry,
}

impl ImageObservation {
    pub fn count(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Mean detector confidence, 0 for an empty set
    pub fn mean_confidence(&self) -> f64 {
        if self.detections.is_empty() {
            return 0.0;
        }
        self.detections.iter().map(|d| d.confidence).sum::<f64>() / self.detections.len() as f64
    }

    /// Mean box area in square pixels, 0 for an empty set
    pub fn mean_box_area(&self) -> f64 {
        if self.detections.is_empty() {
            return 0.0;
        }
        self.detections.iter().map(|d| d.bbox.area()).sum::<f64>() / self.detections.len() as f64
    }

    /// Box enclosing every detection of the image
    pub fn overall_box(&self) -> Option<BoundingBox> {
        let mut boxes = self.detections.iter().map(|d| d.bbox);
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }
}

/// Triangulated world point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedPoint {
    pub ecef: EcefPosition,
    pub geodetic: GeoPosition,
}

/// Single inspection waypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Ordered inspection waypoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub waypoints: Vec<Waypoint>,
}

impl FlightPlan {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Waypoints as `(latitude, longitude, altitude)` triples
    pub fn to_triples(&self) -> Vec<(f64, f64, f64)> {
        self.waypoints
            .iter()
            .map(|w| (w.latitude, w.longitude, w.altitude))
            .collect()
    }
}

/// Validation shorthand used by constructors
pub(crate) fn invalid_detection(reason: impl Into<String>) -> GeolocationError {
    GeolocationError::InvalidDetection { reason: reason.into() }
}
