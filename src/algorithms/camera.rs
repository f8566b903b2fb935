//! Calibrated pinhole camera built from per-photograph telemetry
//!
//! The camera center comes from the GPS fix. Orientation is assembled in two
//! steps: ECEF to the local North-East-Down frame at the camera, then the
//! gimbal yaw/pitch/roll from NED into the camera frame. Gimbal angles are
//! relative to the local horizon, so the first step cannot be skipped.

use crate::algorithms::distortion::BrownConrady;
use crate::algorithms::geodetic::GeodeticFrame;
use crate::core::constants::{CALIBRATED_CX_PX, CALIBRATED_CY_PX, CALIBRATED_FOCAL_LENGTH_PX};
use crate::core::types::{CameraTelemetry, EcefPosition};
use crate::validation::data::validate_telemetry;
use crate::validation::error::{GeoResult, GeolocationError};
use nalgebra::{Matrix3, Matrix3x4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Smallest physical sensor dimension accepted (mm)
const MIN_SENSOR_DIMENSION_MM: f64 = 1e-6;

/// Tolerance on the orthonormality of R
const ROTATION_TOLERANCE: f64 = 1e-9;

/// Where the intrinsic matrix comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntrinsicsSource {
    /// Fixed calibration, stable across a flight
    Calibrated { fx: f64, fy: f64, cx: f64, cy: f64 },
    /// Focal length in pixels derived from the lens focal length and the
    /// physical sensor size, principal point at the image center
    FromTelemetry { sensor_width_mm: f64, sensor_height_mm: f64 },
}

impl Default for IntrinsicsSource {
    fn default() -> Self {
        IntrinsicsSource::Calibrated {
            fx: CALIBRATED_FOCAL_LENGTH_PX,
            fy: CALIBRATED_FOCAL_LENGTH_PX,
            cx: CALIBRATED_CX_PX,
            cy: CALIBRATED_CY_PX,
        }
    }
}

impl IntrinsicsSource {
    /// Build K for one photograph
    pub fn intrinsic_matrix(&self, telemetry: &CameraTelemetry) -> GeoResult<Matrix3<f64>> {
        let (fx, fy, cx, cy) = match *self {
            IntrinsicsSource::Calibrated { fx, fy, cx, cy } => (fx, fy, cx, cy),
            IntrinsicsSource::FromTelemetry { sensor_width_mm, sensor_height_mm } => {
                if !(sensor_width_mm > MIN_SENSOR_DIMENSION_MM && sensor_height_mm > MIN_SENSOR_DIMENSION_MM) {
                    return Err(GeolocationError::InvalidCameraModel {
                        reason: format!(
                            "sensor dimensions {}x{} mm are too small",
                            sensor_width_mm, sensor_height_mm
                        ),
                    });
                }
                if !(telemetry.focal_length_mm > 0.0 && telemetry.focal_length_mm.is_finite()) {
                    return Err(GeolocationError::InvalidCameraModel {
                        reason: format!("focal length {} mm is not positive", telemetry.focal_length_mm),
                    });
                }

                let width = telemetry.image_width as f64;
                let height = telemetry.image_height as f64;
                (
                    telemetry.focal_length_mm * width / sensor_width_mm,
                    telemetry.focal_length_mm * height / sensor_height_mm,
                    width / 2.0,
                    height / 2.0,
                )
            }
        };

        Ok(Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0))
    }
}

/// Projection model of a single photograph
#[derive(Debug, Clone, PartialEq)]
pub struct CameraModel {
    intrinsics: Matrix3<f64>,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    center: EcefPosition,
    projection: Matrix3x4<f64>,
    distortion: BrownConrady,
}

impl CameraModel {
    /// Build the camera of a photograph from its telemetry
    pub fn from_telemetry(
        telemetry: &CameraTelemetry,
        intrinsics: &IntrinsicsSource,
        distortion: BrownConrady,
    ) -> GeoResult<Self> {
        validate_telemetry(telemetry)?;

        let frame = GeodeticFrame::wgs84();
        let k = intrinsics.intrinsic_matrix(telemetry)?;
        let center = frame.to_ecef(&telemetry.position)?;

        let ecef_to_ned = frame.ecef_to_ned_rotation(&telemetry.position);
        let ned_to_camera = gimbal_rotation(telemetry.yaw, telemetry.pitch, telemetry.roll);

        Self::from_parts(k, ned_to_camera * ecef_to_ned, center, distortion)
    }

    /// Assemble a camera from intrinsics, a world-to-camera rotation and the
    /// camera center
    pub fn from_parts(
        intrinsics: Matrix3<f64>,
        rotation: Matrix3<f64>,
        center: EcefPosition,
        distortion: BrownConrady,
    ) -> GeoResult<Self> {
        validate_intrinsics(&intrinsics)?;
        validate_rotation(&rotation)?;

        let translation = -(rotation * center.to_vector());

        let mut extrinsics = Matrix3x4::zeros();
        extrinsics.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        extrinsics.set_column(3, &translation);

        Ok(Self {
            intrinsics,
            rotation,
            translation,
            center,
            projection: intrinsics * extrinsics,
            distortion,
        })
    }

    pub fn intrinsics(&self) -> &Matrix3<f64> {
        &self.intrinsics
    }

    /// World (ECEF) to camera rotation
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn center(&self) -> &EcefPosition {
        &self.center
    }

    /// P = K [R | t]
    pub fn projection(&self) -> &Matrix3x4<f64> {
        &self.projection
    }

    pub fn distortion(&self) -> &BrownConrady {
        &self.distortion
    }

    /// Ideal pinhole projection of an ECEF point; `None` behind the camera
    pub fn project(&self, point: &EcefPosition) -> Option<(f64, f64)> {
        let camera = self.rotation * point.to_vector() + self.translation;
        if camera.z <= 0.0 {
            return None;
        }
        let pixel = self.intrinsics * camera;
        Some((pixel.x / pixel.z, pixel.y / pixel.z))
    }

    /// Map an observed pixel onto the ideal pinhole image
    pub fn undistort(&self, pixel: (f64, f64), max_iterations: usize) -> (f64, f64) {
        self.distortion.undistort_pixel(&self.intrinsics, pixel, max_iterations)
    }
}

/// NED-to-camera rotation from gimbal angles in degrees, composed as the
/// intrinsic sequence yaw (z), pitch (y), roll (x)
pub fn gimbal_rotation(yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Matrix3<f64> {
    Rotation3::from_euler_angles(roll_deg.to_radians(), pitch_deg.to_radians(), yaw_deg.to_radians())
        .into_inner()
}

fn validate_intrinsics(k: &Matrix3<f64>) -> GeoResult<()> {
    if !k.iter().all(|v| v.is_finite()) {
        return Err(GeolocationError::InvalidCameraModel {
            reason: "intrinsic matrix has non-finite entries".to_string(),
        });
    }
    if k[(0, 0)] <= 0.0 || k[(1, 1)] <= 0.0 {
        return Err(GeolocationError::InvalidCameraModel {
            reason: format!("focal terms fx={} fy={} must be positive", k[(0, 0)], k[(1, 1)]),
        });
    }
    Ok(())
}

fn validate_rotation(r: &Matrix3<f64>) -> GeoResult<()> {
    let orthogonality = (r * r.transpose() - Matrix3::identity()).norm();
    let det = r.determinant();
    if !(orthogonality < ROTATION_TOLERANCE) || !((det - 1.0).abs() < ROTATION_TOLERANCE) {
        return Err(GeolocationError::InvalidCameraModel {
            reason: format!("rotation is not proper orthonormal (det {:.6})", det),
        });
    }
    Ok(())
}
