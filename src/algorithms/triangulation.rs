//! Two-view linear triangulation (DLT)
//!
//! Each observation contributes the rows `x * P3 - P1` and `y * P3 - P2` of a
//! homogeneous 4x4 system whose null vector is the world point. The system is
//! solved in a frame centered on the baseline and scaled by its length, since
//! raw ECEF coordinates leave the fourth column many orders of magnitude above
//! the others.

use crate::algorithms::camera::CameraModel;
use crate::algorithms::distortion::BrownConrady;
use crate::algorithms::geodetic::to_geodetic;
use crate::core::constants::DEFAULT_MAX_CONDITION_NUMBER;
use crate::core::types::{EcefPosition, TriangulatedPoint};
use crate::validation::error::{GeoResult, GeolocationError};
use log::debug;
use nalgebra::{Matrix3, Matrix3x4, Matrix4, RowVector4, Vector3};

/// Baselines below this are treated as a single viewpoint (m)
const MIN_BASELINE_M: f64 = 1e-6;

/// Two-view triangulator with a conditioning guard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulator {
    /// Largest accepted 1/sin(angle between viewing rays)
    pub max_condition_number: f64,
    /// Iterations used to invert lens distortion
    pub undistort_iterations: usize,
}

impl Default for Triangulator {
    fn default() -> Self {
        Self {
            max_condition_number: DEFAULT_MAX_CONDITION_NUMBER,
            undistort_iterations: 20,
        }
    }
}

/// Center and unit viewing direction recovered from a projection matrix
struct ViewingRay {
    origin: Vector3<f64>,
    direction: Vector3<f64>,
}

impl Triangulator {
    pub fn new(max_condition_number: f64, undistort_iterations: usize) -> Self {
        Self { max_condition_number, undistort_iterations }
    }

    /// Triangulate one pixel observed in two cameras
    pub fn triangulate_cameras(
        &self,
        first: &CameraModel,
        second: &CameraModel,
        pixel1: (f64, f64),
        pixel2: (f64, f64),
    ) -> GeoResult<TriangulatedPoint> {
        self.triangulate(
            first.projection(),
            second.projection(),
            first.intrinsics(),
            second.intrinsics(),
            first.distortion(),
            second.distortion(),
            pixel1,
            pixel2,
        )
    }

    /// Triangulate from raw projection matrices, intrinsics and distortion
    #[allow(clippy::too_many_arguments)]
    pub fn triangulate(
        &self,
        p1: &Matrix3x4<f64>,
        p2: &Matrix3x4<f64>,
        k1: &Matrix3<f64>,
        k2: &Matrix3<f64>,
        distortion1: &BrownConrady,
        distortion2: &BrownConrady,
        pixel1: (f64, f64),
        pixel2: (f64, f64),
    ) -> GeoResult<TriangulatedPoint> {
        let ideal1 = distortion1.undistort_pixel(k1, pixel1, self.undistort_iterations);
        let ideal2 = distortion2.undistort_pixel(k2, pixel2, self.undistort_iterations);

        let ray1 = viewing_ray(p1, ideal1)?;
        let ray2 = viewing_ray(p2, ideal2)?;

        let baseline = (ray1.origin - ray2.origin).norm();
        if baseline < MIN_BASELINE_M {
            return Err(GeolocationError::DegenerateGeometry {
                condition_number: f64::INFINITY,
                reason: format!("camera centers coincide (baseline {:.3e} m)", baseline),
            });
        }

        let sin_angle = ray1.direction.cross(&ray2.direction).norm();
        let condition_number = if sin_angle > 0.0 { 1.0 / sin_angle } else { f64::INFINITY };
        if !(condition_number <= self.max_condition_number) {
            return Err(GeolocationError::DegenerateGeometry {
                condition_number,
                reason: "viewing rays nearly parallel".to_string(),
            });
        }

        // Normalized world frame: X = scale * X' + origin
        let origin = (ray1.origin + ray2.origin) / 2.0;
        let scale = baseline / 2.0;
        let mut denormalize = Matrix4::identity() * scale;
        denormalize[(3, 3)] = 1.0;
        denormalize.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin);

        let n1 = p1 * denormalize;
        let n2 = p2 * denormalize;

        let rows = [
            n1.row(2) * ideal1.0 - n1.row(0),
            n1.row(2) * ideal1.1 - n1.row(1),
            n2.row(2) * ideal2.0 - n2.row(0),
            n2.row(2) * ideal2.1 - n2.row(1),
        ]
        .map(|row: RowVector4<f64>| {
            let norm = row.norm();
            if norm > 0.0 { row / norm } else { row }
        });
        let a = Matrix4::from_rows(&rows);

        let svd = a.try_svd(false, true, f64::EPSILON, 0).ok_or_else(|| {
            GeolocationError::DegenerateGeometry {
                condition_number,
                reason: "singular value decomposition did not converge".to_string(),
            }
        })?;
        let v_t = svd.v_t.ok_or_else(|| GeolocationError::DegenerateGeometry {
            condition_number,
            reason: "missing right singular vectors".to_string(),
        })?;

        let smallest = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(3);
        let homogeneous = v_t.row(smallest).transpose();

        let w = homogeneous[3];
        if w.abs() < f64::EPSILON * homogeneous.norm() {
            return Err(GeolocationError::DegenerateGeometry {
                condition_number,
                reason: "solution lies at infinity".to_string(),
            });
        }

        let normalized = homogeneous.fixed_rows::<3>(0) / w;
        let world = normalized * scale + origin;
        debug!(
            "Triangulated ({:.3}, {:.3}, {:.3}) with condition number {:.2}",
            world.x, world.y, world.z, condition_number
        );

        let ecef = EcefPosition::from_vector(&world);
        Ok(TriangulatedPoint {
            geodetic: to_geodetic(&ecef)?,
            ecef,
        })
    }
}

/// Back-project an ideal pixel through P = [M | p4]
fn viewing_ray(p: &Matrix3x4<f64>, pixel: (f64, f64)) -> GeoResult<ViewingRay> {
    let m: Matrix3<f64> = p.fixed_view::<3, 3>(0, 0).into_owned();
    let m_inv = m.try_inverse().ok_or_else(|| GeolocationError::InvalidCameraModel {
        reason: "projection matrix has a singular left 3x3 block".to_string(),
    })?;

    let origin = -(m_inv * p.column(3));
    let direction = m_inv * Vector3::new(pixel.0, pixel.1, 1.0);
    let norm = direction.norm();
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(GeolocationError::InvalidCameraModel {
            reason: "viewing ray has no direction".to_string(),
        });
    }

    Ok(ViewingRay { origin, direction: direction / norm })
}
