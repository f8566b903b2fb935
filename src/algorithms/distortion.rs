//! Brown-Conrady lens distortion
//!
//! Coefficients follow the common five-term `[k1, k2, p1, p2, k3]` ordering.
//! Undistortion remaps a pixel into the ideal pinhole image of the same
//! intrinsic matrix.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Update size below which the inverse iteration stops (normalized units)
const UNDISTORT_EPSILON: f64 = 1e-12;

/// Radial and tangential distortion coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 5]", into = "[f64; 5]")]
pub struct BrownConrady {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl From<[f64; 5]> for BrownConrady {
    fn from(c: [f64; 5]) -> Self {
        Self { k1: c[0], k2: c[1], p1: c[2], p2: c[3], k3: c[4] }
    }
}

impl From<BrownConrady> for [f64; 5] {
    fn from(d: BrownConrady) -> Self {
        [d.k1, d.k2, d.p1, d.p2, d.k3]
    }
}

impl Default for BrownConrady {
    fn default() -> Self {
        Self::none()
    }
}

impl BrownConrady {
    /// Identity model
    pub fn none() -> Self {
        Self { k1: 0.0, k2: 0.0, p1: 0.0, p2: 0.0, k3: 0.0 }
    }

    pub fn has_distortion(&self) -> bool {
        self.k1 != 0.0 || self.k2 != 0.0 || self.p1 != 0.0 || self.p2 != 0.0 || self.k3 != 0.0
    }

    /// Distort a normalized image point
    fn distort_normalized(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + dx, y * radial + dy)
    }

    /// Apply distortion to an ideal pixel
    pub fn distort_pixel(&self, k: &Matrix3<f64>, pixel: (f64, f64)) -> (f64, f64) {
        let (fx, fy, cx, cy) = (k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)]);
        let (xd, yd) = self.distort_normalized((pixel.0 - cx) / fx, (pixel.1 - cy) / fy);
        (fx * xd + cx, fy * yd + cy)
    }

    /// Remove distortion from an observed pixel, re-projecting through `k`
    pub fn undistort_pixel(&self, k: &Matrix3<f64>, pixel: (f64, f64), max_iterations: usize) -> (f64, f64) {
        if !self.has_distortion() {
            return pixel;
        }

        let (fx, fy, cx, cy) = (k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)]);
        let x0 = (pixel.0 - cx) / fx;
        let y0 = (pixel.1 - cy) / fy;

        let (mut x, mut y) = (x0, y0);
        for _ in 0..max_iterations {
            let r2 = x * x + y * y;
            let inv_radial = 1.0 / (1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3)));
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

            let nx = (x0 - dx) * inv_radial;
            let ny = (y0 - dy) * inv_radial;
            let step = (nx - x).abs().max((ny - y).abs());
            x = nx;
            y = ny;
            if step < UNDISTORT_EPSILON {
                break;
            }
        }

        (fx * x + cx, fy * y + cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn intrinsics() -> Matrix3<f64> {
        Matrix3::new(2804.051, 0.0, 2010.41, 0.0, 2804.051, 1512.734, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_identity_model() {
        let model = BrownConrady::none();
        assert!(!model.has_distortion());
        assert_eq!(model.undistort_pixel(&intrinsics(), (123.0, 456.0), 20), (123.0, 456.0));
    }

    #[test]
    fn test_undistort_inverts_distort() {
        let model = BrownConrady { k1: 0.1, k2: -0.05, p1: 0.001, p2: -0.0005, k3: 0.01 };
        let k = intrinsics();
        for pixel in [(2010.41, 1512.734), (1500.0, 1200.0), (2600.0, 2000.0), (900.0, 700.0)] {
            let distorted = model.distort_pixel(&k, pixel);
            let recovered = model.undistort_pixel(&k, distorted, 50);
            assert_abs_diff_eq!(recovered.0, pixel.0, epsilon = 1e-6);
            assert_abs_diff_eq!(recovered.1, pixel.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_principal_point_is_fixed() {
        let model = BrownConrady::from(crate::core::constants::CALIBRATED_DISTORTION);
        let k = intrinsics();
        let out = model.undistort_pixel(&k, (2010.41, 1512.734), 20);
        assert_abs_diff_eq!(out.0, 2010.41, epsilon = 1e-9);
        assert_abs_diff_eq!(out.1, 1512.734, epsilon = 1e-9);
    }

    #[test]
    fn test_coefficient_order() {
        let model = BrownConrady::from([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!((model.k1, model.k2, model.p1, model.p2, model.k3), (1.0, 2.0, 3.0, 4.0, 5.0));
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0]");
    }
}
