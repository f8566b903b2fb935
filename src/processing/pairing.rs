//! Candidate image pairs for two-view geolocation
//!
//! Two cheap filters run in sequence: equal (or nearly equal) detection counts,
//! then a camera-to-camera distance window. The distance is measured between
//! the telemetry camera positions. It stands in for the distance between the
//! photographed objects, which is unknown at this stage.

use crate::algorithms::geodetic::to_ecef;
use crate::core::constants::{DEFAULT_MAX_PAIR_DISTANCE_M, DEFAULT_MIN_PAIR_DISTANCE_M};
use crate::core::types::{EcefPosition, ImageObservation};
use crate::validation::error::{GeoResult, GeolocationError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Unordered pair of detection sets with the metrics used for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePair {
    /// Stable id, assigned in creation order
    pub id: usize,
    /// Index of the first observation in the selector input
    pub first: usize,
    /// Index of the second observation in the selector input
    pub second: usize,
    pub first_image: String,
    pub second_image: String,
    /// Absolute difference of the detection counts
    pub count_difference: usize,
    /// Distance between the two camera positions (m)
    pub camera_distance_m: f64,
    /// Mean of the two per-image mean confidences
    pub average_confidence: f64,
    /// Sum of the two per-image mean box areas (px^2)
    pub combined_box_area: f64,
}

/// Pair generation and filtering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSelector {
    count_tolerance: usize,
    min_distance_m: f64,
    max_distance_m: f64,
}

impl Default for PairSelector {
    fn default() -> Self {
        Self {
            count_tolerance: 0,
            min_distance_m: DEFAULT_MIN_PAIR_DISTANCE_M,
            max_distance_m: DEFAULT_MAX_PAIR_DISTANCE_M,
        }
    }
}

impl PairSelector {
    pub fn new(count_tolerance: usize, min_distance_m: f64, max_distance_m: f64) -> GeoResult<Self> {
        if !(min_distance_m >= 0.0 && min_distance_m.is_finite()) {
            return Err(GeolocationError::InvalidParameter {
                parameter: "min_distance_m".to_string(),
                reason: format!("{} must be a non-negative distance", min_distance_m),
            });
        }
        if !(max_distance_m >= min_distance_m) || max_distance_m.is_nan() {
            return Err(GeolocationError::InvalidParameter {
                parameter: "max_distance_m".to_string(),
                reason: format!("{} is below min_distance_m {}", max_distance_m, min_distance_m),
            });
        }

        Ok(Self { count_tolerance, min_distance_m, max_distance_m })
    }

    pub fn count_tolerance(&self) -> usize {
        self.count_tolerance
    }

    pub fn distance_window(&self) -> (f64, f64) {
        (self.min_distance_m, self.max_distance_m)
    }

    /// Build every surviving pair; an empty result is valid
    pub fn select(&self, observations: &[ImageObservation]) -> Vec<ImagePair> {
        let candidates: Vec<(usize, EcefPosition)> = observations
            .iter()
            .enumerate()
            .filter(|(_, obs)| !obs.is_empty())
            .filter_map(|(index, obs)| match to_ecef(&obs.telemetry.position) {
                Ok(ecef) => Some((index, ecef)),
                Err(e) => {
                    warn!("Skipping {}: {}", obs.image_path, e);
                    None
                }
            })
            .collect();
        info!(
            "{} of {} images have detections",
            candidates.len(),
            observations.len()
        );

        let mut pairs = Vec::new();
        let mut count_matches = 0usize;

        for (i, (first, first_ecef)) in candidates.iter().enumerate() {
            for (second, second_ecef) in &candidates[i + 1..] {
                let a = &observations[*first];
                let b = &observations[*second];

                let count_difference = a.count().abs_diff(b.count());
                if count_difference > self.count_tolerance {
                    continue;
                }
                count_matches += 1;

                let distance = first_ecef.distance_to(second_ecef);
                debug!(
                    "{} <-> {}: {} vs {} boxes, {:.3} m apart",
                    a.image_path,
                    b.image_path,
                    a.count(),
                    b.count(),
                    distance
                );
                if distance < self.min_distance_m || distance > self.max_distance_m {
                    continue;
                }

                pairs.push(ImagePair {
                    id: pairs.len(),
                    first: *first,
                    second: *second,
                    first_image: a.image_path.clone(),
                    second_image: b.image_path.clone(),
                    count_difference,
                    camera_distance_m: distance,
                    average_confidence: (a.mean_confidence() + b.mean_confidence()) / 2.0,
                    combined_box_area: a.mean_box_area() + b.mean_box_area(),
                });
            }
        }

        info!(
            "Pairs by count: {}, after distance filter: {}",
            count_matches,
            pairs.len()
        );
        pairs
    }
}
