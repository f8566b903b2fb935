//! Boustrophedon inspection path in front of a rectangular target
//!
//! The target is given by two diagonal corners in ECEF. The other two corners
//! reuse the horizontal position of one corner and the height of the other,
//! which yields a vertical quad. The path is offset from that quad along its
//! normal, on the side facing the drone, and sweeps it row by row from the
//! top edge down to the bottom edge.

use crate::algorithms::geodetic::{to_ecef, to_geodetic};
use crate::core::constants::{DEFAULT_DESCEND_STEP_M, DEFAULT_STANDOFF_DISTANCE_M};
use crate::core::types::{EcefPosition, FlightPlan, GeoPosition, Waypoint};
use crate::validation::error::{GeoResult, GeolocationError};
use log::{debug, info};
use nalgebra::Vector3;

/// Edge cross products below this norm do not define a plane (m^2)
const MIN_NORMAL_NORM: f64 = 1e-6;

/// Corner height difference treated as level (m)
const LEVEL_TOLERANCE_M: f64 = 1e-6;

/// Upper bound on sweep rows in one plan
pub const MAX_PLAN_ROWS: usize = 100_000;

/// Target quad corners, in path order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetQuad {
    pub top_left: GeoPosition,
    pub top_right: GeoPosition,
    pub bottom_left: GeoPosition,
    pub bottom_right: GeoPosition,
}

/// Flight planner parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightPlanner {
    /// Distance kept in front of the target plane (m)
    pub standoff_distance_m: f64,
    /// Altitude dropped between rows (m)
    pub descend_step_m: f64,
}

impl Default for FlightPlanner {
    fn default() -> Self {
        Self {
            standoff_distance_m: DEFAULT_STANDOFF_DISTANCE_M,
            descend_step_m: DEFAULT_DESCEND_STEP_M,
        }
    }
}

impl FlightPlanner {
    pub fn new(standoff_distance_m: f64, descend_step_m: f64) -> Self {
        Self { standoff_distance_m, descend_step_m }
    }

    fn validate(&self) -> GeoResult<()> {
        if !(self.descend_step_m > 0.0 && self.descend_step_m.is_finite()) {
            return Err(GeolocationError::InvalidParameter {
                parameter: "descend_step_m".to_string(),
                reason: format!("{} must be positive", self.descend_step_m),
            });
        }
        if !(self.standoff_distance_m >= 0.0 && self.standoff_distance_m.is_finite()) {
            return Err(GeolocationError::InvalidParameter {
                parameter: "standoff_distance_m".to_string(),
                reason: format!("{} must be non-negative", self.standoff_distance_m),
            });
        }
        Ok(())
    }

    /// Target quad displaced toward the drone by the standoff distance
    pub fn displaced_quad(
        &self,
        top_left: &EcefPosition,
        bottom_right: &EcefPosition,
        drone_position: &GeoPosition,
    ) -> GeoResult<TargetQuad> {
        self.validate()?;

        let tl_geo = to_geodetic(top_left)?;
        let br_geo = to_geodetic(bottom_right)?;
        let top_right = to_ecef(&GeoPosition { altitude: tl_geo.altitude, ..br_geo })?.to_vector();
        let bottom_left = to_ecef(&GeoPosition { altitude: br_geo.altitude, ..tl_geo })?.to_vector();
        let top_left = top_left.to_vector();
        let bottom_right = bottom_right.to_vector();

        let normal = (top_right - top_left).cross(&(bottom_left - top_left));
        let norm = normal.norm();
        if !(norm > MIN_NORMAL_NORM) {
            return Err(GeolocationError::DegenerateGeometry {
                condition_number: f64::INFINITY,
                reason: "target corners do not span a plane".to_string(),
            });
        }
        let mut normal = normal / norm;

        let drone = to_ecef(drone_position)?.to_vector();
        let centroid = (top_left + top_right + bottom_left + bottom_right) / 4.0;
        if ((centroid - normal) - drone).norm() < ((centroid + normal) - drone).norm() {
            normal = -normal;
        }

        let offset = normal * self.standoff_distance_m;
        let displace = |corner: Vector3<f64>| to_geodetic(&EcefPosition::from_vector(&(corner + offset)));

        Ok(TargetQuad {
            top_left: displace(top_left)?,
            top_right: displace(top_right)?,
            bottom_left: displace(bottom_left)?,
            bottom_right: displace(bottom_right)?,
        })
    }

    /// Inspection path for the target spanned by two diagonal corners
    pub fn generate_plan(
        &self,
        top_left: &EcefPosition,
        bottom_right: &EcefPosition,
        drone_position: &GeoPosition,
    ) -> GeoResult<FlightPlan> {
        self.validate()?;

        // No row fits between a top edge at or below the bottom edge
        let top = to_geodetic(top_left)?.altitude;
        let bottom = to_geodetic(bottom_right)?.altitude;
        if top - bottom <= LEVEL_TOLERANCE_M {
            info!("Flight plan: top edge {:.2} m is not above bottom edge {:.2} m, nothing to sweep", top, bottom);
            return Ok(FlightPlan::default());
        }

        let quad = self.displaced_quad(top_left, bottom_right, drone_position)?;
        debug!("Displaced target quad: {:?}", quad);

        let plan = boustrophedon(
            (quad.top_left.latitude, quad.top_left.longitude),
            (quad.bottom_right.latitude, quad.bottom_right.longitude),
            quad.top_left.altitude,
            quad.bottom_right.altitude,
            self.descend_step_m,
        )?;
        info!(
            "Flight plan: {} waypoints from {:.2} m down to floor {:.2} m",
            plan.len(),
            quad.top_left.altitude,
            quad.bottom_right.altitude
        );
        Ok(plan)
    }
}

/// Inspection path with explicit standoff and descend step
pub fn generate_plan(
    top_left: &EcefPosition,
    bottom_right: &EcefPosition,
    drone_position: &GeoPosition,
    standoff_distance_m: f64,
    descend_step_m: f64,
) -> GeoResult<FlightPlan> {
    FlightPlanner::new(standoff_distance_m, descend_step_m).generate_plan(top_left, bottom_right, drone_position)
}

/// Row-by-row sweep between two horizontal endpoints
///
/// Each row emits the current start then the current end at the current
/// altitude; the altitude then drops by `step` and the endpoints swap. Rows
/// are emitted while the altitude is strictly above `floor`.
///
/// Fails with `InvalidParameter` when the sweep would need more than
/// [`MAX_PLAN_ROWS`] rows or when `step` is lost in the precision of
/// `start_altitude`.
pub fn boustrophedon(
    start: (f64, f64),
    end: (f64, f64),
    start_altitude: f64,
    floor_altitude: f64,
    step: f64,
) -> GeoResult<FlightPlan> {
    if !(step > 0.0 && step.is_finite()) {
        return Err(GeolocationError::InvalidParameter {
            parameter: "descend_step_m".to_string(),
            reason: format!("{} must be positive", step),
        });
    }

    if !(start_altitude > floor_altitude) {
        return Ok(FlightPlan::default());
    }

    let rows = ((start_altitude - floor_altitude) / step).ceil();
    if !(rows.is_finite() && rows <= MAX_PLAN_ROWS as f64) {
        return Err(GeolocationError::InvalidParameter {
            parameter: "descend_step_m".to_string(),
            reason: format!(
                "{} m from {} m down to {} m needs more than {} rows",
                step, start_altitude, floor_altitude, MAX_PLAN_ROWS
            ),
        });
    }
    if start_altitude - step >= start_altitude || floor_altitude - step >= floor_altitude {
        return Err(GeolocationError::InvalidParameter {
            parameter: "descend_step_m".to_string(),
            reason: format!(
                "{} is below the altitude resolution between {} and {}",
                step, start_altitude, floor_altitude
            ),
        });
    }

    let (mut start, mut end) = (start, end);
    let mut waypoints = Vec::with_capacity(2 * rows as usize);

    // Rows are indexed so rounding cannot stall the descent
    for row in 0..=rows as usize {
        let altitude = start_altitude - row as f64 * step;
        if !(altitude > floor_altitude) {
            break;
        }
        waypoints.push(Waypoint { latitude: start.0, longitude: start.1, altitude });
        waypoints.push(Waypoint { latitude: end.0, longitude: end.1, altitude });
        std::mem::swap(&mut start, &mut end);
    }

    Ok(FlightPlan { waypoints })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn corner(latitude: f64, longitude: f64, altitude: f64) -> EcefPosition {
        to_ecef(&GeoPosition { latitude, longitude, altitude }).unwrap()
    }

    #[test]
    fn test_three_rows_scenario() {
        let plan = boustrophedon((1.0, 2.0), (3.0, 4.0), 10.0, 5.0, 2.0).unwrap();
        assert_eq!(plan.len(), 6);

        let altitudes: Vec<f64> = plan.iter().map(|w| w.altitude).collect();
        assert_eq!(altitudes, vec![10.0, 10.0, 8.0, 8.0, 6.0, 6.0]);
        // Next row would sit at 4 m, at or below the 5 m floor
        assert!(altitudes[5] - 2.0 <= 5.0);

        let triples = plan.to_triples();
        assert_eq!(triples[0], (1.0, 2.0, 10.0));
        assert_eq!(triples[1], (3.0, 4.0, 10.0));
        assert_eq!(triples[2], (3.0, 4.0, 8.0));
        assert_eq!(triples[3], (1.0, 2.0, 8.0));
        assert_eq!(triples[4], (1.0, 2.0, 6.0));
    }

    #[test]
    fn test_empty_when_start_at_floor() {
        assert!(boustrophedon((0.0, 0.0), (1.0, 1.0), 5.0, 5.0, 1.0).unwrap().is_empty());
        assert!(boustrophedon((0.0, 0.0), (1.0, 1.0), 4.0, 5.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_step_rejected() {
        assert!(matches!(
            boustrophedon((0.0, 0.0), (1.0, 1.0), 10.0, 5.0, 0.0),
            Err(GeolocationError::InvalidParameter { .. })
        ));
        assert!(boustrophedon((0.0, 0.0), (1.0, 1.0), 10.0, 5.0, -1.0).is_err());
    }

    #[test]
    fn test_altitude_monotonic_and_alternating() {
        for step in [0.3, 1.0, 1.5, 2.7] {
            let plan = boustrophedon((1.0, 2.0), (3.0, 4.0), 42.0, 11.0, step).unwrap();
            assert_eq!(plan.len() % 2, 0);

            for pair in plan.waypoints.chunks(2) {
                assert_eq!(pair[0].altitude, pair[1].altitude);
                assert_ne!(
                    (pair[0].latitude, pair[0].longitude),
                    (pair[1].latitude, pair[1].longitude)
                );
            }
            for rows in plan.waypoints.chunks(2).collect::<Vec<_>>().windows(2) {
                assert!(rows[1][0].altitude < rows[0][0].altitude);
                // Each row starts where the previous one ended
                assert_eq!(rows[1][0].latitude, rows[0][1].latitude);
            }
            assert!(plan.iter().all(|w| w.altitude > 11.0));
        }
    }

    #[test]
    fn test_plan_in_front_of_wall() {
        // Wall running east-west, drone to the south of it
        let top_left = corner(49.0990, 12.1809, 10.0);
        let bottom_right = corner(49.0990, 12.18098, 5.0);
        let drone = GeoPosition { latitude: 49.0988, longitude: 12.18094, altitude: 20.0 };

        let plan = generate_plan(&top_left, &bottom_right, &drone, 3.0, 2.0).unwrap();
        assert_eq!(plan.len(), 6);

        let expected = [10.0, 10.0, 8.0, 8.0, 6.0, 6.0];
        for (waypoint, altitude) in plan.iter().zip(expected) {
            assert_abs_diff_eq!(waypoint.altitude, altitude, epsilon = 1e-3);
            assert!(waypoint.latitude < 49.0990);
        }

        // 3 m of latitude is roughly 2.7e-5 degrees
        assert_abs_diff_eq!(plan.waypoints[0].latitude, 49.0990 - 3.0 / 111_200.0, epsilon = 2e-6);
        assert_abs_diff_eq!(plan.waypoints[0].longitude, 12.1809, epsilon = 1e-7);
        assert_abs_diff_eq!(plan.waypoints[1].longitude, 12.18098, epsilon = 1e-7);
    }

    #[test]
    fn test_normal_follows_drone_side() {
        let top_left = corner(49.0990, 12.1809, 10.0);
        let bottom_right = corner(49.0990, 12.18098, 5.0);
        let north = GeoPosition { latitude: 49.0992, longitude: 12.18094, altitude: 20.0 };

        let planner = FlightPlanner::new(3.0, 1.5);
        let quad = planner.displaced_quad(&top_left, &bottom_right, &north).unwrap();
        for c in [quad.top_left, quad.top_right, quad.bottom_left, quad.bottom_right] {
            assert!(c.latitude > 49.0990);
        }
        assert_abs_diff_eq!(quad.top_right.altitude, 10.0, epsilon = 1e-3);
        assert_abs_diff_eq!(quad.bottom_left.altitude, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_stacked_corners_rejected() {
        let drone = GeoPosition { latitude: 49.0988, longitude: 12.18094, altitude: 20.0 };

        let stacked = generate_plan(&corner(49.0990, 12.1809, 10.0), &corner(49.0990, 12.1809, 5.0), &drone, 3.0, 1.5);
        assert!(matches!(stacked, Err(GeolocationError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_level_corners_give_empty_plan() {
        let drone = GeoPosition { latitude: 49.0988, longitude: 12.18094, altitude: 20.0 };

        let level = generate_plan(&corner(49.0990, 12.1809, 10.0), &corner(49.0990, 12.18098, 10.0), &drone, 3.0, 1.5);
        assert!(level.unwrap().is_empty());

        // Same point twice spans nothing and sweeps nothing
        let point = corner(49.0990, 12.1809, 10.0);
        assert!(generate_plan(&point, &point, &drone, 3.0, 1.5).unwrap().is_empty());

        // Parameters are still checked
        let bad_step = generate_plan(&point, &point, &drone, 3.0, 0.0);
        assert!(matches!(bad_step, Err(GeolocationError::InvalidParameter { .. })));
    }

    #[test]
    fn test_step_below_altitude_resolution_rejected() {
        // 1e17 - 1.0 == 1e17 in f64
        let result = boustrophedon((0.0, 0.0), (1.0, 1.0), 1e17, 1e17 - 64.0, 1.0);
        assert!(matches!(result, Err(GeolocationError::InvalidParameter { .. })));
    }

    #[test]
    fn test_row_count_capped() {
        let result = boustrophedon((0.0, 0.0), (1.0, 1.0), 1e17, 0.0, 1.0);
        assert!(matches!(result, Err(GeolocationError::InvalidParameter { .. })));

        let result = boustrophedon((0.0, 0.0), (1.0, 1.0), 100.0, 0.0, 1e-9);
        assert!(matches!(result, Err(GeolocationError::InvalidParameter { .. })));

        // Right at the cap is still planned
        let plan = boustrophedon((0.0, 0.0), (1.0, 1.0), MAX_PLAN_ROWS as f64, 0.0, 1.0).unwrap();
        assert_eq!(plan.len(), 2 * MAX_PLAN_ROWS);
    }

    #[test]
    fn test_inverted_corners_give_empty_plan() {
        let drone = GeoPosition { latitude: 49.0988, longitude: 12.18094, altitude: 20.0 };
        let plan = generate_plan(&corner(49.0990, 12.1809, 5.0), &corner(49.0990, 12.18098, 10.0), &drone, 3.0, 1.5).unwrap();
        assert!(plan.is_empty());
    }
}
