//! Batch geolocation: observations in, target regions and an inspection
//! path out
//!
//! Pairs are processed in fused rank order. A pair that cannot be
//! triangulated is recorded and skipped; the first pair that succeeds drives
//! the flight plan.

use crate::algorithms::camera::CameraModel;
use crate::algorithms::flight_plan::FlightPlanner;
use crate::algorithms::triangulation::Triangulator;
use crate::api::types::ObjectDetector;
use crate::core::types::{FlightPlan, GeoPosition, ImageObservation, TriangulatedPoint};
use crate::processing::pairing::{ImagePair, PairSelector};
use crate::processing::ranking::{RankFuser, RankedPair};
use crate::processing::telemetry::TelemetryReader;
use crate::utils::config::PipelineConfig;
use crate::validation::error::{GeoResult, GeolocationError, ImageFailure, PairFailure};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Triangulated extent of the target seen by one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    pub pair_id: usize,
    pub images: (String, String),
    pub top_left: TriangulatedPoint,
    pub bottom_right: TriangulatedPoint,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationReport {
    /// Every candidate that passed the filters
    pub pairs: Vec<ImagePair>,
    /// Candidates in fused rank order
    pub ranking: Vec<RankedPair>,
    /// Successful regions in rank order
    pub regions: Vec<TargetRegion>,
    pub pair_failures: Vec<PairFailure>,
    pub image_failures: Vec<ImageFailure>,
    pub flight_plan: Option<FlightPlan>,
    /// Why no plan was produced despite a usable region
    pub plan_error: Option<GeolocationError>,
}

impl GeolocationReport {
    /// Highest-ranked pair that triangulated
    pub fn best_pair(&self) -> Option<&ImagePair> {
        let region = self.regions.first()?;
        self.pairs.iter().find(|p| p.id == region.pair_id)
    }

    pub fn best_region(&self) -> Option<&TargetRegion> {
        self.regions.first()
    }
}

/// Run the detector and the telemetry reader over every image
///
/// Images whose detections or telemetry fail are reported and left out.
pub fn collect_observations<D, T>(
    image_paths: &[String],
    detector: &D,
    reader: &T,
) -> (Vec<ImageObservation>, Vec<ImageFailure>)
where
    D: ObjectDetector + ?Sized,
    T: TelemetryReader + ?Sized,
{
    let mut observations = Vec::with_capacity(image_paths.len());
    let mut failures = Vec::new();

    for path in image_paths {
        let result = detector.detect(path).and_then(|detections| {
            let telemetry = reader.read_telemetry(path)?;
            Ok(ImageObservation {
                image_path: path.clone(),
                detections,
                telemetry,
            })
        });

        match result {
            Ok(observation) => observations.push(observation),
            Err(error) => {
                warn!("Skipping image {}: {}", path, error);
                failures.push(ImageFailure {
                    image_path: path.clone(),
                    error,
                });
            }
        }
    }

    info!(
        "Collected {} observations, {} images failed",
        observations.len(),
        failures.len()
    );
    (observations, failures)
}

/// Configured pipeline stages
#[derive(Debug, Clone)]
pub struct GeolocationPipeline {
    config: PipelineConfig,
    selector: PairSelector,
    fuser: RankFuser,
    triangulator: Triangulator,
    planner: FlightPlanner,
}

impl GeolocationPipeline {
    pub fn new(config: PipelineConfig) -> GeoResult<Self> {
        let selector = PairSelector::new(
            config.pairing.count_tolerance,
            config.pairing.min_distance_m,
            config.pairing.max_distance_m,
        )?;
        let fuser = RankFuser::new(config.ranking.rrf_k)?;
        let triangulator = Triangulator::new(
            config.triangulation.max_condition_number,
            config.triangulation.undistort_iterations,
        );
        let planner = FlightPlanner::new(config.flight.standoff_distance_m, config.flight.descend_step_m);

        Ok(Self {
            config,
            selector,
            fuser,
            triangulator,
            planner,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn camera(&self, observation: &ImageObservation) -> GeoResult<CameraModel> {
        CameraModel::from_telemetry(
            &observation.telemetry,
            &self.config.camera.intrinsics,
            self.config.camera.distortion,
        )
    }

    /// Triangulate the corners of the merged detection box of both images
    pub fn triangulate_pair(&self, first: &ImageObservation, second: &ImageObservation) -> GeoResult<(TriangulatedPoint, TriangulatedPoint)> {
        let empty = |obs: &ImageObservation| GeolocationError::InvalidDetection {
            reason: format!("{} has no detections", obs.image_path),
        };
        let box1 = first.overall_box().ok_or_else(|| empty(first))?;
        let box2 = second.overall_box().ok_or_else(|| empty(second))?;

        let camera1 = self.camera(first)?;
        let camera2 = self.camera(second)?;

        let top_left = self
            .triangulator
            .triangulate_cameras(&camera1, &camera2, box1.top_left(), box2.top_left())?;
        let bottom_right = self
            .triangulator
            .triangulate_cameras(&camera1, &camera2, box1.bottom_right(), box2.bottom_right())?;

        Ok((top_left, bottom_right))
    }

    /// Select, rank, triangulate and plan
    ///
    /// Without an explicit drone position the plan starts from the camera
    /// position of the first image of the best pair.
    pub fn run(&self, observations: &[ImageObservation], drone_position: Option<GeoPosition>) -> GeolocationReport {
        let pairs = self.selector.select(observations);
        if pairs.is_empty() {
            warn!("No candidate image pairs");
        }
        let ranking = self.fuser.fuse(&pairs);

        let mut regions = Vec::new();
        let mut pair_failures = Vec::new();

        for ranked in &ranking {
            let Some(pair) = pairs.iter().find(|p| p.id == ranked.pair_id) else {
                continue;
            };
            let images = (pair.first_image.clone(), pair.second_image.clone());

            match self.triangulate_pair(&observations[pair.first], &observations[pair.second]) {
                Ok((top_left, bottom_right)) => {
                    info!(
                        "Pair {} ({} / {}): top-left ({:.8}, {:.8}, {:.2}), bottom-right ({:.8}, {:.8}, {:.2})",
                        pair.id,
                        images.0,
                        images.1,
                        top_left.geodetic.latitude,
                        top_left.geodetic.longitude,
                        top_left.geodetic.altitude,
                        bottom_right.geodetic.latitude,
                        bottom_right.geodetic.longitude,
                        bottom_right.geodetic.altitude
                    );
                    regions.push(TargetRegion {
                        pair_id: pair.id,
                        images,
                        top_left,
                        bottom_right,
                    });
                }
                Err(error) => {
                    warn!("Pair {} ({} / {}) failed: {}", pair.id, images.0, images.1, error);
                    pair_failures.push(PairFailure {
                        pair_id: pair.id,
                        images,
                        error,
                    });
                }
            }
        }

        let mut flight_plan = None;
        let mut plan_error = None;
        if let Some(best) = regions.first() {
            let drone = drone_position.unwrap_or_else(|| {
                pairs
                    .iter()
                    .find(|p| p.id == best.pair_id)
                    .map(|p| observations[p.first].telemetry.position)
                    .unwrap_or(best.top_left.geodetic)
            });

            match self.planner.generate_plan(&best.top_left.ecef, &best.bottom_right.ecef, &drone) {
                Ok(plan) => flight_plan = Some(plan),
                Err(error) => {
                    warn!("No flight plan for pair {}: {}", best.pair_id, error);
                    plan_error = Some(error);
                }
            }
        }

        GeolocationReport {
            pairs,
            ranking,
            regions,
            pair_failures,
            image_failures: Vec::new(),
            flight_plan,
            plan_error,
        }
    }

    /// Collect observations and run the batch
    pub fn run_images<D, T>(
        &self,
        image_paths: &[String],
        detector: &D,
        reader: &T,
        drone_position: Option<GeoPosition>,
    ) -> GeolocationReport
    where
        D: ObjectDetector + ?Sized,
        T: TelemetryReader + ?Sized,
    {
        let (observations, image_failures) = collect_observations(image_paths, detector, reader);
        let mut report = self.run(&observations, drone_position);
        report.image_failures = image_failures;
        report
    }
}
