use crate::algorithms::camera::IntrinsicsSource;
use crate::algorithms::distortion::BrownConrady;
use crate::core::constants::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Pipeline-wide configuration parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pairing: PairingConfig,
    pub ranking: RankingConfig,
    pub camera: CameraConfig,
    pub triangulation: TriangulationConfig,
    pub flight: FlightConfig,
    pub metadata: MetadataConfig,
}

/// Candidate pair filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Largest accepted difference in detection counts
    pub count_tolerance: usize,
    /// Closed camera distance window (meters)
    pub min_distance_m: f64,
    pub max_distance_m: f64,
}

/// Rank fusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// RRF damping constant
    pub rrf_k: f64,
}

/// Camera intrinsics and lens model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub intrinsics: IntrinsicsSource,
    /// Brown-Conrady `[k1, k2, p1, p2, k3]`
    pub distortion: BrownConrady,
}

/// Triangulation guards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Reject pairs whose 1/sin(ray angle) exceeds this
    pub max_condition_number: f64,
    pub undistort_iterations: usize,
}

/// Inspection path parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub standoff_distance_m: f64,
    pub descend_step_m: f64,
}

/// Metadata parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Significant digits kept for GPS latitude/longitude
    pub coordinate_precision: usize,
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },

    #[error("I/O error on {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Serialization error in {path}: {message}")]
    SerializationError { path: String, message: String },
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            count_tolerance: 0,
            min_distance_m: DEFAULT_MIN_PAIR_DISTANCE_M,
            max_distance_m: DEFAULT_MAX_PAIR_DISTANCE_M,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { rrf_k: DEFAULT_RRF_K }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            intrinsics: IntrinsicsSource::default(),
            distortion: BrownConrady::from(CALIBRATED_DISTORTION),
        }
    }
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            max_condition_number: DEFAULT_MAX_CONDITION_NUMBER,
            undistort_iterations: 20,
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            standoff_distance_m: DEFAULT_STANDOFF_DISTANCE_M,
            descend_step_m: DEFAULT_DESCEND_STEP_M,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { coordinate_precision: DEFAULT_COORDINATE_PRECISION }
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl PipelineConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        fs::write(path, content).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pairing = &self.pairing;
        if !(pairing.min_distance_m >= 0.0 && pairing.min_distance_m.is_finite()) {
            return Err(invalid("pairing.min_distance_m", pairing.min_distance_m, "must be a non-negative distance"));
        }
        if !(pairing.max_distance_m >= pairing.min_distance_m) {
            return Err(invalid("pairing.max_distance_m", pairing.max_distance_m, "must not be below min_distance_m"));
        }

        if !(self.ranking.rrf_k > 0.0 && self.ranking.rrf_k.is_finite()) {
            return Err(invalid("ranking.rrf_k", self.ranking.rrf_k, "must be positive"));
        }

        match self.camera.intrinsics {
            IntrinsicsSource::Calibrated { fx, fy, cx, cy } => {
                if !(fx > 0.0 && fy > 0.0) {
                    return Err(invalid("camera.intrinsics", format!("fx={} fy={}", fx, fy), "focal lengths must be positive"));
                }
                if !(cx.is_finite() && cy.is_finite()) {
                    return Err(invalid("camera.intrinsics", format!("cx={} cy={}", cx, cy), "principal point must be finite"));
                }
            }
            IntrinsicsSource::FromTelemetry { sensor_width_mm, sensor_height_mm } => {
                if !(sensor_width_mm > 0.0 && sensor_height_mm > 0.0) {
                    return Err(invalid(
                        "camera.intrinsics",
                        format!("{}x{} mm", sensor_width_mm, sensor_height_mm),
                        "sensor size must be positive",
                    ));
                }
            }
        }
        let d = &self.camera.distortion;
        if ![d.k1, d.k2, d.p1, d.p2, d.k3].iter().all(|c| c.is_finite()) {
            return Err(invalid("camera.distortion", format!("{:?}", d), "coefficients must be finite"));
        }

        if !(self.triangulation.max_condition_number >= 1.0) {
            return Err(invalid(
                "triangulation.max_condition_number",
                self.triangulation.max_condition_number,
                "must be at least 1",
            ));
        }

        if !(self.flight.standoff_distance_m >= 0.0 && self.flight.standoff_distance_m.is_finite()) {
            return Err(invalid("flight.standoff_distance_m", self.flight.standoff_distance_m, "must be non-negative"));
        }
        if !(self.flight.descend_step_m > 0.0 && self.flight.descend_step_m.is_finite()) {
            return Err(invalid("flight.descend_step_m", self.flight.descend_step_m, "must be positive"));
        }

        if self.metadata.coordinate_precision == 0 || self.metadata.coordinate_precision > 17 {
            return Err(invalid(
                "metadata.coordinate_precision",
                self.metadata.coordinate_precision,
                "must be between 1 and 17 significant digits",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pairing.max_distance_m, 10.0);
        assert_eq!(config.ranking.rrf_k, 60.0);
        assert_eq!(config.flight.descend_step_m, 1.5);
        assert_eq!(config.metadata.coordinate_precision, 12);
        assert_eq!(config.camera.distortion.k1, 0.116413456);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "pairing": { "max_distance_m": 25.0 }, "camera": { "intrinsics": { "kind": "from_telemetry", "sensor_width_mm": 6.17, "sensor_height_mm": 4.55 } } }"#,
        )
        .unwrap();
        assert_eq!(config.pairing.max_distance_m, 25.0);
        assert_eq!(config.pairing.min_distance_m, 0.0);
        assert_eq!(
            config.camera.intrinsics,
            IntrinsicsSource::FromTelemetry { sensor_width_mm: 6.17, sensor_height_mm: 4.55 }
        );
        assert_eq!(config.triangulation, TriangulationConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.flight.descend_step_m = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter { parameter, .. }) if parameter == "flight.descend_step_m"));

        let mut config = PipelineConfig::default();
        config.pairing.min_distance_m = 20.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.ranking.rrf_k = -1.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.flight.standoff_distance_m = -3.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.metadata.coordinate_precision = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = PipelineConfig::default();
        config.pairing.count_tolerance = 2;
        config.flight.standoff_distance_m = 5.0;

        config.save_to_file(file.path()).unwrap();
        let loaded = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            PipelineConfig::from_file("/nonexistent/pipeline.json"),
            Err(ConfigError::IoError { .. })
        ));

        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "{ not json").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(file.path()),
            Err(ConfigError::SerializationError { .. })
        ));

        fs::write(file.path(), r#"{ "flight": { "descend_step_m": -1.0 } }"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_file(file.path()),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }
}
