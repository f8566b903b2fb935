//! Collaborator contracts and the JSON input document

use crate::core::types::Detection;
use crate::processing::telemetry::{TagMap, TagMapTelemetryReader};
use crate::validation::data::validate_detection;
use crate::validation::error::{GeoResult, GeolocationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Object detector producing boxes for one photograph
pub trait ObjectDetector {
    fn detect(&self, image_path: &str) -> GeoResult<Vec<Detection>>;
}

/// Detector backed by detections computed elsewhere
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDetections {
    detections: HashMap<String, Vec<Detection>>,
}

impl PrecomputedDetections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_path: impl Into<String>, detections: Vec<Detection>) {
        self.detections.insert(image_path.into(), detections);
    }
}

impl ObjectDetector for PrecomputedDetections {
    /// Images without an entry have no detections
    fn detect(&self, image_path: &str) -> GeoResult<Vec<Detection>> {
        let detections = self.detections.get(image_path).cloned().unwrap_or_default();
        for detection in &detections {
            validate_detection(detection).map_err(|e| match e {
                GeolocationError::InvalidDetection { reason } => GeolocationError::InvalidDetection {
                    reason: format!("{}: {}", image_path, reason),
                },
                other => other,
            })?;
        }
        Ok(detections)
    }
}

/// One photograph of the input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    pub path: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// namespace URI -> qualified tag -> value
    #[serde(default)]
    pub metadata: TagMap,
}

/// Batch input: detections and extracted metadata per photograph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    pub images: Vec<ImageInput>,
}

impl InputDocument {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Image paths in document order with the matching detector and reader
    pub fn into_sources(self, coordinate_precision: usize) -> (Vec<String>, PrecomputedDetections, TagMapTelemetryReader) {
        let mut paths = Vec::with_capacity(self.images.len());
        let mut detector = PrecomputedDetections::new();
        let mut reader = TagMapTelemetryReader::new(coordinate_precision);

        for image in self.images {
            paths.push(image.path.clone());
            detector.insert(image.path.clone(), image.detections);
            reader.insert(image.path, image.metadata);
        }

        (paths, detector, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BoundingBox;
    use crate::processing::telemetry::TelemetryReader;

    const DOCUMENT: &str = r#"{
        "images": [
            {
                "path": "DJI_0001.JPG",
                "detections": [ { "bbox": [10.0, 20.0, 110.0, 220.0], "confidence": 0.87 } ],
                "metadata": {
                    "http://www.uav.com/drone-dji/1.0/": {
                        "drone-dji:AbsoluteAltitude": "+450.0",
                        "drone-dji:GimbalYawDegree": "120.0",
                        "drone-dji:GimbalPitchDegree": "-25.0",
                        "drone-dji:GimbalRollDegree": "0.0",
                        "drone-dji:GpsLatitude": "49.0990",
                        "drone-dji:GpsLongitude": "12.1809"
                    },
                    "http://ns.adobe.com/exif/1.0/": {
                        "exif:FocalLength": "672/100",
                        "exif:PixelXDimension": "4032",
                        "exif:PixelYDimension": "3024"
                    }
                }
            },
            { "path": "DJI_0002.JPG" }
        ]
    }"#;

    #[test]
    fn test_document_sources() {
        let document = InputDocument::from_json(DOCUMENT).unwrap();
        let (paths, detector, reader) = document.into_sources(12);

        assert_eq!(paths, vec!["DJI_0001.JPG", "DJI_0002.JPG"]);

        let detections = detector.detect("DJI_0001.JPG").unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox, BoundingBox::new(10.0, 20.0, 110.0, 220.0));
        assert!(detector.detect("DJI_0002.JPG").unwrap().is_empty());

        let telemetry = reader.read_telemetry("DJI_0001.JPG").unwrap();
        assert_eq!(telemetry.position.altitude, 450.0);
        assert!(matches!(
            reader.read_telemetry("DJI_0002.JPG"),
            Err(GeolocationError::MissingMetadata { .. })
        ));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let mut detector = PrecomputedDetections::new();
        detector.insert(
            "x.jpg",
            vec![Detection { bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0), confidence: 1.5 }],
        );
        assert!(matches!(
            detector.detect("x.jpg"),
            Err(GeolocationError::InvalidDetection { reason }) if reason.starts_with("x.jpg")
        ));
    }

    #[test]
    fn test_malformed_document() {
        assert!(InputDocument::from_json("{\"images\": [ { \"detections\": [] } ]}").is_err());
    }
}
