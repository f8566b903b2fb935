//! Camera telemetry from namespaced XMP tag maps
//!
//! Drone photographs carry gimbal angles and GPS position in a vendor XMP
//! namespace and lens data in the EXIF namespace. Some firmware writes the
//! vendor block under an alternative namespace URI, so both are probed.

use crate::core::constants::DEFAULT_COORDINATE_PRECISION;
use crate::core::types::{CameraTelemetry, GeoPosition};
use crate::processing::parser::{parse_coordinate, parse_dimension, parse_rational, ValueParseError};
use crate::validation::data::validate_telemetry;
use crate::validation::error::{GeoResult, GeolocationError};
use log::debug;
use std::collections::{BTreeMap, HashMap};

pub const DJI_NAMESPACE: &str = "http://www.dji.com/drone-dji/1.0/";
pub const DJI_NAMESPACE_ALTERNATIVE: &str = "http://www.uav.com/drone-dji/1.0/";
pub const EXIF_NAMESPACE: &str = "http://ns.adobe.com/exif/1.0/";

pub const TAG_ABSOLUTE_ALTITUDE: &str = "drone-dji:AbsoluteAltitude";
pub const TAG_RELATIVE_ALTITUDE: &str = "drone-dji:RelativeAltitude";
pub const TAG_GIMBAL_YAW: &str = "drone-dji:GimbalYawDegree";
pub const TAG_GIMBAL_PITCH: &str = "drone-dji:GimbalPitchDegree";
pub const TAG_GIMBAL_ROLL: &str = "drone-dji:GimbalRollDegree";
pub const TAG_LATITUDE: &str = "drone-dji:GpsLatitude";
pub const TAG_LONGITUDE: &str = "drone-dji:GpsLongitude";
pub const TAG_FOCAL_LENGTH: &str = "exif:FocalLength";
pub const TAG_IMAGE_WIDTH: &str = "exif:PixelXDimension";
pub const TAG_IMAGE_HEIGHT: &str = "exif:PixelYDimension";

/// Tag values of one image: namespace URI -> qualified tag -> raw string
pub type TagMap = BTreeMap<String, BTreeMap<String, String>>;

/// Source of per-image camera telemetry
pub trait TelemetryReader {
    fn read_telemetry(&self, image_path: &str) -> GeoResult<CameraTelemetry>;
}

/// Lookup helper over one image's tag map
struct TagLookup<'a> {
    image: &'a str,
    tags: &'a TagMap,
}

impl<'a> TagLookup<'a> {
    fn find(&self, namespaces: &[&str], tag: &str) -> Option<&'a str> {
        namespaces
            .iter()
            .filter_map(|ns| self.tags.get(*ns))
            .find_map(|values| values.get(tag))
            .map(String::as_str)
    }

    fn require(&self, namespaces: &[&str], tag: &str) -> GeoResult<&'a str> {
        self.find(namespaces, tag).ok_or_else(|| GeolocationError::MissingMetadata {
            image: self.image.to_string(),
            tag: tag.to_string(),
        })
    }

    fn vendor(&self, tag: &str) -> GeoResult<&'a str> {
        self.require(&[DJI_NAMESPACE, DJI_NAMESPACE_ALTERNATIVE], tag)
    }

    fn exif(&self, tag: &str) -> GeoResult<&'a str> {
        self.require(&[EXIF_NAMESPACE], tag)
    }
}

fn invalid(tag: &str, value: &str) -> impl FnOnce(ValueParseError) -> GeolocationError {
    let tag = tag.to_string();
    let value = value.to_string();
    move |e| {
        debug!("Tag {} rejected: {}", tag, e);
        GeolocationError::InvalidMetadata { tag, value }
    }
}

fn decimal(tag: &str, value: &str) -> GeoResult<f64> {
    parse_rational(value).map_err(invalid(tag, value))
}

/// Build validated telemetry from one image's tags
pub fn parse_telemetry(image_path: &str, tags: &TagMap, coordinate_precision: usize) -> GeoResult<CameraTelemetry> {
    let lookup = TagLookup { image: image_path, tags };

    let latitude_text = lookup.vendor(TAG_LATITUDE)?;
    let longitude_text = lookup.vendor(TAG_LONGITUDE)?;
    let altitude_text = lookup.vendor(TAG_ABSOLUTE_ALTITUDE)?;
    let yaw_text = lookup.vendor(TAG_GIMBAL_YAW)?;
    let pitch_text = lookup.vendor(TAG_GIMBAL_PITCH)?;
    let roll_text = lookup.vendor(TAG_GIMBAL_ROLL)?;
    let focal_text = lookup.exif(TAG_FOCAL_LENGTH)?;
    let width_text = lookup.exif(TAG_IMAGE_WIDTH)?;
    let height_text = lookup.exif(TAG_IMAGE_HEIGHT)?;

    let relative_altitude = lookup
        .find(&[DJI_NAMESPACE, DJI_NAMESPACE_ALTERNATIVE], TAG_RELATIVE_ALTITUDE)
        .map(|text| decimal(TAG_RELATIVE_ALTITUDE, text))
        .transpose()?;

    let telemetry = CameraTelemetry {
        position: GeoPosition {
            latitude: parse_coordinate(latitude_text, coordinate_precision)
                .map_err(invalid(TAG_LATITUDE, latitude_text))?,
            longitude: parse_coordinate(longitude_text, coordinate_precision)
                .map_err(invalid(TAG_LONGITUDE, longitude_text))?,
            altitude: decimal(TAG_ABSOLUTE_ALTITUDE, altitude_text)?,
        },
        relative_altitude,
        yaw: decimal(TAG_GIMBAL_YAW, yaw_text)?,
        pitch: decimal(TAG_GIMBAL_PITCH, pitch_text)?,
        roll: decimal(TAG_GIMBAL_ROLL, roll_text)?,
        focal_length_mm: parse_rational(focal_text).map_err(invalid(TAG_FOCAL_LENGTH, focal_text))?,
        image_width: parse_dimension(width_text).map_err(invalid(TAG_IMAGE_WIDTH, width_text))?,
        image_height: parse_dimension(height_text).map_err(invalid(TAG_IMAGE_HEIGHT, height_text))?,
    };

    validate_telemetry(&telemetry)?;
    Ok(telemetry)
}

/// Telemetry reader over tag maps extracted ahead of time
#[derive(Debug, Clone)]
pub struct TagMapTelemetryReader {
    images: HashMap<String, TagMap>,
    coordinate_precision: usize,
}

impl Default for TagMapTelemetryReader {
    fn default() -> Self {
        Self::new(DEFAULT_COORDINATE_PRECISION)
    }
}

impl TagMapTelemetryReader {
    pub fn new(coordinate_precision: usize) -> Self {
        Self {
            images: HashMap::new(),
            coordinate_precision,
        }
    }

    pub fn insert(&mut self, image_path: impl Into<String>, tags: TagMap) {
        self.images.insert(image_path.into(), tags);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl TelemetryReader for TagMapTelemetryReader {
    fn read_telemetry(&self, image_path: &str) -> GeoResult<CameraTelemetry> {
        let empty = TagMap::new();
        let tags = self.images.get(image_path).unwrap_or(&empty);
        parse_telemetry(image_path, tags, self.coordinate_precision)
    }
}
