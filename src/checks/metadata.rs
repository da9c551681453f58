//! Capture-metadata extraction and completeness scoring.
//!
//! EXIF is read with `nom-exif`; a missing or unparseable EXIF block is
//! zero completeness, never an error. GPS coordinates are converted from
//! degrees-minutes-seconds rationals to decimal degrees, with malformed
//! triples treated as unavailable.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use nom_exif::*;
use serde::Serialize;
use std::path::Path;

use super::{round_to, CheckStatus};
use crate::config::{GeoBoundary, MetadataRules};

/// Capture metadata extracted from an image's EXIF block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaptureMetadata {
    /// Original capture time, ISO 8601.
    pub timestamp: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub orientation: Option<String>,
    pub iso: Option<String>,
    /// Exposure time, e.g. "1/250".
    pub shutter_speed: Option<String>,
    /// F-number.
    pub aperture: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
}

impl CaptureMetadata {
    /// Whether a named required field is present.
    fn has_field(&self, name: &str) -> bool {
        match name {
            "timestamp" => self.timestamp.is_some(),
            "camera_make_model" => self.camera_make.is_some() || self.camera_model.is_some(),
            "orientation" => self.orientation.is_some(),
            "iso" => self.iso.is_some(),
            "shutter_speed" => self.shutter_speed.is_some(),
            "aperture" => self.aperture.is_some(),
            _ => false,
        }
    }

    pub fn has_gps(&self) -> bool {
        self.gps_latitude.is_some() && self.gps_longitude.is_some()
    }
}

/// Result of the metadata completeness check.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataCheck {
    pub status: CheckStatus,
    /// `100 x found / required`.
    pub completeness: f64,
    /// The completeness percentage required to pass.
    pub required_min: f64,
    /// Required fields that were found, in the configured field order.
    pub found_fields: Vec<String>,
    /// Required fields that were absent, in the configured field order.
    pub missing_fields: Vec<String>,
    pub quality_level: &'static str,
    /// The extracted metadata itself.
    pub capture: CaptureMetadata,
    pub reason: String,
}

impl MetadataCheck {
    /// A failed result with zero completeness, used when the analyzer
    /// cannot run at all.
    pub fn failed(rules: &MetadataRules, reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            completeness: 0.0,
            required_min: rules.min_completeness_percent,
            found_fields: Vec::new(),
            missing_fields: rules.required_fields.clone(),
            quality_level: "poor",
            capture: CaptureMetadata::default(),
            reason: reason.into(),
        }
    }
}

/// Extract capture metadata from the file and score its completeness
/// against the required-field list.
pub fn analyze(path: &Path, rules: &MetadataRules) -> MetadataCheck {
    let capture = match read_capture_metadata(path) {
        Ok(capture) => capture,
        Err(e) => {
            return MetadataCheck::failed(rules, format!("Metadata extraction failed: {e}"));
        }
    };

    let mut found_fields = Vec::new();
    let mut missing_fields = Vec::new();
    for name in &rules.required_fields {
        if capture.has_field(name) {
            found_fields.push(name.clone());
        } else {
            missing_fields.push(name.clone());
        }
    }

    let completeness = if rules.required_fields.is_empty() {
        0.0
    } else {
        100.0 * found_fields.len() as f64 / rules.required_fields.len() as f64
    };

    let passes = completeness >= rules.min_completeness_percent;

    let quality_level = if completeness >= 85.0 {
        "excellent"
    } else if completeness >= 70.0 {
        "acceptable"
    } else {
        "poor"
    };

    let reason = if passes {
        "Sufficient metadata extracted".to_string()
    } else {
        "Insufficient metadata extracted".to_string()
    };

    MetadataCheck {
        status: CheckStatus::from_bool(passes),
        completeness: round_to(completeness, 1),
        required_min: rules.min_completeness_percent,
        found_fields,
        missing_fields,
        quality_level,
        capture,
        reason,
    }
}

/// Read capture metadata from an image file.
///
/// A file with no EXIF block yields an empty [`CaptureMetadata`]; only an
/// unopenable file is an error (the caller downgrades that to a failed
/// check).
pub fn read_capture_metadata(path: &Path) -> Result<CaptureMetadata> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(CaptureMetadata::default());
        }
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    let mut capture = CaptureMetadata::default();

    if let Some(val) = exif.get(ExifTag::DateTimeOriginal) {
        capture.timestamp = entry_to_string(val).and_then(|s| exif_timestamp_to_iso(&s));
    }
    if let Some(val) = exif.get(ExifTag::Make) {
        capture.camera_make = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::Model) {
        capture.camera_model = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::Orientation) {
        capture.orientation = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::ISOSpeedRatings) {
        capture.iso = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::ExposureTime) {
        capture.shutter_speed = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::FNumber) {
        capture.aperture = entry_to_string(val);
    }

    if let Some(gps) = gps_info {
        capture.gps_latitude = dms_to_decimal(
            [
                (gps.latitude.0.0, gps.latitude.0.1),
                (gps.latitude.1.0, gps.latitude.1.1),
                (gps.latitude.2.0, gps.latitude.2.1),
            ],
            gps.latitude_ref,
        );
        capture.gps_longitude = dms_to_decimal(
            [
                (gps.longitude.0.0, gps.longitude.0.1),
                (gps.longitude.1.0, gps.longitude.1.1),
                (gps.longitude.2.0, gps.longitude.2.1),
            ],
            gps.longitude_ref,
        );
    }

    Ok(capture)
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Convert an EXIF `"YYYY:MM:DD HH:MM:SS"` timestamp to ISO 8601. An
/// unparseable value counts as a missing timestamp.
fn exif_timestamp_to_iso(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Convert a degrees/minutes/seconds rational triple to decimal degrees.
///
/// South and west references flip the sign. A zero denominator anywhere in
/// the triple makes the coordinate unavailable rather than a division
/// error.
pub fn dms_to_decimal(parts: [(u32, u32); 3], reference: char) -> Option<f64> {
    if parts.iter().any(|&(_, denom)| denom == 0) {
        return None;
    }

    let degrees = parts[0].0 as f64 / parts[0].1 as f64;
    let minutes = parts[1].0 as f64 / parts[1].1 as f64;
    let seconds = parts[2].0 as f64 / parts[2].1 as f64;

    let mut coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference == 'S' || reference == 'W' {
        coord = -coord;
    }

    Some(coord)
}

/// Result of the independent geofence check. This is a warning signal
/// only; it never contributes to the overall score.
#[derive(Debug, Clone, Serialize)]
pub struct LocationCheck {
    pub within_boundaries: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reason: String,
}

/// Check whether the extracted GPS position falls inside the configured
/// rectangular boundary.
pub fn locate(capture: &CaptureMetadata, boundary: &GeoBoundary) -> LocationCheck {
    let (lat, lon) = match (capture.gps_latitude, capture.gps_longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return LocationCheck {
                within_boundaries: false,
                latitude: None,
                longitude: None,
                reason: "No GPS data available".to_string(),
            };
        }
    };

    let within = boundary.contains(lat, lon);
    LocationCheck {
        within_boundaries: within,
        latitude: Some(lat),
        longitude: Some(lon),
        reason: if within {
            "Valid location".to_string()
        } else {
            "Outside configured boundaries".to_string()
        },
    }
}
