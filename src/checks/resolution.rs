//! Resolution and file-size analysis.
//!
//! Dimensions come from the image header only (no full pixel decode), so
//! this check stays cheap even for very large uploads.

use serde::Serialize;
use std::path::Path;

use super::{round_to, CheckStatus};
use crate::config::ResolutionRules;

/// Result of the resolution check.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionCheck {
    pub status: CheckStatus,
    pub width: u32,
    pub height: u32,
    pub megapixels: f64,
    pub aspect_ratio: f64,
    pub file_size_bytes: u64,
    /// Tier by total pixel count: "Ultra High" down to "Very Low".
    pub quality_tier: &'static str,
    /// Rough compression estimate from bytes per pixel; JPEG only.
    pub estimated_quality: &'static str,
    /// Whether the image meets the recommended (not just minimum) megapixels.
    pub is_recommended_quality: bool,
    /// 1920x1080 or better.
    pub is_high_resolution: bool,
    /// Human-readable minimum, e.g. `"800x600, >=0.5 MP"`.
    pub min_required: String,
    pub reason: String,
}

impl ResolutionCheck {
    /// A failed result with zero dimensions, used when the analyzer cannot run.
    pub fn failed(rules: &ResolutionRules, reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            width: 0,
            height: 0,
            megapixels: 0.0,
            aspect_ratio: 0.0,
            file_size_bytes: 0,
            quality_tier: "Very Low",
            estimated_quality: "N/A",
            is_recommended_quality: false,
            is_high_resolution: false,
            min_required: min_required_label(rules),
            reason: reason.into(),
        }
    }
}

/// Analyze image dimensions and on-disk size against the resolution rules.
///
/// Errors (unreadable file, unsupported header) are downgraded to a failed
/// result carrying the error text.
pub fn analyze(path: &Path, rules: &ResolutionRules) -> ResolutionCheck {
    match try_analyze(path, rules) {
        Ok(check) => check,
        Err(e) => ResolutionCheck::failed(rules, format!("Resolution check failed: {e}")),
    }
}

fn try_analyze(path: &Path, rules: &ResolutionRules) -> anyhow::Result<ResolutionCheck> {
    let (width, height) = image::image_dimensions(path)?;
    let file_size_bytes = std::fs::metadata(path)?.len();

    let total_pixels = width as u64 * height as u64;
    let megapixels = total_pixels as f64 / 1_000_000.0;
    let aspect_ratio = if height > 0 {
        width as f64 / height as f64
    } else {
        0.0
    };

    let passes = width >= rules.min_width
        && height >= rules.min_height
        && megapixels >= rules.min_megapixels;

    let bytes_per_pixel = if total_pixels > 0 {
        file_size_bytes as f64 / total_pixels as f64
    } else {
        0.0
    };

    let reason = if passes {
        "Resolution meets the minimum requirements".to_string()
    } else {
        "Resolution below minimum required size".to_string()
    };

    Ok(ResolutionCheck {
        status: CheckStatus::from_bool(passes),
        width,
        height,
        megapixels: round_to(megapixels, 2),
        aspect_ratio: round_to(aspect_ratio, 2),
        file_size_bytes,
        quality_tier: quality_tier(total_pixels),
        estimated_quality: estimate_compression(bytes_per_pixel, is_jpeg(path)),
        is_recommended_quality: megapixels >= rules.recommended_megapixels,
        is_high_resolution: width >= 1920 && height >= 1080,
        min_required: min_required_label(rules),
        reason,
    })
}

fn min_required_label(rules: &ResolutionRules) -> String {
    format!(
        "{}x{}, >={} MP",
        rules.min_width, rules.min_height, rules.min_megapixels
    )
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            e == "jpg" || e == "jpeg"
        })
        .unwrap_or(false)
}

/// Quality tier by total pixel count.
fn quality_tier(total_pixels: u64) -> &'static str {
    if total_pixels >= 8_000_000 {
        "Ultra High"
    } else if total_pixels >= 2_000_000 {
        "High"
    } else if total_pixels >= 1_000_000 {
        "Medium"
    } else if total_pixels >= 500_000 {
        "Low"
    } else {
        "Very Low"
    }
}

/// Rough JPEG compression estimate from bytes per pixel. Only meaningful
/// for JPEG; other formats get "N/A".
fn estimate_compression(bytes_per_pixel: f64, jpeg: bool) -> &'static str {
    if !jpeg {
        return "N/A (not JPEG)";
    }
    if bytes_per_pixel > 3.0 {
        "High (minimal compression)"
    } else if bytes_per_pixel > 1.5 {
        "Good"
    } else if bytes_per_pixel > 0.8 {
        "Fair"
    } else {
        "Low (high compression)"
    }
}
