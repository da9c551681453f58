//! Exposure analysis from the luminance histogram.
//!
//! Dynamic range is the index distance between the 0.5th and 99.5th
//! cumulative-histogram percentiles — a robust spread that ignores outlier
//! tails. Clipping is the fraction of pixels pinned at pure black or pure
//! white.

use image::GrayImage;
use serde::Serialize;

use super::{intensity_histogram, round_to, CheckStatus};
use crate::config::ExposureRules;

/// Result of the exposure check.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureCheck {
    pub status: CheckStatus,
    /// Robust intensity spread, 0-255.
    pub dynamic_range: f64,
    /// The minimum dynamic range tested against.
    pub threshold: f64,
    /// Fraction of pixels in bins `[0, 85)`.
    pub shadows_ratio: f64,
    /// Fraction of pixels in bins `[85, 170)`.
    pub midtones_ratio: f64,
    /// Fraction of pixels in bins `[170, 256)`.
    pub highlights_ratio: f64,
    /// Fraction of pixels exactly at bin 0.
    pub shadow_clipping: f64,
    /// Fraction of pixels exactly at bin 255.
    pub highlight_clipping: f64,
    /// `100 x max(shadow_clipping, highlight_clipping)`.
    pub clipping_percentage: f64,
    pub has_clipping: bool,
    pub has_excessive_clipping: bool,
    pub is_underexposed: bool,
    pub is_overexposed: bool,
    pub meets_min_score: bool,
    pub is_acceptable_range: bool,
    /// Passes and clipping is within the limit.
    pub has_good_exposure: bool,
    /// Label from the shadow/highlight/clipping decision table.
    pub exposure_quality: &'static str,
    pub quality_level: &'static str,
    /// Per-problem advisories, deduplicated; a single "looks good" message
    /// when nothing is wrong.
    pub recommendations: Vec<String>,
    pub reason: String,
}

impl ExposureCheck {
    /// A failed result with zero metrics, used when the analyzer cannot run.
    pub fn failed(threshold: f64, reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            dynamic_range: 0.0,
            threshold,
            shadows_ratio: 0.0,
            midtones_ratio: 0.0,
            highlights_ratio: 0.0,
            shadow_clipping: 0.0,
            highlight_clipping: 0.0,
            clipping_percentage: 0.0,
            has_clipping: false,
            has_excessive_clipping: false,
            is_underexposed: false,
            is_overexposed: false,
            meets_min_score: false,
            is_acceptable_range: false,
            has_good_exposure: false,
            exposure_quality: "poor",
            quality_level: "poor",
            recommendations: Vec::new(),
            reason: reason.into(),
        }
    }
}

/// Analyze exposure of a grayscale image against the exposure rules.
pub fn analyze(gray: &GrayImage, rules: &ExposureRules) -> ExposureCheck {
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return ExposureCheck::failed(rules.min_dynamic_range, "Image contains no pixels");
    }

    let hist = intensity_histogram(gray);
    let n = total as f64;

    let shadows = hist[..85].iter().sum::<u64>() as f64 / n;
    let midtones = hist[85..170].iter().sum::<u64>() as f64 / n;
    let highlights = hist[170..].iter().sum::<u64>() as f64 / n;

    let shadow_clipping = hist[0] as f64 / n;
    let highlight_clipping = hist[255] as f64 / n;
    let clipping_percentage = shadow_clipping.max(highlight_clipping) * 100.0;

    let dynamic_range = dynamic_range(&hist, total);

    let meets_min_score = dynamic_range >= rules.min_dynamic_range;
    let is_acceptable_range = rules.acceptable_range[0] <= dynamic_range
        && dynamic_range <= rules.acceptable_range[1];
    let passes = meets_min_score || is_acceptable_range;

    let has_excessive_clipping = clipping_percentage > rules.max_clipping_percent;
    let has_clipping = shadow_clipping > 0.01 || highlight_clipping > 0.01;

    let quality_level = if meets_min_score && !has_excessive_clipping {
        "excellent"
    } else if dynamic_range >= rules.acceptable_range[0] && !has_excessive_clipping {
        "acceptable"
    } else {
        "poor"
    };

    let reason = if passes {
        "Exposure and dynamic range are excellent".to_string()
    } else {
        "Exposure quality below acceptable standards".to_string()
    };

    ExposureCheck {
        status: CheckStatus::from_bool(passes),
        dynamic_range: round_to(dynamic_range, 2),
        threshold: rules.min_dynamic_range,
        shadows_ratio: round_to(shadows, 3),
        midtones_ratio: round_to(midtones, 3),
        highlights_ratio: round_to(highlights, 3),
        shadow_clipping: round_to(shadow_clipping, 4),
        highlight_clipping: round_to(highlight_clipping, 4),
        clipping_percentage: round_to(clipping_percentage, 2),
        has_clipping,
        has_excessive_clipping,
        is_underexposed: shadows > 0.6,
        is_overexposed: highlights > 0.4,
        meets_min_score,
        is_acceptable_range,
        has_good_exposure: passes && !has_excessive_clipping,
        exposure_quality: assess_quality(
            shadows,
            midtones,
            highlights,
            shadow_clipping,
            highlight_clipping,
        ),
        quality_level,
        recommendations: recommendations(shadows, highlights, shadow_clipping, highlight_clipping),
        reason,
    }
}

/// Index distance between the 0.5% and 99.5% percentiles of the cumulative
/// histogram.
fn dynamic_range(hist: &[u64; 256], total: u64) -> f64 {
    let low_target = total as f64 * 0.005;
    let high_target = total as f64 * 0.995;

    let mut cumulative = 0u64;
    let mut low_idx = 0usize;
    let mut high_idx = 255usize;
    let mut low_found = false;

    for (idx, &count) in hist.iter().enumerate() {
        cumulative += count;
        let c = cumulative as f64;
        if !low_found && c >= low_target {
            low_idx = idx;
            low_found = true;
        }
        if c >= high_target {
            high_idx = idx;
            break;
        }
    }

    (high_idx - low_idx) as f64
}

/// Decision table for the overall exposure label.
fn assess_quality(
    shadows: f64,
    midtones: f64,
    highlights: f64,
    shadow_clip: f64,
    highlight_clip: f64,
) -> &'static str {
    if shadow_clip > 0.02 || highlight_clip > 0.02 {
        return "poor";
    }
    if shadows > 0.7 {
        return "underexposed";
    }
    if highlights > 0.5 {
        return "overexposed";
    }
    if (0.3..=0.7).contains(&midtones) && shadows < 0.5 && highlights < 0.4 {
        "excellent"
    } else if (0.2..=0.8).contains(&midtones) && shadows < 0.6 && highlights < 0.45 {
        "good"
    } else {
        "fair"
    }
}

/// Per-problem advisories. Each specific problem contributes one message;
/// a clean histogram gets a single "looks good" line.
fn recommendations(
    shadows: f64,
    highlights: f64,
    shadow_clip: f64,
    highlight_clip: f64,
) -> Vec<String> {
    let mut recs = Vec::new();

    if shadow_clip > 0.02 {
        recs.push("Increase exposure or use fill flash to recover shadow details".to_string());
    }
    if highlight_clip > 0.02 {
        recs.push("Decrease exposure or use graduated filter to recover highlights".to_string());
    }
    if shadows > 0.6 {
        recs.push("Image is underexposed - increase brightness or use flash".to_string());
    }
    if highlights > 0.4 {
        recs.push("Image is overexposed - reduce brightness or avoid direct sunlight".to_string());
    }

    if recs.is_empty() {
        recs.push("Exposure looks good".to_string());
    }

    recs
}
