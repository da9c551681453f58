//! Brightness and contrast analysis from mean pixel intensity.

use image::GrayImage;
use serde::Serialize;

use super::{intensity_histogram, round_to, CheckStatus};
use crate::config::BrightnessRules;

/// Result of the brightness check.
#[derive(Debug, Clone, Serialize)]
pub struct BrightnessCheck {
    pub status: CheckStatus,
    /// Mean pixel intensity, 0-255.
    pub mean_brightness: f64,
    /// Population standard deviation of intensity.
    pub std_brightness: f64,
    /// Fraction of pixels in bins `[0, 50)`.
    pub dark_ratio: f64,
    /// Fraction of pixels in bins `[200, 256)`.
    pub bright_ratio: f64,
    pub too_dark: bool,
    pub too_bright: bool,
    /// More than 10% of pixels are very bright.
    pub overexposed: bool,
    /// More than 30% of pixels are very dark.
    pub underexposed: bool,
    /// Derived quality score as a percentage, 0-100.
    pub quality_percent: f64,
    pub quality_level: &'static str,
    /// The acceptable `[min, max]` mean-intensity range tested against.
    pub range: [f64; 2],
    pub reason: String,
}

impl BrightnessCheck {
    /// A failed result with zero metrics, used when the analyzer cannot run.
    pub fn failed(range: [f64; 2], reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            mean_brightness: 0.0,
            std_brightness: 0.0,
            dark_ratio: 0.0,
            bright_ratio: 0.0,
            too_dark: false,
            too_bright: false,
            overexposed: false,
            underexposed: false,
            quality_percent: 0.0,
            quality_level: "poor",
            range,
            reason: reason.into(),
        }
    }
}

/// Analyze mean brightness, contrast, and exposure ratios of a grayscale
/// image against the brightness rules.
pub fn analyze(gray: &GrayImage, rules: &BrightnessRules) -> BrightnessCheck {
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return BrightnessCheck::failed(rules.range, "Image contains no pixels");
    }

    let hist = intensity_histogram(gray);

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for (value, &count) in hist.iter().enumerate() {
        let v = value as f64;
        let c = count as f64;
        sum += v * c;
        sum_sq += v * v * c;
    }
    let n = total as f64;
    let mean = sum / n;
    let std = (sum_sq / n - mean * mean).max(0.0).sqrt();

    let dark_ratio = hist[..50].iter().sum::<u64>() as f64 / n;
    let bright_ratio = hist[200..].iter().sum::<u64>() as f64 / n;

    let [range_min, range_max] = rules.range;
    let too_dark = mean < range_min;
    let too_bright = mean > range_max;
    let overexposed = bright_ratio > 0.10;
    let underexposed = dark_ratio > 0.30;

    let quality = quality_score(mean, std, dark_ratio, bright_ratio);
    let quality_percent = quality * 100.0;

    let passes =
        range_min <= mean && mean <= range_max && quality_percent >= rules.min_quality_percent;

    let quality_level = if quality_percent >= 80.0 {
        "excellent"
    } else if quality_percent >= rules.min_quality_percent {
        "acceptable"
    } else {
        "poor"
    };

    let reason = if passes {
        "Brightness is within the acceptable range".to_string()
    } else {
        "Brightness is outside the acceptable range".to_string()
    };

    BrightnessCheck {
        status: CheckStatus::from_bool(passes),
        mean_brightness: round_to(mean, 2),
        std_brightness: round_to(std, 2),
        dark_ratio: round_to(dark_ratio, 3),
        bright_ratio: round_to(bright_ratio, 3),
        too_dark,
        too_bright,
        overexposed,
        underexposed,
        quality_percent: round_to(quality_percent, 1),
        quality_level,
        range: rules.range,
        reason,
    }
}

/// The brightness quality formula, clamped to `[0, 1]`.
///
/// `(brightness_term + contrast_term) / 2 - exposure_penalty`, where the
/// brightness term rewards means near mid-gray, the contrast term rewards
/// standard deviation up to 64, and the penalty kicks in past 10% dark /
/// 5% bright pixel ratios. The order of operations matters for parity with
/// the reported percentages.
fn quality_score(mean: f64, std: f64, dark_ratio: f64, bright_ratio: f64) -> f64 {
    let brightness_term = 1.0 - (mean - 128.0).abs() / 128.0;
    let contrast_term = (std / 64.0).min(1.0);
    let exposure_penalty =
        (dark_ratio - 0.1).max(0.0) + (bright_ratio - 0.05).max(0.0);

    let quality = (brightness_term + contrast_term) / 2.0 - exposure_penalty;
    quality.clamp(0.0, 1.0)
}
