//! Sharpness analysis via variance of the Laplacian.
//!
//! A discrete Laplacian kernel highlights regions of rapid intensity
//! change; sharp images carry more high-frequency content and therefore a
//! higher response variance. Scores are on the same scale as the classic
//! OpenCV variance-of-Laplacian blur detector.

use image::GrayImage;
use serde::Serialize;

use super::{round_to, CheckStatus};
use crate::config::BlurRules;

/// Result of the sharpness check.
#[derive(Debug, Clone, Serialize)]
pub struct BlurCheck {
    pub status: CheckStatus,
    /// Variance of the Laplacian response. Higher is sharper.
    pub score: f64,
    /// The minimum score required to pass.
    pub threshold: f64,
    /// Banding independent of the pass threshold: "excellent",
    /// "acceptable", or "poor".
    pub quality_level: &'static str,
    /// `min(score / threshold, 2.0)` — how far past (or short of) the
    /// threshold the image landed.
    pub confidence: f64,
    pub reason: String,
}

impl BlurCheck {
    /// A failed result with zero score, used when the analyzer cannot run.
    pub fn failed(threshold: f64, reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            score: 0.0,
            threshold,
            quality_level: "poor",
            confidence: 0.0,
            reason: reason.into(),
        }
    }
}

/// Analyze the sharpness of a grayscale image against the blur rules.
pub fn analyze(gray: &GrayImage, rules: &BlurRules) -> BlurCheck {
    let score = laplacian_variance(gray);
    let passes = score >= rules.min_score;

    let quality_level = if score >= rules.excellent_level {
        "excellent"
    } else if score >= rules.acceptable_level {
        "acceptable"
    } else {
        "poor"
    };

    let confidence = if rules.min_score > 0.0 {
        (score / rules.min_score).min(2.0)
    } else {
        2.0
    };

    let reason = if passes {
        "Image sharpness is acceptable".to_string()
    } else {
        "Image is too blurry for quality standards".to_string()
    };

    BlurCheck {
        status: CheckStatus::from_bool(passes),
        score: round_to(score, 2),
        threshold: rules.min_score,
        quality_level,
        confidence: round_to(confidence, 3),
        reason,
    }
}

/// Variance of the 3x3 Laplacian response over the interior pixels.
///
/// Kernel:
/// ```text
/// [ 0  1  0 ]
/// [ 1 -4  1 ]
/// [ 0  1  0 ]
/// ```
///
/// Images smaller than 3x3 have no interior and score 0.0.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();

    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let count = ((width - 2) as u64 * (height - 2) as u64) as f64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as i32;
            let top = gray.get_pixel(x, y - 1)[0] as i32;
            let bottom = gray.get_pixel(x, y + 1)[0] as i32;
            let left = gray.get_pixel(x - 1, y)[0] as i32;
            let right = gray.get_pixel(x + 1, y)[0] as i32;

            let response = (top + bottom + left + right - 4 * center) as f64;
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    sum_sq / count - mean * mean
}
