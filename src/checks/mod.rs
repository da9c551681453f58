//! The five independent quality analyzers and their shared result types.
//!
//! Each analyzer is a pure function over decoded pixel data (or the file
//! itself for resolution and metadata) and a rule group from
//! [`RuleConfig`](crate::config::RuleConfig). Analyzers never panic and
//! never return errors: any failure is downgraded to a `Fail` result
//! carrying the error text as its `reason`.

pub mod blur;
pub mod brightness;
pub mod exposure;
pub mod metadata;
pub mod resolution;

pub use blur::BlurCheck;
pub use brightness::BrightnessCheck;
pub use exposure::ExposureCheck;
pub use metadata::{CaptureMetadata, LocationCheck, MetadataCheck};
pub use resolution::ResolutionCheck;

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Pass/fail outcome of a single check (and of the overall verdict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }

    pub(crate) fn from_bool(passes: bool) -> Self {
        if passes { Self::Pass } else { Self::Fail }
    }
}

/// The five check kinds, used to key weights and partial-credit scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Blur,
    Brightness,
    Resolution,
    Exposure,
    Metadata,
}

impl CheckKind {
    /// Fixed iteration order used everywhere checks are walked, so that
    /// scores and recommendation lists come out deterministic.
    pub const ORDER: [CheckKind; 5] = [
        CheckKind::Blur,
        CheckKind::Brightness,
        CheckKind::Resolution,
        CheckKind::Exposure,
        CheckKind::Metadata,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Blur => "blur",
            CheckKind::Brightness => "brightness",
            CheckKind::Resolution => "resolution",
            CheckKind::Exposure => "exposure",
            CheckKind::Metadata => "metadata",
        }
    }
}

/// All five check results for one image, in the shape consumed by the
/// aggregator and serialized as the verdict's `checks` object.
#[derive(Debug, Clone, Serialize)]
pub struct Checks {
    pub blur: BlurCheck,
    pub brightness: BrightnessCheck,
    pub resolution: ResolutionCheck,
    pub exposure: ExposureCheck,
    pub metadata: MetadataCheck,
}

impl Checks {
    pub fn status_of(&self, kind: CheckKind) -> CheckStatus {
        match kind {
            CheckKind::Blur => self.blur.status,
            CheckKind::Brightness => self.brightness.status,
            CheckKind::Resolution => self.resolution.status,
            CheckKind::Exposure => self.exposure.status,
            CheckKind::Metadata => self.metadata.status,
        }
    }

    /// Number of checks that failed.
    pub fn failed_count(&self) -> u32 {
        CheckKind::ORDER
            .iter()
            .filter(|kind| !self.status_of(**kind).is_pass())
            .count() as u32
    }
}

/// 256-bin intensity histogram of a grayscale image.
pub(crate) fn intensity_histogram(gray: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for pixel in gray.pixels() {
        hist[pixel[0] as usize] += 1;
    }
    hist
}

/// Round to a fixed number of decimal places, matching the precision the
/// verdict reports metrics at.
pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
