use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::checks::CheckKind;

/// Top-level rule configuration for the validation engine.
///
/// Holds the thresholds for all five quality checks, the per-check weights
/// used by the aggregator, the optional geofence boundary, and the storage
/// directories used by the disposition router.
///
/// # Loading
///
/// ```rust,no_run
/// use photo_gate::config::RuleConfig;
///
/// // From a JSON file
/// let rules = RuleConfig::load(Some("rules.json".as_ref())).unwrap();
///
/// // Or use a named preset
/// let strict = RuleConfig::strict();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Sharpness (Laplacian variance) thresholds.
    pub blur: BlurRules,
    /// Mean-intensity range and quality floor.
    pub brightness: BrightnessRules,
    /// Minimum dimensions and megapixel requirements.
    pub resolution: ResolutionRules,
    /// Dynamic range and clipping limits.
    pub exposure: ExposureRules,
    /// Required EXIF fields and completeness floor.
    pub metadata: MetadataRules,
    /// Per-check weights for the overall score.
    pub weights: Weights,
    /// Optional rectangular geofence for the location warning.
    pub boundary: Option<GeoBoundary>,
    /// Accepted/rejected directories for the disposition router.
    pub storage: StorageConfig,
}

/// Blur detection thresholds (Laplacian variance scale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurRules {
    /// Minimum variance required to pass.
    pub min_score: f64,
    /// Variance at or above which the image is banded "excellent".
    pub excellent_level: f64,
    /// Variance at or above which the image is banded "acceptable".
    pub acceptable_level: f64,
}

/// Brightness validation thresholds (0-255 intensity scale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrightnessRules {
    /// Acceptable `[min, max]` range for mean intensity.
    pub range: [f64; 2],
    /// Minimum derived quality percentage required to pass.
    pub min_quality_percent: f64,
}

/// Resolution requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRules {
    pub min_width: u32,
    pub min_height: u32,
    pub min_megapixels: f64,
    /// Megapixel count considered optimal (informational flag only).
    pub recommended_megapixels: f64,
}

/// Exposure requirements (histogram-derived dynamic range).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureRules {
    /// Dynamic range at or above which the check passes outright.
    pub min_dynamic_range: f64,
    /// `[min, max]` dynamic range band that also passes.
    pub acceptable_range: [f64; 2],
    /// Maximum percentage of clipped (pure black/white) pixels.
    pub max_clipping_percent: f64,
}

/// Metadata completeness requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRules {
    /// Field names the completeness ratio is computed against.
    pub required_fields: Vec<String>,
    /// Minimum completeness percentage required to pass.
    pub min_completeness_percent: f64,
}

/// Per-check integer weights. The aggregator normalizes by the weight sum,
/// so any positive total works; the defaults sum to 100, making the overall
/// score a true percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weights {
    pub blur: u32,
    pub brightness: u32,
    pub resolution: u32,
    pub exposure: u32,
    pub metadata: u32,
}

impl Weights {
    /// The weight assigned to a given check kind.
    pub fn of(&self, kind: CheckKind) -> u32 {
        match kind {
            CheckKind::Blur => self.blur,
            CheckKind::Brightness => self.brightness,
            CheckKind::Resolution => self.resolution,
            CheckKind::Exposure => self.exposure,
            CheckKind::Metadata => self.metadata,
        }
    }

    /// Sum of all five weights.
    pub fn total(&self) -> u32 {
        self.blur + self.brightness + self.resolution + self.exposure + self.metadata
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            blur: 25,
            brightness: 20,
            resolution: 25,
            exposure: 15,
            metadata: 15,
        }
    }
}

/// Rectangular lat/lon boundary for the geofence warning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoBoundary {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBoundary {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.min_lat <= lat && lat <= self.max_lat && self.min_lon <= lon && lon <= self.max_lon
    }
}

/// Storage directories for the disposition router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Destination for images that pass validation.
    pub accepted_dir: PathBuf,
    /// Destination for images that fail validation.
    pub rejected_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            accepted_dir: PathBuf::from("storage/processed"),
            rejected_dir: PathBuf::from("storage/rejected"),
        }
    }
}

/// The six capture-metadata fields checked by default, in the fixed order
/// used for deterministic missing-field reporting.
pub const DEFAULT_REQUIRED_FIELDS: [&str; 6] = [
    "timestamp",
    "camera_make_model",
    "orientation",
    "iso",
    "shutter_speed",
    "aperture",
];

impl Default for RuleConfig {
    fn default() -> Self {
        Self::mobile()
    }
}

impl RuleConfig {
    /// The canonical, mobile-optimized profile. Wider brightness range and
    /// lower floors to accommodate varied phone cameras; the weighted
    /// 65%-pass scoring makes the individual thresholds soft rather than
    /// hard gates.
    pub fn mobile() -> Self {
        Self {
            blur: BlurRules {
                min_score: 100.0,
                excellent_level: 300.0,
                acceptable_level: 150.0,
            },
            brightness: BrightnessRules {
                range: [50.0, 220.0],
                min_quality_percent: 60.0,
            },
            resolution: ResolutionRules {
                min_width: 800,
                min_height: 600,
                min_megapixels: 0.5,
                recommended_megapixels: 2.0,
            },
            exposure: ExposureRules {
                min_dynamic_range: 100.0,
                acceptable_range: [80.0, 150.0],
                max_clipping_percent: 2.0,
            },
            metadata: MetadataRules {
                required_fields: DEFAULT_REQUIRED_FIELDS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                min_completeness_percent: 15.0,
            },
            weights: Weights::default(),
            boundary: Some(GeoBoundary {
                min_lat: 40.4774,
                max_lat: 40.9176,
                min_lon: -74.2591,
                max_lon: -73.7004,
            }),
            storage: StorageConfig::default(),
        }
    }

    /// The earlier, stricter profile (1024x1024 minimum, 90-180 brightness
    /// range). Kept as a named preset; weights and the pass cutoff stay the
    /// same as the canonical profile since the old one never specified them.
    pub fn strict() -> Self {
        Self {
            blur: BlurRules {
                min_score: 150.0,
                excellent_level: 300.0,
                acceptable_level: 150.0,
            },
            brightness: BrightnessRules {
                range: [90.0, 180.0],
                min_quality_percent: 70.0,
            },
            resolution: ResolutionRules {
                min_width: 1024,
                min_height: 1024,
                min_megapixels: 1.0,
                recommended_megapixels: 2.0,
            },
            exposure: ExposureRules {
                min_dynamic_range: 150.0,
                acceptable_range: [120.0, 150.0],
                max_clipping_percent: 1.0,
            },
            metadata: MetadataRules {
                required_fields: DEFAULT_REQUIRED_FIELDS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                min_completeness_percent: 30.0,
            },
            ..Self::mobile()
        }
    }

    /// Look up a preset by name (`"mobile"` or `"strict"`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "mobile" => Some(Self::mobile()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }

    /// Resolve the default rules file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("rules.json"))
    }

    /// Load rules from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Rules file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read rules file")?;
        let config: RuleConfig =
            serde_json::from_str(&contents).context("Failed to parse rules file")?;
        Ok(config)
    }

    /// Save rules to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize rules")?;
        std::fs::write(&config_path, contents).context("Failed to write rules file")?;
        log::info!("Rules saved to {}", config_path.display());
        Ok(())
    }
}
