//! Per-image evaluation pipeline and disposition routing.

use chrono::Local;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::checks::{
    blur, brightness, exposure, metadata, resolution, BlurCheck, BrightnessCheck, CheckStatus,
    Checks, ExposureCheck, MetadataCheck, ResolutionCheck,
};
use crate::config::{RuleConfig, StorageConfig};
use crate::detect::{ContentCheck, ContentDetector};
use crate::error::EngineError;
use crate::verdict::{build_verdict, ValidationVerdict};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Evaluate a single image against the rules.
///
/// The only error is a nonexistent path. A file that exists but cannot be
/// decoded produces a failing verdict with the load error as every check's
/// reason, so batch callers never lose an entry mid-run.
pub fn evaluate(path: &Path, rules: &RuleConfig) -> Result<ValidationVerdict, EngineError> {
    evaluate_with_detector(path, rules, None)
}

/// [`evaluate`], additionally consulting a content detector.
///
/// Detector failures degrade to [`ContentCheck::Unavailable`] and never
/// affect the score or the pass/fail outcome.
pub fn evaluate_with_detector(
    path: &Path,
    rules: &RuleConfig,
    detector: Option<&dyn ContentDetector>,
) -> Result<ValidationVerdict, EngineError> {
    if !path.exists() {
        return Err(EngineError::NotFound {
            path: path.to_path_buf(),
        });
    }

    log::debug!("Evaluating {}", path.display());

    // Decode once; blur, brightness, and exposure share the grayscale.
    let gray = match image::open(path) {
        Ok(img) => img.to_luma8(),
        Err(e) => {
            log::warn!("Failed to load {}: {e}", path.display());
            return Ok(load_failure_verdict(rules, &e.to_string()));
        }
    };

    let checks = Checks {
        blur: blur::analyze(&gray, &rules.blur),
        brightness: brightness::analyze(&gray, &rules.brightness),
        resolution: resolution::analyze(path, &rules.resolution),
        exposure: exposure::analyze(&gray, &rules.exposure),
        metadata: metadata::analyze(path, &rules.metadata),
    };

    let mut warnings = Vec::new();

    if let Some(boundary) = &rules.boundary {
        let location = metadata::locate(&checks.metadata.capture, boundary);
        if !location.within_boundaries {
            warnings.push(location.reason);
        }
    }

    let content = match detector {
        None => ContentCheck::Unavailable {
            reason: "no detector configured".to_string(),
        },
        Some(detector) => match detector.detect(path) {
            Ok(signal) => ContentCheck::Detected(signal),
            Err(e) => {
                log::warn!("Content detector '{}' failed: {e}", detector.name());
                ContentCheck::Unavailable {
                    reason: e.to_string(),
                }
            }
        },
    };
    if let Some(warning) = content.warning() {
        warnings.push(warning);
    }

    Ok(build_verdict(checks, &rules.weights, warnings, content))
}

/// The verdict for a file that exists but could not be decoded: a single
/// issue, zero score, and the load error on every check.
fn load_failure_verdict(rules: &RuleConfig, error: &str) -> ValidationVerdict {
    let reason = format!("Failed to load image: {error}");
    ValidationVerdict {
        overall_status: CheckStatus::Fail,
        overall_score: 0.0,
        issues_found: 1,
        recommendations: vec!["Please try uploading the image again".to_string()],
        warnings: Vec::new(),
        checks: Checks {
            blur: BlurCheck::failed(rules.blur.min_score, reason.clone()),
            brightness: BrightnessCheck::failed(rules.brightness.range, reason.clone()),
            resolution: ResolutionCheck::failed(&rules.resolution, reason.clone()),
            exposure: ExposureCheck::failed(rules.exposure.min_dynamic_range, reason.clone()),
            metadata: MetadataCheck::failed(&rules.metadata, reason),
        },
        content: ContentCheck::Unavailable {
            reason: "image could not be loaded".to_string(),
        },
    }
}

/// Collect image paths from a mix of files and directories.
///
/// Directories are walked recursively (following symlinks); only files
/// with supported image extensions are included.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Move an evaluated image into its disposition directory.
///
/// Passing verdicts go to the accepted directory, failing verdicts to the
/// rejected one. The destination name is prefixed with the current local
/// time so repeated uploads of the same filename never collide. Falls back
/// to copy-and-remove when a plain rename fails (cross-device moves).
pub fn route(
    path: &Path,
    verdict: &ValidationVerdict,
    storage: &StorageConfig,
) -> Result<PathBuf, EngineError> {
    let dest_dir = if verdict.passed() {
        &storage.accepted_dir
    } else {
        &storage.rejected_dir
    };

    let route_err = |source: std::io::Error| EngineError::Route {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dest_dir).map_err(route_err)?;

    let original = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dest = dest_dir.join(format!("{stamp}_{original}"));

    if std::fs::rename(path, &dest).is_err() {
        std::fs::copy(path, &dest).map_err(route_err)?;
        std::fs::remove_file(path).map_err(route_err)?;
    }

    log::info!("Routed {} -> {}", path.display(), dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> RuleConfig {
        RuleConfig::mobile()
    }

    /// A sharp, well-lit 1900x1080 synthetic: checkerboard of 60 and 160.
    /// Passes everything except metadata (no EXIF in a bare PNG).
    fn write_good_png(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let img = GrayImage::from_fn(1900, 1080, |x, y| {
            if (x + y) % 2 == 0 { Luma([60u8]) } else { Luma([160u8]) }
        });
        img.save(&path).unwrap();
        path
    }

    // ── evaluate ─────────────────────────────────────────────────────

    #[test]
    fn good_image_without_exif_fails_only_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_good_png(&dir, "good.png");

        let verdict = evaluate(&path, &rules()).unwrap();
        assert!(verdict.checks.blur.status.is_pass());
        assert!(verdict.checks.brightness.status.is_pass());
        assert!(verdict.checks.resolution.status.is_pass());
        assert!(verdict.checks.exposure.status.is_pass());
        assert!(!verdict.checks.metadata.status.is_pass());

        // 85 of 100 weighted points survive the metadata failure.
        assert_eq!(verdict.overall_score, 85.0);
        assert!(verdict.passed());
        assert_eq!(verdict.issues_found, 1);
        assert_eq!(
            verdict.recommendations,
            vec!["Ensure camera metadata is enabled"]
        );
        // The default profile carries a geofence; no GPS means a warning.
        assert!(verdict
            .warnings
            .iter()
            .any(|w| w == "No GPS data available"));
    }

    #[test]
    fn dark_image_fails_brightness_with_partial_credit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dark.png");
        GrayImage::from_pixel(900, 700, Luma([20u8]))
            .save(&path)
            .unwrap();

        let verdict = evaluate(&path, &rules()).unwrap();
        assert!(verdict.checks.brightness.too_dark);
        assert!(!verdict.checks.brightness.status.is_pass());
        assert!(verdict.checks.resolution.status.is_pass());
        // blur 0, brightness 50 (30 below the range floor), resolution
        // pass, exposure 30, metadata 0.
        assert_eq!(verdict.overall_score, 39.5);
        assert!(!verdict.passed());
    }

    #[test]
    fn small_image_fails_resolution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.png");
        GrayImage::from_pixel(400, 300, Luma([128u8]))
            .save(&path)
            .unwrap();

        let verdict = evaluate(&path, &rules()).unwrap();
        assert!(!verdict.checks.resolution.status.is_pass());
        assert_eq!(verdict.checks.resolution.megapixels, 0.12);
        assert!(verdict
            .recommendations
            .iter()
            .any(|r| r == "Use higher resolution camera setting"));
    }

    #[test]
    fn corrupt_file_yields_zero_score_verdict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let verdict = evaluate(&path, &rules()).unwrap();
        assert!(!verdict.passed());
        assert_eq!(verdict.overall_score, 0.0);
        assert_eq!(verdict.issues_found, 1);
        assert!(verdict
            .checks
            .blur
            .reason
            .starts_with("Failed to load image:"));
        assert!(verdict
            .checks
            .metadata
            .reason
            .starts_with("Failed to load image:"));
        assert_eq!(
            verdict.recommendations,
            vec!["Please try uploading the image again"]
        );
    }

    #[test]
    fn missing_file_is_the_only_error() {
        let err = evaluate(Path::new("/nonexistent/photo.jpg"), &rules()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_good_png(&dir, "same.png");

        let first = serde_json::to_string(&evaluate(&path, &rules()).unwrap()).unwrap();
        let second = serde_json::to_string(&evaluate(&path, &rules()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    // ── evaluate_with_detector ───────────────────────────────────────

    struct FixedDetector {
        relevant: bool,
    }

    impl ContentDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(&self, _path: &Path) -> anyhow::Result<crate::detect::ContentSignal> {
            Ok(crate::detect::ContentSignal {
                has_relevant_content: self.relevant,
                object_count: if self.relevant { 2 } else { 0 },
                summary: "storefront scan".to_string(),
            })
        }
    }

    struct BrokenDetector;

    impl ContentDetector for BrokenDetector {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _path: &Path) -> anyhow::Result<crate::detect::ContentSignal> {
            anyhow::bail!("model not loaded")
        }
    }

    #[test]
    fn missing_content_adds_warning_without_affecting_score() {
        let dir = TempDir::new().unwrap();
        let path = write_good_png(&dir, "content.png");

        let plain = evaluate(&path, &rules()).unwrap();
        let flagged =
            evaluate_with_detector(&path, &rules(), Some(&FixedDetector { relevant: false }))
                .unwrap();

        assert_eq!(plain.overall_score, flagged.overall_score);
        assert!(flagged
            .warnings
            .iter()
            .any(|w| w.starts_with("No relevant content detected")));
    }

    #[test]
    fn detector_error_degrades_to_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write_good_png(&dir, "broken.png");

        let verdict = evaluate_with_detector(&path, &rules(), Some(&BrokenDetector)).unwrap();
        assert!(matches!(
            verdict.content,
            ContentCheck::Unavailable { ref reason } if reason == "model not loaded"
        ));
        assert_eq!(verdict.overall_score, 85.0);
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()]);
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        let images = collect_images(&[txt]);
        assert!(images.is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.png"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")]);
        assert!(images.is_empty());
    }

    // ── route ────────────────────────────────────────────────────────

    #[test]
    fn failing_verdict_routes_to_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blurry.png");
        GrayImage::from_pixel(16, 16, Luma([128u8]))
            .save(&path)
            .unwrap();

        let storage = StorageConfig {
            accepted_dir: dir.path().join("accepted"),
            rejected_dir: dir.path().join("rejected"),
        };

        let verdict = evaluate(&path, &rules()).unwrap();
        assert!(!verdict.passed());

        let dest = route(&path, &verdict, &storage).unwrap();
        assert!(dest.starts_with(&storage.rejected_dir));
        assert!(dest.exists());
        assert!(!path.exists());
        // 15-char timestamp prefix plus underscore before the original name.
        let name = dest.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_blurry.png"));
        assert_eq!(name.len(), "YYYYmmdd_HHMMSS_blurry.png".len());
    }

    #[test]
    fn passing_verdict_routes_to_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.png");
        GrayImage::from_pixel(16, 16, Luma([128u8]))
            .save(&path)
            .unwrap();

        let storage = StorageConfig {
            accepted_dir: dir.path().join("accepted"),
            rejected_dir: dir.path().join("rejected"),
        };

        let mut verdict = evaluate(&path, &rules()).unwrap();
        verdict.overall_status = CheckStatus::Pass;

        let dest = route(&path, &verdict, &storage).unwrap();
        assert!(dest.starts_with(&storage.accepted_dir));
        assert!(!storage.rejected_dir.exists());
    }

    #[test]
    fn routing_a_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.png");
        GrayImage::from_pixel(16, 16, Luma([128u8]))
            .save(&path)
            .unwrap();

        let storage = StorageConfig {
            accepted_dir: dir.path().join("accepted"),
            rejected_dir: dir.path().join("rejected"),
        };
        let verdict = evaluate(&path, &rules()).unwrap();
        fs::remove_file(&path).unwrap();

        let err = route(&path, &verdict, &storage).unwrap_err();
        assert!(matches!(err, EngineError::Route { .. }));
    }
}
