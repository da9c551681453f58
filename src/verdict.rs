//! Weighted aggregation of the five check results into a single verdict.
//!
//! Failed checks earn partial credit proportional to how close they came
//! to their threshold, so one marginal failure does not sink an otherwise
//! good image. The overall score is the weight-normalized sum, and the
//! verdict passes at [`PASS_SCORE`] or better.

use serde::Serialize;

use crate::checks::{round_to, CheckKind, CheckStatus, Checks};
use crate::config::Weights;
use crate::detect::ContentCheck;

/// Minimum overall score for a passing verdict.
pub const PASS_SCORE: f64 = 65.0;

/// The complete validation result for one image.
///
/// Built once per evaluation and never mutated afterwards; serialize it
/// with `serde_json` for machine consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationVerdict {
    pub overall_status: CheckStatus,
    /// Weighted score, 0-100, rounded to one decimal.
    pub overall_score: f64,
    /// Number of checks that failed.
    pub issues_found: u32,
    /// Actionable advice for failed checks, deduplicated, in check order.
    pub recommendations: Vec<String>,
    /// Non-scoring advisories (geofence, content detection).
    pub warnings: Vec<String>,
    pub checks: Checks,
    pub content: ContentCheck,
}

impl ValidationVerdict {
    pub fn passed(&self) -> bool {
        self.overall_status.is_pass()
    }
}

/// Assemble a verdict from check results.
pub fn build_verdict(
    checks: Checks,
    weights: &Weights,
    warnings: Vec<String>,
    content: ContentCheck,
) -> ValidationVerdict {
    let (overall_score, overall_status) = aggregate(&checks, weights);
    let recommendations = recommendations(&checks);
    let issues_found = checks.failed_count();

    ValidationVerdict {
        overall_status,
        overall_score,
        issues_found,
        recommendations,
        warnings,
        checks,
        content,
    }
}

/// Weighted overall score and pass/fail status.
///
/// Each passing check contributes `weight x 100`; each failing check
/// contributes `weight x partial_score`. The result is normalized by the
/// weight sum and rounded to one decimal. A zero weight sum scores 0.
pub fn aggregate(checks: &Checks, weights: &Weights) -> (f64, CheckStatus) {
    let total = weights.total();
    if total == 0 {
        return (0.0, CheckStatus::Fail);
    }

    let mut sum = 0.0f64;
    for kind in CheckKind::ORDER {
        let weight = weights.of(kind) as f64;
        let credit = if checks.status_of(kind).is_pass() {
            100.0
        } else {
            partial_score(checks, kind)
        };
        sum += weight * credit;
    }

    let score = round_to(sum / total as f64, 1);
    (score, CheckStatus::from_bool(score >= PASS_SCORE))
}

/// Partial credit for a failed check, always in `[0, 100)`.
///
/// Each formula scales the check's own headline metric against its
/// threshold, with a floor for checks that produced nothing usable.
fn partial_score(checks: &Checks, kind: CheckKind) -> f64 {
    match kind {
        CheckKind::Blur => {
            let blur = &checks.blur;
            if blur.score > 0.0 && blur.threshold > 0.0 {
                (blur.score / blur.threshold * 80.0).min(80.0)
            } else {
                0.0
            }
        }
        CheckKind::Brightness => {
            let brightness = &checks.brightness;
            let [min, max] = brightness.range;
            let mean = brightness.mean_brightness;
            let distance = if mean < min {
                min - mean
            } else if mean > max {
                mean - max
            } else {
                // Inside the range but failed the quality gate.
                return 70.0;
            };
            (80.0 - distance / 50.0 * 50.0).max(30.0)
        }
        CheckKind::Resolution => {
            let mp = checks.resolution.megapixels;
            if mp >= 0.3 {
                (mp / 0.5 * 80.0).min(80.0)
            } else {
                20.0
            }
        }
        CheckKind::Exposure => {
            let exposure = &checks.exposure;
            if exposure.dynamic_range > 0.0 && exposure.threshold > 0.0 {
                (exposure.dynamic_range / exposure.threshold * 70.0).min(70.0)
            } else {
                30.0
            }
        }
        CheckKind::Metadata => (checks.metadata.completeness * 2.0).min(60.0),
    }
}

/// Advice for failed checks, walked in [`CheckKind::ORDER`] so the output
/// is deterministic. The exposure analyzer supplies its own advisories;
/// duplicates keep their first occurrence.
fn recommendations(checks: &Checks) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();
    let push = |recs: &mut Vec<String>, msg: String| {
        if !recs.contains(&msg) {
            recs.push(msg);
        }
    };

    for kind in CheckKind::ORDER {
        let failed = !checks.status_of(kind).is_pass();
        match kind {
            CheckKind::Blur if failed => {
                push(&mut recs, "Take a clearer photo with better focus".to_string());
            }
            CheckKind::Brightness if failed => {
                push(&mut recs, "Take photo in better lighting conditions".to_string());
            }
            CheckKind::Resolution if failed => {
                push(&mut recs, "Use higher resolution camera setting".to_string());
            }
            CheckKind::Exposure => {
                // Exposure advisories apply whether or not the check passed;
                // the all-clear message is not advice.
                for rec in &checks.exposure.recommendations {
                    if rec != "Exposure looks good" {
                        push(&mut recs, rec.clone());
                    }
                }
            }
            CheckKind::Metadata if failed => {
                push(&mut recs, "Ensure camera metadata is enabled".to_string());
            }
            _ => {}
        }
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{
        BlurCheck, BrightnessCheck, ExposureCheck, MetadataCheck, ResolutionCheck,
    };
    use crate::config::{MetadataRules, ResolutionRules, DEFAULT_REQUIRED_FIELDS};

    fn metadata_rules() -> MetadataRules {
        MetadataRules {
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_completeness_percent: 15.0,
        }
    }

    fn resolution_rules() -> ResolutionRules {
        ResolutionRules {
            min_width: 800,
            min_height: 600,
            min_megapixels: 0.5,
            recommended_megapixels: 2.0,
        }
    }

    fn pass_blur() -> BlurCheck {
        BlurCheck {
            status: CheckStatus::Pass,
            score: 250.0,
            quality_level: "acceptable",
            confidence: 2.0,
            reason: "Image sharpness is acceptable".to_string(),
            ..BlurCheck::failed(100.0, "")
        }
    }

    fn pass_brightness() -> BrightnessCheck {
        BrightnessCheck {
            status: CheckStatus::Pass,
            mean_brightness: 128.0,
            std_brightness: 64.0,
            quality_percent: 100.0,
            quality_level: "excellent",
            reason: "Brightness is within the acceptable range".to_string(),
            ..BrightnessCheck::failed([50.0, 220.0], "")
        }
    }

    fn pass_resolution() -> ResolutionCheck {
        ResolutionCheck {
            status: CheckStatus::Pass,
            width: 1920,
            height: 1080,
            megapixels: 2.07,
            aspect_ratio: 1.78,
            quality_tier: "High",
            is_high_resolution: true,
            reason: "Resolution meets the minimum requirements".to_string(),
            ..ResolutionCheck::failed(&resolution_rules(), "")
        }
    }

    fn pass_exposure() -> ExposureCheck {
        ExposureCheck {
            status: CheckStatus::Pass,
            dynamic_range: 200.0,
            meets_min_score: true,
            has_good_exposure: true,
            exposure_quality: "excellent",
            quality_level: "excellent",
            recommendations: vec!["Exposure looks good".to_string()],
            reason: "Exposure and dynamic range are excellent".to_string(),
            ..ExposureCheck::failed(100.0, "")
        }
    }

    fn pass_metadata() -> MetadataCheck {
        MetadataCheck {
            status: CheckStatus::Pass,
            completeness: 100.0,
            found_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            missing_fields: Vec::new(),
            quality_level: "excellent",
            reason: "Sufficient metadata extracted".to_string(),
            ..MetadataCheck::failed(&metadata_rules(), "")
        }
    }

    fn all_pass() -> Checks {
        Checks {
            blur: pass_blur(),
            brightness: pass_brightness(),
            resolution: pass_resolution(),
            exposure: pass_exposure(),
            metadata: pass_metadata(),
        }
    }

    fn no_content() -> ContentCheck {
        ContentCheck::Unavailable {
            reason: "no detector configured".to_string(),
        }
    }

    // ── aggregate ────────────────────────────────────────────────────

    #[test]
    fn all_passing_checks_score_100() {
        let (score, status) = aggregate(&all_pass(), &Weights::default());
        assert_eq!(score, 100.0);
        assert!(status.is_pass());
    }

    #[test]
    fn all_failing_zero_metric_checks_score_at_floor() {
        let checks = Checks {
            blur: BlurCheck::failed(100.0, "x"),
            brightness: BrightnessCheck::failed([50.0, 220.0], "x"),
            resolution: ResolutionCheck::failed(&resolution_rules(), "x"),
            exposure: ExposureCheck::failed(100.0, "x"),
            metadata: MetadataCheck::failed(&metadata_rules(), "x"),
        };
        // blur 0, brightness 30 (mean 0 is 50 below the range), resolution
        // 20, exposure 30, metadata 0 -> (600 + 500 + 450) / 100.
        let (score, status) = aggregate(&checks, &Weights::default());
        assert_eq!(score, 15.5);
        assert!(!status.is_pass());
        assert_eq!(checks.failed_count(), 5);
    }

    #[test]
    fn missing_metadata_alone_scores_85() {
        let checks = Checks {
            metadata: MetadataCheck::failed(&metadata_rules(), "no EXIF"),
            ..all_pass()
        };
        let (score, status) = aggregate(&checks, &Weights::default());
        assert_eq!(score, 85.0);
        assert!(status.is_pass());
    }

    #[test]
    fn brightness_partial_uses_distance_from_range() {
        // Mean 20 with range [50, 220]: distance 30 -> 80 - 30 = 50.
        let checks = Checks {
            brightness: BrightnessCheck {
                mean_brightness: 20.0,
                too_dark: true,
                ..BrightnessCheck::failed([50.0, 220.0], "too dark")
            },
            ..all_pass()
        };
        assert_eq!(partial_score(&checks, CheckKind::Brightness), 50.0);
        let (score, _) = aggregate(&checks, &Weights::default());
        assert_eq!(score, 90.0);
    }

    #[test]
    fn brightness_inside_range_quality_failure_gets_70() {
        let checks = Checks {
            brightness: BrightnessCheck {
                mean_brightness: 128.0,
                ..BrightnessCheck::failed([50.0, 220.0], "flat")
            },
            ..all_pass()
        };
        assert_eq!(partial_score(&checks, CheckKind::Brightness), 70.0);
    }

    #[test]
    fn partial_scores_stay_below_100() {
        // Metrics far past their thresholds still cap below a pass.
        let checks = Checks {
            blur: BlurCheck {
                score: 10_000.0,
                ..BlurCheck::failed(100.0, "x")
            },
            brightness: BrightnessCheck {
                mean_brightness: 221.0,
                ..BrightnessCheck::failed([50.0, 220.0], "x")
            },
            resolution: ResolutionCheck {
                megapixels: 50.0,
                ..ResolutionCheck::failed(&resolution_rules(), "x")
            },
            exposure: ExposureCheck {
                dynamic_range: 255.0,
                ..ExposureCheck::failed(100.0, "x")
            },
            metadata: MetadataCheck {
                completeness: 100.0,
                ..MetadataCheck::failed(&metadata_rules(), "x")
            },
        };
        for kind in CheckKind::ORDER {
            let partial = partial_score(&checks, kind);
            assert!(
                (0.0..100.0).contains(&partial),
                "{}: {partial}",
                kind.name()
            );
        }
    }

    #[test]
    fn exactly_65_passes() {
        // One zero-credit failure weighted at 35 leaves exactly 65.
        let weights = Weights {
            blur: 35,
            brightness: 20,
            resolution: 25,
            exposure: 10,
            metadata: 10,
        };
        let checks = Checks {
            blur: BlurCheck::failed(100.0, "x"),
            ..all_pass()
        };
        let (score, status) = aggregate(&checks, &weights);
        assert_eq!(score, 65.0);
        assert!(status.is_pass());
    }

    #[test]
    fn zero_weight_sum_scores_zero() {
        let weights = Weights {
            blur: 0,
            brightness: 0,
            resolution: 0,
            exposure: 0,
            metadata: 0,
        };
        let (score, status) = aggregate(&all_pass(), &weights);
        assert_eq!(score, 0.0);
        assert!(!status.is_pass());
    }

    #[test]
    fn aggregate_is_deterministic() {
        let checks = Checks {
            metadata: MetadataCheck::failed(&metadata_rules(), "no EXIF"),
            ..all_pass()
        };
        let first = aggregate(&checks, &Weights::default());
        let second = aggregate(&checks, &Weights::default());
        assert_eq!(first, second);
    }

    // ── build_verdict ────────────────────────────────────────────────

    #[test]
    fn clean_verdict_has_no_recommendations() {
        let verdict = build_verdict(all_pass(), &Weights::default(), Vec::new(), no_content());
        assert!(verdict.passed());
        assert_eq!(verdict.overall_score, 100.0);
        assert_eq!(verdict.issues_found, 0);
        assert!(verdict.recommendations.is_empty());
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn failed_checks_produce_ordered_recommendations() {
        let checks = Checks {
            blur: BlurCheck::failed(100.0, "x"),
            resolution: ResolutionCheck::failed(&resolution_rules(), "x"),
            metadata: MetadataCheck::failed(&metadata_rules(), "x"),
            ..all_pass()
        };
        let verdict = build_verdict(checks, &Weights::default(), Vec::new(), no_content());
        assert_eq!(verdict.issues_found, 3);
        assert_eq!(
            verdict.recommendations,
            vec![
                "Take a clearer photo with better focus",
                "Use higher resolution camera setting",
                "Ensure camera metadata is enabled"
            ]
        );
    }

    #[test]
    fn exposure_advisories_flow_through_even_on_pass() {
        let checks = Checks {
            exposure: ExposureCheck {
                status: CheckStatus::Pass,
                recommendations: vec![
                    "Decrease exposure or use graduated filter to recover highlights"
                        .to_string(),
                ],
                ..pass_exposure()
            },
            ..all_pass()
        };
        let verdict = build_verdict(checks, &Weights::default(), Vec::new(), no_content());
        assert_eq!(verdict.issues_found, 0);
        assert_eq!(
            verdict.recommendations,
            vec!["Decrease exposure or use graduated filter to recover highlights"]
        );
    }

    #[test]
    fn duplicate_recommendations_keep_first_occurrence() {
        let checks = Checks {
            exposure: ExposureCheck {
                recommendations: vec![
                    "Image is underexposed - increase brightness or use flash".to_string(),
                    "Image is underexposed - increase brightness or use flash".to_string(),
                ],
                ..ExposureCheck::failed(100.0, "x")
            },
            ..all_pass()
        };
        let verdict = build_verdict(checks, &Weights::default(), Vec::new(), no_content());
        let underexposed: Vec<_> = verdict
            .recommendations
            .iter()
            .filter(|r| r.contains("underexposed"))
            .collect();
        assert_eq!(underexposed.len(), 1);
    }

    #[test]
    fn warnings_are_carried_verbatim() {
        let verdict = build_verdict(
            all_pass(),
            &Weights::default(),
            vec!["Outside configured boundaries".to_string()],
            no_content(),
        );
        assert!(verdict.passed());
        assert_eq!(verdict.warnings, vec!["Outside configured boundaries"]);
    }

    #[test]
    fn verdict_serializes_to_json() {
        let verdict = build_verdict(all_pass(), &Weights::default(), Vec::new(), no_content());
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["overall_status"], "pass");
        assert_eq!(json["overall_score"], 100.0);
        assert_eq!(json["checks"]["blur"]["status"], "pass");
        assert_eq!(json["content"]["availability"], "unavailable");
    }
}
