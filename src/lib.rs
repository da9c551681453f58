//! # photo-gate
//!
//! Rule-based image quality validation — scores uploads on sharpness, brightness,
//! resolution, exposure, and capture metadata, then accepts or rejects them against
//! a weighted quality bar.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through the pipeline module, which handles
//! the full decode → analyze → score flow for one image:
//!
//! ```rust,no_run
//! use photo_gate::config::RuleConfig;
//! use photo_gate::pipeline::{collect_images, evaluate, route};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load rules from file (thresholds, weights, storage dirs)
//!     let rules = RuleConfig::load(Some("rules.json".as_ref()))?;
//!
//!     // Collect supported image files from paths (files or directories)
//!     let images = collect_images(&[PathBuf::from("./uploads")]);
//!
//!     for path in &images {
//!         let verdict = evaluate(path, &rules)?;
//!         println!(
//!             "{}: {} ({:.1}%)",
//!             path.display(),
//!             if verdict.passed() { "accepted" } else { "rejected" },
//!             verdict.overall_score
//!         );
//!
//!         // Move the file into its accepted/rejected directory
//!         let dest = route(path, &verdict, &rules.storage)?;
//!         println!("  -> {}", dest.display());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! Each analyzer is a standalone function over decoded pixels (or the file
//! itself), and the aggregator can be driven directly:
//!
//! ```rust,no_run
//! use photo_gate::checks::{blur, brightness};
//! use photo_gate::config::RuleConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let rules = RuleConfig::default();
//!     let gray = image::open("photo.jpg")?.to_luma8();
//!
//!     let sharpness = blur::analyze(&gray, &rules.blur);
//!     println!("Laplacian variance: {}", sharpness.score);
//!
//!     let light = brightness::analyze(&gray, &rules.brightness);
//!     println!("Mean brightness: {}", light.mean_brightness);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Scoring
//!
//! | Check | Weight | Passing means |
//! |------------|--------|----------------------------------------------|
//! | blur | 25 | Laplacian variance at or above the threshold |
//! | brightness | 20 | Mean intensity in range, quality floor met |
//! | resolution | 25 | Minimum dimensions and megapixels met |
//! | exposure | 15 | Dynamic range past the bar or in the band |
//! | metadata | 15 | Enough required EXIF fields present |
//!
//! Failed checks earn partial credit, and the verdict passes at an overall
//! score of 65 or better.
//!
//! ## Modules
//!
//! - [`checks`] — The five quality analyzers and their result types
//! - [`config`] — Rule configuration, presets, and loading/saving
//! - [`detect`] — Optional content-detection collaborator seam
//! - [`pipeline`] — Evaluation pipeline, image collection, disposition routing
//! - [`verdict`] — Weighted aggregation into the final verdict

pub mod checks;
pub mod config;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod verdict;

pub use config::RuleConfig;
pub use detect::{ContentCheck, ContentDetector, ContentSignal};
pub use error::EngineError;
pub use pipeline::{evaluate, evaluate_with_detector, route};
pub use verdict::{ValidationVerdict, PASS_SCORE};
