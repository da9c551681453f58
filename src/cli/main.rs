use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use photo_gate::checks::CheckKind;
use photo_gate::{config, pipeline, ValidationVerdict};

#[derive(Parser, Debug)]
#[command(
    name = "photo-gate",
    version,
    about = "Rule-based image quality gate — score uploads on sharpness, brightness, resolution, exposure, and metadata"
)]
struct Cli {
    /// Image files or directories to validate
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to rules file (default: rules.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a named rule preset instead of a rules file
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Initialize a default rules.json and exit
    #[arg(long)]
    init: bool,

    /// Output verdicts as JSON
    #[arg(long)]
    json: bool,

    /// Move images into accepted/rejected directories after scoring
    #[arg(long = "move")]
    apply_move: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let rules = config::RuleConfig::default();
        let path = cli.config.as_deref();
        rules.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::RuleConfig::config_path()?,
        };
        println!("Default rules written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    // Load rules: preset wins over file
    let rules = match cli.preset.as_deref() {
        Some(name) => config::RuleConfig::preset(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset '{name}' (try: mobile, strict)"))?,
        None => config::RuleConfig::load(cli.config.as_deref())?,
    };

    // Collect images
    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    log::info!("Found {} image(s) to validate", images.len());

    let total = images.len();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut verdicts: Vec<(PathBuf, ValidationVerdict)> = Vec::new();

    for (i, image_path) in images.iter().enumerate() {
        log::info!("[{}/{}] Validating: {}", i + 1, total, image_path.display());

        let verdict = pipeline::evaluate(image_path, &rules)?;

        if !cli.json {
            print_verdict(&verdict);
        }

        if verdict.passed() {
            accepted += 1;
        } else {
            rejected += 1;
        }

        if cli.apply_move {
            let dest = pipeline::route(image_path, &verdict, &rules.storage)?;
            log::info!("  Moved to {}", dest.display());
        }

        verdicts.push((image_path.clone(), verdict));
    }

    // JSON output
    if cli.json {
        let json_results: Vec<serde_json::Value> = verdicts
            .iter()
            .map(|(path, verdict)| {
                serde_json::json!({
                    "path": path.display().to_string(),
                    "verdict": verdict,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    // Summary
    log::info!("Done: {accepted} accepted, {rejected} rejected out of {total} images");

    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print a per-check report for one verdict.
fn print_verdict(verdict: &ValidationVerdict) {
    println!();
    println!("  {BOLD}Quality Report:{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(72));

    for kind in CheckKind::ORDER {
        let (status, detail) = match kind {
            CheckKind::Blur => (
                verdict.checks.blur.status,
                format!(
                    "score {:.1} (min {:.0})",
                    verdict.checks.blur.score, verdict.checks.blur.threshold
                ),
            ),
            CheckKind::Brightness => (
                verdict.checks.brightness.status,
                format!(
                    "mean {:.1}, quality {:.0}%",
                    verdict.checks.brightness.mean_brightness,
                    verdict.checks.brightness.quality_percent
                ),
            ),
            CheckKind::Resolution => (
                verdict.checks.resolution.status,
                format!(
                    "{}x{} ({:.2} MP)",
                    verdict.checks.resolution.width,
                    verdict.checks.resolution.height,
                    verdict.checks.resolution.megapixels
                ),
            ),
            CheckKind::Exposure => (
                verdict.checks.exposure.status,
                format!(
                    "dynamic range {:.0}, {}",
                    verdict.checks.exposure.dynamic_range, verdict.checks.exposure.exposure_quality
                ),
            ),
            CheckKind::Metadata => (
                verdict.checks.metadata.status,
                format!("{:.0}% complete", verdict.checks.metadata.completeness),
            ),
        };

        let badge = if status.is_pass() {
            format!("{GREEN}PASS{RESET}")
        } else {
            format!("{RED}FAIL{RESET}")
        };
        println!("  {badge}  {:<12} {DIM}{detail}{RESET}", kind.name());
    }

    println!("  {DIM}{}{RESET}", "─".repeat(72));

    let summary = if verdict.passed() {
        format!("{GREEN}{BOLD}ACCEPTED{RESET}")
    } else {
        format!("{RED}{BOLD}REJECTED{RESET}")
    };
    println!("  {summary}  overall score {:.1}", verdict.overall_score);

    for rec in &verdict.recommendations {
        println!("  {YELLOW}•{RESET} {rec}");
    }
    for warning in &verdict.warnings {
        println!("  {YELLOW}!{RESET} {DIM}{warning}{RESET}");
    }
    println!();
}
