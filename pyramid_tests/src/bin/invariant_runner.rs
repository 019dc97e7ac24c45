//! Invariant runner with JSON report generation.
//!
//! Regenerates many seeded pyramids, checks every geometric invariant on each
//! one, prints a summary, and writes `invariants.json` to the output
//! directory.
//!
//! Usage:
//!   cargo run -p pyramid_tests --bin invariant_runner -- [out_dir] [--runs 256] [--seed 1]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use pyramid_shared::basis::generate;
use pyramid_shared::config::{GeneratorConfig, V3_FRAC_RANGE};
use pyramid_shared::math::Vec3;
use pyramid_shared::metrics::{compute_metrics, PyramidMetrics};
use pyramid_shared::pyramid::{step_count_for, PyramidSpec};
use pyramid_shared::wireframe::{compute_wireframe, SEGMENTS_PER_STEP};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

const ORTHO_TOL: f32 = 1e-4;
const SUM_TOL: f64 = 1e-9;

/// One failed check.
#[derive(Debug, Serialize)]
struct Failure {
    run: u32,
    check: &'static str,
    detail: String,
}

/// Per-check pass/fail counts.
#[derive(Debug, Default, Serialize)]
struct CheckStats {
    id: &'static str,
    name: &'static str,
    passed: u32,
    failed: u32,
}

#[derive(Debug, Serialize)]
struct InvariantReport {
    runs: u32,
    base_seed: u64,
    checks: Vec<CheckStats>,
    failures: Vec<Failure>,
    duration_ms: u128,
    /// Metrics of the first generated pyramid, for eyeballing.
    sample: Option<PyramidMetrics>,
}

impl InvariantReport {
    fn failed(&self) -> u32 {
        self.checks.iter().map(|c| c.failed).sum()
    }

    fn passed(&self) -> u32 {
        self.checks.iter().map(|c| c.passed).sum()
    }
}

type Check = fn(&PyramidSpec) -> Result<(), String>;

const CHECKS: &[(&str, &str, Check)] = &[
    ("INV-001", "Orthogonal basis", check_orthogonal),
    ("INV-002", "Step count formula", check_step_count),
    ("INV-003", "Totals equal step sums", check_totals),
    ("INV-004", "Bottom face and top occlusion", check_end_steps),
    ("INV-005", "Twelve segments per step", check_segment_count),
    ("INV-006", "Idempotent derivation", check_idempotent),
];

fn cos_between(a: Vec3, b: Vec3) -> f32 {
    a.dot(b).abs() / (a.length() * b.length())
}

fn check_orthogonal(spec: &PyramidSpec) -> Result<(), String> {
    for (name, a, b) in [("v1.v2", spec.v1, spec.v2), ("v1.v3", spec.v1, spec.v3), ("v2.v3", spec.v2, spec.v3)] {
        let c = cos_between(a, b);
        if c >= ORTHO_TOL {
            return Err(format!("{} cosine {}", name, c));
        }
    }
    Ok(())
}

fn check_step_count(spec: &PyramidSpec) -> Result<(), String> {
    let expected = step_count_for(spec.v1.length(), spec.v3.length());
    if spec.step_count == 0 || spec.step_count != expected {
        return Err(format!("step_count {} expected {}", spec.step_count, expected));
    }
    Ok(())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= SUM_TOL * b.abs().max(1.0)
}

fn check_totals(spec: &PyramidSpec) -> Result<(), String> {
    let m = compute_metrics(spec);
    let volume: f64 = m.steps.iter().map(|s| s.volume).sum();
    let area: f64 = m.steps.iter().map(|s| s.area).sum();
    let perimeter: f64 = m.steps.iter().map(|s| s.perimeter).sum();
    if !close(m.total_volume, volume) {
        return Err(format!("volume {} vs {}", m.total_volume, volume));
    }
    if !close(m.total_area, area) {
        return Err(format!("area {} vs {}", m.total_area, area));
    }
    if !close(m.total_perimeter, perimeter) {
        return Err(format!("perimeter {} vs {}", m.total_perimeter, perimeter));
    }
    Ok(())
}

fn check_end_steps(spec: &PyramidSpec) -> Result<(), String> {
    let m = compute_metrics(spec);
    let (Some(first), Some(last)) = (m.steps.first(), m.steps.last()) else {
        return Err("no steps".to_string());
    };
    if last.occluded_area != 0.0 {
        return Err(format!("last step occludes {}", last.occluded_area));
    }
    let sides = 2.0 * first.width * first.height + 2.0 * first.length * first.height;
    let expected = sides + 2.0 * first.width * first.length - first.occluded_area;
    if !close(first.area, expected) {
        return Err(format!("step 0 area {} expected {}", first.area, expected));
    }
    Ok(())
}

fn check_segment_count(spec: &PyramidSpec) -> Result<(), String> {
    let n = compute_wireframe(spec, Vec3::ZERO).segments().count();
    let expected = spec.step_count as usize * SEGMENTS_PER_STEP;
    if n != expected {
        return Err(format!("{} segments, expected {}", n, expected));
    }
    Ok(())
}

fn check_idempotent(spec: &PyramidSpec) -> Result<(), String> {
    if compute_metrics(spec) != compute_metrics(spec) {
        return Err("metrics differ between runs".to_string());
    }
    let wf = compute_wireframe(spec, Vec3::ZERO);
    if !wf.segments().eq(wf.segments()) {
        return Err("wireframe differs between runs".to_string());
    }
    Ok(())
}

fn check_degenerate() -> Result<(), String> {
    let empty = PyramidSpec::EMPTY;
    if !compute_metrics(&empty).is_empty() || !compute_wireframe(&empty, Vec3::ZERO).is_empty() {
        return Err("degenerate spec produced geometry".to_string());
    }
    Ok(())
}

/// Degenerate input must produce nothing and never panic. Runs once, after the seeded runs.
fn run_degenerate_check(run: u32, failures: &mut Vec<Failure>) -> CheckStats {
    record_degenerate(run, check_degenerate(), failures)
}

fn record_degenerate(run: u32, outcome: Result<(), String>, failures: &mut Vec<Failure>) -> CheckStats {
    let mut stats = CheckStats {
        id: "INV-007",
        name: "Degenerate spec is empty",
        ..CheckStats::default()
    };
    match outcome {
        Ok(()) => stats.passed += 1,
        Err(detail) => {
            warn!(check = stats.id, detail = %detail, "Invariant violated");
            stats.failed += 1;
            failures.push(Failure { run, check: stats.id, detail });
        }
    }
    stats
}

fn parse_args() -> anyhow::Result<(PathBuf, u32, u64)> {
    let args: Vec<String> = std::env::args().collect();
    let mut out_dir = PathBuf::from("test-reports");
    let mut runs = 256;
    let mut seed = 1;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" if i + 1 < args.len() => {
                runs = args[i + 1].parse().context("--runs")?;
                i += 2;
            }
            "--seed" if i + 1 < args.len() => {
                seed = args[i + 1].parse().context("--seed")?;
                i += 2;
            }
            other => {
                out_dir = PathBuf::from(other);
                i += 1;
            }
        }
    }
    Ok((out_dir, runs, seed))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (output_dir, runs, base_seed) = parse_args()?;
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;

    println!("Pyramid Invariant Runner");
    println!("========================\n");

    let mut checks: Vec<CheckStats> = CHECKS
        .iter()
        .map(|&(id, name, _)| CheckStats {
            id,
            name,
            ..CheckStats::default()
        })
        .collect();
    let mut failures = Vec::new();
    let mut sample = None;

    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(base_seed);
    let mut previous_v1 = Vec3::ZERO;

    for run in 0..runs {
        let cfg = GeneratorConfig {
            v3_frac: rng.gen_range(V3_FRAC_RANGE),
            ..GeneratorConfig::default()
        };
        let spec = generate(&mut rng, &cfg, previous_v1);
        previous_v1 = spec.v1;
        if sample.is_none() {
            sample = Some(compute_metrics(&spec));
        }

        for (&(id, _, check), stats) in CHECKS.iter().zip(checks.iter_mut()) {
            match check(&spec) {
                Ok(()) => stats.passed += 1,
                Err(detail) => {
                    warn!(run, check = id, detail = %detail, "Invariant violated");
                    stats.failed += 1;
                    failures.push(Failure { run, check: id, detail });
                }
            }
        }
    }

    checks.push(run_degenerate_check(runs, &mut failures));

    let duration: Duration = start.elapsed();
    let report = InvariantReport {
        runs,
        base_seed,
        checks,
        failures,
        duration_ms: duration.as_millis(),
        sample,
    };

    println!("Runs:    {}", report.runs);
    for c in &report.checks {
        let mark = if c.failed == 0 { "ok" } else { "FAILED" };
        println!("  {} {:<32} {:>6} passed {:>4} failed  {}", c.id, c.name, c.passed, c.failed, mark);
    }
    println!("Passed:  {}", report.passed());
    println!("Failed:  {}", report.failed());
    println!("Duration: {:.2}s", duration.as_secs_f64());

    let json_path = output_dir.join("invariants.json");
    let json = serde_json::to_string_pretty(&report).context("serialize report")?;
    std::fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(path = %json_path.display(), "Report saved");

    if !report.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(checks: Vec<CheckStats>, failures: Vec<Failure>) -> InvariantReport {
        InvariantReport {
            runs: 1,
            base_seed: 1,
            checks,
            failures,
            duration_ms: 0,
            sample: None,
        }
    }

    #[test]
    fn degenerate_check_passes() {
        let mut failures = Vec::new();
        let stats = run_degenerate_check(0, &mut failures);
        assert_eq!((stats.passed, stats.failed), (1, 0));
        assert!(failures.is_empty());
    }

    #[test]
    fn degenerate_failure_is_counted_in_summary() {
        let mut failures = Vec::new();
        let stats = record_degenerate(3, Err("geometry".to_string()), &mut failures);
        let report = report(vec![stats], failures);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failed() as usize, report.failures.len());
        assert_eq!(report.failures[0].check, "INV-007");
    }
}
