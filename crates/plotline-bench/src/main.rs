//! plotline-bench: CLI tool for simplification parameter experimentation and diagnostics.
//!
//! Runs the simplification pipeline on a JSON series (or a generated
//! synthetic one) with configurable parameters, printing detailed
//! per-stage diagnostics. Useful for:
//!
//! - Tuning the tolerance for a given viewport size
//! - Comparing linear and logarithmic value scales
//! - Measuring per-pass durations on large inputs
//! - Understanding how much each pass removes
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin plotline-bench -- [OPTIONS] [INPUT]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::hash::Hasher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use plotline_simplify::diagnostics::{Clock, PipelineDiagnostics};
use plotline_simplify::{ScaleKind, SimplifyConfig, Timeseries};
use siphasher::sip::SipHasher13;

/// Number of synthetic points when neither `INPUT` nor `--synthetic` is given.
const DEFAULT_SYNTHETIC_POINTS: usize = 100_000;

/// Simplification parameter experimentation and diagnostics for plotline.
///
/// Runs the two-pass simplification pipeline on a series with
/// configurable parameters and prints detailed per-stage timing and
/// count diagnostics.
#[derive(Parser)]
#[command(name = "plotline-bench", version)]
struct Cli {
    /// Path to a JSON series (`{"times": [...], "values": [...]}`).
    ///
    /// When omitted, a synthetic series is generated.
    input: Option<PathBuf>,

    /// Number of points in the generated synthetic series.
    #[arg(long, conflicts_with = "input", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    synthetic: Option<usize>,

    /// Simplification tolerance in pixels.
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1920.0, value_parser = parse_pixels)]
    width: f64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 1080.0, value_parser = parse_pixels)]
    height: f64,

    /// Use a logarithmic value axis.
    #[arg(long)]
    log_values: bool,

    /// Write the reduced series as JSON to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full simplify config as a JSON string.
    ///
    /// When provided, `--epsilon`, `--width`, `--height`, and
    /// `--log-values` are ignored. The JSON must be a valid
    /// `SimplifyConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Parse a viewport dimension, which must be a finite number of pixels
/// greater than zero.
fn parse_pixels(arg: &str) -> Result<f64, String> {
    let px: f64 = arg.parse().map_err(|e| format!("{arg}: {e}"))?;
    if px.is_finite() && px > 0.0 {
        Ok(px)
    } else {
        Err(format!("{arg} is not a positive pixel count"))
    }
}

/// Build a [`SimplifyConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, scales are fitted
/// to the extents of `series` so that it fills the viewport.
fn config_from_cli(cli: &Cli, series: &Timeseries) -> Result<SimplifyConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let (t_min, t_max) = extent(series.times().iter().copied());
    let time_scale = ScaleKind::fit_linear(t_min, t_max, 0.0, cli.width);

    // Screen y grows downwards.
    let value_scale = if cli.log_values {
        let (v_min, v_max) = extent(
            series
                .values()
                .iter()
                .map(|&v| f64::from(v))
                .filter(|&v| v > 0.0),
        );
        ScaleKind::fit_log(v_min, v_max, cli.height, 0.0)
    } else {
        let (v_min, v_max) = extent(series.values().iter().map(|&v| f64::from(v)));
        ScaleKind::fit_linear(v_min, v_max, cli.height, 0.0)
    };

    Ok(SimplifyConfig {
        epsilon: cli.epsilon,
        time_scale,
        value_scale,
    })
}

/// Minimum and maximum of the finite values, or `(inf, -inf)` if there
/// are none.
fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Load the series named on the command line, or generate one.
fn load_series(cli: &Cli) -> Result<(String, Timeseries), String> {
    let Some(ref path) = cli.input else {
        let n = cli.synthetic.unwrap_or(DEFAULT_SYNTHETIC_POINTS);
        return Ok((format!("synthetic ({n} points)"), synthetic_series(n)));
    };

    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let series: Timeseries = serde_json::from_str(&text)
        .map_err(|e| format!("Error parsing {}: {e}", path.display()))?;
    Ok((format!("{} ({} points)", path.display(), series.len()), series))
}

/// Deterministic noisy waveform sampled at 1 kHz.
///
/// A slow sine carries a faster ripple, per-sample noise, and a sharp
/// spike every few thousand samples, so both passes have work to do.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
fn synthetic_series(n: usize) -> Timeseries {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.001;
            let hash = sample_hash(i as u64);
            let noise = (hash >> 11) as f64 / (1_u64 << 53) as f64 - 0.5;
            let spike = if hash % 4096 == 0 { 25.0 } else { 0.0 };
            let v = (t * 0.5 * std::f64::consts::TAU).sin() * 10.0
                + (t * 40.0).sin() * 0.5
                + noise
                + spike;
            (t, v as f32)
        })
        .collect()
}

/// Stable per-index hash used as the synthetic noise source.
fn sample_hash(index: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0x706c_6f74, 0x6c69_6e65);
    hasher.write_u64(index);
    hasher.finish()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (source, series) = match load_series(&cli) {
        Ok(loaded) => loaded,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let config = match config_from_cli(&cli, &series) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Series: {source}");
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match plotline_simplify::diagnostics::process_staged_with_diagnostics(
            &series, &config, &StdClock,
        ) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the reduced series on the first run only.
                if run == 0
                    && let Some(ref output_path) = cli.output
                {
                    let json = match serde_json::to_string(&staged.output) {
                        Ok(json) => json,
                        Err(e) => {
                            eprintln!("Error serializing output series: {e}");
                            return ExitCode::FAILURE;
                        }
                    };
                    match std::fs::write(output_path, &json) {
                        Ok(()) => {
                            eprintln!(
                                "Series written to {} ({} points, {} bytes)",
                                output_path.display(),
                                staged.output.len(),
                                json.len(),
                            );
                        }
                        Err(e) => {
                            eprintln!("Error writing series to {}: {e}", output_path.display());
                            return ExitCode::FAILURE;
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Mean of `durations` in milliseconds.
#[allow(clippy::cast_precision_loss)]
fn mean_ms(durations: impl ExactSizeIterator<Item = Duration>) -> f64 {
    let n = durations.len().max(1) as f64;
    durations.map(|d| d.as_secs_f64() * 1000.0).sum::<f64>() / n
}

/// Print aggregated statistics across multiple runs.
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    let totals = || all_diagnostics.iter().map(|d| d.total_duration);
    let (Some(min), Some(max)) = (totals().min(), totals().max()) else {
        return;
    };

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );
    println!(
        "Total duration: min={:.3}ms  mean={:.3}ms  max={:.3}ms",
        min.as_secs_f64() * 1000.0,
        mean_ms(totals()),
        max.as_secs_f64() * 1000.0,
    );

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));
    println!(
        "{:<24} {:>10.3}ms",
        "Distance Filter",
        mean_ms(all_diagnostics.iter().map(|d| d.distance_filter.duration)),
    );
    println!(
        "{:<24} {:>10.3}ms",
        "Refinement",
        mean_ms(all_diagnostics.iter().map(|d| d.refinement.duration)),
    );
}
