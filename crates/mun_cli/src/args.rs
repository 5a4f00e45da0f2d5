//! Command-line surface.
//!
//! - Input paths must be local (any `scheme://` is refused).
//! - `--seed` accepts a decimal u64 or 0x-hex (up to 16 nybbles).
//! - Results are canonical JSON on stdout unless `--out` names a file.

use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use mun_algo::calibration::CorrectionMethod;
use mun_pipeline::presets::PRESET_NAMES;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "mun",
    version,
    disable_help_subcommand = true,
    about = "Paris municipal election simulator (two rounds, majority bonus, mayor)"
)]
pub struct Args {
    /// Election rules JSON; missing fields take the Paris 2026 values.
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Only warnings and errors on stderr.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More logging (-v debug, -vv trace). RUST_LOG overrides both flags.
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Simulate one scenario.
    Run {
        #[arg(long)]
        scenario: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Perturbed runs of one scenario.
    Montecarlo(MonteCarloArgs),
    /// Fit poll corrections and optionally correct a set of scores.
    Calibrate(CalibrateArgs),
    /// Write a built-in scenario.
    Preset {
        #[arg(value_parser = PRESET_NAMES)]
        name: String,
        #[command(flatten)]
        output: Output,
    },
    /// Run several scenarios and compare the councils.
    Compare {
        #[arg(long = "scenario")]
        scenarios: Vec<PathBuf>,
        /// Built-in scenarios to add to the comparison.
        #[arg(long = "preset", value_parser = PRESET_NAMES)]
        presets: Vec<String>,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Debug, ClapArgs, Clone)]
pub struct Output {
    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct MonteCarloArgs {
    #[arg(long)]
    pub scenario: PathBuf,
    /// Defaults to the rules' Monte Carlo settings, as do the sigmas.
    #[arg(long)]
    pub iterations: Option<u32>,
    #[arg(long)]
    pub score_sigma: Option<f64>,
    #[arg(long)]
    pub participation_sigma: Option<f64>,
    #[arg(long)]
    pub transfer_sigma: Option<f64>,
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
    #[command(flatten)]
    pub output: Output,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct CalibrateArgs {
    /// Calibration points JSON (array). Defaults to the built-in Paris dataset.
    #[arg(long)]
    pub points: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = MethodArg::Multiplicative)]
    pub method: MethodArg,
    /// Half-life, in elections.
    #[arg(long, default_value_t = 2.0)]
    pub half_life: f64,
    /// `{list: score}` JSON to correct.
    #[arg(long)]
    pub scores: Option<PathBuf>,
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
    #[command(flatten)]
    pub output: Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Multiplicative,
    Additive,
}

impl From<MethodArg> for CorrectionMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Multiplicative => CorrectionMethod::Multiplicative,
            MethodArg::Additive => CorrectionMethod::Additive,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    BadValue(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            CliError::BadValue(s) => write!(f, "invalid value: {s}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if has_scheme(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

fn check_fraction(name: &str, v: f64, open: bool) -> Result<(), CliError> {
    let ok = if open { v > 0.0 && v < 1.0 } else { v.is_finite() && v >= 0.0 };
    if ok {
        Ok(())
    } else {
        Err(CliError::BadValue(format!("--{name} {v}")))
    }
}

impl Args {
    fn paths(&self) -> Vec<&Path> {
        let mut out: Vec<&Path> = self.rules.iter().map(PathBuf::as_path).collect();
        match &self.command {
            Command::Run { scenario, output } => {
                out.push(scenario);
                out.extend(output.out.as_deref());
            }
            Command::Montecarlo(m) => {
                out.push(&m.scenario);
                out.extend(m.output.out.as_deref());
            }
            Command::Calibrate(c) => {
                out.extend(c.points.as_deref());
                out.extend(c.scores.as_deref());
                out.extend(c.output.out.as_deref());
            }
            Command::Preset { output, .. } => out.extend(output.out.as_deref()),
            Command::Compare { scenarios, output, .. } => {
                out.extend(scenarios.iter().map(PathBuf::as_path));
                out.extend(output.out.as_deref());
            }
        }
        out
    }

    /// Checks clap cannot express: local paths, value domains, at least one
    /// scenario to compare.
    pub fn validate(&self) -> Result<(), CliError> {
        for p in self.paths() {
            ensure_local_path(p)?;
        }
        match &self.command {
            Command::Montecarlo(m) => {
                for (name, v) in [
                    ("score-sigma", m.score_sigma),
                    ("participation-sigma", m.participation_sigma),
                    ("transfer-sigma", m.transfer_sigma),
                ] {
                    if let Some(v) = v {
                        check_fraction(name, v, false)?;
                    }
                }
                check_fraction("confidence", m.confidence, true)?;
            }
            Command::Calibrate(c) => {
                check_fraction("confidence", c.confidence, true)?;
                if !(c.half_life.is_finite() && c.half_life > 0.0) {
                    return Err(CliError::BadValue(format!("--half-life {}", c.half_life)));
                }
            }
            Command::Compare { scenarios, presets, .. } if scenarios.is_empty() && presets.is_empty() => {
                return Err(CliError::BadValue("compare needs at least one --scenario or --preset".into()));
            }
            _ => {}
        }
        Ok(())
    }
}

pub fn parse_and_validate() -> Result<Args, clap::Error> {
    Args::try_parse()
}
