//! Subcommand bodies. Each loads its inputs, runs the engine and emits one
//! canonical JSON document.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use mun_algo::calibration::{
    calibration_points, classify_list, overall_mae, Band, CalibrationSettings, CorrectionFactor,
    CorrectionMethod, RedressementModel,
};
use mun_core::entities::SeatAllocation;
use mun_core::families::FamilyCode;
use mun_core::ids::ListId;
use mun_core::variables::ElectionRules;
use mun_io::canonical_json::{to_canonical_bytes, write_canonical_file};
use mun_io::hasher::sha256_canonical;
use mun_io::loader;
use mun_pipeline::{presets, simulate, CoalitionSummary, MonteCarloParams, Orchestrator, Scenario, ScenarioComparator};

use crate::args::{Args, CalibrateArgs, Command, MonteCarloArgs, Output};
use crate::MainError;

pub fn dispatch(args: &Args) -> Result<(), MainError> {
    match &args.command {
        Command::Run { scenario, output } => {
            let orch = orchestrator(args)?;
            let scenario = load_scenario(scenario)?;
            let result = orch.run(&scenario)?;
            if let Some(mayor) = result.mayor.as_ref().and_then(|m| m.elected.as_deref()) {
                info!(mayor, "mayor elected");
            }
            emit(&result, output)
        }
        Command::Montecarlo(m) => montecarlo(args, m),
        Command::Calibrate(c) => calibrate(c),
        Command::Preset { name, output } => {
            let scenario = presets::preset(name)
                .ok_or_else(|| MainError::Validation(format!("unknown preset {name}")))?;
            emit(&scenario, output)
        }
        Command::Compare { scenarios, presets: names, output } => {
            let orch = orchestrator(args)?;
            let mut cmp = ScenarioComparator::new();
            for path in scenarios {
                cmp.add(load_scenario(path)?);
            }
            for name in names {
                let s = presets::preset(name)
                    .ok_or_else(|| MainError::Validation(format!("unknown preset {name}")))?;
                cmp.add(s);
            }
            cmp.run_all(&orch)?;
            emit(&Comparison { seats: cmp.seats_table(), coalitions: cmp.coalition_summary() }, output)
        }
    }
}

#[derive(Serialize)]
struct Comparison {
    seats: BTreeMap<String, SeatAllocation>,
    coalitions: BTreeMap<String, CoalitionSummary>,
}

fn orchestrator(args: &Args) -> Result<Orchestrator, MainError> {
    let rules = match &args.rules {
        Some(path) => loader::load_rules(path)?.0,
        None => ElectionRules::paris_2026(),
    };
    info!(rules_sha256 = %sha256_canonical(&rules)?, "rules loaded");
    let (orch, status) = Orchestrator::new(rules)?;
    for notice in &status.notices {
        warn!("{notice}");
    }
    Ok(orch)
}

fn load_scenario(path: &std::path::Path) -> Result<Scenario, MainError> {
    let scenario = loader::load_scenario(path)?;
    info!(scenario = %scenario.name, scenario_sha256 = %sha256_canonical(&scenario)?, "scenario loaded");
    Ok(scenario)
}

fn montecarlo(args: &Args, m: &MonteCarloArgs) -> Result<(), MainError> {
    let orch = orchestrator(args)?;
    let scenario = load_scenario(&m.scenario)?;

    let defaults = MonteCarloParams::from_rules(orch.rules());
    let params = MonteCarloParams {
        iterations: m.iterations.unwrap_or(defaults.iterations),
        score_sigma: m.score_sigma.unwrap_or(defaults.score_sigma),
        participation_sigma: m.participation_sigma.unwrap_or(defaults.participation_sigma),
        transfer_sigma: m.transfer_sigma.unwrap_or(defaults.transfer_sigma),
        seed: m.seed,
        confidence: m.confidence,
        ..defaults
    };
    let result = simulate(&orch, &scenario, &params)?;
    if result.iterations_kept == 0 && result.iterations_requested > 0 {
        warn!(dropped = result.dropped, "every iteration failed");
    }
    emit(&result, &m.output)
}

#[derive(Serialize)]
struct CalibrationReport {
    settings: CalibrationSettings,
    n_points: usize,
    factors: Vec<CorrectionFactor>,
    /// Leave-one-out error of the built-in dataset, in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    loo_mae: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrected: Option<BTreeMap<ListId, CorrectedScore>>,
}

#[derive(Serialize)]
struct CorrectedScore {
    family: Option<FamilyCode>,
    raw: f64,
    #[serde(flatten)]
    band: Band,
}

fn calibrate(c: &CalibrateArgs) -> Result<(), MainError> {
    let method = CorrectionMethod::from(c.method);
    let settings = CalibrationSettings { method, half_life: c.half_life, ..Default::default() };

    let (points, builtin) = match &c.points {
        Some(path) => (loader::load_calibration_points(path)?, false),
        None => (calibration_points(None), true),
    };
    let n_points = points.len();
    let model = RedressementModel::from_points(settings, points)?;
    let loo_mae = if builtin { Some(overall_mae(method, c.half_life)?) } else { None };

    let corrected = match &c.scores {
        Some(path) => {
            let raw = loader::load_scores(path)?;
            let families: BTreeMap<ListId, FamilyCode> = raw
                .keys()
                .filter_map(|list| classify_list(list.as_str(), None, &[]).map(|f| (list.clone(), f)))
                .collect();
            let bands = model.uncertainty_band(&raw, &families, c.confidence);
            Some(
                bands
                    .into_iter()
                    .map(|(list, band)| {
                        let entry = CorrectedScore {
                            family: families.get(&list).copied(),
                            raw: raw.get(&list).copied().unwrap_or(0.0),
                            band,
                        };
                        (list, entry)
                    })
                    .collect(),
            )
        }
        None => None,
    };

    info!(method = %method, n_points, families = model.factors().len(), "calibrated");
    let report = CalibrationReport {
        settings,
        n_points,
        factors: model.factors().values().cloned().collect(),
        loo_mae,
        corrected,
    };
    emit(&report, &c.output)
}

fn emit<T: Serialize>(value: &T, output: &Output) -> Result<(), MainError> {
    match &output.out {
        Some(path) => {
            write_canonical_file(path, value)?;
            info!(path = %path.display(), "written");
        }
        None => {
            let mut bytes = to_canonical_bytes(value)?;
            bytes.push(b'\n');
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| MainError::Io(format!("stdout: {e}")))?;
        }
    }
    Ok(())
}
