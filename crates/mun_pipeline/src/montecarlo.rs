//! Monte Carlo engine.
//!
//! Each iteration perturbs a copy of the scenario and runs the orchestrator
//! once:
//! - every score table gets independent normal noise, recentred so the noise
//!   sums to zero, negatives clamped, renormalised to the original total
//!   (sigma is read in points when the table is in points);
//! - one participation shock is added to the city rate and to every explicit
//!   sector rate, each clamped to the rules' floor/ceiling;
//! - transfer rates are scaled by `1 + N(0, transfer_sigma)` and clamped,
//!   withdrawals rescaled if their rates then sum above 1.
//!
//! Iteration `i` draws from its own stream of the batch seed and threads that
//! one generator through every draw, in canonical order. Iterations whose run
//! fails are dropped from every aggregate; the count and a sample of causes
//! are reported.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mun_algo::rounds::{InterRoundConfig, TransferEdge, TransferRate, Withdrawal};
use mun_algo::stats::{mean, std_dev, summarize, DistributionSummary};
use mun_core::families::Coalition;
use mun_core::ids::ListId;
use mun_core::rng::SimRng;
use mun_core::variables::{absolute_majority, ElectionRules, MonteCarloDefaults};

use crate::convert::is_percent_scale;
use crate::orchestrator::{ElectionResult, Orchestrator};
use crate::scenario::{Scenario, ScenarioSource, ScoreTable};
use crate::PipelineError;

const MAX_SAMPLED_FAILURES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloParams {
    pub iterations: u32,
    /// Fraction of the expressed vote (0.02 = 2 points).
    pub score_sigma: f64,
    pub participation_sigma: f64,
    /// Relative noise on transfer rates.
    pub transfer_sigma: f64,
    /// Drawn from OS entropy when absent; the seed used is echoed in the result.
    pub seed: Option<u64>,
    /// Coalition name → member lists. Defaults to the blocs implied by list families.
    pub coalitions: Option<BTreeMap<String, BTreeSet<ListId>>>,
    /// Level of the percentile interval in the summaries.
    pub confidence: f64,
}

impl Default for MonteCarloParams {
    fn default() -> Self {
        Self::from_defaults(&MonteCarloDefaults::default())
    }
}

impl MonteCarloParams {
    /// Iteration count and sigmas from the rule set.
    pub fn from_rules(rules: &ElectionRules) -> Self {
        Self::from_defaults(&rules.monte_carlo)
    }

    fn from_defaults(d: &MonteCarloDefaults) -> Self {
        Self {
            iterations: d.iterations,
            score_sigma: d.score_sigma,
            participation_sigma: d.participation_sigma,
            transfer_sigma: d.transfer_sigma,
            seed: None,
            coalitions: None,
            confidence: 0.95,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        for (name, v) in [
            ("score_sigma", self.score_sigma),
            ("participation_sigma", self.participation_sigma),
            ("transfer_sigma", self.transfer_sigma),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(PipelineError::InvalidScenario(format!("{name} must be finite and >= 0, got {v}")));
            }
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(PipelineError::InvalidScenario(format!(
                "confidence must be in (0,1), got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationFailure {
    pub iteration: u32,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub scenario: String,
    pub seed: u64,
    pub iterations_requested: u32,
    pub iterations_kept: u32,
    pub dropped: u32,
    /// First failures, at most ten.
    pub failures: Vec<IterationFailure>,
    /// City council seats per list, one entry per kept iteration.
    pub seats: BTreeMap<ListId, Vec<u32>>,
    pub coalition_seats: BTreeMap<String, Vec<u32>>,
    pub majority_threshold: u32,
    pub majority_probabilities: BTreeMap<String, f64>,
    /// Sector → winning list → iterations won.
    pub sector_winners: BTreeMap<String, BTreeMap<ListId, u32>>,
    /// Candidate → iterations elected mayor.
    pub mayor_wins: BTreeMap<String, u32>,
    pub confidence: f64,
    pub summaries: BTreeMap<ListId, DistributionSummary>,
}

impl MonteCarloResult {
    /// `(low, median, high)` seats for a list at the result's confidence.
    pub fn seats_ci(&self, list: &ListId) -> Option<(f64, f64, f64)> {
        self.summaries.get(list).map(|s| (s.low, s.median, s.high))
    }

    pub fn seats_mean_std(&self, list: &ListId) -> Option<(f64, f64)> {
        let xs: Vec<f64> = self.seats.get(list)?.iter().map(|&n| f64::from(n)).collect();
        Some((mean(&xs), std_dev(&xs)))
    }
}

/// Run `params.iterations` perturbed elections of `scenario`.
///
/// Fails up front on an invalid scenario or parameters; per-iteration
/// failures are counted, not propagated.
pub fn simulate(
    orchestrator: &Orchestrator,
    scenario: &Scenario,
    params: &MonteCarloParams,
) -> Result<MonteCarloResult, PipelineError> {
    let rules = orchestrator.rules();
    scenario.validate(rules)?;
    params.validate()?;

    let seed = params.seed.unwrap_or_else(SimRng::entropy_seed);
    let coalitions = params.coalitions.clone().unwrap_or_else(|| default_coalitions(scenario));
    let threshold = absolute_majority(rules.city_seats);

    let mut acc = Accumulator::new(scenario, &coalitions);
    let mut failures = Vec::new();
    let mut dropped = 0u32;

    for i in 0..params.iterations {
        let mut rng = SimRng::for_iteration(seed, u64::from(i));
        match run_iteration(orchestrator, scenario, params, &mut rng) {
            Ok(result) => acc.record(&result, &coalitions),
            Err(e) => {
                dropped += 1;
                debug!(iteration = i, error = %e, "monte carlo iteration dropped");
                if failures.len() < MAX_SAMPLED_FAILURES {
                    failures.push(IterationFailure { iteration: i, cause: e.to_string() });
                }
            }
        }
    }

    let kept = acc.kept;
    let majority_probabilities = acc
        .coalition_seats
        .iter()
        .map(|(name, xs)| {
            let hits = xs.iter().filter(|&&n| n >= threshold).count();
            let p = if kept == 0 { 0.0 } else { hits as f64 / f64::from(kept) };
            (name.clone(), p)
        })
        .collect();
    let summaries = acc
        .seats
        .iter()
        .map(|(list, xs)| {
            let fs: Vec<f64> = xs.iter().map(|&n| f64::from(n)).collect();
            (list.clone(), summarize(&fs, params.confidence))
        })
        .collect();

    info!(
        scenario = %scenario.name,
        seed,
        requested = params.iterations,
        kept,
        dropped,
        "monte carlo finished"
    );

    Ok(MonteCarloResult {
        scenario: scenario.name.clone(),
        seed,
        iterations_requested: params.iterations,
        iterations_kept: kept,
        dropped,
        failures,
        seats: acc.seats,
        coalition_seats: acc.coalition_seats,
        majority_threshold: threshold,
        majority_probabilities,
        sector_winners: acc.sector_winners,
        mayor_wins: acc.mayor_wins,
        confidence: params.confidence,
        summaries,
    })
}

fn run_iteration(
    orchestrator: &Orchestrator,
    base: &Scenario,
    params: &MonteCarloParams,
    rng: &mut SimRng,
) -> Result<ElectionResult, PipelineError> {
    let perturbed = perturb_scenario(orchestrator, base, params, rng);
    orchestrator.run(&perturbed)
}

/// Bloc name → lists of the scenario in that bloc (only blocs with lists).
fn default_coalitions(scenario: &Scenario) -> BTreeMap<String, BTreeSet<ListId>> {
    let mut out: BTreeMap<String, BTreeSet<ListId>> = BTreeMap::new();
    for list in scenario.city_scores.keys() {
        let bloc = scenario.family_of(list).coalition();
        if Coalition::BLOCS.contains(&bloc) {
            out.entry(bloc.label().to_string()).or_default().insert(list.clone());
        }
    }
    out
}

pub fn perturb_scenario(
    orchestrator: &Orchestrator,
    base: &Scenario,
    params: &MonteCarloParams,
    rng: &mut SimRng,
) -> Scenario {
    let rules = orchestrator.rules();
    let mc = &rules.monte_carlo;
    let mut s = base.clone();
    s.source = ScenarioSource::MonteCarlo;

    s.city_scores = perturb_scores(&base.city_scores, params.score_sigma, rng);
    for scores in s.sector_scores.values_mut() {
        *scores = perturb_scores(scores, params.score_sigma, rng);
    }

    let shock = rng.normal(0.0, params.participation_sigma);
    let clamp = |p: f64| (p + shock).clamp(mc.participation_floor, mc.participation_ceiling);
    s.participation = Some(clamp(base.effective_participation(rules)));
    for p in s.sector_participation.values_mut() {
        *p = clamp(*p);
    }

    if let Some(cfg) = s.city_interround.as_mut() {
        perturb_transfers(cfg, params.transfer_sigma, rng);
    }
    for cfg in s.sector_interround.values_mut() {
        perturb_transfers(cfg, params.transfer_sigma, rng);
    }
    s
}

pub fn perturb_scores(scores: &ScoreTable, sigma: f64, rng: &mut SimRng) -> ScoreTable {
    if scores.is_empty() {
        return ScoreTable::new();
    }
    let total: f64 = scores.values().sum();
    let sigma = if is_percent_scale(scores) { sigma * 100.0 } else { sigma };

    let noise: Vec<f64> = scores.keys().map(|_| rng.normal(0.0, sigma)).collect();
    let shift = mean(&noise);
    let moved: Vec<f64> = scores
        .values()
        .zip(&noise)
        .map(|(v, n)| (v + n - shift).max(0.0))
        .collect();

    let new_total: f64 = moved.iter().sum();
    let scale = if new_total > 0.0 { total / new_total } else { 1.0 };
    scores.keys().cloned().zip(moved.into_iter().map(|v| v * scale)).collect()
}

fn perturb_transfers(cfg: &mut InterRoundConfig, sigma: f64, rng: &mut SimRng) {
    for edge in &mut cfg.mergers {
        *edge = TransferEdge::new(
            edge.source.clone(),
            edge.target.clone(),
            TransferRate::clamped(edge.rate.get() * (1.0 + rng.normal(0.0, sigma))),
        );
    }
    for w in &mut cfg.withdrawals {
        let rates: BTreeMap<ListId, f64> = w
            .beneficiaries()
            .iter()
            .map(|(k, r)| (k.clone(), r.get() * (1.0 + rng.normal(0.0, sigma))))
            .collect();
        *w = Withdrawal::rescaled(w.source().clone(), rates);
    }
}

/// Per-iteration outputs, zero-filled so every array has one entry per kept
/// iteration.
struct Accumulator {
    kept: u32,
    seats: BTreeMap<ListId, Vec<u32>>,
    coalition_seats: BTreeMap<String, Vec<u32>>,
    sector_winners: BTreeMap<String, BTreeMap<ListId, u32>>,
    mayor_wins: BTreeMap<String, u32>,
}

impl Accumulator {
    fn new(scenario: &Scenario, coalitions: &BTreeMap<String, BTreeSet<ListId>>) -> Self {
        Self {
            kept: 0,
            seats: scenario.city_scores.keys().map(|k| (k.clone(), Vec::new())).collect(),
            coalition_seats: coalitions.keys().map(|k| (k.clone(), Vec::new())).collect(),
            sector_winners: BTreeMap::new(),
            mayor_wins: BTreeMap::new(),
        }
    }

    fn record(&mut self, result: &ElectionResult, coalitions: &BTreeMap<String, BTreeSet<ListId>>) {
        let city = result.city_seats();
        let before = self.kept as usize;
        for list in city.keys() {
            self.seats.entry(list.clone()).or_insert_with(|| vec![0; before]);
        }
        for (list, xs) in self.seats.iter_mut() {
            xs.push(city.get(list).copied().unwrap_or(0));
        }

        for (name, members) in coalitions {
            let held: u32 = members.iter().filter_map(|l| city.get(l)).sum();
            self.coalition_seats.entry(name.clone()).or_default().push(held);
        }

        for (sector, winner) in result.sector_winners() {
            let counts = self.sector_winners.entry(sector).or_default();
            if let Some(w) = winner {
                *counts.entry(w).or_insert(0) += 1;
            }
        }
        if let Some(elected) = result.mayor.as_ref().and_then(|m| m.elected.clone()) {
            *self.mayor_wins.entry(elected).or_insert(0) += 1;
        }
        self.kept += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Helpers ---
    fn scores(pairs: &[(&str, f64)]) -> ScoreTable {
        pairs.iter().map(|(k, v)| (k.parse().unwrap(), *v)).collect()
    }

    #[test]
    fn perturbation_keeps_total_and_sign() {
        let s = scores(&[("A", 40.0), ("B", 35.0), ("C", 24.0), ("D", 1.0)]);
        let mut rng = SimRng::from_seed_u64(7);
        for _ in 0..200 {
            let p = perturb_scores(&s, 0.05, &mut rng);
            assert!((p.values().sum::<f64>() - 100.0).abs() < 1e-9);
            assert!(p.values().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn zero_sigma_is_identity() {
        let s = scores(&[("A", 0.6), ("B", 0.4)]);
        let mut rng = SimRng::from_seed_u64(7);
        assert_eq!(perturb_scores(&s, 0.0, &mut rng), s);
        assert_eq!(rng.samples_drawn(), 0);
    }

    #[test]
    fn participation_shock_is_clamped() {
        let (orch, _) = Orchestrator::new(ElectionRules::paris_2026()).unwrap();
        let mut base = Scenario::new("t");
        base.city_scores = scores(&[("PS", 60.0), ("LR", 40.0)]);
        base.participation = Some(0.84);
        let params = MonteCarloParams { participation_sigma: 0.5, ..Default::default() };
        let mut rng = SimRng::from_seed_u64(1);
        for _ in 0..50 {
            let p = perturb_scenario(&orch, &base, &params, &mut rng).participation.unwrap();
            assert!((0.15..=0.85).contains(&p));
        }
    }

    #[test]
    fn transfer_perturbation_stays_in_domain() {
        let mut cfg = InterRoundConfig {
            mergers: vec![TransferEdge::new("D".parse().unwrap(), "A".parse().unwrap(), TransferRate::ALL)],
            withdrawals: vec![Withdrawal::new(
                "C".parse().unwrap(),
                BTreeMap::from([
                    (ListId::new("A").unwrap(), TransferRate::new(0.6).unwrap()),
                    (ListId::new("B").unwrap(), TransferRate::new(0.4).unwrap()),
                ]),
            )
            .unwrap()],
            participation_delta: 0.0,
        };
        let mut rng = SimRng::from_seed_u64(3);
        for _ in 0..50 {
            perturb_transfers(&mut cfg, 0.3, &mut rng);
            assert!((0.0..=1.0).contains(&cfg.mergers[0].rate.get()));
            assert!(cfg.withdrawals[0].total_rate() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn default_coalitions_follow_families() {
        let mut s = Scenario::new("t");
        s.city_scores = scores(&[("Gauche unie", 40.0), ("LFI", 10.0), ("REN", 20.0), ("RN", 20.0), ("Autre", 10.0)]);
        s.list_families.insert("Gauche unie".parse().unwrap(), mun_core::families::FamilyCode::Ps);
        let c = default_coalitions(&s);
        assert_eq!(c["Gauche"].len(), 2);
        assert_eq!(c["Centre"].len(), 1);
        assert!(c.contains_key("Extrême droite"));
        assert!(!c.contains_key("Droite"));
        assert!(!c.values().any(|m| m.contains(&"Autre".parse::<ListId>().unwrap())));
    }
}
