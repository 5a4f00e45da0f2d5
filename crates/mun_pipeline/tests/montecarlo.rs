//! Monte Carlo batches over full elections.

use mun_core::ids::ListId;
use mun_core::variables::ElectionRules;
use mun_pipeline::{simulate, MonteCarloParams, Orchestrator, Scenario};

// --- Helpers ---
fn id(s: &str) -> ListId {
    s.parse().unwrap()
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(ElectionRules::paris_2026()).unwrap().0
}

fn scenario(pairs: &[(&str, f64)]) -> Scenario {
    let mut s = Scenario::new("mc");
    s.city_scores = pairs.iter().map(|(k, v)| (id(k), *v)).collect();
    s
}

fn params(iterations: u32, seed: u64) -> MonteCarloParams {
    MonteCarloParams { iterations, seed: Some(seed), ..Default::default() }
}

#[test]
fn same_seed_same_arrays() {
    let orch = orchestrator();
    let s = scenario(&[("PS", 30.0), ("LFI", 12.0), ("REN", 25.0), ("LR", 20.0), ("RN", 13.0)]);
    let a = simulate(&orch, &s, &params(60, 2026)).unwrap();
    let b = simulate(&orch, &s, &params(60, 2026)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.seed, 2026);

    let c = simulate(&orch, &s, &params(60, 2027)).unwrap();
    assert_ne!(a.seats, c.seats);
}

#[test]
fn every_array_has_one_entry_per_kept_iteration() {
    let orch = orchestrator();
    let s = scenario(&[("PS", 30.0), ("LFI", 12.0), ("REN", 25.0), ("LR", 20.0), ("RN", 13.0)]);
    let r = simulate(&orch, &s, &params(40, 9)).unwrap();
    assert_eq!(r.iterations_kept, 40);
    assert_eq!(r.dropped, 0);
    for xs in r.seats.values().chain(r.coalition_seats.values()) {
        assert_eq!(xs.len(), 40);
    }
    for i in 0..40 {
        let total: u32 = r.seats.values().map(|xs| xs[i]).sum();
        assert_eq!(total, 163);
    }
    for counts in r.sector_winners.values() {
        assert_eq!(counts.values().sum::<u32>(), 40);
    }
}

#[test]
fn dominant_list_almost_always_holds_the_majority() {
    let orch = orchestrator();
    let s = scenario(&[("PS", 55.0), ("LR", 25.0), ("REN", 20.0)]);
    let p = MonteCarloParams { score_sigma: 0.02, ..params(1_000, 42) };
    let r = simulate(&orch, &s, &p).unwrap();
    assert_eq!(r.majority_threshold, 82);
    assert!(r.majority_probabilities["Gauche"] > 0.95, "{:?}", r.majority_probabilities);
    assert!(r.majority_probabilities["Droite"] < 0.05);

    let (low, median, high) = r.seats_ci(&id("PS")).unwrap();
    assert!(low <= median && median <= high);
    assert!(median >= 82.0);
    let (mean, std) = r.seats_mean_std(&id("PS")).unwrap();
    assert!(mean > 82.0 && std > 0.0);
}

#[test]
fn failing_iterations_are_dropped_and_sampled() {
    let orch = orchestrator();
    let mut s = scenario(&[("A", 49.0), ("B", 30.0), ("C", 21.0)]);
    // nobody votes in round 2: only first-round wins survive
    s.city_interround = Some(mun_algo::rounds::InterRoundConfig { participation_delta: -1.0, ..Default::default() });
    let r = simulate(&orch, &s, &params(200, 5)).unwrap();
    assert!(r.dropped > 0);
    assert!(r.iterations_kept > 0);
    assert_eq!(r.dropped + r.iterations_kept, 200);
    assert!(r.failures.len() <= 10);
    assert!(r.failures.iter().all(|f| f.cause.contains("Conseil de Paris")));
    assert!(r.seats.values().all(|xs| xs.len() == r.iterations_kept as usize));
}

#[test]
fn invalid_scenario_fails_up_front() {
    let orch = orchestrator();
    let s = scenario(&[("A", -1.0), ("B", 50.0)]);
    assert!(simulate(&orch, &s, &params(10, 1)).is_err());

    let ok = scenario(&[("A", 60.0), ("B", 40.0)]);
    let bad = MonteCarloParams { score_sigma: -0.1, ..params(10, 1) };
    assert!(simulate(&orch, &ok, &bad).is_err());
}

#[test]
fn mayor_wins_are_counted() {
    let orch = orchestrator();
    let s = mun_pipeline::presets::gauche_unie();
    let r = simulate(&orch, &s, &params(30, 11)).unwrap();
    let total: u32 = r.mayor_wins.values().sum();
    assert!(total <= r.iterations_kept);
    assert!(r.mayor_wins.get("Gauche unie").copied().unwrap_or(0) > 0);
}
