//! Indirect election of the mayor by the council.
//!
//! Each round a candidate collects `round_half_even(discipline × seats of the
//! supporting lists)` votes; undisciplined councillors abstain. Every round
//! but the last requires the absolute majority of the chamber
//! (`floor(total/2) + 1`); the last is decided by plurality. Ties go to the
//! candidate listed first.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use mun_core::entities::total_seats;
use mun_core::rounding::to_seats;
use mun_core::variables::absolute_majority;

use crate::{ListId, SeatAllocation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MayorCandidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coalition: Option<String>,
    pub supporting_lists: Vec<ListId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MayorOutcome {
    pub elected: Option<String>,
    pub round_elected: Option<u8>,
    /// Per-round tally, candidate name → votes.
    pub rounds: Vec<BTreeMap<String, u32>>,
    pub majority_threshold: u32,
}

pub fn elect_mayor(
    seats: &SeatAllocation,
    candidates: &[MayorCandidate],
    discipline_rate: f64,
    max_rounds: u8,
) -> MayorOutcome {
    let majority_threshold = absolute_majority(total_seats(seats));
    let mut outcome =
        MayorOutcome { elected: None, round_elected: None, rounds: Vec::new(), majority_threshold };
    if candidates.is_empty() {
        return outcome;
    }

    let discipline = if discipline_rate.is_nan() { 0.0 } else { discipline_rate.clamp(0.0, 1.0) };
    let last = max_rounds.max(1);

    for round in 1..=last {
        let tally: Vec<u32> = candidates
            .iter()
            .map(|c| {
                let raw: u32 = c.supporting_lists.iter().filter_map(|l| seats.get(l)).sum();
                to_seats(raw as f64 * discipline)
            })
            .collect();
        outcome
            .rounds
            .push(candidates.iter().map(|c| c.name.clone()).zip(tally.iter().copied()).collect());

        let (top, top_votes) = tally
            .iter()
            .enumerate()
            .fold((0usize, 0u32), |best, (i, &v)| if v > best.1 { (i, v) } else { best });

        let decided = round == last || top_votes >= majority_threshold;
        if decided {
            outcome.elected = Some(candidates[top].name.clone());
            outcome.round_elected = Some(round);
            break;
        }
    }
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoalitionStanding {
    pub seats: u32,
    pub has_majority: bool,
}

/// Seats held by each named coalition and whether it reaches the absolute
/// majority of the chamber.
pub fn majority_check(
    seats: &SeatAllocation,
    coalitions: &BTreeMap<String, BTreeSet<ListId>>,
) -> BTreeMap<String, CoalitionStanding> {
    let threshold = absolute_majority(total_seats(seats));
    coalitions
        .iter()
        .map(|(name, members)| {
            let held: u32 = members.iter().filter_map(|l| seats.get(l)).sum();
            (name.clone(), CoalitionStanding { seats: held, has_majority: held >= threshold })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Helpers ---
    fn id(s: &str) -> ListId {
        s.parse().unwrap()
    }

    fn council(pairs: &[(&str, u32)]) -> SeatAllocation {
        pairs.iter().map(|(k, v)| (id(k), *v)).collect()
    }

    fn candidate(name: &str, lists: &[&str]) -> MayorCandidate {
        MayorCandidate {
            name: name.into(),
            coalition: None,
            supporting_lists: lists.iter().map(|s| id(s)).collect(),
        }
    }

    #[test]
    fn majority_in_first_round() {
        let seats = council(&[("PS", 80), ("EELV", 10), ("LR", 60), ("RN", 13)]);
        let out = elect_mayor(&seats, &[candidate("Gauche", &["PS", "EELV"]), candidate("Droite", &["LR"])], 0.95, 3);
        assert_eq!(out.majority_threshold, 82);
        // round(90 × 0.95) = 86 (85.5 rounds to even)
        assert_eq!(out.rounds[0]["Gauche"], 86);
        assert_eq!(out.elected.as_deref(), Some("Gauche"));
        assert_eq!(out.round_elected, Some(1));
        assert_eq!(out.rounds.len(), 1);
    }

    #[test]
    fn plurality_in_last_round() {
        let seats = council(&[("A", 70), ("B", 60), ("C", 33)]);
        let out = elect_mayor(&seats, &[candidate("a", &["A"]), candidate("b", &["B"])], 1.0, 3);
        assert_eq!(out.rounds.len(), 3);
        assert_eq!(out.elected.as_deref(), Some("a"));
        assert_eq!(out.round_elected, Some(3));
    }

    #[test]
    fn tie_goes_to_first_candidate() {
        let seats = council(&[("A", 50), ("B", 50)]);
        let out = elect_mayor(&seats, &[candidate("b", &["B"]), candidate("a", &["A"])], 1.0, 3);
        assert_eq!(out.elected.as_deref(), Some("b"));
    }

    #[test]
    fn no_candidates_elects_nobody() {
        let seats = council(&[("A", 50)]);
        let out = elect_mayor(&seats, &[], 0.95, 3);
        assert!(out.elected.is_none());
        assert!(out.rounds.is_empty());
    }

    #[test]
    fn zero_vote_last_round_still_elects_first_candidate() {
        // supporters hold no seats: every round tallies 0
        let seats = council(&[("A", 50), ("B", 50)]);
        let out = elect_mayor(&seats, &[candidate("x", &["X"]), candidate("y", &["Y"])], 0.95, 3);
        assert_eq!(out.rounds.len(), 3);
        assert!(out.rounds.iter().all(|r| r.values().all(|&v| v == 0)));
        assert_eq!(out.elected.as_deref(), Some("x"));
        assert_eq!(out.round_elected, Some(3));

        let out = elect_mayor(&SeatAllocation::new(), &[candidate("a", &["A"])], 0.0, 1);
        assert_eq!(out.elected.as_deref(), Some("a"));
        assert_eq!(out.round_elected, Some(1));
    }

    #[test]
    fn majority_check_reports_each_coalition() {
        let seats = council(&[("PS", 70), ("EELV", 15), ("LR", 60), ("RN", 18)]);
        let coalitions: BTreeMap<String, BTreeSet<ListId>> = [
            ("gauche".to_string(), [id("PS"), id("EELV")].into()),
            ("droite".to_string(), [id("LR")].into()),
        ]
        .into();
        let r = majority_check(&seats, &coalitions);
        assert_eq!(r["gauche"], CoalitionStanding { seats: 85, has_majority: true });
        assert_eq!(r["droite"], CoalitionStanding { seats: 60, has_majority: false });
    }
}
