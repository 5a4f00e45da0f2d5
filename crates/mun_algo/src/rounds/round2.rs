//! Second round: plurality winner takes the bonus, the remainder is shared by
//! D'Hondt among lists clearing the proportional threshold.

use serde::Serialize;
use tracing::debug;

use mun_core::entities::{leader, shares, total_votes};

use crate::allocation::allocate_with_bonus;
use crate::{AlgoError, BallotRules, ListId, PercentageTally, SeatAllocation, VoteTally};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round2Result {
    pub votes: VoteTally,
    pub total_expressed: u64,
    pub shares: PercentageTally,
    pub winner: ListId,
    pub seats: SeatAllocation,
}

/// Resolve a run-off. An empty ballot is a configuration fault: a second
/// round is only reached when contestants were expected.
pub fn run_round2(votes: &VoteTally, rules: &BallotRules) -> Result<Round2Result, AlgoError> {
    let total = total_votes(votes);
    let winner = match leader(votes) {
        Some(w) if total > 0 => w.clone(),
        _ => return Err(AlgoError::EmptyRound2Ballot),
    };

    let seats = allocate_with_bonus(votes, rules.seats, rules.bonus_fraction, Some(&winner), rules.proportional);
    debug!(winner = %winner, total, "round 2 resolved");

    Ok(Round2Result { votes: votes.clone(), total_expressed: total, shares: shares(votes), winner, seats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mun_core::entities::total_seats;
    use mun_core::variables::ElectionRules;

    // --- Helpers ---
    fn tally(pairs: &[(&str, u64)]) -> VoteTally {
        pairs.iter().map(|(k, v)| (k.parse().unwrap(), *v)).collect()
    }

    fn city() -> BallotRules {
        ElectionRules::paris_2026().city_ballot()
    }

    #[test]
    fn plurality_winner_takes_bonus() {
        let v = tally(&[("A", 420_000), ("B", 390_000), ("C", 190_000)]);
        let r = run_round2(&v, &city()).unwrap();
        assert_eq!(r.winner.as_str(), "A");
        assert_eq!(total_seats(&r.seats), 163);
        assert!(r.seats[&r.winner] >= 41);
        assert!(r.seats[&r.winner] > r.seats[&"B".parse().unwrap()]);
    }

    #[test]
    fn tie_goes_to_canonical_first() {
        let v = tally(&[("B", 500), ("A", 500)]);
        assert_eq!(run_round2(&v, &city()).unwrap().winner.as_str(), "A");
    }

    #[test]
    fn empty_ballot_is_an_error() {
        assert_eq!(run_round2(&VoteTally::new(), &city()), Err(AlgoError::EmptyRound2Ballot));
        let v = tally(&[("A", 0), ("B", 0)]);
        assert_eq!(run_round2(&v, &city()), Err(AlgoError::EmptyRound2Ballot));
    }

    #[test]
    fn single_contestant_takes_everything() {
        let v = tally(&[("A", 1_000)]);
        let r = run_round2(&v, &city()).unwrap();
        assert_eq!(r.seats[&r.winner], 163);
    }
}
