//! Tallies, seat allocations, and share thresholds.
//!
//! All keyed records are `BTreeMap`s keyed by [`ListId`], so iteration order is
//! the canonical list order everywhere (ascending name). Helpers here are
//! total functions: empty or all-zero inputs produce well-defined values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::ListId;

/// List → expressed votes. Sum is the ballot's total expressed votes.
pub type VoteTally = BTreeMap<ListId, u64>;

/// List → fraction of expressed votes in [0,1].
pub type PercentageTally = BTreeMap<ListId, f64>;

/// List → seats. Sum equals the chamber size after every apportionment.
pub type SeatAllocation = BTreeMap<ListId, u32>;

const BASIS_POINTS: u128 = 10_000;

#[inline]
pub fn total_votes(votes: &VoteTally) -> u64 {
    votes.values().fold(0u64, |acc, &v| acc.saturating_add(v))
}

#[inline]
pub fn total_seats(seats: &SeatAllocation) -> u32 {
    seats.values().fold(0u32, |acc, &s| acc.saturating_add(s))
}

/// Vote shares; all zero when the ballot is empty.
pub fn shares(votes: &VoteTally) -> PercentageTally {
    let total = total_votes(votes);
    votes
        .iter()
        .map(|(id, &v)| {
            let share = if total == 0 { 0.0 } else { v as f64 / total as f64 };
            (id.clone(), share)
        })
        .collect()
}

/// Highest-vote list; ties go to the first list in canonical order.
pub fn leader(votes: &VoteTally) -> Option<&ListId> {
    let mut best: Option<(&ListId, u64)> = None;
    for (id, &v) in votes {
        match best {
            Some((_, bv)) if v <= bv => {}
            _ => best = Some((id, v)),
        }
    }
    best.map(|(id, _)| id)
}

/// Lists ordered by votes descending, ties by canonical order.
pub fn ranked(votes: &VoteTally) -> Vec<ListId> {
    let mut ids: Vec<(&ListId, u64)> = votes.iter().map(|(k, &v)| (k, v)).collect();
    // stable sort keeps canonical order among equal counts
    ids.sort_by(|a, b| b.1.cmp(&a.1));
    ids.into_iter().map(|(k, _)| k.clone()).collect()
}

/// Vote-share threshold held in basis points so band boundaries compare exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShareThreshold {
    basis_points: u32,
}

impl ShareThreshold {
    pub const ZERO: ShareThreshold = ShareThreshold { basis_points: 0 };
    pub const HALF: ShareThreshold = ShareThreshold { basis_points: 5_000 };

    /// Build from a fraction in [0,1] (e.g. `0.05` for 5 %).
    pub fn from_fraction(fraction: f64) -> Result<Self, CoreError> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(CoreError::DomainOutOfRange(format!(
                "share threshold must be in [0,1], got {fraction}"
            )));
        }
        Ok(Self::from_fraction_clamped(fraction))
    }

    /// Same as [`from_fraction`](Self::from_fraction), clamping out-of-range input.
    pub fn from_fraction_clamped(fraction: f64) -> Self {
        let f = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            basis_points: (f * BASIS_POINTS as f64).round() as u32,
        }
    }

    #[inline]
    pub fn basis_points(self) -> u32 {
        self.basis_points
    }

    #[inline]
    pub fn as_fraction(self) -> f64 {
        self.basis_points as f64 / BASIS_POINTS as f64
    }

    /// `votes / total >= threshold`, cross-multiplied. An empty ballot admits nobody
    /// unless the threshold is zero.
    #[inline]
    pub fn admits(self, votes: u64, total: u64) -> bool {
        (votes as u128) * BASIS_POINTS >= (self.basis_points as u128) * (total as u128)
            && (total > 0 || self.basis_points == 0)
    }

    /// `votes / total > threshold` (strict).
    #[inline]
    pub fn exceeded_by(self, votes: u64, total: u64) -> bool {
        total > 0 && (votes as u128) * BASIS_POINTS > (self.basis_points as u128) * (total as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Helpers ---
    fn tally(pairs: &[(&str, u64)]) -> VoteTally {
        pairs.iter().map(|(k, v)| (k.parse().unwrap(), *v)).collect()
    }

    #[test]
    fn shares_zero_on_empty_ballot() {
        let t = tally(&[("A", 0), ("B", 0)]);
        let s = shares(&t);
        assert!(s.values().all(|&x| x == 0.0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn leader_prefers_canonical_order_on_tie() {
        let t = tally(&[("B", 10), ("A", 10), ("C", 3)]);
        assert_eq!(leader(&t).unwrap().as_str(), "A");
        assert!(leader(&VoteTally::new()).is_none());
    }

    #[test]
    fn ranked_is_votes_desc_then_name() {
        let t = tally(&[("C", 5), ("B", 9), ("A", 5)]);
        let r: Vec<String> = ranked(&t).into_iter().map(|l| l.to_string()).collect();
        assert_eq!(r, vec!["B", "A", "C"]);
    }

    #[test]
    fn threshold_boundaries_are_exact() {
        let five = ShareThreshold::from_fraction(0.05).unwrap();
        assert!(five.admits(500, 10_000));
        assert!(!five.admits(499, 10_000));
        assert!(!ShareThreshold::HALF.exceeded_by(5_000, 10_000));
        assert!(ShareThreshold::HALF.exceeded_by(5_010, 10_000));
        assert!(ShareThreshold::from_fraction(1.5).is_err());
    }

    #[test]
    fn empty_ballot_admits_only_at_zero_threshold() {
        assert!(ShareThreshold::ZERO.admits(0, 0));
        assert!(!ShareThreshold::from_fraction_clamped(0.05).admits(0, 0));
    }
}
