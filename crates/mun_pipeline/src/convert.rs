//! Scores → integer vote counts.
//!
//! Scores are renormalised to fractions first, whatever their scale (a total
//! above 2 is read as points). Expressed votes are
//! `round_half_even(registered × participation)`; per-list counts are rounded
//! the same way and the rounding drift goes to the top list so the tally sums
//! exactly to the expressed total. All-zero scores give an all-zero tally.

use mun_core::entities::{leader, total_votes, VoteTally};
use mun_core::rounding::to_count;

use crate::scenario::ScoreTable;

/// Totals above this are read as points (0–100) rather than fractions.
pub const PERCENT_SCALE_CUTOFF: f64 = 2.0;

pub fn is_percent_scale(scores: &ScoreTable) -> bool {
    scores.values().sum::<f64>() > PERCENT_SCALE_CUTOFF
}

/// Scores as fractions summing to 1; all zero when the total is not positive.
pub fn normalize(scores: &ScoreTable) -> ScoreTable {
    let total: f64 = scores.values().map(|v| v.max(0.0)).sum();
    scores
        .iter()
        .map(|(k, &v)| (k.clone(), if total > 0.0 { v.max(0.0) / total } else { 0.0 }))
        .collect()
}

pub fn scores_to_votes(scores: &ScoreTable, registered: u64, participation: f64) -> VoteTally {
    let fractions = normalize(scores);
    let expressed = to_count(registered as f64 * participation);

    let mut votes: VoteTally =
        fractions.iter().map(|(k, &f)| (k.clone(), to_count(f * expressed as f64))).collect();

    let has_support = fractions.values().any(|&f| f > 0.0);
    let drift = expressed as i128 - total_votes(&votes) as i128;
    if has_support && drift != 0 {
        if let Some(top) = leader(&votes).cloned() {
            if let Some(v) = votes.get_mut(&top) {
                *v = (*v as i128 + drift).max(0) as u64;
            }
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mun_core::ids::ListId;
    use proptest::prelude::*;

    // --- Helpers ---
    fn scores(pairs: &[(&str, f64)]) -> ScoreTable {
        pairs.iter().map(|(k, v)| (k.parse().unwrap(), *v)).collect()
    }

    fn id(s: &str) -> ListId {
        s.parse().unwrap()
    }

    #[test]
    fn points_and_fractions_agree() {
        let pts = scores(&[("A", 40.0), ("B", 35.0), ("C", 25.0)]);
        let frac = scores(&[("A", 0.40), ("B", 0.35), ("C", 0.25)]);
        assert!(is_percent_scale(&pts));
        assert!(!is_percent_scale(&frac));
        assert_eq!(scores_to_votes(&pts, 1_000, 0.5), scores_to_votes(&frac, 1_000, 0.5));
        assert_eq!(scores_to_votes(&pts, 1_000, 0.5)[&id("A")], 200);
    }

    #[test]
    fn drift_goes_to_top_list() {
        // thirds of 100 round to 33 each; the missing vote goes to the leader
        let s = scores(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let v = scores_to_votes(&s, 200, 0.5);
        assert_eq!(total_votes(&v), 100);
        assert_eq!(v[&id("A")], 34);
    }

    #[test]
    fn unnormalised_input_is_rescaled() {
        let s = scores(&[("A", 50.0), ("B", 30.0)]);
        let v = scores_to_votes(&s, 1_000, 0.8);
        assert_eq!(v[&id("A")], 500);
        assert_eq!(v[&id("B")], 300);
    }

    #[test]
    fn zero_scores_give_zero_tally() {
        let s = scores(&[("A", 0.0), ("B", 0.0)]);
        let v = scores_to_votes(&s, 1_000, 0.5);
        assert_eq!(total_votes(&v), 0);
        assert_eq!(v.len(), 2);
    }

    proptest! {
        #[test]
        fn tally_sums_to_expressed(
            raw in proptest::collection::vec(0.0f64..60.0, 1..12),
            registered in 0u64..2_000_000,
            participation in 0.0f64..=1.0,
        ) {
            let s: ScoreTable = raw
                .iter()
                .enumerate()
                .map(|(i, &x)| (format!("L{i:02}").parse().unwrap(), x))
                .collect();
            let v = scores_to_votes(&s, registered, participation);
            prop_assert_eq!(v.len(), s.len());
            if raw.iter().any(|&x| x > 0.0) {
                prop_assert_eq!(total_votes(&v), to_count(registered as f64 * participation));
            }
        }
    }
}
