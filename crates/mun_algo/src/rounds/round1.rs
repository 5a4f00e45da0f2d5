//! First round.
//!
//! Contract:
//! - Empty ballot (0 expressed votes): unresolved, all shares 0, empty bands.
//! - A list strictly above the victory share (50 %) wins outright; seats are
//!   apportioned immediately with that list as bonus recipient.
//! - Otherwise every list falls in exactly one band, lower bounds inclusive:
//!   qualified (≥ 10 %), fusion-eligible ([5 %, 10 %)), eliminated (< 5 %).

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use mun_core::entities::{shares, total_votes};

use crate::allocation::allocate_with_bonus;
use crate::{BallotRules, ListId, PercentageTally, SeatAllocation, VoteTally};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Round1Partition {
    pub qualified: BTreeSet<ListId>,
    pub fusion_eligible: BTreeSet<ListId>,
    pub eliminated: BTreeSet<ListId>,
}

impl Round1Partition {
    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty() && self.fusion_eligible.is_empty() && self.eliminated.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Round1Outcome {
    Resolved { winner: ListId, seats: SeatAllocation },
    Unresolved(Round1Partition),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round1Result {
    pub votes: VoteTally,
    pub total_expressed: u64,
    pub shares: PercentageTally,
    pub outcome: Round1Outcome,
}

impl Round1Result {
    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, Round1Outcome::Resolved { .. })
    }

    pub fn partition(&self) -> Option<&Round1Partition> {
        match &self.outcome {
            Round1Outcome::Unresolved(p) => Some(p),
            Round1Outcome::Resolved { .. } => None,
        }
    }
}

pub fn run_round1(votes: &VoteTally, rules: &BallotRules) -> Round1Result {
    let total = total_votes(votes);
    let pct = shares(votes);

    if total == 0 {
        return Round1Result {
            votes: votes.clone(),
            total_expressed: 0,
            shares: pct,
            outcome: Round1Outcome::Unresolved(Round1Partition::default()),
        };
    }

    // At most one list can be strictly above half.
    if let Some((winner, _)) = votes.iter().find(|&(_, &v)| rules.victory.exceeded_by(v, total)) {
        debug!(winner = %winner, total, "round 1 resolved outright");
        let seats = allocate_with_bonus(votes, rules.seats, rules.bonus_fraction, Some(winner), rules.proportional);
        return Round1Result {
            votes: votes.clone(),
            total_expressed: total,
            shares: pct,
            outcome: Round1Outcome::Resolved { winner: winner.clone(), seats },
        };
    }

    let mut partition = Round1Partition::default();
    for (id, &v) in votes {
        if rules.qualification.admits(v, total) {
            partition.qualified.insert(id.clone());
        } else if rules.fusion.admits(v, total) {
            partition.fusion_eligible.insert(id.clone());
        } else {
            partition.eliminated.insert(id.clone());
        }
    }
    debug!(
        qualified = partition.qualified.len(),
        fusion_eligible = partition.fusion_eligible.len(),
        eliminated = partition.eliminated.len(),
        "round 1 unresolved"
    );

    Round1Result {
        votes: votes.clone(),
        total_expressed: total,
        shares: pct,
        outcome: Round1Outcome::Unresolved(partition),
    }
}
