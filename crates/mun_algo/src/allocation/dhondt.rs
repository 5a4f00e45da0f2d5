//! D'Hondt (highest averages) allocation.
//!
//! Contract:
//! - Every list in `votes` appears in the output, possibly with 0 seats.
//! - Lists whose share is below `threshold` take no seat. If nobody clears the
//!   threshold, the threshold is ignored and every list competes.
//! - Seats are awarded one at a time to the highest quotient `v / (s + 1)`.
//! - Ties go to the first list in canonical order (ascending `ListId`).
//! - If all competing lists have 0 votes, seats are dealt round-robin in
//!   canonical order so the seat total still holds.
//! - Pure integers; no division in comparisons (cross-multiply in u128).
//!
//! Determinism:
//! - Scans run over `BTreeMap` order only.

use std::cmp::Ordering;

use serde::Serialize;

use mun_core::entities::total_votes;

use crate::{ListId, SeatAllocation, ShareThreshold, VoteTally};

/// Allocate `seats` by D'Hondt among lists clearing `threshold`.
pub fn allocate_dhondt(seats: u32, votes: &VoteTally, threshold: ShareThreshold) -> SeatAllocation {
    let mut alloc: SeatAllocation = votes.keys().map(|k| (k.clone(), 0)).collect();
    if seats == 0 || votes.is_empty() {
        return alloc;
    }

    let eligible = eligible_lists(votes, threshold);

    if eligible.iter().all(|(_, v)| *v == 0) {
        deal_round_robin(&mut alloc, &eligible, seats);
        return alloc;
    }

    let mut won = vec![0u32; eligible.len()];
    for _round in 0..seats {
        let winner = next_award(&eligible, &won);
        won[winner] += 1;
    }

    for ((id, _), s) in eligible.iter().zip(won) {
        alloc.insert((*id).clone(), s);
    }
    alloc
}

/// Lists (in canonical order) taking part in the distribution.
fn eligible_lists(votes: &VoteTally, threshold: ShareThreshold) -> Vec<(&ListId, u64)> {
    let total = total_votes(votes);
    let passing: Vec<(&ListId, u64)> = votes
        .iter()
        .filter(|&(_, &v)| threshold.admits(v, total))
        .map(|(k, &v)| (k, v))
        .collect();
    if passing.is_empty() {
        votes.iter().map(|(k, &v)| (k, v)).collect()
    } else {
        passing
    }
}

fn deal_round_robin(alloc: &mut SeatAllocation, eligible: &[(&ListId, u64)], seats: u32) {
    let n = eligible.len() as u32;
    let base = seats / n;
    let extra = seats % n;
    for (i, (id, _)) in eligible.iter().enumerate() {
        let s = base + u32::from((i as u32) < extra);
        alloc.insert((*id).clone(), s);
    }
}

/// Index of the argmax of v/(s+1); first index wins ties.
fn next_award(eligible: &[(&ListId, u64)], won: &[u32]) -> usize {
    let mut best = 0usize;
    for i in 1..eligible.len() {
        if cmp_quotients(eligible[i].1, won[i], eligible[best].1, won[best]) == Ordering::Greater {
            best = i;
        }
    }
    best
}

/// Compare D'Hondt quotients v_a/(s_a+1) vs v_b/(s_b+1) without floats.
/// Returns Ordering::Greater if a's quotient is larger.
pub(crate) fn cmp_quotients(v_a: u64, s_a: u32, v_b: u64, s_b: u32) -> Ordering {
    let da = (s_a as u128) + 1;
    let db = (s_b as u128) + 1;
    let lhs = (v_a as u128) * db;
    let rhs = (v_b as u128) * da;
    lhs.cmp(&rhs)
}

/// One cell of the quotient table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotientRow {
    pub list: ListId,
    pub divisor: u32,
    pub quotient: f64,
    /// Seat number (1-based) when this quotient wins a seat.
    pub seat: Option<u32>,
}

/// The `seats` first quotients of every competing list, sorted by quotient
/// descending (ties in canonical list order). The first `seats` rows are the
/// winning quotients and match [`allocate_dhondt`] whenever some list has votes.
pub fn quotient_table(votes: &VoteTally, seats: u32, threshold: ShareThreshold) -> Vec<QuotientRow> {
    if seats == 0 || votes.is_empty() {
        return Vec::new();
    }
    let eligible = eligible_lists(votes, threshold);

    let mut cells: Vec<(usize, u64, u32)> = Vec::with_capacity(eligible.len() * seats as usize);
    for (idx, (_, v)) in eligible.iter().enumerate() {
        for divisor in 1..=seats {
            cells.push((idx, *v, divisor));
        }
    }
    cells.sort_by(|a, b| {
        cmp_quotients(b.1, b.2 - 1, a.1, a.2 - 1)
            .then(a.0.cmp(&b.0))
            .then(a.2.cmp(&b.2))
    });

    cells
        .into_iter()
        .enumerate()
        .map(|(rank, (idx, v, divisor))| QuotientRow {
            list: eligible[idx].0.clone(),
            divisor,
            quotient: v as f64 / divisor as f64,
            seat: (rank < seats as usize).then_some(rank as u32 + 1),
        })
        .collect()
}
