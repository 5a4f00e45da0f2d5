//! Majority-bonus apportionment ("prime majoritaire").
//!
//! `bonus = round_half_even(total × fraction)` seats go to the winner first; the
//! remaining `total − bonus` seats are split by D'Hondt among all lists, the
//! winner included. The winner is the explicit override if given, else the
//! highest-vote list (ties in canonical order). A named winner absent from the
//! tally is added to the allocation with its bonus.

use mun_core::entities::leader;
use mun_core::variables::bonus_seats;

use super::dhondt::allocate_dhondt;
use crate::{ListId, SeatAllocation, ShareThreshold, VoteTally};

pub fn allocate_with_bonus(
    votes: &VoteTally,
    total_seats: u32,
    bonus_fraction: f64,
    winner: Option<&ListId>,
    threshold: ShareThreshold,
) -> SeatAllocation {
    if total_seats == 0 {
        return votes.keys().map(|k| (k.clone(), 0)).collect();
    }

    let bonus = bonus_seats(total_seats, bonus_fraction);
    let proportional = total_seats - bonus;
    let mut seats = allocate_dhondt(proportional, votes, threshold);

    if bonus > 0 {
        if let Some(recipient) = winner.or_else(|| leader(votes)) {
            *seats.entry(recipient.clone()).or_insert(0) += bonus;
        }
    }
    seats
}
