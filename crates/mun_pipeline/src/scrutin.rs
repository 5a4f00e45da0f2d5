//! One ballot, end to end: round 1, then inter-round and round 2 when needed.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::debug;

use mun_algo::rounds::{
    project_round2, run_round1, run_round2, InterRoundConfig, Round1Outcome, Round1Result, Round2Result,
    Round2Setup,
};
use mun_algo::{AlgoError, BallotRules};
use mun_core::entities::{total_votes, SeatAllocation, VoteTally};
use mun_core::ids::ListId;
use mun_core::rounding::to_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    FirstRound,
    SecondRound,
    /// Nobody reached the run-off; no seats were allocated.
    NoContest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrutinResult {
    pub name: String,
    pub total_seats: u32,
    pub registered: u64,
    pub participation: f64,
    pub round1: Round1Result,
    pub round2_setup: Option<Round2Setup>,
    pub round2: Option<Round2Result>,
}

impl ScrutinResult {
    pub fn resolution(&self) -> Resolution {
        if self.round1.is_resolved() {
            Resolution::FirstRound
        } else if self.round2.is_some() {
            Resolution::SecondRound
        } else {
            Resolution::NoContest
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution() != Resolution::NoContest
    }

    /// Final seats, whichever round decided.
    pub fn seats(&self) -> Option<&SeatAllocation> {
        match (&self.round1.outcome, &self.round2) {
            (Round1Outcome::Resolved { seats, .. }, _) => Some(seats),
            (Round1Outcome::Unresolved(_), Some(r2)) => Some(&r2.seats),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<&ListId> {
        match (&self.round1.outcome, &self.round2) {
            (Round1Outcome::Resolved { winner, .. }, _) => Some(winner),
            (Round1Outcome::Unresolved(_), Some(r2)) => Some(&r2.winner),
            _ => None,
        }
    }
}

impl Serialize for ScrutinResult {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("ScrutinResult", 10)?;
        st.serialize_field("name", &self.name)?;
        st.serialize_field("total_seats", &self.total_seats)?;
        st.serialize_field("registered", &self.registered)?;
        st.serialize_field("participation", &self.participation)?;
        st.serialize_field("resolution", &self.resolution())?;
        st.serialize_field("winner", &self.winner())?;
        st.serialize_field("seats", &self.seats())?;
        st.serialize_field("round1", &self.round1)?;
        st.serialize_field("round2_setup", &self.round2_setup)?;
        st.serialize_field("round2", &self.round2)?;
        st.end()
    }
}

/// Resolve one ballot.
///
/// A `registered` of 0 is inferred from the round-1 votes and participation.
/// Round 2 runs whenever the projection leaves at least one contestant; an
/// empty projected ballot for them is reported as an error.
pub fn simulate_scrutin(
    name: &str,
    votes: &VoteTally,
    rules: &BallotRules,
    interround: Option<&InterRoundConfig>,
    registered: u64,
    participation: f64,
) -> Result<ScrutinResult, AlgoError> {
    let round1 = run_round1(votes, rules);
    let registered = if registered > 0 {
        registered
    } else {
        infer_registered(votes, participation)
    };

    let mut out = ScrutinResult {
        name: name.to_string(),
        total_seats: rules.seats,
        registered,
        participation,
        round1,
        round2_setup: None,
        round2: None,
    };

    let Some(partition) = out.round1.partition() else {
        return Ok(out);
    };

    let default_cfg = InterRoundConfig::default();
    let cfg = interround.unwrap_or(&default_cfg);
    let setup = project_round2(&out.round1.votes, partition, cfg, registered, participation);
    debug!(ballot = name, shape = ?setup.shape, contestants = setup.contestants.len(), "round 2 projected");

    if !setup.contestants.is_empty() {
        out.round2 = Some(run_round2(&setup.votes, rules)?);
    }
    out.round2_setup = Some(setup);
    Ok(out)
}

fn infer_registered(votes: &VoteTally, participation: f64) -> u64 {
    let cast = total_votes(votes);
    if participation > 0.0 {
        to_count(cast as f64 / participation)
    } else {
        cast
    }
}
