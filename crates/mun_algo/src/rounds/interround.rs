//! Between the two rounds: mergers, withdrawals, vote transfers and the
//! participation re-basing that turns round-1 counts into a projected round-2
//! ballot.
//!
//! Order of operations:
//! 1. keep the round-1 votes of qualified lists only;
//! 2. apply every merger (fusion-eligible source into a list already in play;
//!    one source may feed several partners);
//! 3. apply withdrawals (a list in play leaves, its voters follow the
//!    configured rates, the rest abstain);
//! 4. scale everything to `registered × clamp(p1 + delta, 0, 1)` and round.
//!
//! Fusion-eligible lists nobody absorbs simply vanish; their voters are not
//! carried as abstention. The unallocated part of a withdrawal is only "lost"
//! through step 4.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use mun_core::entities::ranked;
use mun_core::rounding::to_count;
use mun_core::variables::DEFAULT_TRANSFER_RATE;

use super::round1::Round1Partition;
use crate::{AlgoError, ListId, VoteTally};

/// Tolerance on the sum of a withdrawal's outgoing rates.
const RATE_SUM_EPSILON: f64 = 1e-9;

/// Fraction of a departing list's voters who follow a given beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TransferRate(f64);

impl TransferRate {
    pub const NONE: TransferRate = TransferRate(0.0);
    pub const ALL: TransferRate = TransferRate(1.0);

    pub fn new(rate: f64) -> Result<Self, AlgoError> {
        if rate.is_finite() && (0.0..=1.0).contains(&rate) {
            Ok(Self(rate))
        } else {
            Err(AlgoError::InvalidTransferRate(rate))
        }
    }

    /// Saturating constructor; NaN maps to 0.
    pub fn clamped(rate: f64) -> Self {
        if rate.is_nan() {
            Self::NONE
        } else {
            Self(rate.clamp(0.0, 1.0))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for TransferRate {
    fn default() -> Self {
        Self(DEFAULT_TRANSFER_RATE)
    }
}

impl TryFrom<f64> for TransferRate {
    type Error = AlgoError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransferRate> for f64 {
    fn from(r: TransferRate) -> f64 {
        r.0
    }
}

impl fmt::Display for TransferRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

/// Directed transfer `source → target` at `rate`. Used as-is for mergers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEdge {
    pub source: ListId,
    pub target: ListId,
    #[serde(default)]
    pub rate: TransferRate,
}

impl TransferEdge {
    pub fn new(source: ListId, target: ListId, rate: TransferRate) -> Self {
        Self { source, target, rate }
    }
}

/// A qualified list standing down. Outgoing rates sum to at most 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Withdrawal {
    source: ListId,
    beneficiaries: BTreeMap<ListId, TransferRate>,
}

impl Withdrawal {
    pub fn new(
        source: ListId,
        beneficiaries: BTreeMap<ListId, TransferRate>,
    ) -> Result<Self, AlgoError> {
        let total: f64 = beneficiaries.values().map(|r| r.get()).sum();
        if total > 1.0 + RATE_SUM_EPSILON {
            return Err(AlgoError::OverAllocatedWithdrawal { list: source.to_string(), total });
        }
        Ok(Self { source, beneficiaries })
    }

    /// Build from raw rates, clamping each into [0,1] and scaling the set
    /// down proportionally when it sums above 1.
    pub fn rescaled(source: ListId, rates: BTreeMap<ListId, f64>) -> Self {
        let clamped: BTreeMap<ListId, f64> = rates
            .into_iter()
            .map(|(k, r)| (k, TransferRate::clamped(r).get()))
            .collect();
        let total: f64 = clamped.values().sum();
        let scale = if total > 1.0 { 1.0 / total } else { 1.0 };
        let beneficiaries = clamped
            .into_iter()
            .map(|(k, r)| (k, TransferRate::clamped(r * scale)))
            .collect();
        Self { source, beneficiaries }
    }

    pub fn source(&self) -> &ListId {
        &self.source
    }

    pub fn beneficiaries(&self) -> &BTreeMap<ListId, TransferRate> {
        &self.beneficiaries
    }

    pub fn total_rate(&self) -> f64 {
        self.beneficiaries.values().map(|r| r.get()).sum()
    }

    pub fn edges(&self) -> impl Iterator<Item = TransferEdge> + '_ {
        self.beneficiaries
            .iter()
            .map(|(t, &r)| TransferEdge::new(self.source.clone(), t.clone(), r))
    }
}

impl<'de> Deserialize<'de> for Withdrawal {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            source: ListId,
            #[serde(default)]
            beneficiaries: BTreeMap<ListId, TransferRate>,
        }
        let raw = Raw::deserialize(d)?;
        Withdrawal::new(raw.source, raw.beneficiaries).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterRoundConfig {
    pub mergers: Vec<TransferEdge>,
    pub withdrawals: Vec<Withdrawal>,
    /// Participation change from round 1 to round 2, e.g. `0.02` for +2 points.
    pub participation_delta: f64,
}

impl InterRoundConfig {
    pub fn is_empty(&self) -> bool {
        self.mergers.is_empty() && self.withdrawals.is_empty() && self.participation_delta == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestShape {
    NoContest,
    Walkover,
    Duel,
    Triangular,
    QuadrangularPlus,
}

impl ContestShape {
    pub fn from_count(n: usize) -> Self {
        match n {
            0 => ContestShape::NoContest,
            1 => ContestShape::Walkover,
            2 => ContestShape::Duel,
            3 => ContestShape::Triangular,
            _ => ContestShape::QuadrangularPlus,
        }
    }

    /// At least two lists face each other.
    pub fn is_contest(self) -> bool {
        !matches!(self, ContestShape::NoContest | ContestShape::Walkover)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round2Setup {
    pub votes: VoteTally,
    /// Contestants by projected votes, descending.
    pub contestants: Vec<ListId>,
    pub shape: ContestShape,
    pub absorbed: BTreeSet<ListId>,
    pub withdrawn: BTreeSet<ListId>,
    /// Round-2 participation rate after the delta, clamped to [0,1].
    pub participation: f64,
    /// Projected total after transfers, before re-basing.
    pub pre_rebase_total: f64,
}

pub fn project_round2(
    round1: &VoteTally,
    partition: &Round1Partition,
    config: &InterRoundConfig,
    registered: u64,
    participation_r1: f64,
) -> Round2Setup {
    let r1 = |id: &ListId| round1.get(id).copied().unwrap_or(0) as f64;

    let mut working: BTreeMap<ListId, f64> =
        partition.qualified.iter().map(|q| (q.clone(), r1(q))).collect();

    let mut absorbed = BTreeSet::new();
    for edge in &config.mergers {
        if !partition.fusion_eligible.contains(&edge.source) {
            warn!(source = %edge.source, "merger skipped: source is not fusion-eligible");
            continue;
        }
        match working.get_mut(&edge.target) {
            Some(v) => {
                *v += r1(&edge.source) * edge.rate.get();
                absorbed.insert(edge.source.clone());
            }
            None => warn!(target = %edge.target, "merger skipped: target not in round 2"),
        }
    }

    let mut withdrawn = BTreeSet::new();
    for w in &config.withdrawals {
        let Some(base) = working.remove(&w.source) else {
            warn!(source = %w.source, "withdrawal skipped: list not in round 2");
            continue;
        };
        withdrawn.insert(w.source.clone());
        for (beneficiary, rate) in &w.beneficiaries {
            if let Some(v) = working.get_mut(beneficiary) {
                *v += base * rate.get();
            }
        }
    }

    let participation = (participation_r1 + config.participation_delta).clamp(0.0, 1.0);
    let pre_rebase_total: f64 = working.values().sum();
    let target = registered as f64 * participation;
    let ratio = if pre_rebase_total > 0.0 { target / pre_rebase_total } else { 1.0 };

    let votes: VoteTally = working.into_iter().map(|(k, v)| (k, to_count(v * ratio))).collect();
    let contestants = ranked(&votes);
    let shape = ContestShape::from_count(contestants.len());

    Round2Setup { votes, contestants, shape, absorbed, withdrawn, participation, pre_rebase_total }
}

/// Mergers from a declared alliance map (fusion-eligible list → preferred
/// qualified partner). Alliances pointing outside the qualified set are ignored.
pub fn auto_fusions(
    fusion_eligible: &BTreeSet<ListId>,
    qualified: &BTreeSet<ListId>,
    alliances: &BTreeMap<ListId, ListId>,
    rate: TransferRate,
) -> Vec<TransferEdge> {
    fusion_eligible
        .iter()
        .filter_map(|f| {
            alliances
                .get(f)
                .filter(|target| qualified.contains(*target))
                .map(|target| TransferEdge::new(f.clone(), target.clone(), rate))
        })
        .collect()
}
