// crates/mun_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure electoral arithmetic. No I/O, no global state; every function is a
//! transformation over immutable inputs and is deterministic given its inputs.

use thiserror::Error;

pub use mun_core::{
    entities::{PercentageTally, SeatAllocation, ShareThreshold, VoteTally},
    ids::ListId,
    variables::BallotRules,
};

/// Errors raised by the algorithm layer. Degenerate inputs (zero seats, zero
/// votes) are not errors; only configuration faults are.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlgoError {
    /// A run-off was requested but nobody has any votes.
    #[error("round 2 has no expressed votes; a run-off requires configured contestants")]
    EmptyRound2Ballot,

    #[error("transfer rate must be a finite value in [0,1], got {0}")]
    InvalidTransferRate(f64),

    #[error("withdrawal of {list} hands out {total} of its votes (must be <= 1)")]
    OverAllocatedWithdrawal { list: String, total: f64 },

    #[error("invalid calibration input: {0}")]
    InvalidCalibration(String),
}

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod bonus;
    pub mod dhondt;

    pub use bonus::allocate_with_bonus;
    pub use dhondt::{allocate_dhondt, quotient_table, QuotientRow};
}

// ----------------------------- Two-round resolution ----------------------------------

pub mod rounds {
    pub mod interround;
    pub mod round1;
    pub mod round2;

    pub use interround::{
        auto_fusions, project_round2, ContestShape, InterRoundConfig, Round2Setup, TransferEdge,
        TransferRate, Withdrawal,
    };
    pub use round1::{run_round1, Round1Outcome, Round1Partition, Round1Result};
    pub use round2::{run_round2, Round2Result};
}

pub mod mayor;

// ----------------------------- Poll calibration --------------------------------------

pub mod calibration {
    pub mod classify;
    pub mod dataset;
    pub mod model;

    pub use classify::{classify_list, group_by_family};
    pub use dataset::{build_model, calibration_points, leave_one_out, overall_mae};
    pub use model::{
        Band, CalibrationPoint, CalibrationSettings, CorrectionFactor, CorrectionMethod,
        RedressementModel,
    };
}

pub mod stats;

// Convenience re-exports (pipeline imports these from crate root)
pub use allocation::{allocate_dhondt, allocate_with_bonus};
pub use mayor::{elect_mayor, majority_check, CoalitionStanding, MayorCandidate, MayorOutcome};
pub use rounds::{project_round2, run_round1, run_round2};
