//! mun_pipeline: deterministic orchestration (scores → votes → round 1 → inter-round →
//! round 2 → mayor) plus the Monte Carlo engine wrapped around it.
//! I/O-free: scenarios arrive as values, results leave as values. JSON lives in `mun_io`.

#![forbid(unsafe_code)]

use thiserror::Error;

use mun_algo::AlgoError;
use mun_core::errors::CoreError;

pub mod compare;
pub mod convert;
pub mod montecarlo;
pub mod orchestrator;
pub mod presets;
pub mod scenario;
pub mod scrutin;

pub use compare::{CoalitionSummary, ScenarioComparator};
pub use convert::scores_to_votes;
pub use montecarlo::{simulate, IterationFailure, MonteCarloParams, MonteCarloResult};
pub use orchestrator::{ElectionResult, Orchestrator};
pub use scenario::{MayorSetup, Scenario, ScenarioSource, ScoreTable};
pub use scrutin::{Resolution, ScrutinResult};

/// Single error surface for orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid election rules: {0}")]
    Rules(#[from] CoreError),

    /// A ballot could not be resolved; names the ballot so the scenario can be fixed.
    #[error("ballot '{ballot}': {source}")]
    Ballot {
        ballot: String,
        #[source]
        source: AlgoError,
    },
}

impl PipelineError {
    /// Round-2 configuration faults, as opposed to malformed input.
    pub fn is_simulation_fault(&self) -> bool {
        matches!(self, PipelineError::Ballot { .. })
    }
}
