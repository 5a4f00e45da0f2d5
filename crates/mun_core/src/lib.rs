//! mun_core: Core types, rules, families, rounding, and deterministic RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared by the
//! engine crates (`mun_algo`, `mun_pipeline`, `mun_io`, `mun_cli`).
//!
//! - List identifiers: `ListId`
//! - Tallies: `VoteTally`, `PercentageTally`, `SeatAllocation`, `ShareThreshold`
//! - Political families: closed `FamilyCode` enumeration + `Coalition` tags
//! - Election rules: `ElectionRules` (Paris 2026 defaults) + `RulesStatus`
//! - Half-even rounding helpers
//! - Seedable RNG (ChaCha20) for Monte Carlo perturbations

#![forbid(unsafe_code)]

pub mod entities;
pub mod errors;
pub mod families;
pub mod ids;
pub mod rng;
pub mod rounding;
pub mod variables;

pub use entities::{PercentageTally, SeatAllocation, ShareThreshold, VoteTally};
pub use errors::CoreError;
pub use families::{Coalition, FamilyCode};
pub use ids::ListId;
pub use rng::SimRng;
pub use variables::{ElectionRules, RulesStatus};
