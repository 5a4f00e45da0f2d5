//! Scenario: the full set of assumptions for one simulated election.
//!
//! Scores may be given as fractions (sum ≈ 1) or points (sum ≈ 100); both
//! are renormalised before use. Every per-sector table is optional and falls
//! back to the city-wide value. `None` for participation / registered means
//! "use the rules' default".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mun_algo::rounds::InterRoundConfig;
use mun_algo::MayorCandidate;
use mun_core::families::FamilyCode;
use mun_core::ids::ListId;
use mun_core::variables::ElectionRules;

use crate::PipelineError;

/// List → score (fraction or points).
pub type ScoreTable = BTreeMap<ListId, f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioSource {
    #[default]
    Manual,
    Poll,
    MonteCarlo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MayorSetup {
    pub candidates: Vec<MayorCandidate>,
    /// Overrides the rules' discipline rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discipline_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub source: ScenarioSource,

    pub city_scores: ScoreTable,
    /// Sector name → scores. Missing sectors reuse `city_scores`.
    pub sector_scores: BTreeMap<String, ScoreTable>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation: Option<f64>,
    pub sector_participation: BTreeMap<String, f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<u64>,
    /// Missing sectors get a seat-weighted share of the city electorate.
    pub sector_registered: BTreeMap<String, u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_interround: Option<InterRoundConfig>,
    pub sector_interround: BTreeMap<String, InterRoundConfig>,

    /// Family of lists whose name is not itself a family code ("Gauche unie").
    pub list_families: BTreeMap<ListId, FamilyCode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mayor: Option<MayorSetup>,

    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Copy with overrides, for sensitivity analysis. The copy is renamed
    /// `"<name> (variante)"` unless `edit` sets a new name.
    pub fn variant(&self, edit: impl FnOnce(&mut Scenario)) -> Scenario {
        let mut out = self.clone();
        edit(&mut out);
        if out.name == self.name {
            out.name = format!("{} (variante)", self.name);
        }
        out
    }

    /// Family of a list: explicit tag first, else the list id read as a
    /// family code, else `DIV`.
    pub fn family_of(&self, list: &ListId) -> FamilyCode {
        self.list_families
            .get(list)
            .copied()
            .unwrap_or_else(|| FamilyCode::or_diverse(list.as_str()))
    }

    pub fn effective_participation(&self, rules: &ElectionRules) -> f64 {
        self.participation.unwrap_or(rules.default_participation)
    }

    pub fn effective_registered(&self, rules: &ElectionRules) -> u64 {
        self.registered.unwrap_or(rules.default_registered)
    }

    /// Reject values no ballot can be built from. Sector keys must name a
    /// sector of `rules`.
    pub fn validate(&self, rules: &ElectionRules) -> Result<(), PipelineError> {
        if self.city_scores.is_empty() {
            return Err(invalid(format!("scenario '{}' has no city-wide scores", self.name)));
        }
        check_scores("city_scores", &self.city_scores)?;
        for (sector, scores) in &self.sector_scores {
            check_sector(rules, "sector_scores", sector)?;
            check_scores(&format!("sector_scores.{sector}"), scores)?;
        }

        if let Some(p) = self.participation {
            check_fraction("participation", p)?;
        }
        for (sector, &p) in &self.sector_participation {
            check_sector(rules, "sector_participation", sector)?;
            check_fraction(&format!("sector_participation.{sector}"), p)?;
        }
        for sector in self.sector_registered.keys() {
            check_sector(rules, "sector_registered", sector)?;
        }

        if let Some(cfg) = &self.city_interround {
            check_delta("city_interround", cfg)?;
        }
        for (sector, cfg) in &self.sector_interround {
            check_sector(rules, "sector_interround", sector)?;
            check_delta(&format!("sector_interround.{sector}"), cfg)?;
        }

        if let Some(rate) = self.mayor.as_ref().and_then(|m| m.discipline_rate) {
            check_fraction("mayor.discipline_rate", rate)?;
        }
        Ok(())
    }
}

fn invalid(msg: String) -> PipelineError {
    PipelineError::InvalidScenario(msg)
}

fn check_scores(field: &str, scores: &ScoreTable) -> Result<(), PipelineError> {
    for (list, &v) in scores {
        if !v.is_finite() || v < 0.0 {
            return Err(invalid(format!("{field}: score of '{list}' must be finite and >= 0, got {v}")));
        }
    }
    Ok(())
}

fn check_fraction(field: &str, v: f64) -> Result<(), PipelineError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be in [0,1], got {v}")))
    }
}

fn check_delta(field: &str, cfg: &InterRoundConfig) -> Result<(), PipelineError> {
    let d = cfg.participation_delta;
    if d.is_finite() && (-1.0..=1.0).contains(&d) {
        Ok(())
    } else {
        Err(invalid(format!("{field}.participation_delta must be in [-1,1], got {d}")))
    }
}

fn check_sector(rules: &ElectionRules, field: &str, sector: &str) -> Result<(), PipelineError> {
    match rules.sector(sector) {
        Some(_) => Ok(()),
        None => Err(invalid(format!("{field}: unknown sector '{sector}'"))),
    }
}
