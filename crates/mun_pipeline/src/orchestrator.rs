//! Full election run: the city-wide ballot, every sector ballot, then the
//! mayor if the city ballot produced a council.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use mun_algo::{elect_mayor, MayorOutcome};
use mun_core::entities::SeatAllocation;
use mun_core::ids::ListId;
use mun_core::rounding::to_count;
use mun_core::variables::{ElectionRules, RulesStatus};

use crate::convert::scores_to_votes;
use crate::scenario::Scenario;
use crate::scrutin::{simulate_scrutin, ScrutinResult};
use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionResult {
    pub scenario: String,
    pub city: ScrutinResult,
    pub sectors: BTreeMap<String, ScrutinResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mayor: Option<MayorOutcome>,
}

impl ElectionResult {
    /// City council seats; empty when the city ballot had no contest.
    pub fn city_seats(&self) -> SeatAllocation {
        self.city.seats().cloned().unwrap_or_default()
    }

    pub fn sector_winners(&self) -> BTreeMap<String, Option<ListId>> {
        self.sectors.iter().map(|(name, r)| (name.clone(), r.winner().cloned())).collect()
    }

    /// Arrondissement council seats per list, summed over sectors.
    pub fn sector_seat_totals(&self) -> SeatAllocation {
        let mut out = SeatAllocation::new();
        for seats in self.sectors.values().filter_map(ScrutinResult::seats) {
            for (list, &n) in seats {
                *out.entry(list.clone()).or_insert(0) += n;
            }
        }
        out
    }

    /// Ballot name → seats, city first.
    pub fn seats_summary(&self) -> Vec<(String, SeatAllocation)> {
        std::iter::once(&self.city)
            .chain(self.sectors.values())
            .map(|r| (r.name.clone(), r.seats().cloned().unwrap_or_default()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    rules: ElectionRules,
}

impl Orchestrator {
    /// Validate the rules once; notices (provisional seat counts, ...) are
    /// handed back to the caller rather than logged here.
    pub fn new(rules: ElectionRules) -> Result<(Self, RulesStatus), PipelineError> {
        let status = rules.validate()?;
        Ok((Self { rules }, status))
    }

    pub fn rules(&self) -> &ElectionRules {
        &self.rules
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ElectionResult, PipelineError> {
        let rules = &self.rules;
        scenario.validate(rules)?;

        let registered = scenario.effective_registered(rules);
        let participation = scenario.effective_participation(rules);

        let city_votes = scores_to_votes(&scenario.city_scores, registered, participation);
        let city = simulate_scrutin(
            &rules.city_name,
            &city_votes,
            &rules.city_ballot(),
            scenario.city_interround.as_ref(),
            registered,
            participation,
        )
        .map_err(|source| PipelineError::Ballot { ballot: rules.city_name.clone(), source })?;

        let sector_seat_total = rules.total_sector_seats();
        let mut sectors = BTreeMap::new();
        for sector in &rules.sectors {
            let name = sector.name.as_str();
            let scores = scenario.sector_scores.get(name).unwrap_or(&scenario.city_scores);
            let s_registered = match scenario.sector_registered.get(name) {
                Some(&n) => n,
                None => to_count(registered as f64 * sector.seats as f64 / sector_seat_total as f64),
            };
            let s_participation = scenario.sector_participation.get(name).copied().unwrap_or(participation);

            let votes = scores_to_votes(scores, s_registered, s_participation);
            let result = simulate_scrutin(
                name,
                &votes,
                &rules.sector_ballot(sector),
                scenario.sector_interround.get(name),
                s_registered,
                s_participation,
            )
            .map_err(|source| PipelineError::Ballot { ballot: sector.name.clone(), source })?;
            sectors.insert(sector.name.clone(), result);
        }

        let mayor = match (&scenario.mayor, city.seats()) {
            (Some(setup), Some(seats)) if !setup.candidates.is_empty() => Some(elect_mayor(
                seats,
                &setup.candidates,
                setup.discipline_rate.unwrap_or(rules.mayor_discipline_rate),
                rules.mayor_max_rounds,
            )),
            _ => None,
        };

        debug!(
            scenario = %scenario.name,
            city = ?city.resolution(),
            sectors = sectors.len(),
            mayor = mayor.as_ref().and_then(|m| m.elected.as_deref()).unwrap_or("-"),
            "election simulated"
        );

        Ok(ElectionResult { scenario: scenario.name.clone(), city, sectors, mayor })
    }
}
