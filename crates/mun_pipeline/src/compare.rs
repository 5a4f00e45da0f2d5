//! Side-by-side runs of several scenarios.

use std::collections::BTreeMap;

use serde::Serialize;

use mun_core::entities::SeatAllocation;
use mun_core::families::Coalition;
use mun_core::variables::absolute_majority;

use crate::orchestrator::{ElectionResult, Orchestrator};
use crate::scenario::Scenario;
use crate::PipelineError;

/// City council seats per bloc for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoalitionSummary {
    pub seats: BTreeMap<Coalition, u32>,
    /// Some bloc holds the absolute majority on its own.
    pub majority: bool,
    pub majority_threshold: u32,
}

#[derive(Debug, Default)]
pub struct ScenarioComparator {
    scenarios: Vec<Scenario>,
    results: BTreeMap<String, ElectionResult>,
}

impl ScenarioComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Run every scenario; previous results are dropped. Scenario names are
    /// the keys, so a later scenario with the same name replaces an earlier one.
    pub fn run_all(&mut self, orchestrator: &Orchestrator) -> Result<&BTreeMap<String, ElectionResult>, PipelineError> {
        self.results.clear();
        for s in &self.scenarios {
            let r = orchestrator.run(s)?;
            self.results.insert(s.name.clone(), r);
        }
        Ok(&self.results)
    }

    pub fn results(&self) -> &BTreeMap<String, ElectionResult> {
        &self.results
    }

    /// Scenario → city council seats.
    pub fn seats_table(&self) -> BTreeMap<String, SeatAllocation> {
        self.results.iter().map(|(name, r)| (name.clone(), r.city_seats())).collect()
    }

    pub fn coalition_summary(&self) -> BTreeMap<String, CoalitionSummary> {
        let mut out = BTreeMap::new();
        for scenario in &self.scenarios {
            let Some(result) = self.results.get(&scenario.name) else { continue };
            let seats = result.city_seats();
            let mut by_bloc: BTreeMap<Coalition, u32> = Coalition::BLOCS.iter().map(|&c| (c, 0)).collect();
            for (list, &n) in &seats {
                if let Some(slot) = by_bloc.get_mut(&scenario.family_of(list).coalition()) {
                    *slot += n;
                }
            }
            let threshold = absolute_majority(result.city.total_seats);
            let majority = by_bloc.values().any(|&n| n >= threshold);
            out.insert(
                scenario.name.clone(),
                CoalitionSummary { seats: by_bloc, majority, majority_threshold: threshold },
            );
        }
        out
    }
}
