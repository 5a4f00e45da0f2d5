//! Election rules and their Paris 2026 defaults.
//!
//! Two ballots per election since the 2025 reform:
//! - one city-wide list ballot for the Conseil de Paris (163 seats, 25 % bonus);
//! - one ballot per sector for the arrondissement councils (50 % bonus).
//!
//! Sector seat counts mirror the councils sitting in 2020 and are provisional
//! until the implementing decree is published. The flag travels with the rules
//! and is reported through [`RulesStatus`] when the rules are validated.
//!
//! Every field has a serde default, so a rules file only needs the overrides.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::ShareThreshold;
use crate::errors::CoreError;
use crate::rounding::to_seats;

/// Share of a departing list's voters assumed to follow a merger or withdrawal.
pub const DEFAULT_TRANSFER_RATE: f64 = 0.85;

/// One sector ballot: name, the arrondissements it covers, council size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRule {
    pub name: String,
    pub arrondissements: Vec<u8>,
    pub seats: u32,
}

impl SectorRule {
    fn new(name: &str, arrondissements: &[u8], seats: u32) -> Self {
        Self { name: name.to_string(), arrondissements: arrondissements.to_vec(), seats }
    }
}

/// Monte Carlo defaults (sigmas are fractions of the expressed vote).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloDefaults {
    pub iterations: u32,
    pub score_sigma: f64,
    pub participation_sigma: f64,
    pub transfer_sigma: f64,
    pub participation_floor: f64,
    pub participation_ceiling: f64,
}

impl Default for MonteCarloDefaults {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            score_sigma: 0.02,
            participation_sigma: 0.03,
            transfer_sigma: 0.10,
            participation_floor: 0.15,
            participation_ceiling: 0.85,
        }
    }
}

/// Full rule set for one municipal election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionRules {
    pub city_name: String,
    pub city_seats: u32,
    pub city_bonus_fraction: f64,

    pub sectors: Vec<SectorRule>,
    pub sector_bonus_fraction: f64,
    pub provisional_sector_seats: bool,

    /// Strictly above this share in round 1 wins outright.
    pub victory_threshold: f64,
    pub qualification_threshold: f64,
    pub fusion_threshold: f64,
    /// Minimum share to take part in the proportional distribution.
    pub proportional_threshold: f64,

    pub default_participation: f64,
    pub default_registered: u64,
    pub default_transfer_rate: f64,

    pub mayor_discipline_rate: f64,
    pub mayor_max_rounds: u8,

    pub monte_carlo: MonteCarloDefaults,
}

impl Default for ElectionRules {
    fn default() -> Self {
        Self::paris_2026()
    }
}

/// Result of rule validation. Informational notices (e.g. provisional seat
/// counts) are returned to the caller instead of being emitted as side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesStatus {
    pub provisional_sector_seats: bool,
    pub notices: Vec<String>,
}

impl RulesStatus {
    pub fn is_clean(&self) -> bool {
        !self.provisional_sector_seats && self.notices.is_empty()
    }
}

/// Seats, bonus, and thresholds for a single ballot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallotRules {
    pub seats: u32,
    pub bonus_fraction: f64,
    pub victory: ShareThreshold,
    pub qualification: ShareThreshold,
    pub fusion: ShareThreshold,
    pub proportional: ShareThreshold,
}

impl BallotRules {
    /// Absolute majority of the chamber elected by this ballot.
    pub fn absolute_majority(&self) -> u32 {
        absolute_majority(self.seats)
    }

    /// Seats carved out for the winner.
    pub fn bonus_seats(&self) -> u32 {
        bonus_seats(self.seats, self.bonus_fraction)
    }
}

/// `floor(seats / 2) + 1`.
#[inline]
pub fn absolute_majority(seats: u32) -> u32 {
    seats / 2 + 1
}

/// `round(seats × fraction)`, fraction clamped to [0,1].
#[inline]
pub fn bonus_seats(seats: u32, fraction: f64) -> u32 {
    let f = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    to_seats(seats as f64 * f).min(seats)
}

impl ElectionRules {
    pub fn paris_2026() -> Self {
        Self {
            city_name: "Conseil de Paris".to_string(),
            city_seats: 163,
            city_bonus_fraction: 0.25,
            sectors: vec![
                SectorRule::new("Paris Centre", &[1, 2, 3, 4], 99),
                SectorRule::new("5e", &[5], 27),
                SectorRule::new("6e", &[6], 21),
                SectorRule::new("7e", &[7], 25),
                SectorRule::new("8e", &[8], 21),
                SectorRule::new("9e", &[9], 27),
                SectorRule::new("10e", &[10], 33),
                SectorRule::new("11e", &[11], 41),
                SectorRule::new("12e", &[12], 37),
                SectorRule::new("13e", &[13], 41),
                SectorRule::new("14e", &[14], 37),
                SectorRule::new("15e", &[15], 53),
                SectorRule::new("16e", &[16], 41),
                SectorRule::new("17e", &[17], 41),
                SectorRule::new("18e", &[18], 51),
                SectorRule::new("19e", &[19], 47),
                SectorRule::new("20e", &[20], 51),
            ],
            sector_bonus_fraction: 0.50,
            provisional_sector_seats: true,
            victory_threshold: 0.50,
            qualification_threshold: 0.10,
            fusion_threshold: 0.05,
            proportional_threshold: 0.05,
            default_participation: 0.45,
            default_registered: 1_400_000,
            default_transfer_rate: DEFAULT_TRANSFER_RATE,
            mayor_discipline_rate: 0.95,
            mayor_max_rounds: 3,
            monte_carlo: MonteCarloDefaults::default(),
        }
    }

    pub fn city_ballot(&self) -> BallotRules {
        self.ballot(self.city_seats, self.city_bonus_fraction)
    }

    pub fn sector_ballot(&self, sector: &SectorRule) -> BallotRules {
        self.ballot(sector.seats, self.sector_bonus_fraction)
    }

    fn ballot(&self, seats: u32, bonus_fraction: f64) -> BallotRules {
        BallotRules {
            seats,
            bonus_fraction,
            victory: ShareThreshold::from_fraction_clamped(self.victory_threshold),
            qualification: ShareThreshold::from_fraction_clamped(self.qualification_threshold),
            fusion: ShareThreshold::from_fraction_clamped(self.fusion_threshold),
            proportional: ShareThreshold::from_fraction_clamped(self.proportional_threshold),
        }
    }

    pub fn sector(&self, name: &str) -> Option<&SectorRule> {
        self.sectors.iter().find(|s| s.name == name)
    }

    pub fn sector_for_arrondissement(&self, arrondissement: u8) -> Option<&SectorRule> {
        self.sectors.iter().find(|s| s.arrondissements.contains(&arrondissement))
    }

    pub fn total_sector_seats(&self) -> u32 {
        self.sectors.iter().map(|s| s.seats).sum()
    }

    pub fn city_absolute_majority(&self) -> u32 {
        absolute_majority(self.city_seats)
    }

    /// Validate domains and consistency; report notices instead of warning.
    pub fn validate(&self) -> Result<RulesStatus, CoreError> {
        if self.city_seats == 0 {
            return Err(CoreError::DomainOutOfRange("city_seats must be > 0".into()));
        }
        for (name, v) in [
            ("city_bonus_fraction", self.city_bonus_fraction),
            ("sector_bonus_fraction", self.sector_bonus_fraction),
            ("victory_threshold", self.victory_threshold),
            ("qualification_threshold", self.qualification_threshold),
            ("fusion_threshold", self.fusion_threshold),
            ("proportional_threshold", self.proportional_threshold),
            ("default_participation", self.default_participation),
            ("default_transfer_rate", self.default_transfer_rate),
            ("mayor_discipline_rate", self.mayor_discipline_rate),
        ] {
            check_fraction(name, v)?;
        }
        if self.fusion_threshold > self.qualification_threshold {
            return Err(CoreError::DomainOutOfRange(
                "fusion_threshold must not exceed qualification_threshold".into(),
            ));
        }
        if self.mayor_max_rounds == 0 {
            return Err(CoreError::DomainOutOfRange("mayor_max_rounds must be >= 1".into()));
        }

        let mc = &self.monte_carlo;
        for (name, v) in [
            ("monte_carlo.score_sigma", mc.score_sigma),
            ("monte_carlo.participation_sigma", mc.participation_sigma),
            ("monte_carlo.transfer_sigma", mc.transfer_sigma),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::DomainOutOfRange(format!("{name} must be finite and >= 0")));
            }
        }
        check_fraction("monte_carlo.participation_floor", mc.participation_floor)?;
        check_fraction("monte_carlo.participation_ceiling", mc.participation_ceiling)?;
        if mc.participation_floor > mc.participation_ceiling {
            return Err(CoreError::DomainOutOfRange(
                "monte_carlo participation floor above ceiling".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut arrondissements = BTreeSet::new();
        for s in &self.sectors {
            if !seen.insert(s.name.as_str()) {
                return Err(CoreError::DuplicateSector(s.name.clone()));
            }
            if s.seats == 0 {
                return Err(CoreError::DomainOutOfRange(format!("sector {} has 0 seats", s.name)));
            }
            for a in &s.arrondissements {
                if !arrondissements.insert(*a) {
                    return Err(CoreError::DomainOutOfRange(format!(
                        "arrondissement {a} assigned to more than one sector"
                    )));
                }
            }
        }

        let mut status = RulesStatus {
            provisional_sector_seats: self.provisional_sector_seats,
            notices: Vec::new(),
        };
        if self.provisional_sector_seats {
            status.notices.push(
                "arrondissement council sizes are provisional (2020 figures) pending the 2025 reform decree"
                    .to_string(),
            );
        }
        if self.sectors.is_empty() {
            status.notices.push("no sector ballots configured; only the city-wide ballot runs".to_string());
        }
        Ok(status)
    }
}

fn check_fraction(name: &str, v: f64) -> Result<(), CoreError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(CoreError::DomainOutOfRange(format!("{name} must be in [0,1], got {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paris_defaults() {
        let r = ElectionRules::paris_2026();
        assert_eq!(r.city_seats, 163);
        assert_eq!(r.city_ballot().bonus_seats(), 41);
        assert_eq!(r.city_absolute_majority(), 82);
        assert_eq!(r.sectors.len(), 17);
        assert_eq!(r.sector("15e").map(|s| s.seats), Some(53));
        assert_eq!(r.sector_for_arrondissement(3).map(|s| s.name.as_str()), Some("Paris Centre"));
        assert_eq!(r.total_sector_seats(), 693);
    }

    #[test]
    fn provisional_seats_reported_not_warned() {
        let status = ElectionRules::paris_2026().validate().unwrap();
        assert!(status.provisional_sector_seats);
        assert_eq!(status.notices.len(), 1);

        let mut r = ElectionRules::paris_2026();
        r.provisional_sector_seats = false;
        assert!(r.validate().unwrap().is_clean());
    }

    #[test]
    fn sector_bonus_rounds_half_even() {
        let r = ElectionRules::paris_2026();
        let sixth = r.sector("6e").unwrap();
        assert_eq!(r.sector_ballot(sixth).bonus_seats(), 10); // 10.5
        let centre = r.sector("Paris Centre").unwrap();
        assert_eq!(r.sector_ballot(centre).bonus_seats(), 50); // 49.5
    }

    #[test]
    fn validation_rejects_bad_domains() {
        let mut r = ElectionRules::paris_2026();
        r.city_bonus_fraction = 1.2;
        assert!(r.validate().is_err());

        let mut r = ElectionRules::paris_2026();
        r.sectors.push(SectorRule::new("5e", &[21], 10));
        assert!(matches!(r.validate(), Err(CoreError::DuplicateSector(_))));

        let mut r = ElectionRules::paris_2026();
        r.fusion_threshold = 0.2;
        assert!(r.validate().is_err());
    }

    #[test]
    fn partial_json_overrides_fill_defaults() {
        let r: ElectionRules = serde_json::from_str(r#"{"city_seats": 101}"#).unwrap();
        assert_eq!(r.city_seats, 101);
        assert_eq!(r.sectors.len(), 17);
        assert_eq!(r.monte_carlo.iterations, 10_000);
    }
}
