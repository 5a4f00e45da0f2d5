//! Poll correction ("redressement").
//!
//! Per political family, fit either a multiplicative ratio `actual / poll` or
//! an additive delta `actual − poll` over historical points, weighted by
//! recency: `w = exp(−ln 2 × |reference_year − year| / (half_life × 2.5))`,
//! the half-life being counted in elections of roughly 2.5 years each.
//!
//! Contract:
//! - Families absent from the calibration set pass through unchanged.
//! - `correct` clamps negatives to 0 and renormalises to 100 whenever the
//!   corrected total is positive; if the correction wipes out every score the
//!   raw scores are renormalised instead.
//! - Bands are on the same renormalised scale as the central estimate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mun_core::families::FamilyCode;

use crate::stats::{weighted_mean, weighted_std, z_for_confidence};
use crate::{AlgoError, ListId};

/// Polls below this score (in points) are too small to yield a stable ratio.
const MIN_POLL_FOR_RATIO: f64 = 0.5;
const YEARS_PER_ELECTION: f64 = 2.5;
const CI95_Z: f64 = 1.96;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    #[default]
    Multiplicative,
    Additive,
}

impl CorrectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionMethod::Multiplicative => "multiplicative",
            CorrectionMethod::Additive => "additive",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionMethod {
    type Err = AlgoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiplicative" | "mult" => Ok(CorrectionMethod::Multiplicative),
            "additive" | "add" => Ok(CorrectionMethod::Additive),
            other => Err(AlgoError::InvalidCalibration(format!("unknown correction method '{other}'"))),
        }
    }
}

fn default_year() -> i32 {
    2020
}

/// A historical (poll, result) pair for one family, scores in points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub election: String,
    pub family: FamilyCode,
    pub poll_score: f64,
    pub actual_score: f64,
    #[serde(default = "default_year")]
    pub year: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub method: CorrectionMethod,
    /// In elections.
    pub half_life: f64,
    pub reference_year: i32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self { method: CorrectionMethod::Multiplicative, half_life: 2.0, reference_year: 2026 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrectionFactor {
    pub family: FamilyCode,
    pub method: CorrectionMethod,
    /// Ratio (multiplicative) or delta in points (additive).
    pub factor: f64,
    pub std: f64,
    pub n_points: usize,
    pub confidence_low: f64,
    pub confidence_high: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Band {
    pub low: f64,
    pub central: f64,
    pub high: f64,
}

#[derive(Clone, Debug)]
pub struct RedressementModel {
    settings: CalibrationSettings,
    points: Vec<CalibrationPoint>,
    factors: BTreeMap<FamilyCode, CorrectionFactor>,
}

impl RedressementModel {
    pub fn new(settings: CalibrationSettings) -> Result<Self, AlgoError> {
        if !settings.half_life.is_finite() || settings.half_life <= 0.0 {
            return Err(AlgoError::InvalidCalibration(format!(
                "half-life must be positive, got {}",
                settings.half_life
            )));
        }
        Ok(Self { settings, points: Vec::new(), factors: BTreeMap::new() })
    }

    /// Build and fit in one go.
    pub fn from_points(
        settings: CalibrationSettings,
        points: impl IntoIterator<Item = CalibrationPoint>,
    ) -> Result<Self, AlgoError> {
        let mut model = Self::new(settings)?;
        model.add_points(points);
        model.calibrate()?;
        Ok(model)
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn factors(&self) -> &BTreeMap<FamilyCode, CorrectionFactor> {
        &self.factors
    }

    pub fn factor(&self, family: FamilyCode) -> Option<&CorrectionFactor> {
        self.factors.get(&family)
    }

    pub fn add_point(&mut self, point: CalibrationPoint) {
        self.points.push(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = CalibrationPoint>) {
        self.points.extend(points);
    }

    /// Recency weight of a point from `year`.
    pub fn weight(&self, year: i32) -> f64 {
        let distance = (self.settings.reference_year - year).unsigned_abs() as f64;
        (-std::f64::consts::LN_2 * distance / (self.settings.half_life * YEARS_PER_ELECTION)).exp()
    }

    /// Refit every family from the current points. Previous factors are discarded.
    pub fn calibrate(&mut self) -> Result<(), AlgoError> {
        let mut by_family: BTreeMap<FamilyCode, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for pt in &self.points {
            if !pt.poll_score.is_finite() || !pt.actual_score.is_finite() {
                return Err(AlgoError::InvalidCalibration(format!(
                    "non-finite score for {} in {}",
                    pt.family, pt.election
                )));
            }
            let value = match self.settings.method {
                CorrectionMethod::Multiplicative if pt.poll_score > MIN_POLL_FOR_RATIO => {
                    pt.actual_score / pt.poll_score
                }
                CorrectionMethod::Multiplicative => 1.0,
                CorrectionMethod::Additive => pt.actual_score - pt.poll_score,
            };
            let entry = by_family.entry(pt.family).or_default();
            entry.0.push(value);
            entry.1.push(self.weight(pt.year));
        }

        self.factors = by_family
            .into_iter()
            .map(|(family, (values, weights))| {
                let factor = weighted_mean(&values, &weights);
                let std = weighted_std(&values, &weights);
                let cf = CorrectionFactor {
                    family,
                    method: self.settings.method,
                    factor,
                    std,
                    n_points: values.len(),
                    confidence_low: factor - CI95_Z * std,
                    confidence_high: factor + CI95_Z * std,
                };
                (family, cf)
            })
            .collect();
        debug!(families = self.factors.len(), points = self.points.len(), "calibration fitted");
        Ok(())
    }

    /// Correct a single score without clamping or renormalising.
    pub fn adjust(&self, family: FamilyCode, score: f64) -> f64 {
        match self.factors.get(&family) {
            Some(cf) => self.apply(cf.factor, score),
            None => score,
        }
    }

    fn apply(&self, factor: f64, score: f64) -> f64 {
        match self.settings.method {
            CorrectionMethod::Multiplicative => score * factor,
            CorrectionMethod::Additive => score + factor,
        }
    }

    /// Correct every list and renormalise the set to 100.
    pub fn correct(
        &self,
        raw: &BTreeMap<ListId, f64>,
        families: &BTreeMap<ListId, FamilyCode>,
    ) -> BTreeMap<ListId, f64> {
        self.corrected_with_scale(raw, families).0
    }

    /// Per-list `(low, central, high)` at `confidence`. Lists whose family has
    /// no factor or a zero std collapse to the central value.
    pub fn uncertainty_band(
        &self,
        raw: &BTreeMap<ListId, f64>,
        families: &BTreeMap<ListId, FamilyCode>,
        confidence: f64,
    ) -> BTreeMap<ListId, Band> {
        let z = z_for_confidence(confidence);
        let (central, scale) = self.corrected_with_scale(raw, families);

        raw.iter()
            .map(|(list, &score)| {
                let c = central.get(list).copied().unwrap_or(0.0);
                let flat = Band { low: c, central: c, high: c };
                let cf = family_of(list, families).and_then(|f| self.factors.get(&f));
                let band = match (cf, scale) {
                    (Some(cf), Some(scale)) if cf.std > 0.0 => {
                        let low = self.apply(cf.factor - z * cf.std, score) * scale;
                        let high = self.apply(cf.factor + z * cf.std, score) * scale;
                        Band { low: low.max(0.0), central: c, high: high.max(0.0) }
                    }
                    _ => flat,
                };
                (list.clone(), band)
            })
            .collect()
    }

    /// Corrected scores plus the renormalisation factor applied to them
    /// (`None` when the raw fallback was used).
    fn corrected_with_scale(
        &self,
        raw: &BTreeMap<ListId, f64>,
        families: &BTreeMap<ListId, FamilyCode>,
    ) -> (BTreeMap<ListId, f64>, Option<f64>) {
        let corrected: BTreeMap<ListId, f64> = raw
            .iter()
            .map(|(list, &score)| {
                let v = match family_of(list, families) {
                    Some(f) => self.adjust(f, score),
                    None => score,
                };
                (list.clone(), v.max(0.0))
            })
            .collect();

        let total: f64 = corrected.values().sum();
        if total > 0.0 {
            let scale = 100.0 / total;
            return (corrected.into_iter().map(|(k, v)| (k, v * scale)).collect(), Some(scale));
        }

        let fallback: BTreeMap<ListId, f64> = raw.iter().map(|(k, &v)| (k.clone(), v.max(0.0))).collect();
        let raw_total: f64 = fallback.values().sum();
        let out = if raw_total > 0.0 {
            fallback.into_iter().map(|(k, v)| (k, v * 100.0 / raw_total)).collect()
        } else {
            fallback
        };
        (out, None)
    }
}

/// Family of a list: explicit mapping first, else the list id read as a code.
fn family_of(list: &ListId, families: &BTreeMap<ListId, FamilyCode>) -> Option<FamilyCode> {
    families.get(list).copied().or_else(|| list.as_str().parse().ok())
}
