//! Built-in Paris calibration data: final poll averages vs official Paris
//! results, per family, for four recent elections. Scores are in points.

use std::collections::BTreeMap;

use mun_core::families::FamilyCode::{self, Eelv, Lfi, Lr, Pcf, Ps, Rec, Ren, Rn};

use super::model::{CalibrationPoint, CalibrationSettings, CorrectionMethod, RedressementModel};
use crate::AlgoError;

struct Election {
    key: &'static str,
    year: i32,
    /// (family, poll, actual)
    rows: &'static [(FamilyCode, f64, f64)],
}

static ELECTIONS: [Election; 4] = [
    Election {
        key: "municipales_2014",
        year: 2014,
        // REN stands for the UDI/centre lists of the time, LFI for the Front de Gauche
        rows: &[(Ps, 34.0, 34.4), (Lr, 22.0, 22.7), (Eelv, 10.0, 8.9), (Ren, 4.0, 3.0), (Lfi, 5.0, 6.2), (Rn, 7.0, 6.3)],
    },
    Election {
        key: "municipales_2020",
        year: 2020,
        rows: &[
            (Ps, 30.0, 29.3),
            (Lr, 22.0, 22.7),
            (Eelv, 12.0, 10.8),
            (Ren, 17.0, 13.7),
            (Lfi, 3.5, 3.2),
            (Pcf, 3.0, 2.8),
            (Rn, 2.0, 1.5),
        ],
    },
    Election {
        key: "presidentielle_2022",
        year: 2022,
        rows: &[
            (Lfi, 28.0, 30.1),
            (Ren, 30.0, 35.3),
            (Eelv, 5.0, 5.8),
            (Ps, 2.0, 2.2),
            (Pcf, 3.0, 2.8),
            (Lr, 5.0, 4.1),
            (Rn, 10.0, 5.1),
            (Rec, 8.0, 5.5),
        ],
    },
    Election {
        key: "europeennes_2024",
        year: 2024,
        rows: &[
            (Ps, 16.0, 22.6),
            (Ren, 16.0, 17.2),
            (Lfi, 10.0, 12.0),
            (Eelv, 7.0, 7.8),
            (Lr, 8.0, 6.6),
            (Rn, 15.0, 7.4),
            (Rec, 5.0, 3.8),
        ],
    },
];

/// Keys of the built-in elections, oldest first.
pub fn election_keys() -> impl Iterator<Item = &'static str> {
    ELECTIONS.iter().map(|e| e.key)
}

fn points_of(e: &Election) -> impl Iterator<Item = CalibrationPoint> + '_ {
    e.rows.iter().map(move |&(family, poll, actual)| CalibrationPoint {
        election: e.key.to_string(),
        family,
        poll_score: poll,
        actual_score: actual,
        year: e.year,
    })
}

/// Points of the named elections (all of them when `None`). Unknown keys are ignored.
pub fn calibration_points(elections: Option<&[&str]>) -> Vec<CalibrationPoint> {
    ELECTIONS
        .iter()
        .filter(|e| elections.map_or(true, |keys| keys.contains(&e.key)))
        .flat_map(points_of)
        .collect()
}

pub fn build_model(
    method: CorrectionMethod,
    elections: Option<&[&str]>,
    half_life: f64,
) -> Result<RedressementModel, AlgoError> {
    let settings = CalibrationSettings { method, half_life, ..Default::default() };
    RedressementModel::from_points(settings, calibration_points(elections))
}

/// Fit on every election but one, predict the held-out one.
///
/// Returns election → family → absolute error in points. Each family's poll is
/// corrected on its own (no renormalisation across families).
pub fn leave_one_out(
    method: CorrectionMethod,
    half_life: f64,
) -> Result<BTreeMap<String, BTreeMap<FamilyCode, f64>>, AlgoError> {
    let mut out = BTreeMap::new();
    for held_out in &ELECTIONS {
        let train: Vec<&str> = election_keys().filter(|k| *k != held_out.key).collect();
        let model = build_model(method, Some(train.as_slice()), half_life)?;
        let errors = held_out
            .rows
            .iter()
            .map(|&(family, poll, actual)| (family, (model.adjust(family, poll) - actual).abs()))
            .collect();
        out.insert(held_out.key.to_string(), errors);
    }
    Ok(out)
}

/// Mean absolute error over every held-out (election, family) pair.
pub fn overall_mae(method: CorrectionMethod, half_life: f64) -> Result<f64, AlgoError> {
    let loo = leave_one_out(method, half_life)?;
    let errors: Vec<f64> = loo.values().flat_map(|m| m.values().copied()).collect();
    Ok(crate::stats::mean(&errors))
}
