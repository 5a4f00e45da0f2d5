//! Typed loaders for the simulator's JSON inputs. Every loader checks the
//! content it can check without the other inputs; the orchestrator validates
//! a scenario against the rules.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use mun_algo::calibration::CalibrationPoint;
use mun_core::variables::{ElectionRules, RulesStatus};
use mun_pipeline::{Scenario, ScoreTable};

use crate::canonical_json::write_canonical_file;
use crate::{looks_like_url, IoError, IoResult};

/// Input files are small; anything larger is refused.
const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> IoResult<T> {
    let shown = path.display().to_string();
    if looks_like_url(&shown) {
        return Err(IoError::Path(format!("{shown}: only local files are read")));
    }
    let f = File::open(path).map_err(|e| IoError::Path(format!("{shown} ({e})")))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Path(format!("{shown} ({e})")))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Invalid(format!("{shown}: larger than {MAX_INPUT_BYTES} bytes")));
    }
    serde_json::from_slice(&buf).map_err(|e| match IoError::from(e) {
        IoError::Json { pointer, msg } => IoError::Json { pointer: format!("{shown}:{pointer}"), msg },
        other => other,
    })
}

pub fn load_scenario(path: &Path) -> IoResult<Scenario> {
    let s: Scenario = read_json(path)?;
    if s.city_scores.is_empty() {
        return Err(IoError::Invalid(format!("{}: scenario has no city_scores", path.display())));
    }
    Ok(s)
}

pub fn write_scenario(path: &Path, scenario: &Scenario) -> IoResult<()> {
    write_canonical_file(path, scenario)
}

/// Rules file; missing fields take the Paris 2026 values.
pub fn load_rules(path: &Path) -> IoResult<(ElectionRules, RulesStatus)> {
    let rules: ElectionRules = read_json(path)?;
    let status = rules.validate().map_err(|e| IoError::Invalid(format!("{}: {e}", path.display())))?;
    Ok((rules, status))
}

/// JSON array of poll/result pairs.
pub fn load_calibration_points(path: &Path) -> IoResult<Vec<CalibrationPoint>> {
    let points: Vec<CalibrationPoint> = read_json(path)?;
    if points.is_empty() {
        return Err(IoError::Invalid(format!("{}: no calibration points", path.display())));
    }
    for (i, p) in points.iter().enumerate() {
        if !(p.poll_score >= 0.0 && p.actual_score >= 0.0) {
            return Err(IoError::Invalid(format!(
                "{}: point {i} ({}, {}) has a negative score",
                path.display(),
                p.election,
                p.family
            )));
        }
    }
    Ok(points)
}

/// Flat `{list: score}` object.
pub fn load_scores(path: &Path) -> IoResult<ScoreTable> {
    let scores: ScoreTable = read_json(path)?;
    if let Some((list, v)) = scores.iter().find(|(_, v)| !(v.is_finite() && **v >= 0.0)) {
        return Err(IoError::Invalid(format!("{}: score of {list} is {v}", path.display())));
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_refused() {
        let err = read_json::<ScoreTable>(Path::new("https://example.org/scores.json")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));
    }

    #[test]
    fn missing_file_is_a_path_error() {
        let err = load_scenario(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));
    }
}
