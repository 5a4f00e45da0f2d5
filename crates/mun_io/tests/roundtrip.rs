//! Files written by the simulator load back unchanged.

use std::fs;

use assert_json_diff::assert_json_eq;
use serde_json::json;
use tempfile::tempdir;

use mun_core::variables::ElectionRules;
use mun_io::canonical_json::write_canonical_file;
use mun_io::hasher::{sha256_canonical, sha256_file, InputDigests};
use mun_io::loader::{load_calibration_points, load_rules, load_scenario, load_scores, write_scenario};
use mun_io::IoError;
use mun_pipeline::presets;

#[test]
fn preset_scenario_survives_a_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/gauche_unie.json");
    let s = presets::gauche_unie();
    write_scenario(&path, &s).unwrap();

    let back = load_scenario(&path).unwrap();
    assert_eq!(back, s);
    assert_eq!(sha256_canonical(&back).unwrap(), sha256_canonical(&s).unwrap());

    // one line of sorted, compact JSON
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.ends_with('\n'));
    assert!(text.find("\"city_scores\"").unwrap() < text.find("\"name\"").unwrap());
}

#[test]
fn rewriting_gives_identical_bytes() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    write_canonical_file(&a, &json!({"z": [3, 1], "a": {"y": null, "b": true}})).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&a).unwrap()).unwrap();
    write_canonical_file(&b, &v).unwrap();
    assert_eq!(sha256_file(&a).unwrap(), sha256_file(&b).unwrap());
}

#[test]
fn hand_written_scenario_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");
    fs::write(
        &path,
        r#"{
            "name": "Test",
            "city_scores": {"PS": 40, "REN": 35, "RN": 25},
            "city_interround": {
                "withdrawals": [{"source": "RN", "beneficiaries": {"REN": 0.5}}]
            }
        }"#,
    )
    .unwrap();
    let s = load_scenario(&path).unwrap();
    assert_eq!(s.name, "Test");
    assert!(s.participation.is_none());
    let cfg = s.city_interround.as_ref().unwrap();
    assert_eq!(cfg.withdrawals[0].total_rate(), 0.5);
    assert_eq!(cfg.participation_delta, 0.0);
}

#[test]
fn over_allocated_withdrawal_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");
    fs::write(
        &path,
        r#"{"name": "x", "city_scores": {"A": 60, "B": 40},
            "city_interround": {"withdrawals": [{"source": "B", "beneficiaries": {"A": 0.7, "C": 0.6}}]}}"#,
    )
    .unwrap();
    assert!(matches!(load_scenario(&path), Err(IoError::Json { .. })));
}

#[test]
fn parse_errors_carry_a_position() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\n  \"name\": \"x\",\n  \"city_scores\": {\"A\": }\n}").unwrap();
    match load_scenario(&path) {
        Err(IoError::Json { pointer, .. }) => {
            assert!(pointer.starts_with(&path.display().to_string()));
            assert!(pointer.contains(":3:"), "{pointer}");
        }
        other => panic!("expected json error, got {other:?}"),
    }
}

#[test]
fn empty_scenario_is_invalid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");
    fs::write(&path, r#"{"name": "vide"}"#).unwrap();
    assert!(matches!(load_scenario(&path), Err(IoError::Invalid(_))));
}

#[test]
fn partial_rules_file_keeps_paris_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"{"city_seats": 101, "default_participation": 0.5}"#).unwrap();
    let (rules, _status) = load_rules(&path).unwrap();
    assert_eq!(rules.city_seats, 101);
    assert_eq!(rules.sectors.len(), 17);

    let digests = InputDigests::compute(&presets::fragmentation(), &rules).unwrap();
    let paris = InputDigests::compute(&presets::fragmentation(), &ElectionRules::paris_2026()).unwrap();
    assert_eq!(digests.scenario_sha256, paris.scenario_sha256);
    assert_ne!(digests.rules_sha256, paris.rules_sha256);

    fs::write(&path, r#"{"default_participation": 1.5}"#).unwrap();
    assert!(matches!(load_rules(&path), Err(IoError::Invalid(_))));
}

#[test]
fn calibration_points_and_scores() {
    let dir = tempdir().unwrap();
    let points = dir.path().join("points.json");
    fs::write(
        &points,
        r#"[{"election": "m2020", "family": "PS", "poll_score": 30.0, "actual_score": 29.3},
            {"election": "m2020", "family": "RN", "poll_score": 6.0, "actual_score": 4.1, "year": 2020}]"#,
    )
    .unwrap();
    let loaded = load_calibration_points(&points).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_json_eq!(
        serde_json::to_value(&loaded[1]).unwrap(),
        json!({"election": "m2020", "family": "RN", "poll_score": 6.0, "actual_score": 4.1, "year": 2020})
    );

    fs::write(&points, "[]").unwrap();
    assert!(matches!(load_calibration_points(&points), Err(IoError::Invalid(_))));

    let scores = dir.path().join("scores.json");
    fs::write(&scores, r#"{"PS": 25.5, "LR": 20}"#).unwrap();
    assert_eq!(load_scores(&scores).unwrap().len(), 2);
    fs::write(&scores, r#"{"PS": -1}"#).unwrap();
    assert!(load_scores(&scores).is_err());
}
