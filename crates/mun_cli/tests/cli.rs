//! The `mun` binary end to end.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

// --- Helpers ---
fn mun() -> Command {
    let mut cmd = Command::cargo_bin("mun").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn preset_then_run() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("gauche.json");
    mun().args(["preset", "gauche_unie", "--out"]).arg(&scenario).assert().success();
    assert!(scenario.exists());

    let mut cmd = mun();
    cmd.args(["run", "--scenario"]).arg(&scenario);
    let v = json_stdout(&mut cmd);
    assert_eq!(v["scenario"], "Gauche unie");
    assert_eq!(v["city"]["total_seats"], 163);
    assert_eq!(v["sectors"].as_object().unwrap().len(), 17);

    mun()
        .args(["run", "--scenario"])
        .arg(&scenario)
        .assert()
        .success()
        .stderr(predicate::str::contains("scenario_sha256"))
        .stderr(predicate::str::contains("provisional"));
}

#[test]
fn montecarlo_is_reproducible_with_a_seed() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("s.json");
    mun().args(["preset", "fragmentation", "--out"]).arg(&scenario).assert().success();

    let run = |seed: &str| {
        let mut cmd = mun();
        cmd.args(["montecarlo", "--iterations", "25", "--seed", seed, "-q", "--scenario"]).arg(&scenario);
        json_stdout(&mut cmd)
    };
    let a = run("0x2A");
    let b = run("42");
    assert_eq!(a, b);
    assert_eq!(a["seed"], 42);
    assert_eq!(a["iterations_kept"], 25);
}

#[test]
fn calibrate_builtin_with_scores() {
    let dir = tempdir().unwrap();
    let scores = dir.path().join("scores.json");
    fs::write(&scores, r#"{"PS": 24, "Renaissance": 22, "LR": 18, "RN": 12, "LFI": 14, "EELV": 10}"#).unwrap();

    let mut cmd = mun();
    cmd.args(["calibrate", "--method", "additive", "--scores"]).arg(&scores);
    let v = json_stdout(&mut cmd);
    assert_eq!(v["settings"]["method"], "additive");
    assert!(v["loo_mae"].as_f64().unwrap() > 0.0);
    assert!(!v["factors"].as_array().unwrap().is_empty());
    let ps = &v["corrected"]["PS"];
    assert!(ps["low"].as_f64().unwrap() <= ps["central"].as_f64().unwrap());
    assert!(ps["central"].as_f64().unwrap() <= ps["high"].as_f64().unwrap());
}

#[test]
fn compare_presets() {
    let mut cmd = mun();
    cmd.args(["compare", "--preset", "gauche_unie", "--preset", "droite_unie"]);
    let v = json_stdout(&mut cmd);
    assert_eq!(v["seats"].as_object().unwrap().len(), 2);
    assert_eq!(v["coalitions"]["Gauche unie"]["majority_threshold"], 82);
}

#[test]
fn exit_codes() {
    // usage
    mun().args(["run"]).assert().code(2);
    mun().args(["preset", "nope"]).assert().code(2);
    mun().args(["montecarlo", "--scenario", "s.json", "--seed", "0x"]).assert().code(2);

    // missing file
    mun().args(["run", "--scenario", "definitely/missing.json"]).assert().code(4);

    let dir = tempdir().unwrap();
    // invalid content
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"name": "x", "city_scores": {"A": 60, "B": 40}, "participation": 1.4}"#).unwrap();
    mun().args(["run", "--scenario"]).arg(&bad).assert().code(2);

    // unresolvable run-off
    let empty_r2 = dir.path().join("r2.json");
    fs::write(
        &empty_r2,
        r#"{"name": "x", "city_scores": {"A": 40, "B": 35, "C": 25},
            "city_interround": {"participation_delta": -1.0}}"#,
    )
    .unwrap();
    mun()
        .args(["run", "--scenario"])
        .arg(&empty_r2)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Conseil de Paris"));
}
