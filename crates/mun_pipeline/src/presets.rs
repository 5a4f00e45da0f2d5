//! Built-in scenarios for the 2026 Paris election.

use std::collections::BTreeMap;

use mun_algo::MayorCandidate;
use mun_core::families::FamilyCode;
use mun_core::ids::ListId;

use crate::scenario::{MayorSetup, Scenario, ScoreTable};

pub const PRESET_NAMES: [&str; 3] = ["gauche_unie", "droite_unie", "fragmentation"];

pub fn preset(name: &str) -> Option<Scenario> {
    match name {
        "gauche_unie" => Some(gauche_unie()),
        "droite_unie" => Some(droite_unie()),
        "fragmentation" => Some(fragmentation()),
        _ => None,
    }
}

// Preset literals are valid list names; `ListId::new` cannot fail on them.
fn table(pairs: &[(&str, f64)]) -> ScoreTable {
    pairs
        .iter()
        .filter_map(|&(name, score)| ListId::new(name).ok().map(|id| (id, score)))
        .collect()
}

fn ids(names: &[&str]) -> Vec<ListId> {
    names.iter().filter_map(|n| ListId::new(*n).ok()).collect()
}

fn candidate(name: &str, coalition: &str, lists: &[&str]) -> MayorCandidate {
    MayorCandidate { name: name.into(), coalition: Some(coalition.into()), supporting_lists: ids(lists) }
}

fn mayor(candidates: Vec<MayorCandidate>) -> Option<MayorSetup> {
    Some(MayorSetup { candidates, discipline_rate: None })
}

/// Single PS-EELV-LFI-PCF list against separate REN, LR and RN lists.
pub fn gauche_unie() -> Scenario {
    let mut s = Scenario::new("Gauche unie");
    s.description = "Liste unique gauche PS-EELV-LFI-PCF, face à REN, LR, RN séparés".into();
    s.city_scores = table(&[
        ("Gauche unie", 38.0),
        ("REN", 20.0),
        ("LR", 18.0),
        ("RN", 10.0),
        ("REC", 5.0),
        ("DIV", 9.0),
    ]);
    s.participation = Some(0.48);
    s.list_families = families(&[("Gauche unie", FamilyCode::Ps)]);
    s.mayor = mayor(vec![
        candidate("Gauche unie", "gauche", &["Gauche unie"]),
        candidate("Droite et centre", "droite", &["LR", "REN"]),
    ]);
    s
}

/// LR-REN alliance facing a split left.
pub fn droite_unie() -> Scenario {
    let mut s = Scenario::new("Droite unie");
    s.description = "Alliance LR-REN, gauche fragmentée".into();
    s.city_scores = table(&[
        ("PS", 18.0),
        ("LFI", 12.0),
        ("EELV", 8.0),
        ("PCF", 3.0),
        ("LR-REN", 32.0),
        ("RN", 10.0),
        ("REC", 5.0),
        ("DIV", 12.0),
    ]);
    s.participation = Some(0.46);
    s.list_families = families(&[("LR-REN", FamilyCode::Lr)]);
    s.mayor = mayor(vec![
        candidate("Gauche", "gauche", &["PS", "LFI", "EELV", "PCF"]),
        candidate("LR-REN", "droite", &["LR-REN"]),
    ]);
    s
}

/// Every party runs its own list.
pub fn fragmentation() -> Scenario {
    let mut s = Scenario::new("Fragmentation maximale");
    s.description = "Toutes les forces politiques présentent des listes séparées".into();
    s.city_scores = table(&[
        ("PS", 16.0),
        ("LFI", 14.0),
        ("EELV", 8.0),
        ("PCF", 4.0),
        ("REN", 18.0),
        ("MDM", 3.0),
        ("LR", 15.0),
        ("RN", 9.0),
        ("REC", 5.0),
        ("EXG", 2.0),
        ("DIV", 6.0),
    ]);
    s.participation = Some(0.42);
    s.mayor = mayor(vec![
        candidate("Gauche", "gauche", &["PS", "LFI", "EELV", "PCF", "EXG"]),
        candidate("Centre", "centre", &["REN", "MDM"]),
        candidate("Droite", "droite", &["LR"]),
    ]);
    s
}

fn families(pairs: &[(&str, FamilyCode)]) -> BTreeMap<ListId, FamilyCode> {
    pairs.iter().filter_map(|&(n, f)| ListId::new(n).ok().map(|id| (id, f))).collect()
}
