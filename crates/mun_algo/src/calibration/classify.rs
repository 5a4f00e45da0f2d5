//! List name → political family, by case-insensitive substring match on
//! head-of-list or party names.

use std::collections::BTreeMap;

use mun_core::families::FamilyCode::{self, Div, Dvd, Eelv, Exd, Exg, Lfi, Lr, Pcf, Ps, Rec, Ren, Rn};

use crate::ListId;

type NameTable = &'static [(&'static str, FamilyCode)];

static NAME_TABLES: [(&str, NameTable); 3] = [
    (
        "municipales_2020",
        &[
            ("HIDALGO", Ps),
            ("PARIS EN COMMUN", Ps),
            ("DATI", Lr),
            ("CHANGER PARIS", Lr),
            ("BUZYN", Ren),
            ("VILLANI", Eelv),
            ("BELLIARD", Eelv),
            ("SIMONNET", Lfi),
            ("BROSSAT", Pcf),
            ("BOURNAZEL", Dvd),
            ("CAMPION", Div),
        ],
    ),
    (
        "presidentielle_2022",
        &[
            ("ARTHAUD", Exg),
            ("POUTOU", Exg),
            ("ROUSSEL", Pcf),
            ("MELENCHON", Lfi),
            ("MÉLENCHON", Lfi),
            ("JADOT", Eelv),
            ("HIDALGO", Ps),
            ("MACRON", Ren),
            ("PECRESSE", Lr),
            ("PÉCRESSE", Lr),
            ("LASSALLE", Div),
            ("ZEMMOUR", Rec),
            ("LE PEN", Rn),
            ("DUPONT-AIGNAN", Exd),
        ],
    ),
    (
        "europeennes_2024",
        &[
            ("BARDELLA", Rn),
            ("HAYER", Ren),
            ("GLUCKSMANN", Ps),
            ("TOUSSAINT", Eelv),
            ("AUBRY", Lfi),
            ("BELLAMY", Lr),
            ("MARÉCHAL", Rec),
            ("BOMPARD", Lfi),
        ],
    ),
];

fn first_match<'a, I>(name: &str, table: I) -> Option<FamilyCode>
where
    I: IntoIterator<Item = &'a (&'a str, FamilyCode)>,
{
    table.into_iter().find(|(key, _)| name.contains(&key.to_uppercase())).map(|&(_, f)| f)
}

/// Family of a list name. The custom table wins, then the named election's
/// table, then every built-in table in turn.
pub fn classify_list(
    name: &str,
    election: Option<&str>,
    custom: &[(&str, FamilyCode)],
) -> Option<FamilyCode> {
    let upper = name.trim().to_uppercase();

    if let Some(f) = first_match(&upper, custom) {
        return Some(f);
    }
    if let Some((_, table)) = election.and_then(|e| NAME_TABLES.iter().find(|(k, _)| *k == e)) {
        if let Some(f) = first_match(&upper, *table) {
            return Some(f);
        }
    }
    NAME_TABLES.iter().find_map(|(_, table)| first_match(&upper, *table))
}

/// Sum scores per family; unclassified lists land in `DIV`.
pub fn group_by_family(scores: &BTreeMap<ListId, f64>, election: Option<&str>) -> BTreeMap<FamilyCode, f64> {
    let mut out = BTreeMap::new();
    for (list, &score) in scores {
        let family = classify_list(list.as_str(), election, &[]).unwrap_or(FamilyCode::Div);
        *out.entry(family).or_insert(0.0) += score;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_ignores_case() {
        assert_eq!(classify_list("Liste Rachida Dati", None, &[]), Some(Lr));
        assert_eq!(classify_list("  jean-luc mélenchon ", None, &[]), Some(Lfi));
        assert_eq!(classify_list("Marine Le Pen", Some("presidentielle_2022"), &[]), Some(Rn));
        assert_eq!(classify_list("Liste inconnue", None, &[]), None);
    }

    #[test]
    fn custom_table_wins() {
        let custom = [("hidalgo", Dvd)];
        assert_eq!(classify_list("Anne Hidalgo", None, &custom), Some(Dvd));
        assert_eq!(classify_list("Anne Hidalgo", Some("municipales_2020"), &[]), Some(Ps));
    }

    #[test]
    fn grouping_defaults_to_div() {
        let scores: BTreeMap<ListId, f64> = [
            ("Glucksmann".parse().unwrap(), 22.6),
            ("Hidalgo".parse().unwrap(), 2.2),
            ("Someone Else".parse().unwrap(), 3.0),
        ]
        .into();
        let g = group_by_family(&scores, Some("europeennes_2024"));
        assert!((g[&Ps] - 24.8).abs() < 1e-9);
        assert_eq!(g[&Div], 3.0);
    }
}
