//! Political families and coalition blocs.
//!
//! Contract:
//! - `FamilyCode` is a closed set. Parsing an unknown code fails
//!   (`CoreError::UnknownFamily`); callers that want the catch-all bucket must
//!   ask for it with [`FamilyCode::or_diverse`].
//! - Each family belongs to exactly one [`Coalition`].
//! - Display metadata (label, colour, historical poll bias) is read-only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FamilyCode {
    Exg,
    Lfi,
    Pcf,
    Ps,
    Eelv,
    Dvg,
    Ren,
    Mdm,
    Lr,
    Dvd,
    Rn,
    Rec,
    Exd,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coalition {
    Left,
    Centre,
    Right,
    FarRight,
    Unaligned,
}

/// Read-only presentation and bias metadata for a family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FamilyInfo {
    pub code: FamilyCode,
    pub label: &'static str,
    pub short_label: &'static str,
    pub color: &'static str,
    /// Mean historical poll-minus-result gap, in points (positive = polls overestimate).
    pub historical_bias: f64,
    pub historical_bias_std: f64,
}

const fn info(
    code: FamilyCode,
    label: &'static str,
    short_label: &'static str,
    color: &'static str,
    historical_bias: f64,
    historical_bias_std: f64,
) -> FamilyInfo {
    FamilyInfo { code, label, short_label, color, historical_bias, historical_bias_std }
}

const REGISTRY: [FamilyInfo; 14] = [
    info(FamilyCode::Exg, "Extrême gauche", "Ext. G", "#8B0000", 0.0, 0.0),
    info(FamilyCode::Lfi, "La France Insoumise", "LFI", "#CC2443", 1.5, 1.2),
    info(FamilyCode::Pcf, "Parti Communiste", "PCF", "#DD0000", 0.3, 0.5),
    info(FamilyCode::Ps, "Parti Socialiste", "PS", "#FF8080", -0.5, 1.0),
    info(FamilyCode::Eelv, "Ecologistes", "EELV", "#00C000", 1.0, 1.5),
    info(FamilyCode::Dvg, "Divers gauche", "DVG", "#FFC0CB", 0.0, 0.0),
    info(FamilyCode::Ren, "Renaissance", "REN", "#FFEB00", 0.5, 1.0),
    info(FamilyCode::Mdm, "MoDem", "MoDem", "#FF9900", 0.2, 0.5),
    info(FamilyCode::Lr, "Les Républicains", "LR", "#0066CC", -1.0, 1.2),
    info(FamilyCode::Dvd, "Divers droite", "DVD", "#74B4E8", 0.0, 0.0),
    info(FamilyCode::Rn, "Rassemblement National", "RN", "#0D378A", -2.0, 1.5),
    info(FamilyCode::Rec, "Reconquête", "REC", "#1A1A2E", -0.5, 1.0),
    info(FamilyCode::Exd, "Extrême droite", "Ext. D", "#404040", 0.0, 0.0),
    info(FamilyCode::Div, "Divers", "Div.", "#999999", 0.0, 0.0),
];

impl FamilyCode {
    pub const ALL: [FamilyCode; 14] = [
        FamilyCode::Exg,
        FamilyCode::Lfi,
        FamilyCode::Pcf,
        FamilyCode::Ps,
        FamilyCode::Eelv,
        FamilyCode::Dvg,
        FamilyCode::Ren,
        FamilyCode::Mdm,
        FamilyCode::Lr,
        FamilyCode::Dvd,
        FamilyCode::Rn,
        FamilyCode::Rec,
        FamilyCode::Exd,
        FamilyCode::Div,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FamilyCode::Exg => "EXG",
            FamilyCode::Lfi => "LFI",
            FamilyCode::Pcf => "PCF",
            FamilyCode::Ps => "PS",
            FamilyCode::Eelv => "EELV",
            FamilyCode::Dvg => "DVG",
            FamilyCode::Ren => "REN",
            FamilyCode::Mdm => "MDM",
            FamilyCode::Lr => "LR",
            FamilyCode::Dvd => "DVD",
            FamilyCode::Rn => "RN",
            FamilyCode::Rec => "REC",
            FamilyCode::Exd => "EXD",
            FamilyCode::Div => "DIV",
        }
    }

    pub fn info(self) -> &'static FamilyInfo {
        // REGISTRY is laid out in declaration order
        &REGISTRY[self as usize]
    }

    pub fn coalition(self) -> Coalition {
        match self {
            FamilyCode::Exg
            | FamilyCode::Lfi
            | FamilyCode::Pcf
            | FamilyCode::Ps
            | FamilyCode::Eelv
            | FamilyCode::Dvg => Coalition::Left,
            FamilyCode::Ren | FamilyCode::Mdm => Coalition::Centre,
            FamilyCode::Lr | FamilyCode::Dvd => Coalition::Right,
            FamilyCode::Rn | FamilyCode::Rec | FamilyCode::Exd => Coalition::FarRight,
            FamilyCode::Div => Coalition::Unaligned,
        }
    }

    /// Explicit catch-all: unknown codes become `DIV`.
    pub fn or_diverse(code: &str) -> FamilyCode {
        code.parse().unwrap_or(FamilyCode::Div)
    }
}

impl fmt::Display for FamilyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyCode {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FamilyCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownFamily(s.to_string()))
    }
}

impl Coalition {
    pub const BLOCS: [Coalition; 4] =
        [Coalition::Left, Coalition::Centre, Coalition::Right, Coalition::FarRight];

    pub fn label(self) -> &'static str {
        match self {
            Coalition::Left => "Gauche",
            Coalition::Centre => "Centre",
            Coalition::Right => "Droite",
            Coalition::FarRight => "Extrême droite",
            Coalition::Unaligned => "Divers",
        }
    }

    pub fn members(self) -> impl Iterator<Item = FamilyCode> {
        FamilyCode::ALL.into_iter().filter(move |f| f.coalition() == self)
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
