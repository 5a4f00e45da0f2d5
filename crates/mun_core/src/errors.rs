use std::fmt;

/// Minimal error set for core-domain validation & parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum CoreError {
    InvalidListId(String),
    UnknownFamily(String),
    DomainOutOfRange(String),
    DuplicateSector(String),
    EmptySectorTable,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidListId(s) => write!(f, "invalid list id: {s:?}"),
            CoreError::UnknownFamily(s) => write!(f, "unknown political family code: {s}"),
            CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            CoreError::DuplicateSector(s) => write!(f, "duplicate sector: {s}"),
            CoreError::EmptySectorTable => write!(f, "sector table is empty"),
        }
    }
}

impl std::error::Error for CoreError {}
