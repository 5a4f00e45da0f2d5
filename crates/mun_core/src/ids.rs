//! List identifiers.
//! Lists are named by their ballot label ("PS", "Gauche unie", "LR-REN", ...).
//! Names are free text but must be non-blank, short, and free of control characters.

use std::fmt;
use std::str::FromStr;

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

const MAX_LIST_ID_LEN: usize = 128;

#[inline]
fn is_valid_list_name(s: &str) -> bool {
    !s.trim().is_empty() && s.chars().count() <= MAX_LIST_ID_LEN && !s.chars().any(char::is_control)
}

/// Ballot list identifier. Ordering is lexicographic on the name and is the
/// canonical iteration order for every tally in the engine.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if is_valid_list_name(&name) {
            Ok(Self(name))
        } else {
            Err(CoreError::InvalidListId(name))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ListId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ListId {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for ListId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ListId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        if is_valid_list_name(&s) {
            Ok(ListId(s))
        } else {
            Err(D::Error::invalid_value(
                Unexpected::Str(&s),
                &"non-blank list name without control characters, at most 128 chars",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_free_text_names() {
        assert!(ListId::new("Gauche unie").is_ok());
        assert!(ListId::new("LR-REN").is_ok());
        assert!(ListId::new("Écologistes").is_ok());
    }

    #[test]
    fn rejects_blank_and_control() {
        assert!(ListId::new("").is_err());
        assert!(ListId::new("   ").is_err());
        assert!(ListId::new("PS\n").is_err());
        assert!(ListId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a: ListId = "EELV".parse().unwrap();
        let b: ListId = "PS".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_is_transparent_and_validated() {
        let id: ListId = serde_json::from_str("\"RN\"").unwrap();
        assert_eq!(id.as_str(), "RN");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"RN\"");
        assert!(serde_json::from_str::<ListId>("\"  \"").is_err());
    }
}
