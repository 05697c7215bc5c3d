//! Historical phases
//!
//! Every page, media item and history entry belongs to one of five eras,
//! always rendered as a two-digit zero-padded code (`"01"` .. `"05"`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A phase code, displayed and serialized as two zero-padded digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phase(u8);

/// The five eras with their display labels
pub const PHASES: [(Phase, &str); 5] = [
    (Phase(1), "1959 - 1962"),
    (Phase(2), "1962 - 1966"),
    (Phase(3), "1966 - 1970"),
    (Phase(4), "1970 - 9999"),
    (Phase(5), "Karaokes"),
];

impl Phase {
    /// Phase used when a source row or placeholder has none
    pub const DEFAULT: Phase = Phase(1);

    /// Build a phase from its number (0-99)
    pub fn new(number: u8) -> Result<Self> {
        if number > 99 {
            return Err(Error::InvalidPhase(number.to_string()));
        }
        Ok(Self(number))
    }

    /// Label of a known era, if any
    pub fn label(&self) -> Option<&'static str> {
        PHASES
            .iter()
            .find(|(phase, _)| phase == self)
            .map(|(_, label)| *label)
    }

    /// Convert an integer coming out of a legacy row
    pub fn from_integer(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidPhase(value.to_string()))
            .and_then(Self::new)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for Phase {
    type Err = Error;

    /// Accepts one or two ASCII digits; `"2"` and `"02"` are the same phase
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.len() > 2
            || !trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidPhase(s.to_string()));
        }
        let number: u8 = trimmed
            .parse()
            .map_err(|_| Error::InvalidPhase(s.to_string()))?;
        Self::new(number)
    }
}

impl TryFrom<String> for Phase {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.to_string()
    }
}
