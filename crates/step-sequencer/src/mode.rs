use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to step effects once the core computation has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Keep every step effect. The run exists to durably build something.
    #[default]
    Factory,
    /// Unwind every step effect after the core runs, leaving no trace.
    ///
    /// If that unwind fails, the run fails and the core's value is dropped.
    Scoped,
}

impl Mode {
    /// Whether a successful run unwinds all step effects.
    #[must_use]
    pub const fn unwinds_on_success(self) -> bool {
        matches!(self, Self::Scoped)
    }

    /// Lowercase name, as accepted by `FromStr` and serde.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Factory => "factory",
            Self::Scoped => "scoped",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`Mode`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sequencer mode '{0}' (expected 'factory' or 'scoped')")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factory" => Ok(Self::Factory),
            "scoped" => Ok(Self::Scoped),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
