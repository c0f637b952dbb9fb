use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownBackendKind;

/// Which database engine an operation targets.
///
/// The wire and config spelling is `"local"` for the embedded SQLite file and `"remote"`
/// for the networked PostgreSQL server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "local")]
    Embedded,
    #[serde(rename = "remote")]
    Networked,
}

impl BackendKind {
    /// Used whenever the configured default cannot be understood.
    pub const FALLBACK: BackendKind = BackendKind::Embedded;

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Embedded => "local",
            BackendKind::Networked => "remote",
        }
    }

    /// Exact, case-sensitive match on the two recognized spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "local" => Some(BackendKind::Embedded),
            "remote" => Some(BackendKind::Networked),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackendKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::parse(s).ok_or_else(|| UnknownBackendKind(s.to_string()))
    }
}
