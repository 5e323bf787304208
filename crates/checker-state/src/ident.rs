//! Record identifiers.
//!
//! An identifier is opaque to the store but ends up as a file name, so only
//! a conservative character set is accepted.

use std::fmt;
use std::str::FromStr;

use checker_core::{ServiceId, TeamId, Tick};

use crate::error::{StateError, StateResult};

/// Longest accepted identifier, leaving room for the file suffix.
pub const MAX_IDENTIFIER_LEN: usize = 200;

/// Validated, filesystem-safe record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `raw`: ASCII alphanumerics plus `-`, `_`, `.`; not `.` or `..`.
    pub fn new(raw: impl Into<String>) -> StateResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(StateError::InvalidIdentifier("empty identifier".to_string()));
        }
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(StateError::InvalidIdentifier(format!(
                "identifier is {} bytes, limit is {MAX_IDENTIFIER_LEN}",
                raw.len()
            )));
        }
        if raw == "." || raw == ".." {
            return Err(StateError::InvalidIdentifier(raw));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(StateError::InvalidIdentifier(format!(
                "{raw:?} contains {bad:?}"
            )));
        }
        Ok(Self(raw))
    }

    /// Conventional key for one checker purpose in one tick:
    /// `team{T}-svc{S}-tick{N}-{purpose}`.
    pub fn for_tick(
        team: TeamId,
        service: ServiceId,
        tick: Tick,
        purpose: &str,
    ) -> StateResult<Self> {
        Self::new(format!("team{team}-svc{service}-tick{tick}-{purpose}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = StateError;

    fn from_str(s: &str) -> StateResult<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
