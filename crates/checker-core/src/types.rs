//! Shared types used across checker crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric team identifier (the team's network number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

/// Numeric service identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u32);

/// Zero-based round index relative to the competition start.
pub type Tick = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the runner hands a checker for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerContext {
    pub tick: Tick,
    pub team: TeamId,
    pub service: ServiceId,
    /// Address of the monitored service. Not used by storage or flags.
    pub address: String,
}

impl CheckerContext {
    pub fn new(tick: Tick, team: TeamId, service: ServiceId, address: impl Into<String>) -> Self {
        Self {
            tick,
            team,
            service,
            address: address.into(),
        }
    }
}
