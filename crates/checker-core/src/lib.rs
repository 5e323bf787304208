//! checker-core — shared types, configuration, and flag derivation.
//!
//! A checker runs once per tick per team. It plants a flag on the monitored
//! service and later verifies it is still there. Flags are never stored:
//! [`FlagDeriver`] recomputes them from the competition clock and a
//! [`FlagGenerator`], so any tick's flag can be reproduced on demand.

pub mod config;
pub mod flag;
pub mod types;

pub use config::{CheckerConfig, parse_duration};
pub use flag::{
    FlagDeriver, FlagError, FlagGenerator, FlagInfo, HmacFlagGenerator, check_tick_duration,
};
pub use types::*;
