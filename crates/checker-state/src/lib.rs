//! checker-state — tick-keyed persistence for checkers.
//!
//! A checker plants state on a service in one tick and checks it in a later
//! one, so it needs to remember what it did. This crate stores two
//! independent records per [`Identifier`]: a YAML metadata mapping and a raw
//! blob.
//!
//! # Architecture
//!
//! ```text
//! StateBackend (trait)
//!   ├── LocalBackend   {root}/{id}.yaml, {root}/{id}.blob
//!   └── MemoryBackend  HashMap, for tests and dry runs
//!
//! Checker<B, G>
//!   ├── CheckerContext (tick, team, service, address)
//!   ├── B: StateBackend
//!   └── FlagDeriver<G>
//! ```
//!
//! Retrieval distinguishes three outcomes: `Ok(Some(_))` when a record
//! exists, `Ok(None)` when it was never written, and `Err(StateError)` when
//! storage itself is broken (missing root, I/O failure, corrupt YAML).

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| $crate::error::StateError::$variant(e.to_string())
    };
}

pub mod backend;
pub mod checker;
pub mod error;
pub mod ident;
pub mod local;
pub mod memory;

pub use backend::{MetadataRecord, StateBackend, StoreOutcome};
pub use checker::{Checker, LocalChecker};
pub use error::{StateError, StateResult};
pub use ident::Identifier;
pub use local::LocalBackend;
pub use memory::MemoryBackend;
