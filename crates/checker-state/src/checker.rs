//! Checker — one invocation's view of storage and flags.
//!
//! The runner builds a `Checker` per (tick, team, service), points it at a
//! backend and the competition clock, and then uses it to remember what was
//! planted and to recompute flags. Storage and flag derivation never call
//! each other; the checker only holds both.

use std::path::PathBuf;
use std::time::Duration;

use checker_core::{
    CheckerContext, FlagDeriver, FlagError, FlagGenerator, HmacFlagGenerator, Tick, Timestamp,
};

use crate::backend::{MetadataRecord, StateBackend, StoreOutcome};
use crate::error::StateResult;
use crate::ident::Identifier;
use crate::local::LocalBackend;

/// Checker backed by files on the local filesystem.
pub type LocalChecker = Checker<LocalBackend, HmacFlagGenerator>;

#[derive(Debug)]
pub struct Checker<B, G> {
    context: CheckerContext,
    backend: B,
    deriver: FlagDeriver<G>,
}

impl<B: StateBackend, G: FlagGenerator> Checker<B, G> {
    pub fn new(context: CheckerContext, backend: B, generator: G) -> Self {
        let deriver = FlagDeriver::new(context.team, context.service, generator);
        Self {
            context,
            backend,
            deriver,
        }
    }

    pub fn context(&self) -> &CheckerContext {
        &self.context
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn deriver(&self) -> &FlagDeriver<G> {
        &self.deriver
    }

    pub fn set_start_time(&mut self, start_time: Timestamp) {
        self.deriver.set_start_time(start_time);
    }

    /// Rejects zero and fractional-second durations; the clock is left unchanged.
    pub fn set_tick_duration(&mut self, tick_duration: Duration) -> Result<(), FlagError> {
        self.deriver.set_tick_duration(tick_duration)
    }

    /// The conventional identifier for `purpose` in this checker's tick.
    pub fn identifier(&self, purpose: &str) -> StateResult<Identifier> {
        self.identifier_at(self.context.tick, purpose)
    }

    /// The conventional identifier for `purpose` in an arbitrary tick.
    pub fn identifier_at(&self, tick: Tick, purpose: &str) -> StateResult<Identifier> {
        Identifier::for_tick(self.context.team, self.context.service, tick, purpose)
    }

    pub fn store_metadata(
        &self,
        id: &Identifier,
        record: &MetadataRecord,
    ) -> StateResult<StoreOutcome> {
        self.backend.store_metadata(id, record)
    }

    pub fn store_blob(&self, id: &Identifier, bytes: &[u8]) -> StateResult<StoreOutcome> {
        self.backend.store_blob(id, bytes)
    }

    pub fn retrieve_metadata(&self, id: &Identifier) -> StateResult<Option<MetadataRecord>> {
        self.backend.retrieve_metadata(id)
    }

    pub fn retrieve_blob(&self, id: &Identifier) -> StateResult<Option<Vec<u8>>> {
        self.backend.retrieve_blob(id)
    }

    /// The flag for `tick` as this checker's team and service.
    pub fn get_flag(&self, tick: Tick, payload: Option<&[u8]>) -> Result<String, FlagError> {
        self.deriver.derive(tick, payload)
    }
}

impl<G: FlagGenerator> Checker<LocalBackend, G> {
    /// Move storage to `root`. The directory is not created.
    pub fn set_backend(&mut self, root: impl Into<PathBuf>) {
        self.backend.set_root(root);
    }
}
