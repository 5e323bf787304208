//! The storage contract every checker backend satisfies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StateResult;
use crate::ident::Identifier;

/// Structured metadata: string keys mapped to arbitrary YAML values.
pub type MetadataRecord = BTreeMap<String, serde_yaml::Value>;

/// What a store call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The record was written in full.
    Stored { bytes: u64 },
    /// The destination does not exist; nothing was written or created.
    NotStored,
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored { .. })
    }

    pub fn bytes(&self) -> Option<u64> {
        match self {
            StoreOutcome::Stored { bytes } => Some(*bytes),
            StoreOutcome::NotStored => None,
        }
    }
}

/// Identifier-keyed storage for checker metadata and blobs.
///
/// Metadata and blob records live in separate namespaces: writing one never
/// touches the other. Writes replace any previous record wholesale.
pub trait StateBackend: Send + Sync {
    fn store_metadata(&self, id: &Identifier, record: &MetadataRecord)
    -> StateResult<StoreOutcome>;

    fn store_blob(&self, id: &Identifier, bytes: &[u8]) -> StateResult<StoreOutcome>;

    /// `Ok(None)` if no metadata was ever stored under `id`.
    fn retrieve_metadata(&self, id: &Identifier) -> StateResult<Option<MetadataRecord>>;

    /// `Ok(None)` if no blob was ever stored under `id`.
    fn retrieve_blob(&self, id: &Identifier) -> StateResult<Option<Vec<u8>>>;

    /// Store any value that serializes to a mapping.
    fn store_typed<T: Serialize>(&self, id: &Identifier, value: &T) -> StateResult<StoreOutcome>
    where
        Self: Sized,
    {
        let value = serde_yaml::to_value(value).map_err(map_err!(Serialize))?;
        let record: MetadataRecord = serde_yaml::from_value(value).map_err(map_err!(Serialize))?;
        self.store_metadata(id, &record)
    }

    fn retrieve_typed<T: DeserializeOwned>(&self, id: &Identifier) -> StateResult<Option<T>>
    where
        Self: Sized,
    {
        match self.retrieve_metadata(id)? {
            Some(record) => {
                let value = serde_yaml::to_value(record).map_err(map_err!(Deserialize))?;
                let typed = serde_yaml::from_value(value).map_err(map_err!(Deserialize))?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }
}

impl<B: StateBackend + ?Sized> StateBackend for Box<B> {
    fn store_metadata(
        &self,
        id: &Identifier,
        record: &MetadataRecord,
    ) -> StateResult<StoreOutcome> {
        (**self).store_metadata(id, record)
    }

    fn store_blob(&self, id: &Identifier, bytes: &[u8]) -> StateResult<StoreOutcome> {
        (**self).store_blob(id, bytes)
    }

    fn retrieve_metadata(&self, id: &Identifier) -> StateResult<Option<MetadataRecord>> {
        (**self).retrieve_metadata(id)
    }

    fn retrieve_blob(&self, id: &Identifier) -> StateResult<Option<Vec<u8>>> {
        (**self).retrieve_blob(id)
    }
}

/// Render a metadata record as YAML text.
pub(crate) fn encode_metadata(record: &MetadataRecord) -> StateResult<String> {
    serde_yaml::to_string(record).map_err(map_err!(Serialize))
}

/// Parse YAML text back into a metadata record.
pub(crate) fn decode_metadata(text: &str) -> StateResult<MetadataRecord> {
    serde_yaml::from_str(text).map_err(map_err!(Deserialize))
}
