//! MemoryBackend — ephemeral checker state for tests and dry runs.
//!
//! Metadata is kept as YAML text, so values come back with exactly the type
//! fidelity the local backend gives them.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::backend::{MetadataRecord, StateBackend, StoreOutcome, decode_metadata, encode_metadata};
use crate::error::StateResult;
use crate::ident::Identifier;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    metadata: Mutex<HashMap<Identifier, String>>,
    blobs: Mutex<HashMap<Identifier, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored metadata and blob records.
    pub fn record_counts(&self) -> StateResult<(usize, usize)> {
        let metadata = self.metadata.lock().map_err(map_err!(Lock))?.len();
        let blobs = self.blobs.lock().map_err(map_err!(Lock))?.len();
        Ok((metadata, blobs))
    }
}

impl StateBackend for MemoryBackend {
    fn store_metadata(
        &self,
        id: &Identifier,
        record: &MetadataRecord,
    ) -> StateResult<StoreOutcome> {
        let text = encode_metadata(record)?;
        let bytes = text.len() as u64;
        self.metadata
            .lock()
            .map_err(map_err!(Lock))?
            .insert(id.clone(), text);
        debug!(%id, bytes, "metadata stored in memory");
        Ok(StoreOutcome::Stored { bytes })
    }

    fn store_blob(&self, id: &Identifier, bytes: &[u8]) -> StateResult<StoreOutcome> {
        self.blobs
            .lock()
            .map_err(map_err!(Lock))?
            .insert(id.clone(), bytes.to_vec());
        debug!(%id, bytes = bytes.len(), "blob stored in memory");
        Ok(StoreOutcome::Stored {
            bytes: bytes.len() as u64,
        })
    }

    fn retrieve_metadata(&self, id: &Identifier) -> StateResult<Option<MetadataRecord>> {
        let guard = self.metadata.lock().map_err(map_err!(Lock))?;
        guard.get(id).map(|text| decode_metadata(text)).transpose()
    }

    fn retrieve_blob(&self, id: &Identifier) -> StateResult<Option<Vec<u8>>> {
        let guard = self.blobs.lock().map_err(map_err!(Lock))?;
        Ok(guard.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    #[test]
    fn round_trips_and_absence() {
        let backend = MemoryBackend::new();
        let key = id("team2-svc1-tick9");
        let mut record = MetadataRecord::new();
        record.insert("flag_id".to_string(), Value::from("note-17"));

        assert_eq!(backend.retrieve_metadata(&key).unwrap(), None);
        assert_eq!(backend.retrieve_blob(&key).unwrap(), None);

        assert!(backend.store_metadata(&key, &record).unwrap().is_stored());
        assert_eq!(
            backend.store_blob(&key, b"\x00payload").unwrap(),
            StoreOutcome::Stored { bytes: 8 }
        );

        assert_eq!(backend.retrieve_metadata(&key).unwrap(), Some(record));
        assert_eq!(backend.retrieve_blob(&key).unwrap(), Some(b"\x00payload".to_vec()));
        assert_eq!(backend.record_counts().unwrap(), (1, 1));
    }

    #[test]
    fn namespaces_are_separate() {
        let backend = MemoryBackend::new();
        let key = id("only-blob");

        backend.store_blob(&key, b"bytes").unwrap();
        assert_eq!(backend.retrieve_metadata(&key).unwrap(), None);
        assert_eq!(backend.record_counts().unwrap(), (0, 1));
    }

    #[test]
    fn overwrite_replaces() {
        let backend = MemoryBackend::new();
        let key = id("k");
        let mut first = MetadataRecord::new();
        first.insert("a".to_string(), Value::from(1u64));
        first.insert("b".to_string(), Value::from(2u64));
        let mut second = MetadataRecord::new();
        second.insert("c".to_string(), Value::from(3u64));

        backend.store_metadata(&key, &first).unwrap();
        backend.store_metadata(&key, &second).unwrap();
        assert_eq!(backend.retrieve_metadata(&key).unwrap(), Some(second));
    }
}
