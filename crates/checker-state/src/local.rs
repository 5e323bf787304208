//! LocalBackend — checker state as plain files in one directory.
//!
//! Layout: `{root}/{identifier}.yaml` for metadata and
//! `{root}/{identifier}.blob` for raw bytes. The root is never created by
//! the backend; a store into a missing root reports
//! [`StoreOutcome::NotStored`] and leaves the filesystem untouched.
//!
//! Every call is a single open-write-close or open-read-close. There is no
//! caching and no locking, so concurrent writers to one identifier race and
//! the last one wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::backend::{MetadataRecord, StateBackend, StoreOutcome, decode_metadata, encode_metadata};
use crate::error::{StateError, StateResult};
use crate::ident::Identifier;

const METADATA_SUFFIX: &str = "yaml";
const BLOB_SUFFIX: &str = "blob";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBackend {
    root: PathBuf,
}

impl Default for LocalBackend {
    /// Rooted at the OS temp directory.
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point the backend at a different directory. Does not create it.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
        debug!(root = %self.root.display(), "backend root set");
    }

    pub fn metadata_path(&self, id: &Identifier) -> PathBuf {
        self.root.join(format!("{id}.{METADATA_SUFFIX}"))
    }

    pub fn blob_path(&self, id: &Identifier) -> PathBuf {
        self.root.join(format!("{id}.{BLOB_SUFFIX}"))
    }

    fn write_record(&self, path: &Path, bytes: &[u8]) -> StateResult<StoreOutcome> {
        match fs::write(path, bytes) {
            Ok(()) => {
                debug!(path = %path.display(), bytes = bytes.len(), "record stored");
                Ok(StoreOutcome::Stored {
                    bytes: bytes.len() as u64,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    root = %self.root.display(),
                    path = %path.display(),
                    "backend root missing, record not stored"
                );
                Ok(StoreOutcome::NotStored)
            }
            Err(e) => Err(StateError::Write(format!("{}: {e}", path.display()))),
        }
    }

    fn read_record(&self, path: &Path) -> StateResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "record read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.root.is_dir() {
                    debug!(path = %path.display(), "record absent");
                    Ok(None)
                } else {
                    Err(StateError::RootUnavailable(self.root.display().to_string()))
                }
            }
            Err(e) => Err(StateError::Read(format!("{}: {e}", path.display()))),
        }
    }
}

impl StateBackend for LocalBackend {
    fn store_metadata(
        &self,
        id: &Identifier,
        record: &MetadataRecord,
    ) -> StateResult<StoreOutcome> {
        let text = encode_metadata(record)?;
        self.write_record(&self.metadata_path(id), text.as_bytes())
    }

    fn store_blob(&self, id: &Identifier, bytes: &[u8]) -> StateResult<StoreOutcome> {
        self.write_record(&self.blob_path(id), bytes)
    }

    fn retrieve_metadata(&self, id: &Identifier) -> StateResult<Option<MetadataRecord>> {
        let path = self.metadata_path(id);
        match self.read_record(&path)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| StateError::Deserialize(format!("{}: {e}", path.display())))?;
                let record = decode_metadata(&text)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn retrieve_blob(&self, id: &Identifier) -> StateResult<Option<Vec<u8>>> {
        self.read_record(&self.blob_path(id))
    }
}
