use super::memory::InMemoryKVStore;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{KeyModification, KeyValueStore, ScanResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed ledger store.
///
/// Keeps the ledger in memory and persists a JSON snapshot (values and key
/// histories) after every write. Snapshots are written to a temp file and
/// renamed into place, so a crash leaves either the old or the new ledger.
pub struct FileBackedKVStore {
    inner: InMemoryKVStore,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Opens the ledger at `path`. A missing file yields an empty ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = Self::load_from_file(&path)?;

        if inner.is_empty() {
            info!("📁 No ledger entries at {}", path.display());
        } else {
            info!("💾 Loaded {} keys from {}", inner.len(), path.display());
        }

        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<InMemoryKVStore, KVStoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(InMemoryKVStore::new())
            }
            Err(e) => {
                return Err(KVStoreError::IOError {
                    message: e.to_string(),
                })
            }
        };
        if bytes.is_empty() {
            return Ok(InMemoryKVStore::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| KVStoreError::CorruptionError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        use std::io::Write;

        let io_err = |e: std::io::Error| KVStoreError::IOError {
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let bytes = serde_json::to_vec(&self.inner).map_err(|e| KVStoreError::IOError {
            message: e.to_string(),
        })?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;

        debug!("ledger snapshot written ({} bytes)", bytes.len());
        Ok(())
    }

    fn persist(&mut self, key: &str) -> Result<(), KVStoreError> {
        self.save_to_file().inspect_err(|_| self.inner.undo_last(key))
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KVStoreError> {
        self.inner.put(key, value)?;
        self.persist(key)
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        if !self.inner.exists(key)? {
            return Ok(());
        }
        self.inner.delete(key)?;
        self.persist(key)
    }

    fn history(&self, key: &str) -> Result<Vec<KeyModification>, KVStoreError> {
        self.inner.history(key)
    }

    fn prefix_scan(&self, prefix: &str) -> Result<ScanResult, KVStoreError> {
        self.inner.prefix_scan(prefix)
    }

    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        self.inner.exists(key)
    }
}
