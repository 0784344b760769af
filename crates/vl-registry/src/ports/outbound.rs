//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the registry requires from its host: the ledger key-value
//! store, a clock, and the codec applied to car records.

use crate::domain::entities::{Car, Timestamp};
use crate::domain::errors::{CodecError, KVStoreError};
use serde::{Deserialize, Serialize};

/// Result of a prefix scan: `(key, value)` pairs ordered by key.
pub type ScanResult = Vec<(String, Vec<u8>)>;

/// Abstract interface for the ledger key-value store.
///
/// Each `put`/`delete` is applied atomically and durably on its own. There
/// is no multi-key atomicity and no optimistic concurrency control; the host
/// platform serializes invocations.
///
/// Production: `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), KVStoreError>;

    /// Every modification ever applied to `key`, oldest first.
    fn history(&self, key: &str) -> Result<Vec<KeyModification>, KVStoreError>;

    /// All live keys starting with `prefix`, ordered by key.
    fn prefix_scan(&self, prefix: &str) -> Result<ScanResult, KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// One entry in a key's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    /// Store-wide write sequence number.
    pub sequence: u64,
    /// New value, or `None` for a deletion.
    pub value: Option<Vec<u8>>,
}

impl KeyModification {
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Encoding applied to the car record at `car:<vin>`.
///
/// The default is plain JSON; an encrypting codec can be swapped in without
/// touching the workflows.
pub trait CarCodec: Send + Sync {
    fn encode(&self, car: &Car) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, data: &[u8]) -> Result<Car, CodecError>;
}
