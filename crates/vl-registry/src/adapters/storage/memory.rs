use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{KeyModification, KeyValueStore, ScanResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// In-memory ledger store for unit tests.
///
/// Keys are kept ordered so prefix scans come back sorted. Every write is
/// appended to the key's history with a store-wide sequence number.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InMemoryKVStore {
    data: BTreeMap<String, Vec<u8>>,
    #[serde(default)]
    history: HashMap<String, Vec<KeyModification>>,
    #[serde(default)]
    sequence: u64,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn record(&mut self, key: &str, value: Option<Vec<u8>>) {
        self.sequence += 1;
        self.history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                sequence: self.sequence,
                value,
            });
    }

    /// Reverts the most recent modification of `key`.
    ///
    /// Used by durable wrappers when persisting a write fails, so the write
    /// is not visible in memory either.
    pub(crate) fn undo_last(&mut self, key: &str) {
        let Some(entries) = self.history.get_mut(key) else {
            return;
        };
        if entries.pop().is_some() {
            self.sequence = self.sequence.saturating_sub(1);
        }
        match entries.last().and_then(|m| m.value.clone()) {
            Some(previous) => {
                self.data.insert(key.to_string(), previous);
            }
            None => {
                self.data.remove(key);
            }
        }
        if entries.is_empty() {
            self.history.remove(key);
        }
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_string(), value.to_vec());
        self.record(key, Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        if self.data.remove(key).is_some() {
            self.record(key, None);
        }
        Ok(())
    }

    fn history(&self, key: &str) -> Result<Vec<KeyModification>, KVStoreError> {
        Ok(self.history.get(key).cloned().unwrap_or_default())
    }

    fn prefix_scan(&self, prefix: &str) -> Result<ScanResult, KVStoreError> {
        let results: Vec<_> = self
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }

    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }
}
