//! Test utilities for the vehicle registry.
//!
//! Provides a fault-injecting store for driving compensation paths.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use vl_registry::test_utils::FaultyKVStore;
//! use vl_registry::KeyValueStore;
//!
//! let mut store = FaultyKVStore::new();
//! store.fail_writes_to("index:cars:", 0);
//! assert!(store.put("index:cars:WVW1", b"\"amag\"").is_err());
//! assert!(store.put("car:WVW1", b"{}").is_ok());
//! ```

use crate::adapters::InMemoryKVStore;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{KeyModification, KeyValueStore, ScanResult};

#[derive(Debug, Clone)]
struct FaultRule {
    prefix: String,
    /// Matching writes still allowed to succeed.
    remaining: usize,
}

/// Store wrapper that fails `put`/`delete` on selected keys.
///
/// Each rule lets the first `after` matching writes through and fails every
/// matching write after that. Reads are never affected.
#[derive(Debug, Clone)]
pub struct FaultyKVStore<KV = InMemoryKVStore> {
    inner: KV,
    rules: Vec<FaultRule>,
    injected: usize,
}

impl FaultyKVStore<InMemoryKVStore> {
    pub fn new() -> Self {
        Self::wrap(InMemoryKVStore::new())
    }
}

impl Default for FaultyKVStore<InMemoryKVStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<KV: KeyValueStore> FaultyKVStore<KV> {
    pub fn wrap(inner: KV) -> Self {
        Self {
            inner,
            rules: Vec::new(),
            injected: 0,
        }
    }

    /// Fails writes to keys starting with `prefix` once `after` of them
    /// have succeeded.
    pub fn fail_writes_to(&mut self, prefix: impl Into<String>, after: usize) -> &mut Self {
        self.rules.push(FaultRule {
            prefix: prefix.into(),
            remaining: after,
        });
        self
    }

    /// Removes all rules.
    pub fn heal(&mut self) {
        self.rules.clear();
    }

    /// Number of writes failed so far.
    pub fn injected_faults(&self) -> usize {
        self.injected
    }

    pub fn inner(&self) -> &KV {
        &self.inner
    }

    fn check(&mut self, key: &str) -> Result<(), KVStoreError> {
        let mut fail = false;
        for rule in self.rules.iter_mut().filter(|r| key.starts_with(&r.prefix)) {
            if rule.remaining == 0 {
                fail = true;
            } else {
                rule.remaining -= 1;
            }
        }
        if fail {
            self.injected += 1;
            return Err(KVStoreError::IOError {
                message: format!("injected fault writing '{key}'"),
            });
        }
        Ok(())
    }
}

impl<KV: KeyValueStore> KeyValueStore for FaultyKVStore<KV> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KVStoreError> {
        self.check(key)?;
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        self.check(key)?;
        self.inner.delete(key)
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
