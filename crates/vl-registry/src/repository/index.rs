//! Per-entry secondary index.
//!
//! Each entry is stored under `<prefix><id>`, so an upsert or removal touches
//! exactly one key and listing the index is a prefix scan.

use super::{decode, encode};
use crate::domain::errors::RegistryError;
use crate::ports::outbound::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Typed view over one index key range.
pub struct SecondaryIndex<V> {
    prefix: &'static str,
    entity: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for SecondaryIndex<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for SecondaryIndex<V> {}

impl<V> SecondaryIndex<V>
where
    V: Serialize + DeserializeOwned,
{
    /// `entity` names the indexed thing in `NotFound` errors.
    pub const fn new(prefix: &'static str, entity: &'static str) -> Self {
        Self {
            prefix,
            entity,
            _value: PhantomData,
        }
    }

    pub fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn get<KV: KeyValueStore>(&self, kv: &KV, id: &str) -> Result<Option<V>, RegistryError> {
        let key = self.key(id);
        kv.get(&key)?
            .map(|bytes| decode(&key, &bytes))
            .transpose()
    }

    /// Like [`get`](Self::get), but absence is `NotFound`.
    pub fn load<KV: KeyValueStore>(&self, kv: &KV, id: &str) -> Result<V, RegistryError> {
        self.get(kv, id)?
            .ok_or_else(|| RegistryError::not_found(self.entity, id))
    }

    pub fn upsert<KV: KeyValueStore>(
        &self,
        kv: &mut KV,
        id: &str,
        value: &V,
    ) -> Result<(), RegistryError> {
        let key = self.key(id);
        kv.put(&key, &encode(&key, value)?)?;
        Ok(())
    }

    pub fn remove<KV: KeyValueStore>(&self, kv: &mut KV, id: &str) -> Result<(), RegistryError> {
        kv.delete(&self.key(id))?;
        Ok(())
    }

    pub fn contains<KV: KeyValueStore>(&self, kv: &KV, id: &str) -> Result<bool, RegistryError> {
        Ok(kv.exists(&self.key(id))?)
    }

    /// All entries keyed by id.
    pub fn entries<KV: KeyValueStore>(&self, kv: &KV) -> Result<BTreeMap<String, V>, RegistryError> {
        kv.prefix_scan(self.prefix)?
            .into_iter()
            .map(|(key, bytes)| {
                let value = decode(&key, &bytes)?;
                let id = key[self.prefix.len()..].to_string();
                Ok((id, value))
            })
            .collect()
    }
}
