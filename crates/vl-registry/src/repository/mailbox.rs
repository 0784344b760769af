//! Proposal mailbox.
//!
//! One role deposits a proposal keyed by VIN; a different role later
//! consumes it to perform the privileged action. The roles never call each
//! other, the mailbox is their only hand-off.

use super::index::SecondaryIndex;
use crate::domain::errors::RegistryError;
use crate::ports::outbound::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct ProposalMailbox<T> {
    slots: SecondaryIndex<T>,
}

impl<T> Clone for ProposalMailbox<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ProposalMailbox<T> {}

impl<T> ProposalMailbox<T>
where
    T: Serialize + DeserializeOwned,
{
    pub const fn new(prefix: &'static str, entity: &'static str) -> Self {
        Self {
            slots: SecondaryIndex::new(prefix, entity),
        }
    }

    /// Stores `proposal` at `key`, overwriting any earlier one.
    pub fn deposit<KV: KeyValueStore>(
        &self,
        kv: &mut KV,
        key: &str,
        proposal: &T,
    ) -> Result<(), RegistryError> {
        self.slots.upsert(kv, key, proposal)
    }

    pub fn peek<KV: KeyValueStore>(&self, kv: &KV, key: &str) -> Result<Option<T>, RegistryError> {
        self.slots.get(kv, key)
    }

    /// Removes and returns the proposal at `key` if it satisfies
    /// `predicate`. A non-matching proposal stays in place.
    pub fn consume<KV, P>(
        &self,
        kv: &mut KV,
        key: &str,
        predicate: P,
    ) -> Result<Option<T>, RegistryError>
    where
        KV: KeyValueStore,
        P: FnOnce(&T) -> bool,
    {
        match self.slots.get(kv, key)? {
            Some(proposal) if predicate(&proposal) => {
                self.slots.remove(kv, key)?;
                Ok(Some(proposal))
            }
            _ => Ok(None),
        }
    }

    /// Drops the proposal at `key`. Returns whether one was present.
    pub fn discard<KV: KeyValueStore>(&self, kv: &mut KV, key: &str) -> Result<bool, RegistryError> {
        if !self.slots.contains(kv, key)? {
            return Ok(false);
        }
        self.slots.remove(kv, key)?;
        Ok(true)
    }

    pub fn pending<KV: KeyValueStore>(&self, kv: &KV) -> Result<BTreeMap<String, T>, RegistryError> {
        self.slots.entries(kv)
    }
}
