//! # Entity Repository
//!
//! Typed load/save for cars, users, insurers and proposals on top of the
//! single-key ledger store.
//!
//! ## Write ordering
//!
//! The store has no multi-key transaction. Upserts write the entity first and
//! the index entry second; removals delete the index entry first and the
//! entity second. A crash between the two writes therefore leaves an index
//! that lags behind its entities, never one that points at a missing record.
//!
//! ## Failure kinds
//!
//! A missing key is `NotFound`. A present value that cannot be decoded is
//! `Corruption` and is always surfaced.

mod index;
mod mailbox;

pub use index::SecondaryIndex;
pub use mailbox::ProposalMailbox;

use crate::domain::entities::{Car, Insurer, RegistrationProposal, RevocationProposal, User};
use crate::domain::errors::RegistryError;
use crate::domain::keys::KeyPrefix;
use crate::ports::outbound::{CarCodec, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

const CAR_OWNERS: SecondaryIndex<String> = SecondaryIndex::new(KeyPrefix::CAR_INDEX, "car");
const USER_NAMES: SecondaryIndex<String> = SecondaryIndex::new(KeyPrefix::USER_INDEX, "user");
const INSURERS: SecondaryIndex<Insurer> =
    SecondaryIndex::new(KeyPrefix::INSURER_INDEX, "insurer");
const REGISTRATIONS: ProposalMailbox<RegistrationProposal> =
    ProposalMailbox::new(KeyPrefix::REGISTRATION_PROPOSALS, "registration proposal");
const REVOCATIONS: ProposalMailbox<RevocationProposal> =
    ProposalMailbox::new(KeyPrefix::REVOCATION_PROPOSALS, "revocation proposal");

pub(crate) fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, RegistryError> {
    serde_json::from_slice(bytes).map_err(|e| RegistryError::Corruption {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, RegistryError> {
    serde_json::to_vec(value).map_err(|e| {
        RegistryError::InvariantViolation(format!("cannot encode value for '{key}': {e}"))
    })
}

/// Typed access to every record the registry keeps on the ledger.
pub struct EntityRepository<KV, CC> {
    kv: KV,
    codec: CC,
}

impl<KV, CC> EntityRepository<KV, CC>
where
    KV: KeyValueStore,
    CC: CarCodec,
{
    pub fn new(kv: KV, codec: CC) -> Self {
        Self { kv, codec }
    }

    pub fn store(&self) -> &KV {
        &self.kv
    }

    pub fn store_mut(&mut self) -> &mut KV {
        &mut self.kv
    }

    pub fn into_store(self) -> KV {
        self.kv
    }

    // === Cars ===

    fn decode_car(&self, key: &str, bytes: &[u8]) -> Result<Car, RegistryError> {
        self.codec
            .decode(bytes)
            .map_err(|e| RegistryError::Corruption {
                key: key.to_string(),
                message: e.message,
            })
    }

    pub fn find_car(&self, vin: &str) -> Result<Option<Car>, RegistryError> {
        let key = KeyPrefix::car_key(vin);
        self.kv
            .get(&key)?
            .map(|bytes| self.decode_car(&key, &bytes))
            .transpose()
    }

    pub fn load_car(&self, vin: &str) -> Result<Car, RegistryError> {
        self.find_car(vin)?
            .ok_or_else(|| RegistryError::not_found("car", vin))
    }

    /// Overwrites the car record. The owner index is maintained separately.
    pub fn save_car(&mut self, car: &Car) -> Result<(), RegistryError> {
        let key = KeyPrefix::car_key(&car.vin);
        let bytes = self.codec.encode(car).map_err(|e| {
            RegistryError::InvariantViolation(format!("cannot encode car '{}': {}", car.vin, e))
        })?;
        self.kv.put(&key, &bytes)?;
        Ok(())
    }

    /// Removes the owner index entry, then the car record.
    pub fn remove_car(&mut self, vin: &str) -> Result<(), RegistryError> {
        CAR_OWNERS.remove(&mut self.kv, vin)?;
        self.kv.delete(&KeyPrefix::car_key(vin))?;
        Ok(())
    }

    /// Past values of the car, oldest first. Deletions are skipped.
    pub fn car_history(&self, vin: &str) -> Result<Vec<Car>, RegistryError> {
        let key = KeyPrefix::car_key(vin);
        self.kv
            .history(&key)?
            .into_iter()
            .filter_map(|m| m.value)
            .map(|bytes| self.decode_car(&key, &bytes))
            .collect()
    }

    pub fn car_owner(&self, vin: &str) -> Result<Option<String>, RegistryError> {
        CAR_OWNERS.get(&self.kv, vin)
    }

    pub fn set_car_owner(&mut self, vin: &str, owner: &str) -> Result<(), RegistryError> {
        CAR_OWNERS.upsert(&mut self.kv, vin, &owner.to_string())
    }

    pub fn remove_car_owner(&mut self, vin: &str) -> Result<(), RegistryError> {
        CAR_OWNERS.remove(&mut self.kv, vin)
    }

    /// VIN → owner for every indexed car.
    pub fn car_owners(&self) -> Result<BTreeMap<String, String>, RegistryError> {
        CAR_OWNERS.entries(&self.kv)
    }

    // === Users ===

    pub fn find_user(&self, name: &str) -> Result<Option<User>, RegistryError> {
        let key = KeyPrefix::user_key(name);
        self.kv
            .get(&key)?
            .map(|bytes| decode(&key, &bytes))
            .transpose()
    }

    pub fn load_user(&self, name: &str) -> Result<User, RegistryError> {
        self.find_user(name)?
            .ok_or_else(|| RegistryError::not_found("user", name))
    }

    /// Writes the user record, then adds the user index entry if missing.
    pub fn save_user(&mut self, user: &User) -> Result<(), RegistryError> {
        let key = KeyPrefix::user_key(&user.name);
        self.kv.put(&key, &encode(&key, user)?)?;
        if !USER_NAMES.contains(&self.kv, &user.name)? {
            USER_NAMES.upsert(&mut self.kv, &user.name, &user.name)?;
        }
        Ok(())
    }

    /// Removes the user index entry, then the user record.
    pub fn remove_user(&mut self, name: &str) -> Result<(), RegistryError> {
        USER_NAMES.remove(&mut self.kv, name)?;
        self.kv.delete(&KeyPrefix::user_key(name))?;
        Ok(())
    }

    pub fn user_names(&self) -> Result<Vec<String>, RegistryError> {
        Ok(USER_NAMES.entries(&self.kv)?.into_values().collect())
    }

    // === Insurers ===

    pub fn find_insurer(&self, company: &str) -> Result<Option<Insurer>, RegistryError> {
        INSURERS.get(&self.kv, company)
    }

    pub fn save_insurer(&mut self, insurer: &Insurer) -> Result<(), RegistryError> {
        INSURERS.upsert(&mut self.kv, &insurer.name, insurer)
    }

    pub fn insurers(&self) -> Result<BTreeMap<String, Insurer>, RegistryError> {
        INSURERS.entries(&self.kv)
    }

    // === Proposals ===

    pub fn deposit_registration(
        &mut self,
        proposal: &RegistrationProposal,
    ) -> Result<(), RegistryError> {
        REGISTRATIONS.deposit(&mut self.kv, &proposal.car, proposal)
    }

    pub fn registration_proposal(
        &self,
        vin: &str,
    ) -> Result<Option<RegistrationProposal>, RegistryError> {
        REGISTRATIONS.peek(&self.kv, vin)
    }

    pub fn consume_registration(
        &mut self,
        vin: &str,
    ) -> Result<Option<RegistrationProposal>, RegistryError> {
        REGISTRATIONS.consume(&mut self.kv, vin, |p| p.car == vin)
    }

    pub fn discard_registration(&mut self, vin: &str) -> Result<bool, RegistryError> {
        REGISTRATIONS.discard(&mut self.kv, vin)
    }

    pub fn registration_proposals(
        &self,
    ) -> Result<BTreeMap<String, RegistrationProposal>, RegistryError> {
        REGISTRATIONS.pending(&self.kv)
    }

    pub fn deposit_revocation(&mut self, proposal: &RevocationProposal) -> Result<(), RegistryError> {
        REVOCATIONS.deposit(&mut self.kv, &proposal.car, proposal)
    }

    pub fn discard_revocation(&mut self, vin: &str) -> Result<bool, RegistryError> {
        REVOCATIONS.discard(&mut self.kv, vin)
    }

    pub fn revocation_proposals(
        &self,
    ) -> Result<BTreeMap<String, RevocationProposal>, RegistryError> {
        REVOCATIONS.pending(&self.kv)
    }

    // === Raw ===

    pub fn read_raw(&self, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        Ok(self.kv.get(key)?)
    }
}
