//! # Vehicle Registry Service
//!
//! The main service implementing the registry API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `CertificationApi` (the certification state machine)
//! 2. Implements `OwnershipApi` (transfer and sale with compensation)
//! 3. Implements `AccountApi` and `LedgerReadApi`
//! 4. Authorizes the caller's role before any ledger access
//! 5. Uses dependency injection for all external dependencies
//!
//! The host platform serializes invocations; nothing here locks.

mod accounts;
mod certification;
mod ownership;

use crate::adapters::JsonCarCodec;
use crate::domain::config::RegistryConfig;
use crate::domain::entities::{Car, User};
use crate::domain::errors::RegistryError;
use crate::domain::roles::{authorize, Caller, Operation};
use crate::ports::inbound::LedgerReadApi;
use crate::ports::outbound::{CarCodec, KeyValueStore, TimeSource};
use crate::repository::EntityRepository;
use tracing::debug;

/// The Vehicle Registry Service.
pub struct VehicleRegistryService<KV, TS, CC = JsonCarCodec>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    /// Typed access to the ledger.
    pub(crate) repo: EntityRepository<KV, CC>,
    /// Time source for car creation timestamps.
    pub(crate) time_source: TS,
    pub(crate) config: RegistryConfig,
}

/// Dependencies for VehicleRegistryService
pub struct RegistryDependencies<KV, TS, CC = JsonCarCodec> {
    pub kv_store: KV,
    pub time_source: TS,
    pub codec: CC,
}

impl<KV, TS, CC> VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    pub fn new(deps: RegistryDependencies<KV, TS, CC>, config: RegistryConfig) -> Self {
        Self {
            repo: EntityRepository::new(deps.kv_store, deps.codec),
            time_source: deps.time_source,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn repository(&self) -> &EntityRepository<KV, CC> {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut EntityRepository<KV, CC> {
        &mut self.repo
    }

    /// Consumes the service, returning the underlying store.
    pub fn into_store(self) -> KV {
        self.repo.into_store()
    }

    /// Gate every operation passes first.
    pub(crate) fn gate(&self, caller: &Caller, operation: Operation) -> Result<(), RegistryError> {
        authorize(caller.role, operation)?;
        debug!(
            operation = operation.name(),
            username = %caller.username,
            role = %caller.role,
            "authorized"
        );
        Ok(())
    }

    /// Fails with `NotOwner` unless the car index records `username` as the
    /// owner of `vin`.
    pub(crate) fn require_owner(&self, username: &str, vin: &str) -> Result<(), RegistryError> {
        match self.repo.car_owner(vin)? {
            None => Err(RegistryError::not_found("car", vin)),
            Some(owner) if owner == username => Ok(()),
            Some(_) => Err(RegistryError::NotOwner {
                username: username.to_string(),
                vin: vin.to_string(),
            }),
        }
    }

    /// Ownership-checked read path.
    pub(crate) fn owned_car(&self, username: &str, vin: &str) -> Result<Car, RegistryError> {
        self.require_owner(username, vin)?;
        let car = self.repo.load_car(vin)?;
        if car.vin != vin {
            return Err(RegistryError::validation(format!(
                "VIN argument '{}' does not match stored car '{}'",
                vin, car.vin
            )));
        }
        Ok(car)
    }

    /// Existing user, or a fresh one with the starting balance (not saved).
    pub(crate) fn user_or_new(&self, name: &str) -> Result<User, RegistryError> {
        Ok(self
            .repo
            .find_user(name)?
            .unwrap_or_else(|| User::new(name, self.config.starting_balance)))
    }
}

/// Rejects blank arguments.
pub(crate) fn require_arg<'s>(name: &str, value: &'s str) -> Result<&'s str, RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::validation(format!("{name} must not be empty")));
    }
    Ok(trimmed)
}

impl<KV, TS, CC> LedgerReadApi for VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    fn read(&self, caller: &Caller, key: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        self.gate(caller, Operation::Read)?;
        self.repo.read_raw(key)
    }
}
