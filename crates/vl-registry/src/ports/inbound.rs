//! # Inbound Port (Driving Port)
//!
//! Operations exposed to callers. Every method authorizes the caller's role
//! before touching the ledger; a denial has no side effects.

use crate::domain::entities::{
    Car, InsureProposal, Insurer, NewCar, Offer, RegistrationData, RegistrationProposal,
    RevocationProposal, User,
};
use crate::domain::errors::RegistryError;
use crate::domain::roles::Caller;
use std::collections::BTreeMap;

/// Registration, insurance, confirmation and revocation of a single car.
pub trait CertificationApi {
    /// Creates an unregistered car owned by the calling garage and deposits
    /// a registration proposal for the DOT.
    fn create_car(
        &mut self,
        caller: &Caller,
        car: NewCar,
        registration: Option<RegistrationData>,
    ) -> Result<Car, RegistryError>;

    /// Reads a car owned by the caller.
    fn read_car(&self, caller: &Caller, vin: &str) -> Result<Car, RegistryError>;

    /// Past values of a car, oldest first.
    fn car_history(&self, caller: &Caller, vin: &str) -> Result<Vec<Car>, RegistryError>;

    /// Issues a certificate, consuming the registration proposal.
    fn register_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError>;

    /// Files an insurance request with `company`.
    fn insure_proposal(
        &mut self,
        caller: &Caller,
        vin: &str,
        company: &str,
    ) -> Result<InsureProposal, RegistryError>;

    /// Accepts the owner's pending request and records the insurer on the
    /// certificate. Returns the consumed proposal.
    fn insurance_accept(
        &mut self,
        caller: &Caller,
        owner: &str,
        vin: &str,
        company: &str,
    ) -> Result<InsureProposal, RegistryError>;

    fn get_insurer(&self, caller: &Caller, company: &str) -> Result<Insurer, RegistryError>;

    /// Assigns a numberplate to an insured car.
    fn confirm_car(
        &mut self,
        caller: &Caller,
        vin: &str,
        numberplate: &str,
    ) -> Result<Car, RegistryError>;

    fn revocation_proposal(
        &mut self,
        caller: &Caller,
        vin: &str,
    ) -> Result<RevocationProposal, RegistryError>;

    /// Clears insurer and numberplate.
    fn revoke_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError>;

    /// Removes a car and everything referencing it. Returns the removed car.
    fn delete_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError>;

    fn registration_proposals(
        &self,
        caller: &Caller,
    ) -> Result<BTreeMap<String, RegistrationProposal>, RegistryError>;

    fn revocation_proposals(
        &self,
        caller: &Caller,
    ) -> Result<BTreeMap<String, RevocationProposal>, RegistryError>;

    /// Insured cars still waiting for a numberplate.
    fn cars_to_confirm(&self, caller: &Caller) -> Result<Vec<Car>, RegistryError>;
}

/// Transfer and sale of cars between users.
pub trait OwnershipApi {
    fn transfer(&mut self, caller: &Caller, vin: &str, new_owner: &str)
        -> Result<Car, RegistryError>;

    /// Transfer with a balance side-payment from `buyer` to the caller.
    fn sell(
        &mut self,
        caller: &Caller,
        price: i64,
        vin: &str,
        buyer: &str,
    ) -> Result<Car, RegistryError>;

    fn create_selling_offer(
        &mut self,
        caller: &Caller,
        price: i64,
        vin: &str,
        buyer: &str,
    ) -> Result<Offer, RegistryError>;

    /// Buyer side of an offer: runs the sale at the offered price.
    fn accept_offer(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError>;
}

/// User records and balances.
pub trait AccountApi {
    fn create_user(&mut self, caller: &Caller, name: &str) -> Result<User, RegistryError>;

    /// The caller's own record.
    fn read_user(&self, caller: &Caller) -> Result<User, RegistryError>;

    /// Adds a signed amount to the caller's balance. Returns the new balance.
    fn update_balance(&mut self, caller: &Caller, amount: i64) -> Result<i64, RegistryError>;

    /// Deletes a car-less user, moving the remaining balance to `recipient`.
    /// Returns the updated recipient.
    fn delete_user(
        &mut self,
        caller: &Caller,
        name: &str,
        recipient: &str,
    ) -> Result<User, RegistryError>;
}

/// Raw ledger access for verification tooling.
pub trait LedgerReadApi {
    /// Unrestricted key-value read. Only the verifier role passes the gate.
    fn read(&self, caller: &Caller, key: &str) -> Result<Option<Vec<u8>>, RegistryError>;
}

/// Primary API of the vehicle registry.
pub trait VehicleRegistryApi: CertificationApi + OwnershipApi + AccountApi + LedgerReadApi {}

impl<T> VehicleRegistryApi for T where T: CertificationApi + OwnershipApi + AccountApi + LedgerReadApi {}
