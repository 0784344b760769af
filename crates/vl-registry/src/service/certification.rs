//! # Certification State Machine
//!
//! Implements `CertificationApi`. The certification state is derived from
//! the certificate on every call (see `domain::lifecycle`); the transitions
//! here only ever change certificate fields.

use super::{require_arg, VehicleRegistryService};
use crate::domain::entities::{
    Car, Certificate, InsureProposal, Insurer, NewCar, RegistrationData, RegistrationProposal,
    RevocationProposal,
};
use crate::domain::errors::RegistryError;
use crate::domain::lifecycle::{is_confirmed, is_insured, is_registered, verify_revoked};
use crate::domain::roles::{Caller, Operation, Role};
use crate::ports::inbound::CertificationApi;
use crate::ports::outbound::{CarCodec, KeyValueStore, TimeSource};
use std::collections::BTreeMap;
use tracing::{debug, info};

impl<KV, TS, CC> VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    /// VIN of another car already carrying `numberplate`, if any.
    fn numberplate_holder(&self, numberplate: &str, vin: &str) -> Result<Option<String>, RegistryError> {
        for other in self.repo.car_owners()?.into_keys() {
            if other == vin {
                continue;
            }
            let Some(car) = self.repo.find_car(&other)? else {
                continue;
            };
            let taken = car
                .certificate
                .as_ref()
                .and_then(|cert| cert.numberplate())
                .is_some_and(|plate| plate == numberplate);
            if taken {
                return Ok(Some(other));
            }
        }
        Ok(None)
    }
}

impl<KV, TS, CC> CertificationApi for VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    fn create_car(
        &mut self,
        caller: &Caller,
        car: NewCar,
        registration: Option<RegistrationData>,
    ) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Create)?;
        let vin = require_arg("vin", &car.vin)?.to_string();

        let indexed = self
            .repo
            .car_owner(&vin)?
            .is_some_and(|owner| !owner.is_empty());
        if indexed || self.repo.find_car(&vin)?.is_some() {
            return Err(RegistryError::precondition(format!(
                "Car with VIN '{vin}' already exists"
            )));
        }

        let car = Car::new(vin.clone(), self.time_source.now());
        let mut owner = self.user_or_new(&caller.username)?;
        owner.cars.insert(vin.clone());
        let proposal =
            RegistrationProposal::new(&caller.username, &vin, registration.unwrap_or_default());

        self.repo.save_car(&car)?;
        self.repo.save_user(&owner)?;
        self.repo.set_car_owner(&vin, &owner.name)?;
        self.repo.deposit_registration(&proposal)?;

        info!(vin = %vin, owner = %owner.name, "🚗 Car created");
        Ok(car)
    }

    fn read_car(&self, caller: &Caller, vin: &str) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::ReadCar)?;
        self.owned_car(&caller.username, require_arg("vin", vin)?)
    }

    fn car_history(&self, caller: &Caller, vin: &str) -> Result<Vec<Car>, RegistryError> {
        self.gate(caller, Operation::GetHistory)?;
        let vin = require_arg("vin", vin)?;
        if caller.role != Role::Dot {
            self.require_owner(&caller.username, vin)?;
        }
        let history = self.repo.car_history(vin)?;
        if history.is_empty() {
            return Err(RegistryError::not_found("car", vin));
        }
        Ok(history)
    }

    fn register_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Register)?;
        let vin = require_arg("vin", vin)?;

        if self.repo.registration_proposal(vin)?.is_none() {
            return Err(RegistryError::precondition(format!(
                "No registration proposal for car '{vin}'"
            )));
        }
        let mut car = self.owned_car(&caller.username, vin)?;

        car.certificate = Some(Certificate::issue(&caller.username, vin));
        self.repo.save_car(&car)?;
        self.repo.consume_registration(vin)?;

        info!(vin = %vin, by = %caller.username, "📋 Car registered");
        Ok(car)
    }

    fn insure_proposal(
        &mut self,
        caller: &Caller,
        vin: &str,
        company: &str,
    ) -> Result<InsureProposal, RegistryError> {
        self.gate(caller, Operation::InsureProposal)?;
        let vin = require_arg("vin", vin)?;
        let company = require_arg("company", company)?;
        self.owned_car(&caller.username, vin)?;

        let proposal = InsureProposal {
            user: caller.username.clone(),
            car: vin.to_string(),
        };
        let mut insurer = self
            .repo
            .find_insurer(company)?
            .unwrap_or_else(|| Insurer::new(company));
        insurer.proposals.push(proposal.clone());
        self.repo.save_insurer(&insurer)?;

        debug!(vin = %vin, company = %company, "insurance proposal filed");
        Ok(proposal)
    }

    fn insurance_accept(
        &mut self,
        caller: &Caller,
        owner: &str,
        vin: &str,
        company: &str,
    ) -> Result<InsureProposal, RegistryError> {
        self.gate(caller, Operation::InsuranceAccept)?;
        let owner = require_arg("owner", owner)?;
        let vin = require_arg("vin", vin)?;
        let company = require_arg("company", company)?;

        let mut car = self.owned_car(owner, vin)?;
        if !is_registered(&car) {
            return Err(RegistryError::precondition(format!(
                "Car '{vin}' is not registered"
            )));
        }

        let no_proposal = || {
            RegistryError::precondition(format!(
                "No insurance proposal from '{owner}' for car '{vin}' at '{company}'"
            ))
        };
        let mut insurer = self.repo.find_insurer(company)?.ok_or_else(no_proposal)?;
        let proposal = insurer.take_proposal(vin, owner).ok_or_else(no_proposal)?;

        if let Some(cert) = car.certificate.as_mut() {
            cert.insurer = Some(company.to_string());
        }
        self.repo.save_car(&car)?;
        self.repo.save_insurer(&insurer)?;

        info!(vin = %vin, company = %company, "🛡️ Car insured");
        Ok(proposal)
    }

    fn get_insurer(&self, caller: &Caller, company: &str) -> Result<Insurer, RegistryError> {
        self.gate(caller, Operation::GetInsurer)?;
        let company = require_arg("company", company)?;
        self.repo
            .find_insurer(company)?
            .ok_or_else(|| RegistryError::not_found("insurer", company))
    }

    fn confirm_car(
        &mut self,
        caller: &Caller,
        vin: &str,
        numberplate: &str,
    ) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Confirm)?;
        let vin = require_arg("vin", vin)?;
        let numberplate = require_arg("numberplate", numberplate)?;

        let mut car = self.repo.load_car(vin)?;
        if !is_insured(&car) {
            return Err(RegistryError::precondition(format!(
                "Car '{vin}' is not insured"
            )));
        }
        if let Some(other) = self.numberplate_holder(numberplate, vin)? {
            return Err(RegistryError::precondition(format!(
                "Numberplate '{numberplate}' is already assigned to car '{other}'"
            )));
        }

        if let Some(cert) = car.certificate.as_mut() {
            cert.numberplate = Some(numberplate.to_string());
        }
        self.repo.save_car(&car)?;

        info!(vin = %vin, numberplate = %numberplate, "✅ Car confirmed");
        Ok(car)
    }

    fn revocation_proposal(
        &mut self,
        caller: &Caller,
        vin: &str,
    ) -> Result<RevocationProposal, RegistryError> {
        self.gate(caller, Operation::RevocationProposal)?;
        let vin = require_arg("vin", vin)?;
        self.owned_car(&caller.username, vin)?;

        let proposal = RevocationProposal {
            username: caller.username.clone(),
            car: vin.to_string(),
        };
        self.repo.deposit_revocation(&proposal)?;

        debug!(vin = %vin, "revocation proposal filed");
        Ok(proposal)
    }

    fn revoke_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Revoke)?;
        let vin = require_arg("vin", vin)?;
        let mut car = self.owned_car(&caller.username, vin)?;

        if let Some(cert) = car.certificate.as_mut() {
            cert.insurer = None;
            cert.numberplate = None;
        }
        verify_revoked(&car)?;

        self.repo.save_car(&car)?;
        self.repo.discard_revocation(vin)?;

        info!(vin = %vin, "⛔ Car revoked");
        Ok(car)
    }

    fn delete_car(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Delete)?;
        let vin = require_arg("vin", vin)?;
        let car = self.repo.load_car(vin)?;

        self.repo.discard_registration(vin)?;
        self.repo.discard_revocation(vin)?;
        for mut insurer in self.repo.insurers()?.into_values() {
            let dropped = insurer.drop_proposals_for(vin);
            if dropped > 0 {
                debug!(vin = %vin, company = %insurer.name, dropped, "dropping insurance proposals");
                self.repo.save_insurer(&insurer)?;
            }
        }
        for name in self.repo.user_names()? {
            let Some(mut user) = self.repo.find_user(&name)? else {
                continue;
            };
            let dropped = user.drop_offers_for(vin);
            if dropped > 0 {
                debug!(vin = %vin, buyer = %name, dropped, "dropping selling offers");
                self.repo.save_user(&user)?;
            }
        }
        if let Some(owner) = self.repo.car_owner(vin)? {
            if let Some(mut user) = self.repo.find_user(&owner)? {
                if user.cars.remove(vin) {
                    self.repo.save_user(&user)?;
                }
            }
        }
        self.repo.remove_car(vin)?;

        info!(vin = %vin, "🗑️ Car deleted");
        Ok(car)
    }

    fn registration_proposals(
        &self,
        caller: &Caller,
    ) -> Result<BTreeMap<String, RegistrationProposal>, RegistryError> {
        self.gate(caller, Operation::ReadRegistrationProposals)?;
        self.repo.registration_proposals()
    }

    fn revocation_proposals(
        &self,
        caller: &Caller,
    ) -> Result<BTreeMap<String, RevocationProposal>, RegistryError> {
        self.gate(caller, Operation::GetRevocationProposals)?;
        self.repo.revocation_proposals()
    }

    fn cars_to_confirm(&self, caller: &Caller) -> Result<Vec<Car>, RegistryError> {
        self.gate(caller, Operation::GetCarsToConfirm)?;
        let mut pending = Vec::new();
        for vin in self.repo.car_owners()?.into_keys() {
            if let Some(car) = self.repo.find_car(&vin)? {
                if is_insured(&car) && !is_confirmed(&car) {
                    pending.push(car);
                }
            }
        }
        Ok(pending)
    }
}
