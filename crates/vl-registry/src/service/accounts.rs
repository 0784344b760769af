//! # User Accounts
//!
//! Implements `AccountApi`.

use super::{require_arg, VehicleRegistryService};
use crate::domain::entities::User;
use crate::domain::errors::RegistryError;
use crate::domain::roles::{Caller, Operation};
use crate::domain::saga::Saga;
use crate::ports::inbound::AccountApi;
use crate::ports::outbound::{CarCodec, KeyValueStore, TimeSource};
use tracing::info;

impl<KV, TS, CC> AccountApi for VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    fn create_user(&mut self, caller: &Caller, name: &str) -> Result<User, RegistryError> {
        self.gate(caller, Operation::CreateUser)?;
        let name = require_arg("name", name)?;
        if self.repo.find_user(name)?.is_some() {
            return Err(RegistryError::precondition(format!(
                "User '{name}' already exists"
            )));
        }

        let user = User::new(name, self.config.starting_balance);
        self.repo.save_user(&user)?;

        info!(user = %name, balance = user.balance, "👤 User created");
        Ok(user)
    }

    fn read_user(&self, caller: &Caller) -> Result<User, RegistryError> {
        self.gate(caller, Operation::ReadUser)?;
        self.repo.load_user(&caller.username)
    }

    fn update_balance(&mut self, caller: &Caller, amount: i64) -> Result<i64, RegistryError> {
        self.gate(caller, Operation::UpdateBalance)?;
        let mut user = self.repo.load_user(&caller.username)?;
        let balance = user.adjust_balance(amount)?;
        self.repo.save_user(&user)?;

        info!(user = %user.name, amount, balance, "Balance updated");
        Ok(balance)
    }

    fn delete_user(
        &mut self,
        caller: &Caller,
        name: &str,
        recipient: &str,
    ) -> Result<User, RegistryError> {
        self.gate(caller, Operation::DeleteUser)?;
        let name = require_arg("name", name)?;
        let recipient = require_arg("recipient", recipient)?;
        if name == recipient {
            return Err(RegistryError::validation(format!(
                "'{name}' cannot receive their own remaining balance"
            )));
        }

        let user = self.repo.load_user(name)?;
        if !user.cars.is_empty() {
            return Err(RegistryError::precondition(format!(
                "User '{}' still owns {} car(s)",
                name,
                user.cars.len()
            )));
        }
        self.repo.load_user(recipient)?;

        let remaining = user.balance;
        let refund = remaining.checked_neg().ok_or_else(|| {
            RegistryError::validation(format!(
                "remaining balance {remaining} of '{name}' cannot be transferred"
            ))
        })?;
        let mut credited = None;
        Saga::new("delete user")
            .step(
                "credit recipient",
                |svc: &mut Self| {
                    let mut receiver = svc.repo.load_user(recipient)?;
                    receiver.adjust_balance(remaining)?;
                    svc.repo.save_user(&receiver)?;
                    credited = Some(receiver);
                    Ok(())
                },
                |svc: &mut Self| {
                    let mut receiver = svc.repo.load_user(recipient)?;
                    receiver.adjust_balance(refund)?;
                    svc.repo.save_user(&receiver)
                },
            )
            .final_step("remove user", |svc: &mut Self| svc.repo.remove_user(name))
            .run(self)?;

        info!(user = %name, recipient = %recipient, remaining, "User deleted");
        credited.ok_or_else(|| {
            RegistryError::InvariantViolation(format!("deletion of '{name}' credited nobody"))
        })
    }
}
