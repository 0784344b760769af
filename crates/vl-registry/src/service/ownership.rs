//! # Ownership Transfer Engine
//!
//! Implements `OwnershipApi`. Transfer and sale touch several keys, so both
//! run as sagas: every completed step is undone in reverse order when a
//! later step fails, and a failed undo surfaces as `CompensationFailure`.
//!
//! ```text
//! sale:     debit buyer ──→ credit seller ──→ transfer
//! transfer: certificate ──→ release ──→ acquire ──→ car index
//! ```

use super::{require_arg, VehicleRegistryService};
use crate::domain::entities::{Car, Offer};
use crate::domain::errors::RegistryError;
use crate::domain::lifecycle::is_confirmed;
use crate::domain::roles::{Caller, Operation};
use crate::domain::saga::Saga;
use crate::ports::inbound::OwnershipApi;
use crate::ports::outbound::{CarCodec, KeyValueStore, TimeSource};
use tracing::info;

/// A checked transfer, ready to be applied.
struct TransferPlan {
    from: String,
    to: String,
    original: Car,
    updated: Car,
    receiver_exists: bool,
}

impl<KV, TS, CC> VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    /// Guards shared by transfer and sale. Nothing is written.
    fn plan_transfer(&self, from: &str, vin: &str, to: &str) -> Result<TransferPlan, RegistryError> {
        let vin = require_arg("vin", vin)?;
        let to = require_arg("new owner", to)?;
        if from == to {
            return Err(RegistryError::validation(format!(
                "'{from}' cannot transfer car '{vin}' to themselves"
            )));
        }

        let original = self.owned_car(from, vin)?;
        if is_confirmed(&original) {
            return Err(RegistryError::precondition(format!(
                "Car '{vin}' is confirmed; revoke it before changing owner"
            )));
        }

        let mut updated = original.clone();
        if let Some(cert) = updated.certificate.as_mut() {
            cert.username = to.to_string();
        }

        Ok(TransferPlan {
            from: from.to_string(),
            to: to.to_string(),
            original,
            updated,
            receiver_exists: self.repo.find_user(to)?.is_some(),
        })
    }

    fn apply_transfer(&mut self, plan: &TransferPlan) -> Result<Car, RegistryError> {
        let vin = plan.original.vin.as_str();

        Saga::new("transfer")
            .step(
                "certificate",
                |svc: &mut Self| svc.repo.save_car(&plan.updated),
                |svc: &mut Self| svc.repo.save_car(&plan.original),
            )
            .step(
                "release",
                |svc: &mut Self| {
                    let mut owner = svc.repo.load_user(&plan.from)?;
                    owner.cars.remove(vin);
                    svc.repo.save_user(&owner)
                },
                |svc: &mut Self| {
                    let mut owner = svc.repo.load_user(&plan.from)?;
                    owner.cars.insert(vin.to_string());
                    svc.repo.save_user(&owner)
                },
            )
            .step(
                "acquire",
                |svc: &mut Self| {
                    let mut receiver = svc.user_or_new(&plan.to)?;
                    receiver.cars.insert(vin.to_string());
                    svc.repo.save_user(&receiver)
                },
                |svc: &mut Self| {
                    if !plan.receiver_exists {
                        return svc.repo.remove_user(&plan.to);
                    }
                    let mut receiver = svc.repo.load_user(&plan.to)?;
                    receiver.cars.remove(vin);
                    svc.repo.save_user(&receiver)
                },
            )
            .final_step("car index", |svc: &mut Self| {
                svc.repo.set_car_owner(vin, &plan.to)
            })
            .run(self)?;

        info!(vin = %vin, from = %plan.from, to = %plan.to, "🔑 Ownership transferred");
        Ok(plan.updated.clone())
    }

    /// Moves `price` from `buyer` to `seller`, then transfers the car.
    fn sell_car(
        &mut self,
        seller: &str,
        price: i64,
        vin: &str,
        buyer: &str,
    ) -> Result<Car, RegistryError> {
        if price < 0 {
            return Err(RegistryError::validation(format!(
                "price must not be negative, got {price}"
            )));
        }
        let plan = self.plan_transfer(seller, vin, buyer)?;

        if !plan.receiver_exists {
            let buyer = self.user_or_new(&plan.to)?;
            self.repo.save_user(&buyer)?;
        }
        let balance = self.repo.load_user(&plan.to)?.balance;
        if self.config.enforce_buyer_funds && balance < price {
            return Err(RegistryError::precondition(format!(
                "Buyer '{}' has not enough credits ({} < {})",
                plan.to, balance, price
            )));
        }
        // The buyer exists from here on; undoing the transfer must keep them.
        let plan = TransferPlan {
            receiver_exists: true,
            ..plan
        };

        let mut transferred = None;
        Saga::new("sale")
            .step(
                "debit buyer",
                |svc: &mut Self| svc.adjust_balance(&plan.to, -price),
                |svc: &mut Self| svc.adjust_balance(&plan.to, price),
            )
            .step(
                "credit seller",
                |svc: &mut Self| svc.adjust_balance(&plan.from, price),
                |svc: &mut Self| svc.adjust_balance(&plan.from, -price),
            )
            .final_step("transfer", |svc: &mut Self| {
                transferred = Some(svc.apply_transfer(&plan)?);
                Ok(())
            })
            .run(self)?;

        info!(vin = %plan.original.vin, seller = %plan.from, buyer = %plan.to, price, "💰 Car sold");
        transferred.ok_or_else(|| {
            RegistryError::InvariantViolation(format!(
                "sale of '{}' completed without a transfer",
                plan.original.vin
            ))
        })
    }

    fn adjust_balance(&mut self, name: &str, amount: i64) -> Result<(), RegistryError> {
        let mut user = self.repo.load_user(name)?;
        user.adjust_balance(amount)?;
        self.repo.save_user(&user)
    }
}

impl<KV, TS, CC> OwnershipApi for VehicleRegistryService<KV, TS, CC>
where
    KV: KeyValueStore,
    TS: TimeSource,
    CC: CarCodec,
{
    fn transfer(
        &mut self,
        caller: &Caller,
        vin: &str,
        new_owner: &str,
    ) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Transfer)?;
        let plan = self.plan_transfer(&caller.username, vin, new_owner)?;
        self.apply_transfer(&plan)
    }

    fn sell(
        &mut self,
        caller: &Caller,
        price: i64,
        vin: &str,
        buyer: &str,
    ) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::Sell)?;
        self.sell_car(&caller.username, price, vin, buyer)
    }

    fn create_selling_offer(
        &mut self,
        caller: &Caller,
        price: i64,
        vin: &str,
        buyer: &str,
    ) -> Result<Offer, RegistryError> {
        self.gate(caller, Operation::CreateSellingOffer)?;
        if price < 0 {
            return Err(RegistryError::validation(format!(
                "price must not be negative, got {price}"
            )));
        }
        let vin = require_arg("vin", vin)?;
        let buyer = require_arg("buyer", buyer)?;
        if buyer == caller.username {
            return Err(RegistryError::validation(format!(
                "'{buyer}' cannot make an offer to themselves"
            )));
        }
        self.owned_car(&caller.username, vin)?;

        let offer = Offer {
            seller: caller.username.clone(),
            vin: vin.to_string(),
            price,
        };
        let mut receiver = self.user_or_new(buyer)?;
        receiver.put_offer(offer.clone());
        self.repo.save_user(&receiver)?;

        info!(vin = %vin, seller = %offer.seller, buyer = %buyer, price, "📨 Selling offer created");
        Ok(offer)
    }

    fn accept_offer(&mut self, caller: &Caller, vin: &str) -> Result<Car, RegistryError> {
        self.gate(caller, Operation::AcceptOffer)?;
        let vin = require_arg("vin", vin)?;
        let buyer = caller.username.as_str();

        let mut inbox = self.repo.load_user(buyer)?;
        let offer = inbox.take_offer(vin).ok_or_else(|| {
            RegistryError::precondition(format!("'{buyer}' has no offer for car '{vin}'"))
        })?;

        let mut sold = None;
        Saga::new("accept offer")
            .step(
                "withdraw offer",
                |svc: &mut Self| svc.repo.save_user(&inbox),
                |svc: &mut Self| {
                    let mut user = svc.repo.load_user(buyer)?;
                    user.put_offer(offer.clone());
                    svc.repo.save_user(&user)
                },
            )
            .final_step("sell", |svc: &mut Self| {
                sold = Some(svc.sell_car(&offer.seller, offer.price, &offer.vin, buyer)?);
                Ok(())
            })
            .run(self)?;

        sold.ok_or_else(|| {
            RegistryError::InvariantViolation(format!("offer for '{vin}' accepted without a sale"))
        })
    }
}
