//! # Domain Entities
//!
//! Records persisted on the ledger. All of them serialize as field-named
//! JSON objects; optional fields are omitted when absent and default when
//! missing, so older readers keep working when fields are added.

use crate::domain::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seconds since UNIX epoch.
pub type Timestamp = u64;

/// A vehicle. Ownership is not stored here; it lives in the car index and
/// in the owner's car set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub vin: String,
    #[serde(default)]
    pub created_ts: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl Car {
    pub fn new(vin: impl Into<String>, created_ts: Timestamp) -> Self {
        Self {
            vin: vin.into(),
            created_ts,
            certificate: None,
        }
    }
}

/// DOT-attested record binding a car to an owner, insurer and numberplate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub username: String,
    pub vin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numberplate: Option<String>,
}

impl Certificate {
    pub fn issue(username: impl Into<String>, vin: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            vin: vin.into(),
            insurer: None,
            numberplate: None,
        }
    }

    /// Insurer, treating a blank value as absent.
    pub fn insurer(&self) -> Option<&str> {
        non_blank(&self.insurer)
    }

    /// Numberplate, treating a blank value as absent.
    pub fn numberplate(&self) -> Option<&str> {
        non_blank(&self.numberplate)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Car payload accepted by `create`. Only the VIN is taken from the caller;
/// timestamps and certificates are set by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    pub vin: String,
}

/// Audit data optionally supplied with `create` (test report form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationData {
    /// `4+1` for a passenger car.
    pub number_of_doors: String,
    pub number_of_cylinders: u32,
    pub number_of_axis: u32,
    /// Maximum speed as tested.
    pub max_speed: u32,
}

/// Pending request for the DOT to register a freshly created car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationProposal {
    pub username: String,
    pub car: String,
    #[serde(default)]
    pub number_of_doors: String,
    #[serde(default)]
    pub number_of_cylinders: u32,
    #[serde(default)]
    pub number_of_axis: u32,
    #[serde(default)]
    pub max_speed: u32,
}

impl RegistrationProposal {
    pub fn new(username: impl Into<String>, car: impl Into<String>, data: RegistrationData) -> Self {
        Self {
            username: username.into(),
            car: car.into(),
            number_of_doors: data.number_of_doors,
            number_of_cylinders: data.number_of_cylinders,
            number_of_axis: data.number_of_axis,
            max_speed: data.max_speed,
        }
    }
}

/// Pending request by an owner for the DOT to revoke a car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationProposal {
    pub username: String,
    pub car: String,
}

/// Pending request by a car owner to a specific insurer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsureProposal {
    pub user: String,
    pub car: String,
}

/// An insurance company and the proposals addressed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurer {
    pub name: String,
    #[serde(default)]
    pub proposals: Vec<InsureProposal>,
}

impl Insurer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            proposals: Vec::new(),
        }
    }

    /// Position of the first proposal for `vin` made by `user`.
    pub fn find_proposal(&self, vin: &str, user: &str) -> Option<usize> {
        self.proposals
            .iter()
            .position(|p| p.car == vin && p.user == user)
    }

    /// Removes the first proposal matching `(vin, user)`; duplicates stay.
    pub fn take_proposal(&mut self, vin: &str, user: &str) -> Option<InsureProposal> {
        self.find_proposal(vin, user)
            .map(|pos| self.proposals.remove(pos))
    }

    /// Removes every proposal naming `vin`. Returns how many were dropped.
    pub fn drop_proposals_for(&mut self, vin: &str) -> usize {
        let before = self.proposals.len();
        self.proposals.retain(|p| p.car != vin);
        before - self.proposals.len()
    }
}

/// A selling offer waiting in the buyer's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub seller: String,
    pub vin: String,
    pub price: i64,
}

/// A party holding cars and credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub cars: BTreeSet<String>,
    /// Signed credit ledger; may go negative.
    #[serde(default)]
    pub balance: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offers: Vec<Offer>,
}

impl User {
    pub fn new(name: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            cars: BTreeSet::new(),
            balance,
            offers: Vec::new(),
        }
    }

    pub fn owns(&self, vin: &str) -> bool {
        self.cars.contains(vin)
    }

    /// Adds `amount` (possibly negative) to the balance.
    pub fn adjust_balance(&mut self, amount: i64) -> Result<i64, RegistryError> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            RegistryError::validation(format!(
                "balance of '{}' would overflow when adjusted by {}",
                self.name, amount
            ))
        })?;
        Ok(self.balance)
    }

    /// Stores an offer, replacing an earlier one from the same seller for
    /// the same car.
    pub fn put_offer(&mut self, offer: Offer) {
        self.offers
            .retain(|o| !(o.seller == offer.seller && o.vin == offer.vin));
        self.offers.push(offer);
    }

    /// Removes every offer for `vin`. Returns how many were dropped.
    pub fn drop_offers_for(&mut self, vin: &str) -> usize {
        let before = self.offers.len();
        self.offers.retain(|o| o.vin != vin);
        before - self.offers.len()
    }

    /// Removes and returns the first offer for `vin`.
    pub fn take_offer(&mut self, vin: &str) -> Option<Offer> {
        self.offers
            .iter()
            .position(|o| o.vin == vin)
            .map(|pos| self.offers.remove(pos))
    }
}
