//! # Certification Lifecycle
//!
//! The certification state of a car is derived from its certificate and is
//! never stored. Each state implies the ones before it:
//!
//! ```text
//! Unregistered ──register──→ Registered ──insuranceAccept──→ Insured ──confirm──→ Confirmed
//!       ↑                        ↑                                                    │
//!       │                        └──────────────────── revoke ────────────────────────┘
//! ```
//!
//! Confirmation requires insurance: a numberplate on an uninsured car does
//! not make it confirmed.

use crate::domain::entities::Car;
use crate::domain::errors::RegistryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CertificationState {
    Unregistered,
    Registered,
    Insured,
    Confirmed,
}

impl CertificationState {
    pub fn of(car: &Car) -> Self {
        if is_confirmed(car) {
            CertificationState::Confirmed
        } else if is_insured(car) {
            CertificationState::Insured
        } else if is_registered(car) {
            CertificationState::Registered
        } else {
            CertificationState::Unregistered
        }
    }
}

/// A certificate exists and attests this car's VIN.
pub fn is_registered(car: &Car) -> bool {
    car.certificate
        .as_ref()
        .is_some_and(|cert| !cert.vin.is_empty() && cert.vin == car.vin)
}

pub fn is_insured(car: &Car) -> bool {
    is_registered(car)
        && car
            .certificate
            .as_ref()
            .is_some_and(|cert| cert.insurer().is_some())
}

pub fn is_confirmed(car: &Car) -> bool {
    is_insured(car)
        && car
            .certificate
            .as_ref()
            .is_some_and(|cert| cert.numberplate().is_some())
}

/// Self-check run after a revocation.
pub fn verify_revoked(car: &Car) -> Result<(), RegistryError> {
    if is_insured(car) || is_confirmed(car) {
        return Err(RegistryError::InvariantViolation(format!(
            "car '{}' is still {:?} after revocation",
            car.vin,
            CertificationState::of(car)
        )));
    }
    Ok(())
}
