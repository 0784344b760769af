//! # Vehicle Ledger Registry
//!
//! Certification lifecycle and ownership of vehicles recorded on a shared
//! key-value ledger. The ledger applies single-key writes atomically but
//! offers no multi-key transaction; this crate layers the business state
//! machine on top of it.
//!
//! ## Workflow
//!
//! ```text
//! Garage ──create──→ [registration proposal] ──register──→ DOT
//!                                                            │
//! Owner ──insureProposal──→ [insurer inbox] ──insuranceAccept──→ Insurer
//!                                                            │
//! DOT ──confirm(numberplate)──→ Confirmed ──revoke──→ Registered
//!
//! Owner ──transfer / sell──→ new owner   (saga with compensation)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Unique VIN | A VIN is created at most once |
//! | Registration | A registered car's certificate carries the car's VIN |
//! | Confirmation | Confirmed implies insured implies registered |
//! | Revocation | After revoke the car is neither insured nor confirmed |
//! | Index agreement | The car index and the owner's car set name the same owner |
//! | Balance conservation | A sale moves exactly the price from buyer to seller |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, roles, lifecycle predicates, saga runner, errors
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Stores, clocks, car codec
//! - `repository/` - Typed entity and index access over the store
//! - `service/` - Application service implementing the API
//! - `ipc/` - Invocation surface (function name + string args)
//!
//! ## Usage
//!
//! ```rust
//! use vl_registry::{
//!     Caller, CertificationApi, InMemoryKVStore, JsonCarCodec, NewCar, RegistryConfig,
//!     RegistryDependencies, SystemTimeSource, VehicleRegistryService,
//! };
//!
//! let deps = RegistryDependencies {
//!     kv_store: InMemoryKVStore::new(),
//!     time_source: SystemTimeSource,
//!     codec: JsonCarCodec,
//! };
//! let mut service = VehicleRegistryService::new(deps, RegistryConfig::default());
//!
//! let car = service
//!     .create_car(&Caller::garage("amag"), NewCar { vin: "WVW1".into() }, None)
//!     .unwrap();
//! assert_eq!(car.vin, "WVW1");
//! ```

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod repository;
pub mod service;

/// Fault injection for tests.
///
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::{FileBackedKVStore, FixedTimeSource, InMemoryKVStore, JsonCarCodec, SystemTimeSource};
pub use domain::config::RegistryConfig;
pub use domain::entities::{
    Car, Certificate, InsureProposal, Insurer, NewCar, Offer, RegistrationData,
    RegistrationProposal, RevocationProposal, User,
};
pub use domain::errors::{ErrorKind, KVStoreError, RegistryError};
pub use domain::lifecycle::CertificationState;
pub use domain::roles::{Caller, Operation, Role};
pub use ipc::{InvocationError, InvocationHandler, InvocationResponse};
pub use ports::inbound::{AccountApi, CertificationApi, LedgerReadApi, OwnershipApi, VehicleRegistryApi};
pub use ports::outbound::{CarCodec, KeyValueStore, TimeSource};
pub use repository::EntityRepository;
pub use service::{RegistryDependencies, VehicleRegistryService};
