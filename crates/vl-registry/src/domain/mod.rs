//! # Domain Layer
//!
//! Pure domain logic for the vehicle registry. Nothing here touches the
//! store.
//!
//! ## Modules
//!
//! - `entities` - Car, Certificate, User, Insurer and the proposal records
//! - `lifecycle` - Derived certification state and its predicates
//! - `roles` - Roles, operations and the authorization table
//! - `saga` - Forward/compensate step runner for multi-key operations
//! - `keys` - Ledger key layout
//! - `config` - Registry configuration
//! - `errors` - Domain error types

pub mod config;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod lifecycle;
pub mod roles;
pub mod saga;
