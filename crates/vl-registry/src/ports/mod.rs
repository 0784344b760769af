//! # Ports Layer
//!
//! Defines the port traits for the vehicle registry.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving port (operations exposed to callers)
//! - `outbound.rs` - Driven ports (ledger store, clock, car codec)

pub mod inbound;
pub mod outbound;
