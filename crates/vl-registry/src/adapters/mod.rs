//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: ledger key-value stores (in-memory, JSON file)
//! - `infra`: clocks
//! - `codec`: car record encoding

pub mod codec;
pub mod infra;
pub mod storage;

pub use codec::JsonCarCodec;
pub use infra::{FixedTimeSource, SystemTimeSource};
pub use storage::{FileBackedKVStore, InMemoryKVStore};
