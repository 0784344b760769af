//! # Integration Flows
//!
//! Full role hand-offs through the invocation surface:
//!
//! 1. **Certification**: garage creates, DOT registers, owner proposes
//!    insurance, insurer accepts, DOT confirms and revokes
//! 2. **Ownership**: transfer, sale, selling offers, compensation when the
//!    ledger rejects a write mid-operation
//! 3. **Durability**: a file-backed ledger reopened between invocations

pub mod lifecycle;
pub mod ownership;
