//! # Vehicle Ledger Test Suite
//!
//! Cross-module flows driven through the invocation surface, the way a
//! hosting platform would call the registry.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Handler construction and invocation helpers
//! └── integration/
//!     ├── lifecycle.rs  # garage → DOT → insurer → DOT hand-offs
//!     └── ownership.rs  # transfer, sale, offers, compensation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vl-tests
//! cargo bench -p vl-tests
//! ```

pub mod harness;
pub mod integration;
