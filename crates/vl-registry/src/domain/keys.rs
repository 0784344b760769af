//! # Key Layout
//!
//! Entities live under `car:<vin>` and `user:<name>`. Every index entry is
//! its own key under an `index:` prefix, so mutating one VIN never rewrites
//! the entries of another. Listing an index is a prefix scan.

/// Key prefixes for all records on the ledger.
pub struct KeyPrefix;

impl KeyPrefix {
    pub const CAR: &'static str = "car:";
    pub const USER: &'static str = "user:";
    /// VIN → owner username.
    pub const CAR_INDEX: &'static str = "index:cars:";
    /// Username → username (presence marker).
    pub const USER_INDEX: &'static str = "index:users:";
    /// Company → insurer record with its pending proposals.
    pub const INSURER_INDEX: &'static str = "index:insurers:";
    /// VIN → registration proposal.
    pub const REGISTRATION_PROPOSALS: &'static str = "index:registrationProposals:";
    /// VIN → revocation proposal.
    pub const REVOCATION_PROPOSALS: &'static str = "index:revocationProposals:";

    pub fn car_key(vin: &str) -> String {
        format!("{}{}", Self::CAR, vin)
    }

    pub fn user_key(name: &str) -> String {
        format!("{}{}", Self::USER, name)
    }
}
