//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Starting credits for users the registry creates on the fly.
pub const DEFAULT_STARTING_BALANCE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Balance given to every auto-created user (garage on `create`,
    /// buyer on `sell`, receiver on `transfer`, `createUser`).
    pub starting_balance: i64,
    /// Reject a sale when the buyer cannot cover the price.
    pub enforce_buyer_funds: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            enforce_buyer_funds: true,
        }
    }
}
