//! # Domain Errors
//!
//! Error types for the vehicle registry.
//!
//! ## Design Principles
//!
//! - Every failure maps onto exactly one [`ErrorKind`] on the invocation surface
//! - A failed write aborts the remaining steps of an operation
//! - `CompensationFailure` is never hidden behind a weaker error

use crate::domain::roles::{Operation, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds reported to callers.
///
/// Declaration order is severity order: `CompensationFailure` is the most
/// severe kind and means the ledger may hold a partially applied operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Key absent (user not created yet, unknown VIN, ...).
    NotFound,
    /// Bad or missing argument.
    Validation,
    /// Role or caller not permitted to perform the operation.
    AuthorizationDenied,
    /// State-machine guard not met.
    PreconditionFailed,
    /// Write to the backing store failed.
    Storage,
    /// A stored value exists but cannot be decoded.
    Corruption,
    /// A post-condition the registry checks on itself did not hold.
    InvariantViolation,
    /// A multi-step operation failed and its rollback failed too.
    CompensationFailure,
}

/// Errors produced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Sorry, role '{role}' is not allowed to {}", .operation.description())]
    AuthorizationDenied { role: Role, operation: Operation },

    #[error("Forbidden: car '{vin}' is not owned by '{username}'")]
    NotOwner { username: String, vin: String },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Corrupt value at key '{key}': {message}")]
    Corruption { key: String, message: String },

    #[error(transparent)]
    Storage(#[from] KVStoreError),

    #[error("Internal consistency violated: {0}")]
    InvariantViolation(String),

    #[error(
        "Ledger state possibly inconsistent: step '{step}' failed ({cause}) and compensation failed ({compensation})"
    )]
    CompensationFailure {
        step: String,
        cause: Box<RegistryError>,
        compensation: Box<RegistryError>,
    },
}

impl RegistryError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        RegistryError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RegistryError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        RegistryError::PreconditionFailed(message.into())
    }

    /// Kind reported on the invocation surface.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::Validation(_) => ErrorKind::Validation,
            RegistryError::AuthorizationDenied { .. } | RegistryError::NotOwner { .. } => {
                ErrorKind::AuthorizationDenied
            }
            RegistryError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            RegistryError::Corruption { .. } => ErrorKind::Corruption,
            RegistryError::Storage(_) => ErrorKind::Storage,
            RegistryError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            RegistryError::CompensationFailure { .. } => ErrorKind::CompensationFailure,
        }
    }

    /// Position in the severity order; higher is more severe.
    pub fn severity(&self) -> u8 {
        self.kind() as u8
    }

    pub fn is_compensation_failure(&self) -> bool {
        matches!(self, RegistryError::CompensationFailure { .. })
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    /// Data corruption in the store itself.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Car codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Car codec error: {message}")]
pub struct CodecError {
    pub message: String,
}
