//! Invocation response types.

use crate::domain::errors::{ErrorKind, RegistryError};
use serde::{Deserialize, Serialize};

/// Failure reported to the caller: kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<RegistryError> for InvocationError {
    fn from(err: RegistryError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of one invocation. Exactly one of `payload` or `error` is
/// meaningful; a successful read of an absent key has neither.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationResponse {
    pub payload: Option<Vec<u8>>,
    pub error: Option<InvocationError>,
}

impl InvocationResponse {
    pub fn success(payload: Option<Vec<u8>>) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    pub fn failure(error: impl Into<InvocationError>) -> Self {
        Self {
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Payload decoded as JSON, if it is JSON.
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        self.payload
            .as_deref()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }
}
