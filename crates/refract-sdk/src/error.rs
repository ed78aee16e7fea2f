//! Error types for the host runtime contract

use crate::types::{MemberToken, TypeToken};

/// Result type for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised by a host runtime
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Token does not name a type known to the host
    #[error("Unknown type: {0}")]
    UnknownType(TypeToken),

    /// Token does not name a member known to the host
    #[error("Unknown member: {0}")]
    UnknownMember(MemberToken),

    /// Member cannot be called (field, property, abstract method, open generic)
    #[error("Member is not invocable: {0}")]
    NotInvocable(String),

    /// Invalid argument passed to the host
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// The callee itself failed
    #[error("Invocation failed: {0}")]
    Invocation(String),
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError::Invocation(s)
    }
}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError::Invocation(s.to_string())
    }
}
