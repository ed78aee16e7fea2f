//! Reflection errors
//!
//! Every public operation returns [`ReflectResult`]. Validation failures are
//! raised eagerly, before any host call; failures inside a host call are
//! passed through unchanged as [`ReflectError::Host`].

use refract_sdk::HostError;
use thiserror::Error;

/// Result type for reflection operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Coarse classification of a [`ReflectError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required value was null
    ArgumentAbsent,
    /// An argument was present but unacceptable
    InvalidArgument,
    /// No member (or no unique member) matched a lookup
    MissingMember,
    /// A value did not have the requested type
    TypeArgument,
    /// The host or the callee failed
    Host,
}

/// Errors that can occur during reflection
#[derive(Debug, Error)]
pub enum ReflectError {
    /// Required value is null
    #[error("Argument '{name}' must not be null")]
    ArgumentAbsent {
        /// Name of the missing argument
        name: String,
    },

    /// Type argument does not satisfy a generic parameter constraint
    #[error(
        "Type argument {argument} at position {position} violates constraint on {parameter}: {constraint}"
    )]
    ConstraintViolation {
        /// Position of the offending argument
        position: usize,
        /// Generic parameter name
        parameter: String,
        /// Offending type argument
        argument: String,
        /// Unmet constraint
        constraint: String,
    },

    /// Wrong number of arguments or type arguments
    #[error("{member} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Member or definition being called
        member: String,
        /// Expected count
        expected: usize,
        /// Supplied count
        actual: usize,
    },

    /// Instantiation requested on something that is not an open generic definition
    #[error("{name} is not a generic definition")]
    NotGenericDefinition {
        /// Type or method name
        name: String,
    },

    /// Generic parameter could not be inferred from the arguments
    #[error("Cannot infer type parameter {parameter} of {method} from the arguments")]
    UninferredTypeParameter {
        /// Generic method
        method: String,
        /// Generic parameter left unbound
        parameter: String,
    },

    /// Two arguments inferred different types for the same generic parameter
    #[error("Inconsistent inference for {parameter} of {method}: {first} and {conflicting}")]
    InconsistentInference {
        /// Generic method
        method: String,
        /// Generic parameter
        parameter: String,
        /// Type inferred first
        first: String,
        /// Conflicting type
        conflicting: String,
    },

    /// Field or property does not allow the requested operation
    #[error("Cannot {operation} {member}")]
    AccessDenied {
        /// Qualified member name
        member: String,
        /// "read" or "write"
        operation: &'static str,
    },

    /// No member matched the lookup
    #[error("Member not found: {signature}")]
    MemberNotFound {
        /// Signature that was looked up
        signature: String,
    },

    /// More than one member matched the lookup
    #[error("Ambiguous match for {signature} ({candidates} candidates)")]
    AmbiguousMatch {
        /// Signature that was looked up
        signature: String,
        /// Number of matching members
        candidates: usize,
    },

    /// Invocation result could not be converted to the requested type
    #[error("Result is not convertible to {expected}")]
    ResultTypeMismatch {
        /// Requested Rust type
        expected: &'static str,
        /// Conversion failure
        source: HostError,
    },

    /// Host runtime or callee failure
    #[error(transparent)]
    Host(#[from] HostError),
}

impl ReflectError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReflectError::ArgumentAbsent { .. } => ErrorKind::ArgumentAbsent,
            ReflectError::ConstraintViolation { .. }
            | ReflectError::ArityMismatch { .. }
            | ReflectError::NotGenericDefinition { .. }
            | ReflectError::UninferredTypeParameter { .. }
            | ReflectError::InconsistentInference { .. }
            | ReflectError::AccessDenied { .. } => ErrorKind::InvalidArgument,
            ReflectError::MemberNotFound { .. } | ReflectError::AmbiguousMatch { .. } => {
                ErrorKind::MissingMember
            }
            ReflectError::ResultTypeMismatch { .. } => ErrorKind::TypeArgument,
            ReflectError::Host(_) => ErrorKind::Host,
        }
    }

    pub(crate) fn absent(name: &str) -> Self {
        ReflectError::ArgumentAbsent {
            name: name.to_string(),
        }
    }
}
