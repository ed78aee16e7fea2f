//! Error types for type registration

use refract_sdk::{HostError, TypeToken};

/// Errors raised while registering a type definition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// A type with the same full name is already registered
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    /// A signature names a generic parameter that is not in scope
    #[error("Unknown generic parameter '{name}' in {context}")]
    UnknownGenericParameter {
        /// Parameter name
        name: String,
        /// Type or member being defined
        context: String,
    },

    /// A signature references a token the registry does not know
    #[error("Unknown type: {0}")]
    UnknownType(TypeToken),

    /// Base type cannot be derived from (interface, struct, sealed or generic parameter)
    #[error("Invalid base type {base} for {name}")]
    InvalidBase {
        /// Type being defined
        name: String,
        /// Offending base
        base: String,
    },

    /// Closing a generic reference failed
    #[error(transparent)]
    Host(#[from] HostError),
}

impl From<DefinitionError> for HostError {
    fn from(err: DefinitionError) -> Self {
        match err {
            DefinitionError::Host(e) => e,
            DefinitionError::UnknownType(t) => HostError::UnknownType(t),
            other => HostError::ArgumentError(other.to_string()),
        }
    }
}
