//! Refract SDK - host runtime contract
//!
//! This crate provides the minimal types and traits a host runtime needs to
//! expose its type universe to the Refract reflection layer, without
//! depending on the reflection engine itself:
//!
//! - **Tokens and descriptors** (`types`): opaque handles and the plain-data
//!   metadata a host reports for them
//! - **Values** (`value`): what flows through invocations
//! - **Provider** (`provider`): the `MetadataProvider` trait the engine consumes
//! - **Conversions** (`convert`): `FromValue` / `IntoValue`
//!
//! # Example
//!
//! ```ignore
//! use refract_sdk::{MetadataProvider, TypeToken, Value};
//!
//! fn describe(host: &dyn MetadataProvider, ty: TypeToken) {
//!     let desc = host.describe_type(ty).unwrap();
//!     println!("{} ({})", desc.full_name(), desc.kind);
//! }
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod provider;
pub mod types;
pub mod value;

pub use convert::{FromValue, IntoValue};
pub use error::{HostError, HostResult};
pub use provider::MetadataProvider;
pub use types::{
    Access, ConstraintDescriptor, GenericParameterDescriptor, MemberDescriptor, MemberKind,
    MemberToken, MethodModifiers, ParameterDescriptor, TypeDescriptor, TypeKind, TypeToken,
};
pub use value::{ObjectRef, Value};
