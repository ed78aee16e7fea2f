//! Refract Runtime - in-memory host
//!
//! A scriptable implementation of [`refract_sdk::MetadataProvider`]. Types
//! are registered from builder definitions, method bodies are Rust
//! closures, and generic definitions are closed by substitution.
//!
//! # Example
//!
//! ```ignore
//! use refract_runtime::{InMemoryRuntime, MethodDefinition, TypeDefinition};
//!
//! let runtime = InMemoryRuntime::new();
//! let int32 = runtime.standard().int32;
//! let calc = runtime.define_type(
//!     TypeDefinition::class("Demo", "Calc").method(
//!         MethodDefinition::new("Twice", int32)
//!             .param("x", int32)
//!             .as_static()
//!             .body(|frame| Ok((frame.arg_as::<i32>(0)? * 2).into())),
//!     ),
//! )?;
//! ```

#![warn(missing_docs)]

pub mod definition;
pub mod error;
pub mod metrics;
mod registry;
mod runtime;
pub mod standard;

pub use definition::{
    CallFrame, ConstraintDefinition, ConstructorDefinition, FieldDefinition,
    GenericParameterDefinition, MethodDefinition, NativeBody, ParameterDefinition,
    PropertyDefinition, TypeDefinition, TypeRef,
};
pub use error::DefinitionError;
pub use metrics::{HostMetrics, MetricsSnapshot};
pub use runtime::InMemoryRuntime;
pub use standard::StandardTypes;
