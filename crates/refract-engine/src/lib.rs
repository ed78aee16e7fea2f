//! Refract Engine - reflective metadata layer
//!
//! Wraps a host runtime's type introspection behind a uniform set of
//! wrappers and adds:
//! - A wrapper cache: wrapping the same host entity twice yields the same data
//! - Generic instantiation with constraint checking, cached per definition
//! - Invocation by position, by named argument bag, with generic inference
//!   and with overload resolution by name
//! - Structural equality for every wrapper
//!
//! The engine talks to the host only through
//! [`refract_sdk::MetadataProvider`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use refract_engine::Reflector;
//!
//! let reflector = Reflector::new(Arc::new(host));
//! let list = reflector.wrap_type(list_token)?;
//! let ints = list.make_generic(&[reflector.wrap_type(int32)?])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod reflect;

pub use config::{AmbiguityPolicy, ConfigError, EngineConfig, InferencePolicy};
pub use error::{ErrorKind, ReflectError, ReflectResult};
pub use reflect::{
    infer_type_arguments, join_named_arguments, CacheStats, Constraint, FieldWrapper,
    GenericParameter, Member, MemberWrapper, MethodQuery, MethodWrapper, ParameterWrapper,
    PropertyWrapper, ReflectionCache, Reflector, TypeWrapper, UnmetConstraint,
};
