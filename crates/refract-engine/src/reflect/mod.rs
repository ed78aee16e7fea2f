//! Reflective wrappers over a host runtime
//!
//! This module provides the wrapper model (types, methods, fields,
//! properties, parameters, generic parameters), the wrapper cache, the
//! generic instantiation engine with constraint checking, and the
//! invocation dispatcher.

mod cache;
mod constraint;
mod dispatch;
mod generic;
mod members;
mod query;
mod reflector;
mod types;

pub use cache::{CacheStats, ConcurrentStore, ReflectionCache};
pub use constraint::{Constraint, UnmetConstraint};
pub use dispatch::{infer_type_arguments, join_named_arguments};
pub use generic::{GenericParameter, InstantiationCache, InstantiationKey};
pub use members::{
    FieldWrapper, Member, MemberIdentity, MemberWrapper, MethodWrapper, ParameterWrapper,
    PropertyWrapper,
};
pub use query::MethodQuery;
pub use reflector::Reflector;
pub use types::{TypeIdentity, TypeWrapper};
