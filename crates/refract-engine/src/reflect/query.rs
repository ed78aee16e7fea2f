//! Method queries
//!
//! Filters over method collections, usable on any slice of
//! [`MethodWrapper`]s (for example the result of `TypeWrapper::methods`).

use super::members::{Member, MethodWrapper};
use super::types::TypeWrapper;
use crate::error::ReflectResult;

/// Filtering helpers for method collections
pub trait MethodQuery {
    /// Methods with the given name
    fn named(&self, name: &str) -> Vec<MethodWrapper>;

    /// Methods whose parameter types are exactly `parameter_types`, in order
    fn with_parameter_types(&self, parameter_types: &[TypeWrapper]) -> Vec<MethodWrapper>;

    /// Methods matching name, return type and parameter types
    fn with_signature(
        &self,
        name: &str,
        return_type: &TypeWrapper,
        parameter_types: &[TypeWrapper],
    ) -> ReflectResult<Vec<MethodWrapper>>;

    /// Open generic method definitions
    fn generic_only(&self) -> Vec<MethodWrapper>;
}

fn parameters_match(method: &MethodWrapper, parameter_types: &[TypeWrapper]) -> bool {
    let declared = &method.data.descriptor.parameters;
    declared.len() == parameter_types.len()
        && declared
            .iter()
            .zip(parameter_types)
            .all(|(p, ty)| p.param_type == ty.token())
}

impl MethodQuery for [MethodWrapper] {
    fn named(&self, name: &str) -> Vec<MethodWrapper> {
        self.iter().filter(|m| m.name() == name).cloned().collect()
    }

    fn with_parameter_types(&self, parameter_types: &[TypeWrapper]) -> Vec<MethodWrapper> {
        self.iter()
            .filter(|m| parameters_match(m, parameter_types))
            .cloned()
            .collect()
    }

    fn with_signature(
        &self,
        name: &str,
        return_type: &TypeWrapper,
        parameter_types: &[TypeWrapper],
    ) -> ReflectResult<Vec<MethodWrapper>> {
        let mut out = Vec::new();
        for method in self {
            if method.name() == name
                && parameters_match(method, parameter_types)
                && method.member_type()? == *return_type
            {
                out.push(method.clone());
            }
        }
        Ok(out)
    }

    fn generic_only(&self) -> Vec<MethodWrapper> {
        self.iter()
            .filter(|m| m.is_generic_method_definition())
            .cloned()
            .collect()
    }
}
