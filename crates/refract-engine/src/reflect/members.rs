//! Member wrappers
//!
//! Methods and constructors share [`MethodWrapper`]; fields and properties
//! have their own wrappers with value access. All of them, and parameters,
//! implement [`Member`]. Equality is structural through [`MemberIdentity`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use refract_sdk::{
    Access, MemberDescriptor, MemberKind, MemberToken, MethodModifiers, ParameterDescriptor, Value,
};

use super::generic::{GenericParameter, InstantiationCache};
use super::reflector::Reflector;
use super::types::TypeWrapper;
use crate::error::{ReflectError, ReflectResult};

/// Observable attributes that decide member equality
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberIdentity {
    /// Member kind
    pub kind: MemberKind,
    /// Member name
    pub name: String,
    /// Qualified name of the declaring type
    pub declaring_type: String,
    /// Qualified name of the return, field or property type
    pub member_type: String,
    /// Access level
    pub access: Access,
    /// Static flag
    pub is_static: bool,
    /// Method modifiers
    pub modifiers: MethodModifiers,
    /// Readable flag
    pub can_read: bool,
    /// Writable flag
    pub can_write: bool,
    /// Qualified parameter type names
    pub parameter_types: Vec<String>,
    /// Number of generic parameters
    pub generic_arity: usize,
    /// Qualified type argument names (closed generic methods)
    pub type_arguments: Vec<String>,
}

/// Cached per-member data
pub(crate) struct MemberData {
    pub token: MemberToken,
    pub descriptor: MemberDescriptor,
    pub identity: MemberIdentity,
    /// Closed constructs of this method (open generic methods only)
    pub instantiations: Option<InstantiationCache<Arc<MemberData>>>,
}

impl MemberData {
    pub fn new(
        token: MemberToken,
        descriptor: MemberDescriptor,
        declaring_type: String,
        member_type: String,
        parameter_types: Vec<String>,
        type_arguments: Vec<String>,
    ) -> Self {
        let identity = MemberIdentity {
            kind: descriptor.kind,
            name: descriptor.name.clone(),
            declaring_type,
            member_type,
            access: descriptor.access,
            is_static: descriptor.is_static,
            modifiers: descriptor.modifiers,
            can_read: descriptor.can_read,
            can_write: descriptor.can_write,
            parameter_types,
            generic_arity: descriptor.generic_parameters.len(),
            type_arguments,
        };
        let instantiations = descriptor
            .is_generic_definition()
            .then(InstantiationCache::new);
        Self {
            token,
            descriptor,
            identity,
            instantiations,
        }
    }
}

// ============================================================================
// Member contract
// ============================================================================

/// Attributes shared by every member-like wrapper
pub trait Member {
    /// Member name
    fn name(&self) -> &str;

    /// Declared type: return type, field type, property type or parameter type
    fn member_type(&self) -> ReflectResult<TypeWrapper>;

    /// Type that declares the member
    fn declaring_type(&self) -> ReflectResult<TypeWrapper>;

    /// Access level
    fn access(&self) -> Access;
}

macro_rules! member_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            pub(crate) data: Arc<MemberData>,
            pub(crate) reflector: Reflector,
        }

        impl $name {
            pub(crate) fn new(data: Arc<MemberData>, reflector: Reflector) -> Self {
                Self { data, reflector }
            }

            /// Host token
            pub fn token(&self) -> MemberToken {
                self.data.token
            }

            /// Member name
            pub fn name(&self) -> &str {
                &self.data.descriptor.name
            }

            /// Static flag
            pub fn is_static(&self) -> bool {
                self.data.descriptor.is_static
            }

            /// Structural identity
            pub fn identity(&self) -> &MemberIdentity {
                &self.data.identity
            }

            /// Check if both wrappers share the same cached data
            pub fn same_instance(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.data, &other.data)
            }

            /// `DeclaringType.Name`
            pub fn qualified_name(&self) -> String {
                format!("{}.{}", self.data.identity.declaring_type, self.data.descriptor.name)
            }
        }

        impl Member for $name {
            fn name(&self) -> &str {
                &self.data.descriptor.name
            }

            fn member_type(&self) -> ReflectResult<TypeWrapper> {
                self.reflector.wrap_type(self.data.descriptor.member_type)
            }

            fn declaring_type(&self) -> ReflectResult<TypeWrapper> {
                self.reflector.wrap_type(self.data.descriptor.declaring_type)
            }

            fn access(&self) -> Access {
                self.data.descriptor.access
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.same_instance(other) || self.data.identity == other.data.identity
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.data.identity.hash(state);
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("token", &self.data.token)
                    .field("identity", &self.data.identity)
                    .finish()
            }
        }
    };
}

member_wrapper!(
    /// Reflective view of a method or constructor
    MethodWrapper
);
member_wrapper!(
    /// Reflective view of a field
    FieldWrapper
);
member_wrapper!(
    /// Reflective view of a property
    PropertyWrapper
);

// ============================================================================
// Methods
// ============================================================================

impl MethodWrapper {
    /// Constructor rather than method
    pub fn is_constructor(&self) -> bool {
        self.data.descriptor.kind == MemberKind::Constructor
    }

    /// Virtual / abstract / final flags
    pub fn modifiers(&self) -> MethodModifiers {
        self.data.descriptor.modifiers
    }

    /// Return type (declaring type for constructors)
    pub fn return_type(&self) -> ReflectResult<TypeWrapper> {
        self.member_type()
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> Vec<ParameterWrapper> {
        (0..self.data.descriptor.parameters.len())
            .map(|index| ParameterWrapper {
                method: self.data.clone(),
                index,
                reflector: self.reflector.clone(),
            })
            .collect()
    }

    /// Number of parameters without a default value
    pub fn required_parameter_count(&self) -> usize {
        self.data
            .descriptor
            .parameters
            .iter()
            .filter(|p| p.default_value.is_none())
            .count()
    }

    /// Open generic method definition
    pub fn is_generic_method_definition(&self) -> bool {
        self.data.descriptor.is_generic_definition()
    }

    /// Closed construct of a generic method
    pub fn is_constructed_generic_method(&self) -> bool {
        self.data.descriptor.generic_definition.is_some()
    }

    /// Generic parameters in declaration order
    pub fn generic_parameters(&self) -> Vec<GenericParameter> {
        let owner = self.qualified_name();
        self.data
            .descriptor
            .generic_parameters
            .iter()
            .map(|p| {
                GenericParameter::new(
                    p.clone(),
                    &owner,
                    self.data.descriptor.declaring_type,
                    self.reflector.clone(),
                )
            })
            .collect()
    }

    /// Type arguments of a closed generic method (empty otherwise)
    pub fn type_arguments(&self) -> ReflectResult<Vec<TypeWrapper>> {
        self.data
            .descriptor
            .type_arguments
            .iter()
            .map(|t| self.reflector.wrap_type(*t))
            .collect()
    }

    /// Open definition this method was closed from
    pub fn generic_method_definition(&self) -> ReflectResult<Option<MethodWrapper>> {
        match self.data.descriptor.generic_definition {
            Some(def) => Ok(Some(self.reflector.method(def)?)),
            None => Ok(None),
        }
    }

    /// Number of closed constructs cached for this definition
    pub fn instantiation_count(&self) -> usize {
        self.data
            .instantiations
            .as_ref()
            .map(|cache| cache.len())
            .unwrap_or(0)
    }

    /// Same name and parameter types
    pub(crate) fn has_same_signature(&self, other: &MethodWrapper) -> bool {
        self.data.descriptor.name == other.data.descriptor.name
            && self.data.identity.parameter_types == other.data.identity.parameter_types
            && self.data.identity.generic_arity == other.data.identity.generic_arity
    }

    /// `Type.Name(ParamType, ...)`
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.qualified_name(),
            self.data.identity.parameter_types.join(", ")
        )
    }
}

// ============================================================================
// Fields and properties
// ============================================================================

fn check_target(member: &str, is_static: bool, target: &Value) -> ReflectResult<()> {
    if !is_static && target.is_null() {
        return Err(ReflectError::ArgumentAbsent {
            name: format!("target of {}", member),
        });
    }
    Ok(())
}

impl FieldWrapper {
    /// Readonly fields cannot be written
    pub fn is_readonly(&self) -> bool {
        !self.data.descriptor.can_write
    }

    /// Read the field; `target` is ignored for static fields
    pub fn get_value(&self, target: &Value) -> ReflectResult<Value> {
        check_target(&self.qualified_name(), self.is_static(), target)?;
        Ok(self.reflector.provider().get_value(self.token(), target)?)
    }

    /// Write the field; `target` is ignored for static fields
    pub fn set_value(&self, target: &Value, value: Value) -> ReflectResult<()> {
        if self.is_readonly() {
            return Err(ReflectError::AccessDenied {
                member: self.qualified_name(),
                operation: "write",
            });
        }
        check_target(&self.qualified_name(), self.is_static(), target)?;
        Ok(self
            .reflector
            .provider()
            .set_value(self.token(), target, value)?)
    }
}

impl PropertyWrapper {
    /// Has a getter
    pub fn can_read(&self) -> bool {
        self.data.descriptor.can_read
    }

    /// Has a setter
    pub fn can_write(&self) -> bool {
        self.data.descriptor.can_write
    }

    /// Read the property; `target` is ignored for static properties
    pub fn get_value(&self, target: &Value) -> ReflectResult<Value> {
        if !self.can_read() {
            return Err(ReflectError::AccessDenied {
                member: self.qualified_name(),
                operation: "read",
            });
        }
        check_target(&self.qualified_name(), self.is_static(), target)?;
        Ok(self.reflector.provider().get_value(self.token(), target)?)
    }

    /// Write the property; `target` is ignored for static properties
    pub fn set_value(&self, target: &Value, value: Value) -> ReflectResult<()> {
        if !self.can_write() {
            return Err(ReflectError::AccessDenied {
                member: self.qualified_name(),
                operation: "write",
            });
        }
        check_target(&self.qualified_name(), self.is_static(), target)?;
        Ok(self
            .reflector
            .provider()
            .set_value(self.token(), target, value)?)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Reflective view of a method or constructor parameter
#[derive(Clone)]
pub struct ParameterWrapper {
    method: Arc<MemberData>,
    index: usize,
    reflector: Reflector,
}

impl ParameterWrapper {
    fn descriptor(&self) -> &ParameterDescriptor {
        &self.method.descriptor.parameters[self.index]
    }

    /// Zero-based position
    pub fn position(&self) -> usize {
        self.descriptor().position
    }

    /// Check if the parameter is optional
    pub fn has_default_value(&self) -> bool {
        self.descriptor().default_value.is_some()
    }

    /// Default value of an optional parameter
    pub fn default_value(&self) -> Option<&Value> {
        self.descriptor().default_value.as_ref()
    }

    /// Qualified name of the declared type
    pub fn type_name(&self) -> &str {
        &self.method.identity.parameter_types[self.index]
    }
}

impl Member for ParameterWrapper {
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn member_type(&self) -> ReflectResult<TypeWrapper> {
        self.reflector.wrap_type(self.descriptor().param_type)
    }

    fn declaring_type(&self) -> ReflectResult<TypeWrapper> {
        self.reflector.wrap_type(self.method.descriptor.declaring_type)
    }

    fn access(&self) -> Access {
        self.method.descriptor.access
    }
}

impl PartialEq for ParameterWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.method.identity == other.method.identity
    }
}

impl Eq for ParameterWrapper {}

impl Hash for ParameterWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.identity.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for ParameterWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterWrapper")
            .field("name", &self.descriptor().name)
            .field("position", &self.index)
            .field("type", &self.type_name())
            .finish()
    }
}

// ============================================================================
// Any member
// ============================================================================

/// A wrapped member of any kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberWrapper {
    /// Method
    Method(MethodWrapper),
    /// Constructor
    Constructor(MethodWrapper),
    /// Field
    Field(FieldWrapper),
    /// Property
    Property(PropertyWrapper),
}

impl MemberWrapper {
    /// Member kind
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberWrapper::Method(_) => MemberKind::Method,
            MemberWrapper::Constructor(_) => MemberKind::Constructor,
            MemberWrapper::Field(_) => MemberKind::Field,
            MemberWrapper::Property(_) => MemberKind::Property,
        }
    }

    /// Method or constructor, if this is one
    pub fn as_method(&self) -> Option<&MethodWrapper> {
        match self {
            MemberWrapper::Method(m) | MemberWrapper::Constructor(m) => Some(m),
            _ => None,
        }
    }

    fn as_member(&self) -> &dyn Member {
        match self {
            MemberWrapper::Method(m) | MemberWrapper::Constructor(m) => m,
            MemberWrapper::Field(f) => f,
            MemberWrapper::Property(p) => p,
        }
    }
}

impl Member for MemberWrapper {
    fn name(&self) -> &str {
        self.as_member().name()
    }

    fn member_type(&self) -> ReflectResult<TypeWrapper> {
        self.as_member().member_type()
    }

    fn declaring_type(&self) -> ReflectResult<TypeWrapper> {
        self.as_member().declaring_type()
    }

    fn access(&self) -> Access {
        self.as_member().access()
    }
}
