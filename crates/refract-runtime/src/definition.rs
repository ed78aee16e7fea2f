//! Type definitions for the in-memory host
//!
//! Plain builders describing a type before it is registered with
//! [`InMemoryRuntime::define_type`](crate::InMemoryRuntime::define_type).
//! Signatures refer to other types through [`TypeRef`], which is either a
//! registered token or the name of a generic parameter declared on the
//! method or on the enclosing type.

use std::fmt;
use std::sync::Arc;

use refract_sdk::{Access, HostResult, MemberToken, TypeKind, TypeToken, Value};

use crate::InMemoryRuntime;

// ============================================================================
// Method bodies
// ============================================================================

/// Native implementation of a method, constructor, getter or setter
pub type NativeBody = Arc<dyn Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync>;

/// Everything a native body sees when it runs
pub struct CallFrame<'a> {
    /// The runtime executing the call
    pub runtime: &'a InMemoryRuntime,
    /// The member being executed
    pub member: MemberToken,
    /// Receiver (`Value::Null` for static members)
    pub receiver: &'a Value,
    /// Positional arguments (a setter receives the new value as its only argument)
    pub args: &'a [Value],
    /// Type arguments of a closed generic method
    pub type_arguments: &'a [TypeToken],
}

impl<'a> CallFrame<'a> {
    /// Get argument at index, or null when out of range
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// Get argument at index converted to a Rust type
    pub fn arg_as<T: refract_sdk::FromValue>(&self, index: usize) -> HostResult<T> {
        T::from_value(self.arg(index))
    }
}

// ============================================================================
// Type references
// ============================================================================

/// Reference to a type inside a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Already-registered type
    Token(TypeToken),
    /// Generic parameter by name (method parameters shadow type parameters)
    Param(String),
    /// Generic definition applied to arguments, e.g. `Base<T>`
    Generic {
        /// Open definition
        definition: TypeToken,
        /// Arguments in order
        arguments: Vec<TypeRef>,
    },
}

impl TypeRef {
    /// Reference a generic parameter by name
    pub fn param(name: impl Into<String>) -> Self {
        TypeRef::Param(name.into())
    }

    /// Reference a generic definition applied to arguments
    pub fn generic(definition: TypeToken, arguments: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            definition,
            arguments,
        }
    }
}

impl From<TypeToken> for TypeRef {
    fn from(token: TypeToken) -> Self {
        TypeRef::Token(token)
    }
}

// ============================================================================
// Generic parameters
// ============================================================================

/// Constraint on a generic parameter
#[derive(Debug, Clone)]
pub enum ConstraintDefinition {
    /// Argument must (not) derive from / implement the type
    Inherits {
        /// Required type
        required: TypeRef,
        /// Negate
        invert: bool,
    },
    /// Argument must expose a constructor with these parameter types
    Constructor {
        /// Parameter types in order
        parameters: Vec<TypeRef>,
    },
}

/// Generic parameter declaration
#[derive(Debug, Clone)]
pub struct GenericParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Constraints in order
    pub constraints: Vec<ConstraintDefinition>,
}

impl GenericParameterDefinition {
    /// Create an unconstrained generic parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    /// Require the argument to derive from or implement `ty`
    pub fn inherits(mut self, ty: impl Into<TypeRef>) -> Self {
        self.constraints.push(ConstraintDefinition::Inherits {
            required: ty.into(),
            invert: false,
        });
        self
    }

    /// Require the argument NOT to derive from `ty`
    pub fn not_inherits(mut self, ty: impl Into<TypeRef>) -> Self {
        self.constraints.push(ConstraintDefinition::Inherits {
            required: ty.into(),
            invert: true,
        });
        self
    }

    /// Require a constructor with the given parameter types
    pub fn constructor(mut self, parameters: Vec<TypeRef>) -> Self {
        self.constraints
            .push(ConstraintDefinition::Constructor { parameters });
        self
    }

    /// Require a parameterless constructor
    pub fn default_constructor(self) -> Self {
        self.constructor(Vec::new())
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Parameter definition for method and constructor signatures
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub param_type: TypeRef,
    /// Default value, if optional
    pub default_value: Option<Value>,
}

impl ParameterDefinition {
    /// Create a required parameter
    pub fn new(name: impl Into<String>, param_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            default_value: None,
        }
    }

    /// Make the parameter optional
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

// ============================================================================
// Methods and constructors
// ============================================================================

/// Definition for a method
#[derive(Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Return type
    pub return_type: TypeRef,
    /// Parameters in order
    pub parameters: Vec<ParameterDefinition>,
    /// Method-level generic parameters
    pub generic_parameters: Vec<GenericParameterDefinition>,
    /// Access level
    pub access: Access,
    /// Static method
    pub is_static: bool,
    /// Virtual method
    pub is_virtual: bool,
    /// Abstract method (no body)
    pub is_abstract: bool,
    /// Sealed override
    pub is_final: bool,
    /// Implementation
    pub body: Option<NativeBody>,
}

impl MethodDefinition {
    /// Create a public instance method
    pub fn new(name: impl Into<String>, return_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            access: Access::Public,
            is_static: false,
            is_virtual: false,
            is_abstract: false,
            is_final: false,
            body: None,
        }
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    /// Add a parameter definition
    pub fn with_param(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add a method-level generic parameter
    pub fn generic_parameter(mut self, param: GenericParameterDefinition) -> Self {
        self.generic_parameters.push(param);
        self
    }

    /// Set access level
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark as abstract (clears any body)
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self.is_virtual = true;
        self.body = None;
        self
    }

    /// Mark as sealed override
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Set the implementation
    pub fn body(
        mut self,
        body: impl Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(body));
        self
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("parameters", &self.parameters)
            .field("generic_parameters", &self.generic_parameters)
            .field("is_static", &self.is_static)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Definition for a constructor. The body runs with the freshly allocated
/// object as receiver; its return value is ignored.
#[derive(Clone, Default)]
pub struct ConstructorDefinition {
    /// Parameters in order
    pub parameters: Vec<ParameterDefinition>,
    /// Access level
    pub access: Access,
    /// Initializer
    pub body: Option<NativeBody>,
}

impl ConstructorDefinition {
    /// Create a public parameterless constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    /// Set access level
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Set the initializer
    pub fn body(
        mut self,
        body: impl Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(body));
        self
    }
}

impl fmt::Debug for ConstructorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDefinition")
            .field("parameters", &self.parameters)
            .field("access", &self.access)
            .finish()
    }
}

// ============================================================================
// Fields and properties
// ============================================================================

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeRef,
    /// Initial value
    pub initial_value: Value,
    /// Access level
    pub access: Access,
    /// Static field
    pub is_static: bool,
    /// Readonly field
    pub is_readonly: bool,
}

impl FieldDefinition {
    /// Create a public, writable instance field
    pub fn new(name: impl Into<String>, field_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            initial_value: Value::Null,
            access: Access::Public,
            is_static: false,
            is_readonly: false,
        }
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = value.into();
        self
    }

    /// Set access level
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }
}

/// Definition for a property. Without an explicit getter/setter the property
/// is backed by an object slot of the same name.
#[derive(Clone)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Property type
    pub property_type: TypeRef,
    /// Access level
    pub access: Access,
    /// Static property
    pub is_static: bool,
    /// Has a getter
    pub readable: bool,
    /// Has a setter
    pub writable: bool,
    /// Custom getter
    pub getter: Option<NativeBody>,
    /// Custom setter (new value is `args[0]`)
    pub setter: Option<NativeBody>,
}

impl PropertyDefinition {
    /// Create a public read/write auto-property
    pub fn new(name: impl Into<String>, property_type: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            property_type: property_type.into(),
            access: Access::Public,
            is_static: false,
            readable: true,
            writable: true,
            getter: None,
            setter: None,
        }
    }

    /// Remove the setter
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self.setter = None;
        self
    }

    /// Remove the getter
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self.getter = None;
        self
    }

    /// Set access level
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Custom getter
    pub fn getter(
        mut self,
        body: impl Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.readable = true;
        self.getter = Some(Arc::new(body));
        self
    }

    /// Custom setter
    pub fn setter(
        mut self,
        body: impl Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.writable = true;
        self.setter = Some(Arc::new(body));
        self
    }
}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("name", &self.name)
            .field("property_type", &self.property_type)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .finish()
    }
}

// ============================================================================
// Types
// ============================================================================

/// Complete definition for registering a type
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Namespace
    pub namespace: Option<String>,
    /// Simple name
    pub name: String,
    /// Declaring assembly
    pub assembly: String,
    /// Kind
    pub kind: TypeKind,
    /// Access level
    pub access: Access,
    /// Abstract flag
    pub is_abstract: bool,
    /// Sealed flag
    pub is_sealed: bool,
    /// Base type (defaults to the root type for classes, `System.ValueType` for structs)
    pub base: Option<TypeRef>,
    /// Implemented interfaces
    pub interfaces: Vec<TypeRef>,
    /// Generic parameters (makes the type an open definition)
    pub generic_parameters: Vec<GenericParameterDefinition>,
    /// Fields
    pub fields: Vec<FieldDefinition>,
    /// Properties
    pub properties: Vec<PropertyDefinition>,
    /// Methods
    pub methods: Vec<MethodDefinition>,
    /// Constructors (a class without any gets a public parameterless one)
    pub constructors: Vec<ConstructorDefinition>,
}

impl TypeDefinition {
    fn with_kind(namespace: &str, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace.to_string())
            },
            name: name.into(),
            assembly: "app".to_string(),
            kind,
            access: Access::Public,
            is_abstract: false,
            is_sealed: false,
            base: None,
            interfaces: Vec::new(),
            generic_parameters: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Define a class
    pub fn class(namespace: &str, name: impl Into<String>) -> Self {
        Self::with_kind(namespace, name, TypeKind::Class)
    }

    /// Define a struct
    pub fn structure(namespace: &str, name: impl Into<String>) -> Self {
        let mut def = Self::with_kind(namespace, name, TypeKind::Struct);
        def.is_sealed = true;
        def
    }

    /// Define an interface
    pub fn interface(namespace: &str, name: impl Into<String>) -> Self {
        let mut def = Self::with_kind(namespace, name, TypeKind::Interface);
        def.is_abstract = true;
        def
    }

    /// Set the declaring assembly
    pub fn assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = assembly.into();
        self
    }

    /// Set access level
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Mark as abstract
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark as sealed
    pub fn as_sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Set the base type
    pub fn extends(mut self, base: impl Into<TypeRef>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a generic parameter
    pub fn generic_parameter(mut self, param: GenericParameterDefinition) -> Self {
        self.generic_parameters.push(param);
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Fully-qualified name
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}
