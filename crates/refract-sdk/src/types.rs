//! Host metadata descriptors
//!
//! Tokens are opaque handles into the host's type universe. Descriptors are
//! the plain-data answers a host gives when asked about a token; the
//! reflection layer builds its wrappers from them and never mutates them.

use std::fmt;

use crate::value::Value;

// ============================================================================
// Tokens
// ============================================================================

/// Opaque handle to a host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(pub u32);

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.0)
    }
}

/// Opaque handle to a host member (method, constructor, field, property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberToken(pub u32);

impl fmt::Display for MemberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberToken({})", self.0)
    }
}

// ============================================================================
// Kinds and access levels
// ============================================================================

/// Type kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type
    Class,
    /// Value type
    Struct,
    /// Interface type
    Interface,
    /// Placeholder for an unbound generic parameter (`T`)
    GenericParameter,
}

impl TypeKind {
    /// Value types always have an implicit default constructor and are never null
    pub const fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Struct => write!(f, "struct"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::GenericParameter => write!(f, "generic parameter"),
        }
    }
}

/// Declared access level of a type or member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to derived types
    Protected,
    /// Visible inside the declaring assembly
    Internal,
    /// Visible to derived types or inside the declaring assembly
    ProtectedInternal,
    /// Visible inside the declaring type only
    Private,
}

impl Access {
    /// Check if this is public access
    pub const fn is_public(self) -> bool {
        matches!(self, Access::Public)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Protected => write!(f, "protected"),
            Access::Internal => write!(f, "internal"),
            Access::ProtectedInternal => write!(f, "protected internal"),
            Access::Private => write!(f, "private"),
        }
    }
}

// ============================================================================
// Type descriptors
// ============================================================================

/// Constraint attached to a generic parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintDescriptor {
    /// Argument must (or, inverted, must not) derive from / implement `required`
    Inherits {
        /// Required base type or interface
        required: TypeToken,
        /// Negate the requirement
        invert: bool,
    },
    /// Argument must expose a constructor with exactly these parameter types
    Constructor {
        /// Required parameter types, in order
        parameters: Vec<TypeToken>,
    },
}

/// Unbound generic parameter of a type or method definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParameterDescriptor {
    /// Parameter name (e.g., "T", "TKey")
    pub name: String,
    /// Position in the generic parameter list (0-indexed)
    pub position: usize,
    /// Placeholder type that stands for this parameter in member signatures
    pub type_token: TypeToken,
    /// Constraints in declaration order
    pub constraints: Vec<ConstraintDescriptor>,
}

/// Everything the host knows about a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Simple name (closed generics render their arguments, e.g. `Box<System.Int32>`)
    pub name: String,
    /// Namespace, if any
    pub namespace: Option<String>,
    /// Declaring assembly
    pub assembly: String,
    /// Type kind
    pub kind: TypeKind,
    /// Abstract flag
    pub is_abstract: bool,
    /// Sealed flag
    pub is_sealed: bool,
    /// Access level
    pub access: Access,
    /// Base type (absent for the root type and for interfaces)
    pub base: Option<TypeToken>,
    /// Directly implemented (or, for interfaces, extended) interfaces
    pub interfaces: Vec<TypeToken>,
    /// Generic parameters (open definitions only)
    pub generic_parameters: Vec<GenericParameterDescriptor>,
    /// Type arguments (closed constructs only)
    pub type_arguments: Vec<TypeToken>,
    /// Open definition this type was closed from
    pub generic_definition: Option<TypeToken>,
}

impl TypeDescriptor {
    /// Create a descriptor with no base, interfaces or generics
    pub fn new(name: impl Into<String>, assembly: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            assembly: assembly.into(),
            kind,
            is_abstract: false,
            is_sealed: false,
            access: Access::Public,
            base: None,
            interfaces: Vec::new(),
            generic_parameters: Vec::new(),
            type_arguments: Vec::new(),
            generic_definition: None,
        }
    }

    /// Fully-qualified name (`Namespace.Name`)
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    /// Check if this is an open generic definition
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_parameters.is_empty() && self.type_arguments.is_empty()
    }
}

// ============================================================================
// Member descriptors
// ============================================================================

/// Member kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Method
    Method,
    /// Constructor
    Constructor,
    /// Field
    Field,
    /// Property
    Property,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Constructor => write!(f, "constructor"),
            MemberKind::Field => write!(f, "field"),
            MemberKind::Property => write!(f, "property"),
        }
    }
}

/// Modifier flags for methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MethodModifiers {
    /// Virtual (overridable) method
    pub is_virtual: bool,
    /// Abstract method (no body)
    pub is_abstract: bool,
    /// Final (sealed) override
    pub is_final: bool,
}

/// Parameter of a method or constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name
    pub name: String,
    /// Position in the parameter list (0-indexed)
    pub position: usize,
    /// Declared parameter type
    pub param_type: TypeToken,
    /// Default value, if the parameter is optional
    pub default_value: Option<Value>,
}

/// Everything the host knows about a member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Member name (constructors are named `.ctor`)
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Declaring type
    pub declaring_type: TypeToken,
    /// Return type, field type or property type (declaring type for constructors)
    pub member_type: TypeToken,
    /// Access level
    pub access: Access,
    /// Static member
    pub is_static: bool,
    /// Method modifiers (default for fields and properties)
    pub modifiers: MethodModifiers,
    /// Readable (fields always; properties with a getter)
    pub can_read: bool,
    /// Writable (non-readonly fields; properties with a setter)
    pub can_write: bool,
    /// Parameters in declaration order (methods and constructors)
    pub parameters: Vec<ParameterDescriptor>,
    /// Generic parameters (open generic method definitions only)
    pub generic_parameters: Vec<GenericParameterDescriptor>,
    /// Type arguments (closed generic methods only)
    pub type_arguments: Vec<TypeToken>,
    /// Open generic method this method was closed from
    pub generic_definition: Option<MemberToken>,
}

impl MemberDescriptor {
    /// Create a descriptor with no parameters or generics
    pub fn new(
        name: impl Into<String>,
        kind: MemberKind,
        declaring_type: TypeToken,
        member_type: TypeToken,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            declaring_type,
            member_type,
            access: Access::Public,
            is_static: false,
            modifiers: MethodModifiers::default(),
            can_read: matches!(kind, MemberKind::Field | MemberKind::Property),
            can_write: matches!(kind, MemberKind::Field | MemberKind::Property),
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            type_arguments: Vec::new(),
            generic_definition: None,
        }
    }

    /// Check if this is an open generic method definition
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_parameters.is_empty() && self.type_arguments.is_empty()
    }
}
