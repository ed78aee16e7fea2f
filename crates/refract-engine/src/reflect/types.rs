//! Type wrappers
//!
//! [`TypeWrapper`] is the reflective view of a host type. Equality and
//! hashing go through [`TypeIdentity`], so two wrappers obtained
//! independently (even from different caches) compare equal when they
//! describe the same type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use refract_sdk::{Access, MemberToken, TypeDescriptor, TypeKind, TypeToken};
use rustc_hash::FxHashSet;

use super::generic::{GenericParameter, InstantiationCache};
use super::members::{FieldWrapper, MemberWrapper, MethodWrapper, PropertyWrapper};
use super::reflector::Reflector;
use crate::error::ReflectResult;

/// Observable attributes that decide type equality
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    /// Declaring assembly
    pub assembly: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Kind
    pub kind: TypeKind,
    /// Access level
    pub access: Access,
    /// Fully-qualified name of the base type
    pub base: Option<String>,
}

/// Cached per-type data
pub(crate) struct TypeData {
    pub token: TypeToken,
    pub descriptor: TypeDescriptor,
    pub identity: TypeIdentity,
    /// Declared members, fetched on first use
    pub members: OnceCell<Vec<MemberToken>>,
    /// Closed constructs of this definition (open definitions only)
    pub instantiations: Option<InstantiationCache<Arc<TypeData>>>,
}

impl TypeData {
    pub fn new(token: TypeToken, descriptor: TypeDescriptor, base: Option<String>) -> Self {
        let identity = TypeIdentity {
            assembly: descriptor.assembly.clone(),
            full_name: descriptor.full_name(),
            kind: descriptor.kind,
            access: descriptor.access,
            base,
        };
        let instantiations = descriptor
            .is_generic_definition()
            .then(InstantiationCache::new);
        Self {
            token,
            descriptor,
            identity,
            members: OnceCell::new(),
            instantiations,
        }
    }
}

/// Reflective view of a host type
#[derive(Clone)]
pub struct TypeWrapper {
    pub(crate) data: Arc<TypeData>,
    pub(crate) reflector: Reflector,
}

impl TypeWrapper {
    pub(crate) fn new(data: Arc<TypeData>, reflector: Reflector) -> Self {
        Self { data, reflector }
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Host token
    pub fn token(&self) -> TypeToken {
        self.data.token
    }

    /// Simple name
    pub fn name(&self) -> &str {
        &self.data.descriptor.name
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.data.descriptor.namespace.as_deref()
    }

    /// Fully-qualified name
    pub fn full_name(&self) -> &str {
        &self.data.identity.full_name
    }

    /// Declaring assembly
    pub fn assembly(&self) -> &str {
        &self.data.descriptor.assembly
    }

    /// Kind
    pub fn kind(&self) -> TypeKind {
        self.data.descriptor.kind
    }

    /// Access level
    pub fn access(&self) -> Access {
        self.data.descriptor.access
    }

    /// Abstract flag
    pub fn is_abstract(&self) -> bool {
        self.data.descriptor.is_abstract
    }

    /// Sealed flag
    pub fn is_sealed(&self) -> bool {
        self.data.descriptor.is_sealed
    }

    /// Value type (struct)
    pub fn is_value_type(&self) -> bool {
        self.kind().is_value_type()
    }

    /// Interface type
    pub fn is_interface(&self) -> bool {
        self.kind() == TypeKind::Interface
    }

    /// Placeholder for an unbound generic parameter
    pub fn is_generic_parameter(&self) -> bool {
        self.kind() == TypeKind::GenericParameter
    }

    /// Structural identity
    pub fn identity(&self) -> &TypeIdentity {
        &self.data.identity
    }

    /// Check if both wrappers share the same cached data
    pub fn same_instance(&self, other: &TypeWrapper) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// The reflector this wrapper belongs to
    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Base type (`None` for the root type and interfaces)
    pub fn base_type(&self) -> ReflectResult<Option<TypeWrapper>> {
        match self.data.descriptor.base {
            Some(base) => Ok(Some(self.reflector.wrap_type(base)?)),
            None => Ok(None),
        }
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> ReflectResult<Vec<TypeWrapper>> {
        self.data
            .descriptor
            .interfaces
            .iter()
            .map(|t| self.reflector.wrap_type(*t))
            .collect()
    }

    /// This type followed by its base types, up to the root
    pub fn hierarchy(&self) -> ReflectResult<Vec<TypeWrapper>> {
        let mut chain = vec![self.clone()];
        let mut current = self.base_type()?;
        while let Some(ty) = current {
            current = ty.base_type()?;
            chain.push(ty);
        }
        Ok(chain)
    }

    /// Check if this type is `required`, derives from it, or implements it.
    ///
    /// Interface requirements are searched through the interfaces of this
    /// type, of every base, and of every interface those extend.
    pub fn inherits_from(&self, required: &TypeWrapper) -> ReflectResult<bool> {
        let target = required.token();
        if target == self.reflector.provider().root_type() {
            return Ok(true);
        }

        let mut visited = FxHashSet::default();
        let mut pending: Vec<TypeToken> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if ty.token() == target {
                return Ok(true);
            }
            if required.is_interface() {
                pending.extend(ty.data.descriptor.interfaces.iter().copied());
            }
            current = ty.base_type()?;
        }

        while let Some(iface) = pending.pop() {
            if iface == target {
                return Ok(true);
            }
            if visited.insert(iface) {
                let data = self.reflector.type_data(iface)?;
                pending.extend(data.descriptor.interfaces.iter().copied());
            }
        }
        Ok(false)
    }

    /// Check if a value of type `other` can be stored where this type is expected
    pub fn is_assignable_from(&self, other: &TypeWrapper) -> ReflectResult<bool> {
        other.inherits_from(self)
    }

    // ========================================================================
    // Generics
    // ========================================================================

    /// Open generic definition (has unbound parameters)
    pub fn is_generic_type_definition(&self) -> bool {
        self.data.descriptor.is_generic_definition()
    }

    /// Closed construct of a generic definition
    pub fn is_constructed_generic_type(&self) -> bool {
        self.data.descriptor.generic_definition.is_some()
    }

    /// Generic parameters of the definition (also reported on closed constructs)
    pub fn generic_parameters(&self) -> Vec<GenericParameter> {
        self.data
            .descriptor
            .generic_parameters
            .iter()
            .map(|p| {
                GenericParameter::new(
                    p.clone(),
                    self.full_name(),
                    self.token(),
                    self.reflector.clone(),
                )
            })
            .collect()
    }

    /// Type arguments of a closed construct (empty otherwise)
    pub fn type_arguments(&self) -> ReflectResult<Vec<TypeWrapper>> {
        self.data
            .descriptor
            .type_arguments
            .iter()
            .map(|t| self.reflector.wrap_type(*t))
            .collect()
    }

    /// Open definition this type was closed from
    pub fn generic_type_definition(&self) -> ReflectResult<Option<TypeWrapper>> {
        match self.data.descriptor.generic_definition {
            Some(def) => Ok(Some(self.reflector.wrap_type(def)?)),
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

    // ========================================================================
    // Members
    // ========================================================================

    fn declared_tokens(&self) -> ReflectResult<&[MemberToken]> {
        let tokens = self
            .data
            .members
            .get_or_try_init(|| self.reflector.provider().type_members(self.token()))?;
        Ok(tokens)
    }

    /// Declared members in declaration order
    pub fn declared_members(&self) -> ReflectResult<Vec<MemberWrapper>> {
        self.declared_tokens()?
            .iter()
            .map(|m| self.reflector.wrap_member(*m))
            .collect()
    }

    fn types_to_search(&self) -> ReflectResult<Vec<TypeWrapper>> {
        if self.reflector.config().include_inherited_members {
            self.hierarchy()
        } else {
            Ok(vec![self.clone()])
        }
    }

    /// Methods of this type and, unless disabled in the config, its bases.
    ///
    /// Derived declarations come first; a base method with the same name and
    /// parameter types as an already listed one is hidden.
    pub fn methods(&self) -> ReflectResult<Vec<MethodWrapper>> {
        let mut out: Vec<MethodWrapper> = Vec::new();
        for ty in self.types_to_search()? {
            for member in ty.declared_members()? {
                let MemberWrapper::Method(method) = member else { continue };
                let hidden = out.iter().any(|m| m.has_same_signature(&method));
                if !hidden {
                    out.push(method);
                }
            }
        }
        Ok(out)
    }

    /// Methods with the given name
    pub fn methods_named(&self, name: &str) -> ReflectResult<Vec<MethodWrapper>> {
        Ok(self
            .methods()?
            .into_iter()
            .filter(|m| m.name() == name)
            .collect())
    }

    /// Declared constructors
    pub fn constructors(&self) -> ReflectResult<Vec<MethodWrapper>> {
        Ok(self
            .declared_members()?
            .into_iter()
            .filter_map(|m| match m {
                MemberWrapper::Constructor(c) => Some(c),
                _ => None,
            })
            .collect())
    }

    /// Fields of this type and, unless disabled in the config, its bases
    pub fn fields(&self) -> ReflectResult<Vec<FieldWrapper>> {
        let mut out = Vec::new();
        for ty in self.types_to_search()? {
            for member in ty.declared_members()? {
                if let MemberWrapper::Field(field) = member {
                    out.push(field);
                }
            }
        }
        Ok(out)
    }

    /// Properties of this type and, unless disabled in the config, its bases
    pub fn properties(&self) -> ReflectResult<Vec<PropertyWrapper>> {
        let mut out: Vec<PropertyWrapper> = Vec::new();
        for ty in self.types_to_search()? {
            for member in ty.declared_members()? {
                if let MemberWrapper::Property(property) = member {
                    if !out.iter().any(|p| p.name() == property.name()) {
                        out.push(property);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Find a field by name
    pub fn field(&self, name: &str) -> ReflectResult<Option<FieldWrapper>> {
        Ok(self.fields()?.into_iter().find(|f| f.name() == name))
    }

    /// Find a property by name
    pub fn property(&self, name: &str) -> ReflectResult<Option<PropertyWrapper>> {
        Ok(self.properties()?.into_iter().find(|p| p.name() == name))
    }
}

impl PartialEq for TypeWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other) || self.data.identity == other.data.identity
    }
}

impl Eq for TypeWrapper {}

impl Hash for TypeWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.identity.hash(state);
    }
}

impl fmt::Display for TypeWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl fmt::Debug for TypeWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeWrapper")
            .field("token", &self.data.token)
            .field("identity", &self.data.identity)
            .finish()
    }
}
