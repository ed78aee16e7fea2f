//! Generic instantiation engine
//!
//! Closing an open definition is validated against the constraints of its
//! generic parameters, materialised by the host, and cached on the
//! definition itself. A cache hit returns the stored construct without
//! re-validating or calling the host.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use refract_sdk::{Access, ConstraintDescriptor, GenericParameterDescriptor, TypeToken};
use rustc_hash::FxHashMap;

use super::cache::ConcurrentStore;
use super::constraint::{Constraint, UnmetConstraint};
use super::members::{Member, MemberData, MethodWrapper};
use super::reflector::Reflector;
use super::types::{TypeData, TypeWrapper};
use crate::error::{ReflectError, ReflectResult};

/// Key of an instantiation cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstantiationKey {
    /// Declaring type of a generic method (`None` for types)
    pub owner: Option<TypeToken>,
    /// Type arguments in order
    pub arguments: Vec<TypeToken>,
}

/// Per-definition cache of closed constructs
pub type InstantiationCache<V> = ConcurrentStore<InstantiationKey, V>;

/// Placeholder token of a generic parameter mapped to the argument bound to it
type Bindings = FxHashMap<TypeToken, TypeToken>;

/// Replace bound placeholders in `ty`, closing constructed requirements
/// such as `IFoo<T>` through the host
fn bind(reflector: &Reflector, ty: TypeToken, bindings: &Bindings) -> ReflectResult<TypeToken> {
    if let Some(bound) = bindings.get(&ty) {
        return Ok(*bound);
    }
    let data = reflector.type_data(ty)?;
    let Some(definition) = data.descriptor.generic_definition else {
        return Ok(ty);
    };
    let original = &data.descriptor.type_arguments;
    let mut arguments = Vec::with_capacity(original.len());
    for a in original {
        arguments.push(bind(reflector, *a, bindings)?);
    }
    if arguments == *original {
        return Ok(ty);
    }
    Ok(reflector.provider().make_generic_type(definition, &arguments)?)
}

fn bind_constraint(
    reflector: &Reflector,
    descriptor: &ConstraintDescriptor,
    bindings: &Bindings,
) -> ReflectResult<ConstraintDescriptor> {
    Ok(match descriptor {
        ConstraintDescriptor::Inherits { required, invert } => ConstraintDescriptor::Inherits {
            required: bind(reflector, *required, bindings)?,
            invert: *invert,
        },
        ConstraintDescriptor::Constructor { parameters } => ConstraintDescriptor::Constructor {
            parameters: parameters
                .iter()
                .map(|p| bind(reflector, *p, bindings))
                .collect::<ReflectResult<_>>()?,
        },
    })
}

// ============================================================================
// Generic parameters
// ============================================================================

/// Unbound generic parameter of a type or method definition
#[derive(Clone)]
pub struct GenericParameter {
    descriptor: GenericParameterDescriptor,
    owner: String,
    declaring_type: TypeToken,
    reflector: Reflector,
}

impl GenericParameter {
    pub(crate) fn new(
        descriptor: GenericParameterDescriptor,
        owner: &str,
        declaring_type: TypeToken,
        reflector: Reflector,
    ) -> Self {
        Self {
            descriptor,
            owner: owner.to_string(),
            declaring_type,
            reflector,
        }
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Position in the generic parameter list
    pub fn position(&self) -> usize {
        self.descriptor.position
    }

    /// Qualified name of the declaring type or method
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Placeholder type standing for this parameter in signatures
    pub fn placeholder(&self) -> ReflectResult<TypeWrapper> {
        self.reflector.wrap_type(self.descriptor.type_token)
    }

    /// Constraints in declaration order
    pub fn constraints(&self) -> ReflectResult<Vec<Constraint>> {
        self.descriptor
            .constraints
            .iter()
            .map(|c| Constraint::from_descriptor(c, &self.reflector))
            .collect()
    }

    /// Check if `candidate` satisfies every constraint
    pub fn matches_constraints(&self, candidate: &TypeWrapper) -> ReflectResult<bool> {
        Ok(self.unmet_constraint(candidate)?.is_none())
    }

    /// First constraint `candidate` fails, if any.
    ///
    /// Constraints naming sibling generic parameters (`U : T`) are left
    /// unbound here; `make_generic` checks them against the actual arguments.
    pub fn unmet_constraint(&self, candidate: &TypeWrapper) -> ReflectResult<Option<UnmetConstraint>> {
        self.unmet_bound_constraint(candidate, &Bindings::default())
    }

    fn unmet_bound_constraint(
        &self,
        candidate: &TypeWrapper,
        bindings: &Bindings,
    ) -> ReflectResult<Option<UnmetConstraint>> {
        for descriptor in &self.descriptor.constraints {
            let bound = bind_constraint(&self.reflector, descriptor, bindings)?;
            let constraint = Constraint::from_descriptor(&bound, &self.reflector)?;
            if !constraint.matches(candidate)? {
                return Ok(Some(UnmetConstraint::new(constraint)));
            }
        }
        Ok(None)
    }
}

impl Member for GenericParameter {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The placeholder type
    fn member_type(&self) -> ReflectResult<TypeWrapper> {
        self.placeholder()
    }

    /// The declaring type; for a method parameter, the method's declaring type
    fn declaring_type(&self) -> ReflectResult<TypeWrapper> {
        self.reflector.wrap_type(self.declaring_type)
    }

    fn access(&self) -> Access {
        Access::Public
    }
}

impl PartialEq for GenericParameter {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.descriptor.position == other.descriptor.position
            && self.descriptor.name == other.descriptor.name
    }
}

impl Eq for GenericParameter {}

impl Hash for GenericParameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.descriptor.position.hash(state);
        self.descriptor.name.hash(state);
    }
}

impl fmt::Debug for GenericParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericParameter")
            .field("owner", &self.owner)
            .field("name", &self.descriptor.name)
            .field("position", &self.descriptor.position)
            .finish()
    }
}

/// Validate `arguments` against `parameters` position by position.
///
/// Every parameter is bound to its argument first, so a constraint may
/// refer to any parameter of the same definition.
fn validate_arguments(
    parameters: &[GenericParameter],
    arguments: &[TypeWrapper],
) -> ReflectResult<()> {
    let bindings: Bindings = parameters
        .iter()
        .map(|p| p.descriptor.type_token)
        .zip(arguments.iter().map(|a| a.token()))
        .collect();
    for (param, argument) in parameters.iter().zip(arguments) {
        if let Some(unmet) = param.unmet_bound_constraint(argument, &bindings)? {
            tracing::debug!(
                owner = param.owner(),
                parameter = param.name(),
                argument = argument.full_name(),
                constraint = %unmet,
                "constraint violation"
            );
            return Err(ReflectError::ConstraintViolation {
                position: param.position(),
                parameter: param.name().to_string(),
                argument: argument.full_name().to_string(),
                constraint: unmet.to_string(),
            });
        }
    }
    Ok(())
}

fn argument_names(arguments: &[TypeWrapper]) -> String {
    arguments
        .iter()
        .map(|a| a.full_name())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Type instantiation
// ============================================================================

impl TypeWrapper {
    /// Close this generic type definition over `arguments`.
    ///
    /// Repeated calls with the same arguments return the same cached
    /// construct.
    pub fn make_generic(&self, arguments: &[TypeWrapper]) -> ReflectResult<TypeWrapper> {
        let Some(cache) = self.data.instantiations.as_ref() else {
            return Err(ReflectError::NotGenericDefinition {
                name: self.full_name().to_string(),
            });
        };
        let parameters = self.generic_parameters();
        if parameters.len() != arguments.len() {
            return Err(ReflectError::ArityMismatch {
                member: self.full_name().to_string(),
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }

        let key = InstantiationKey {
            owner: None,
            arguments: arguments.iter().map(|a| a.token()).collect(),
        };
        if let Some(closed) = cache.get(&key) {
            if self.reflector.config().trace_cache {
                tracing::trace!(definition = self.full_name(), "instantiation cache hit");
            }
            return Ok(TypeWrapper::new(closed, self.reflector.clone()));
        }

        tracing::debug!(
            definition = self.full_name(),
            arguments = %argument_names(arguments),
            "instantiating generic type"
        );
        validate_arguments(&parameters, arguments)?;
        let token = self
            .reflector
            .provider()
            .make_generic_type(self.token(), &key.arguments)?;
        let data: Arc<TypeData> = self.reflector.type_data(token)?;
        let winner = cache.get_or_insert(key, data);
        Ok(TypeWrapper::new(winner, self.reflector.clone()))
    }
}

// ============================================================================
// Method instantiation
// ============================================================================

impl MethodWrapper {
    /// Close this generic method definition over `arguments`
    pub fn make_generic(&self, arguments: &[TypeWrapper]) -> ReflectResult<MethodWrapper> {
        let Some(cache) = self.data.instantiations.as_ref() else {
            return Err(ReflectError::NotGenericDefinition {
                name: self.qualified_name(),
            });
        };
        let parameters = self.generic_parameters();
        if parameters.len() != arguments.len() {
            return Err(ReflectError::ArityMismatch {
                member: self.qualified_name(),
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }

        let key = InstantiationKey {
            owner: Some(self.data.descriptor.declaring_type),
            arguments: arguments.iter().map(|a| a.token()).collect(),
        };
        if let Some(closed) = cache.get(&key) {
            if self.reflector.config().trace_cache {
                tracing::trace!(definition = %self.qualified_name(), "instantiation cache hit");
            }
            return Ok(MethodWrapper::new(closed, self.reflector.clone()));
        }

        tracing::debug!(
            definition = %self.qualified_name(),
            arguments = %argument_names(arguments),
            "instantiating generic method"
        );
        validate_arguments(&parameters, arguments)?;
        let token = self
            .reflector
            .provider()
            .make_generic_method(self.token(), &key.arguments)?;
        let data: Arc<MemberData> = self.reflector.member_data(token)?;
        let winner = cache.get_or_insert(key, data);
        Ok(MethodWrapper::new(winner, self.reflector.clone()))
    }
}
