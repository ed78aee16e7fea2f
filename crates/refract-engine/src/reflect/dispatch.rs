//! Invocation dispatcher
//!
//! Calls reach the host in one of four ways:
//!
//! 1. **Positional**: receiver and arity checks, trailing defaults filled,
//!    then a single host call.
//! 2. **Named bag**: the public readable fields and properties of an
//!    argument object are joined to parameters by name, then dispatched
//!    positionally.
//! 3. **Generic**: an open generic method is closed first, either over
//!    explicit type arguments or over types inferred from the arguments.
//! 4. **By name**: overload resolution on a type picks the method whose
//!    parameters accept the arguments.

use refract_sdk::{FromValue, TypeKind, Value};

use super::members::{Member, MethodWrapper, ParameterWrapper};
use super::types::TypeWrapper;
use crate::config::{AmbiguityPolicy, InferencePolicy};
use crate::error::{ReflectError, ReflectResult};

// ============================================================================
// Argument binding
// ============================================================================

/// Inner join of `named` values with `parameters` by exact name.
///
/// Unmatched names and unmatched parameters are dropped. The result is
/// ordered by parameter position.
pub fn join_named_arguments(
    parameters: &[ParameterWrapper],
    named: &[(String, Value)],
) -> Vec<(ParameterWrapper, Value)> {
    let mut joined: Vec<(ParameterWrapper, Value)> = parameters
        .iter()
        .filter_map(|p| {
            named
                .iter()
                .find(|(name, _)| name == p.name())
                .map(|(_, value)| (p.clone(), value.clone()))
        })
        .collect();
    joined.sort_by_key(|(p, _)| p.position());
    joined
}

/// Build a positional argument array from joined named arguments.
///
/// Parameters missing from the join take their default value; a missing
/// required parameter is an arity error.
fn positional_from_joined(
    method: &MethodWrapper,
    joined: &[(ParameterWrapper, Value)],
) -> ReflectResult<Vec<Value>> {
    let parameters = method.parameters();
    let mut args = Vec::with_capacity(parameters.len());
    for p in &parameters {
        if let Some((_, value)) = joined.iter().find(|(j, _)| j.position() == p.position()) {
            args.push(value.clone());
        } else if let Some(default) = p.default_value() {
            args.push(default.clone());
        } else {
            return Err(ReflectError::ArityMismatch {
                member: method.qualified_name(),
                expected: parameters.len(),
                actual: joined.len(),
            });
        }
    }
    Ok(args)
}

/// Append defaults for omitted trailing parameters
fn fill_defaults(method: &MethodWrapper, args: &[Value]) -> ReflectResult<Vec<Value>> {
    let parameters = &method.data.descriptor.parameters;
    let arity_error = || ReflectError::ArityMismatch {
        member: method.qualified_name(),
        expected: parameters.len(),
        actual: args.len(),
    };
    if args.len() > parameters.len() {
        return Err(arity_error());
    }
    let mut filled = args.to_vec();
    for p in &parameters[args.len()..] {
        match &p.default_value {
            Some(default) => filled.push(default.clone()),
            None => return Err(arity_error()),
        }
    }
    Ok(filled)
}

/// Public readable instance fields and properties of a bag object
fn read_named_values(bag: &Value, bag_type: &TypeWrapper) -> ReflectResult<Vec<(String, Value)>> {
    let mut values = Vec::new();
    for field in bag_type.fields()? {
        if field.access().is_public() && !field.is_static() {
            values.push((field.name().to_string(), field.get_value(bag)?));
        }
    }
    for property in bag_type.properties()? {
        if property.access().is_public() && !property.is_static() && property.can_read() {
            values.push((property.name().to_string(), property.get_value(bag)?));
        }
    }
    Ok(values)
}

// ============================================================================
// Generic inference
// ============================================================================

/// Infer the type arguments of an open generic method from call arguments.
///
/// A parameter whose declared type has the same name as one of the method's
/// generic parameters binds that parameter to the runtime type of the
/// argument at the same position. Null arguments do not bind anything.
pub fn infer_type_arguments(
    method: &MethodWrapper,
    args: &[Value],
) -> ReflectResult<Vec<TypeWrapper>> {
    let reflector = &method.reflector;
    let generic_parameters = method.generic_parameters();
    let mut inferred: Vec<Option<TypeWrapper>> = vec![None; generic_parameters.len()];

    for (param, arg) in method.parameters().iter().zip(args) {
        let declared = param.member_type()?;
        let Some(slot) = generic_parameters
            .iter()
            .position(|g| g.name() == declared.name())
        else {
            continue;
        };
        let Some(actual) = reflector.type_of(arg)? else {
            continue;
        };
        match &inferred[slot] {
            None => inferred[slot] = Some(actual),
            Some(first) => {
                if reflector.config().inference == InferencePolicy::RequireConsistent
                    && *first != actual
                {
                    return Err(ReflectError::InconsistentInference {
                        method: method.qualified_name(),
                        parameter: generic_parameters[slot].name().to_string(),
                        first: first.full_name().to_string(),
                        conflicting: actual.full_name().to_string(),
                    });
                }
            }
        }
    }

    inferred
        .into_iter()
        .zip(&generic_parameters)
        .map(|(ty, g)| {
            ty.ok_or_else(|| ReflectError::UninferredTypeParameter {
                method: method.qualified_name(),
                parameter: g.name().to_string(),
            })
        })
        .collect()
}

// ============================================================================
// Method invocation
// ============================================================================

impl MethodWrapper {
    /// Call with positional arguments.
    ///
    /// Instance methods reject a null receiver; static methods and
    /// constructors ignore it. Omitted trailing parameters take their
    /// defaults. An open generic method is closed over inferred type
    /// arguments first.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> ReflectResult<Value> {
        self.check_receiver(receiver)?;
        if self.is_generic_method_definition() {
            let type_args = infer_type_arguments(self, args)?;
            return self.make_generic(&type_args)?.invoke(receiver, args);
        }

        let args = fill_defaults(self, args)?;
        let provider = self.reflector.provider();
        if self.is_constructor() {
            tracing::trace!(method = %self.signature(), "construct");
            return Ok(provider.construct(self.token(), &args)?);
        }
        tracing::trace!(method = %self.signature(), args = args.len(), "invoke");
        Ok(provider.invoke(self.token(), receiver, &args)?)
    }

    /// Call with arguments taken by name from the members of `bag`
    pub fn invoke_named(&self, receiver: &Value, bag: &Value) -> ReflectResult<Value> {
        self.check_receiver(receiver)?;
        let named = self.named_values(bag)?;
        let joined = join_named_arguments(&self.parameters(), &named);
        let args = positional_from_joined(self, &joined)?;
        self.invoke(receiver, &args)
    }

    fn named_values(&self, bag: &Value) -> ReflectResult<Vec<(String, Value)>> {
        let Some(bag_type) = self.reflector.type_of(bag)? else {
            return Err(ReflectError::absent("arguments"));
        };
        read_named_values(bag, &bag_type)
    }

    /// Close over `type_args`, then call
    pub fn invoke_generic(
        &self,
        receiver: &Value,
        type_args: &[TypeWrapper],
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.check_receiver(receiver)?;
        self.make_generic(type_args)?.invoke(receiver, args)
    }

    /// Instance methods need a receiver before any inference or closing
    fn check_receiver(&self, receiver: &Value) -> ReflectResult<()> {
        if !self.is_static() && !self.is_constructor() && receiver.is_null() {
            return Err(ReflectError::absent("receiver"));
        }
        Ok(())
    }

    /// Call and convert the result.
    ///
    /// A null (or void) result yields `default`; a result of the wrong shape
    /// is a `ResultTypeMismatch`.
    pub fn invoke_as<T: FromValue>(
        &self,
        receiver: &Value,
        type_args: Option<&[TypeWrapper]>,
        args: &[Value],
        default: T,
    ) -> ReflectResult<T> {
        let result = match type_args {
            Some(type_args) => self.invoke_generic(receiver, type_args, args)?,
            None => self.invoke(receiver, args)?,
        };
        if result.is_null() {
            return Ok(default);
        }
        T::from_value(result).map_err(|source| ReflectError::ResultTypeMismatch {
            expected: std::any::type_name::<T>(),
            source,
        })
    }

    /// Check if the arguments fit the parameter list
    pub fn accepts(&self, args: &[Value]) -> ReflectResult<bool> {
        let parameters = self.parameters();
        if args.len() > parameters.len() || args.len() < self.required_parameter_count() {
            return Ok(false);
        }
        let generic_names: Vec<String> = self
            .generic_parameters()
            .iter()
            .map(|g| g.name().to_string())
            .collect();

        for (param, arg) in parameters.iter().zip(args) {
            let declared = param.member_type()?;
            if declared.kind() == TypeKind::GenericParameter
                && generic_names.iter().any(|n| n == declared.name())
            {
                continue;
            }
            let fits = match self.reflector.type_of(arg)? {
                None => !declared.is_value_type(),
                Some(actual) => declared.is_assignable_from(&actual)?,
            };
            if !fits {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ============================================================================
// Overload resolution
// ============================================================================

impl TypeWrapper {
    /// Qualified names of the argument types, `null` for null arguments
    fn argument_type_names(&self, args: &[Value]) -> ReflectResult<String> {
        let mut names = Vec::with_capacity(args.len());
        for arg in args {
            names.push(match self.reflector.type_of(arg)? {
                Some(ty) => ty.full_name().to_string(),
                None => "null".to_string(),
            });
        }
        Ok(names.join(", "))
    }

    fn pick(
        &self,
        signature: impl FnOnce() -> ReflectResult<String>,
        mut matched: Vec<MethodWrapper>,
    ) -> ReflectResult<MethodWrapper> {
        match matched.len() {
            0 => Err(ReflectError::MemberNotFound {
                signature: signature()?,
            }),
            1 => Ok(matched.remove(0)),
            n => match self.reflector.config().ambiguity {
                AmbiguityPolicy::Reject => Err(ReflectError::AmbiguousMatch {
                    signature: signature()?,
                    candidates: n,
                }),
                AmbiguityPolicy::FirstDeclared => {
                    let first = matched.remove(0);
                    tracing::warn!(
                        chosen = %first.signature(),
                        candidates = n,
                        "ambiguous overload resolved by declaration order"
                    );
                    Ok(first)
                }
            },
        }
    }

    /// Find the method named `name` whose parameters accept `args`
    pub fn find_method(&self, name: &str, args: &[Value]) -> ReflectResult<MethodWrapper> {
        let mut matched = Vec::new();
        for method in self.methods_named(name)? {
            if method.accepts(args)? {
                matched.push(method);
            }
        }
        tracing::trace!(
            ty = self.full_name(),
            method = name,
            candidates = matched.len(),
            "overload resolution"
        );
        self.pick(
            || {
                let arg_names = self.argument_type_names(args)?;
                Ok(format!("{}.{}({})", self.full_name(), name, arg_names))
            },
            matched,
        )
    }

    /// Resolve the overload of `name` for `args` and call it
    pub fn invoke_method(
        &self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.find_method(name, args)?.invoke(receiver, args)
    }

    /// Resolve `name` against the members of `bag` and call it.
    ///
    /// A candidate qualifies when the bag covers every parameter without a
    /// default value; candidates covering more parameters win.
    pub fn invoke_method_named(
        &self,
        receiver: &Value,
        name: &str,
        bag: &Value,
    ) -> ReflectResult<Value> {
        let Some(bag_type) = self.reflector.type_of(bag)? else {
            return Err(ReflectError::absent("arguments"));
        };
        let named = read_named_values(bag, &bag_type)?;

        let mut best: Vec<MethodWrapper> = Vec::new();
        let mut best_score = 0usize;
        for method in self.methods_named(name)? {
            let joined = join_named_arguments(&method.parameters(), &named);
            let covers_required = method
                .parameters()
                .iter()
                .filter(|p| !p.has_default_value())
                .all(|p| joined.iter().any(|(j, _)| j.position() == p.position()));
            if !covers_required {
                continue;
            }
            let score = joined.len();
            if best.is_empty() || score > best_score {
                best = vec![method];
                best_score = score;
            } else if score == best_score {
                best.push(method);
            }
        }

        let names: Vec<&str> = named.iter().map(|(n, _)| n.as_str()).collect();
        let method = self.pick(
            || Ok(format!("{}.{}{{{}}}", self.full_name(), name, names.join(", "))),
            best,
        )?;
        let joined = join_named_arguments(&method.parameters(), &named);
        let args = positional_from_joined(&method, &joined)?;
        method.invoke(receiver, &args)
    }

    /// Resolve a constructor for `args` and create an instance
    pub fn create_instance(&self, args: &[Value]) -> ReflectResult<Value> {
        let mut matched = Vec::new();
        for ctor in self.constructors()? {
            if ctor.accepts(args)? {
                matched.push(ctor);
            }
        }
        let ctor = self.pick(
            || {
                let arg_names = self.argument_type_names(args)?;
                Ok(format!("{}..ctor({})", self.full_name(), arg_names))
            },
            matched,
        )?;
        ctor.invoke(&Value::Null, args)
    }
}
