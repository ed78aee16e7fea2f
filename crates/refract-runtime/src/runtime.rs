//! InMemoryRuntime - scriptable host
//!
//! Implements [`MetadataProvider`] over an in-process registry. Method bodies
//! are Rust closures; they run without the registry lock held, so a body may
//! call back into the runtime (including defining or closing types).

use parking_lot::RwLock;

use refract_sdk::{
    Access, HostError, HostResult, MemberDescriptor, MemberKind, MemberToken, MetadataProvider,
    ObjectRef, TypeDescriptor, TypeKind, TypeToken, Value,
};

use crate::definition::{CallFrame, NativeBody, TypeDefinition};
use crate::error::DefinitionError;
use crate::metrics::HostMetrics;
use crate::registry::{Implementation, Registry};
use crate::standard::StandardTypes;

/// What a field or property read resolved to once the lock is released
enum Read {
    Value(Value),
    Run(NativeBody),
}

/// In-memory host runtime
pub struct InMemoryRuntime {
    registry: RwLock<Registry>,
    standard: StandardTypes,
    metrics: HostMetrics,
}

impl InMemoryRuntime {
    /// Create a runtime holding the standard type universe
    pub fn new() -> Self {
        let mut registry = Registry::new();
        let standard = StandardTypes::install(&mut registry);
        Self {
            registry: RwLock::new(registry),
            standard,
            metrics: HostMetrics::new(),
        }
    }

    /// Tokens of the standard types
    pub fn standard(&self) -> &StandardTypes {
        &self.standard
    }

    /// Host call counters
    pub fn metrics(&self) -> &HostMetrics {
        &self.metrics
    }

    /// Register a type definition
    pub fn define_type(&self, definition: TypeDefinition) -> Result<TypeToken, DefinitionError> {
        self.registry.write().define(definition)
    }

    /// Look up a type by full name (closed generics included, e.g. `Demo.Box<System.Int32>`)
    pub fn find_type(&self, full_name: &str) -> Option<TypeToken> {
        self.registry.read().find(full_name)
    }

    /// Full name of a type
    pub fn type_name(&self, ty: TypeToken) -> Option<String> {
        self.registry
            .read()
            .type_entry(ty)
            .ok()
            .map(|e| e.descriptor.full_name())
    }

    /// Find a declared member by name (first in declaration order)
    pub fn find_member(&self, ty: TypeToken, name: &str) -> Option<MemberToken> {
        let reg = self.registry.read();
        let entry = reg.type_entry(ty).ok()?;
        entry.members.iter().copied().find(|m| {
            reg.member_entry(*m)
                .map(|e| e.descriptor.name == name)
                .unwrap_or(false)
        })
    }

    /// Allocate an object with default slots without running a constructor
    pub fn instantiate(&self, ty: TypeToken) -> HostResult<Value> {
        let reg = self.registry.read();
        let d = &reg.type_entry(ty)?.descriptor;
        Self::check_instantiable(d)?;
        if let Some(default) = reg.defaults.get(&ty) {
            return Ok(default.clone());
        }
        Ok(Value::Object(ObjectRef::with_slots(
            ty,
            reg.instance_slots(ty),
        )))
    }

    /// Create an object of an anonymous type with public read-only properties.
    ///
    /// Anonymous types are shared by shape: the same property names and
    /// value types in the same order reuse one type.
    pub fn anonymous(&self, properties: &[(&str, Value)]) -> Value {
        let shape: Vec<(String, TypeToken)> = properties
            .iter()
            .map(|(name, value)| {
                let ty = self.runtime_type(value).unwrap_or(self.standard.object);
                (name.to_string(), ty)
            })
            .collect();

        let ty = {
            let mut reg = self.registry.write();
            let existing = reg.anonymous.get(&shape).copied();
            match existing {
                Some(ty) => ty,
                None => {
                    let mut d = TypeDescriptor::new(
                        format!("<>f__AnonymousType{}", reg.anonymous.len()),
                        "anonymous",
                        TypeKind::Class,
                    );
                    d.is_sealed = true;
                    d.access = Access::Internal;
                    d.base = Some(self.standard.object);
                    let ty = reg.push_type(d);
                    for (name, prop_type) in &shape {
                        let mut m =
                            MemberDescriptor::new(name.clone(), MemberKind::Property, ty, *prop_type);
                        m.can_write = false;
                        reg.push_member(
                            m,
                            Implementation::Property {
                                getter: None,
                                setter: None,
                            },
                            Value::Null,
                        );
                    }
                    reg.anonymous.insert(shape, ty);
                    ty
                }
            }
        };

        Value::Object(ObjectRef::with_slots(
            ty,
            properties
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone())),
        ))
    }

    fn runtime_type(&self, value: &Value) -> Option<TypeToken> {
        match value {
            Value::Object(obj) => Some(obj.type_token()),
            other => self.standard.primitive_type_of(other),
        }
    }

    fn check_instantiable(d: &TypeDescriptor) -> HostResult<()> {
        if d.is_abstract || d.kind == TypeKind::Interface || d.kind == TypeKind::GenericParameter {
            return Err(HostError::NotInvocable(format!(
                "cannot instantiate {} {}",
                d.kind,
                d.full_name()
            )));
        }
        if d.is_generic_definition() {
            return Err(HostError::NotInvocable(format!(
                "cannot instantiate open generic type {}",
                d.full_name()
            )));
        }
        Ok(())
    }

    fn check_arity(d: &MemberDescriptor, args: &[Value]) -> HostResult<()> {
        if args.len() != d.parameters.len() {
            return Err(HostError::ArgumentError(format!(
                "{} expects {} arguments, got {}",
                d.name,
                d.parameters.len(),
                args.len()
            )));
        }
        Ok(())
    }

    fn storage_target<'v>(d: &MemberDescriptor, target: &'v Value) -> HostResult<&'v ObjectRef> {
        target.as_object().ok_or_else(|| {
            HostError::ArgumentError(format!(
                "{} {} requires an object target, got {}",
                d.kind,
                d.name,
                target.type_name()
            ))
        })
    }
}

impl Default for InMemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for InMemoryRuntime {
    fn root_type(&self) -> TypeToken {
        self.standard.object
    }

    fn describe_type(&self, ty: TypeToken) -> HostResult<TypeDescriptor> {
        self.metrics.record_describe_type();
        Ok(self.registry.read().type_entry(ty)?.descriptor.clone())
    }

    fn type_members(&self, ty: TypeToken) -> HostResult<Vec<MemberToken>> {
        Ok(self.registry.read().type_entry(ty)?.members.clone())
    }

    fn type_of(&self, value: &Value) -> HostResult<Option<TypeToken>> {
        Ok(self.runtime_type(value))
    }

    fn describe_member(&self, member: MemberToken) -> HostResult<MemberDescriptor> {
        Ok(self.registry.read().member_entry(member)?.descriptor.clone())
    }

    fn make_generic_type(&self, definition: TypeToken, args: &[TypeToken]) -> HostResult<TypeToken> {
        self.metrics.record_make_generic_type();
        self.registry.write().close_type(definition, args)
    }

    fn make_generic_method(
        &self,
        definition: MemberToken,
        args: &[TypeToken],
    ) -> HostResult<MemberToken> {
        self.metrics.record_make_generic_method();
        self.registry.write().close_method(definition, args)
    }

    fn invoke(&self, method: MemberToken, receiver: &Value, args: &[Value]) -> HostResult<Value> {
        self.metrics.record_invoke();
        let (body, type_arguments) = {
            let reg = self.registry.read();
            let d = &reg.member_entry(method)?.descriptor;
            if d.kind != MemberKind::Method {
                return Err(HostError::NotInvocable(format!("{} is a {}", d.name, d.kind)));
            }
            if d.is_generic_definition() {
                return Err(HostError::NotInvocable(format!(
                    "open generic method {}",
                    d.name
                )));
            }
            Self::check_arity(d, args)?;

            let mut target = method;
            if !d.is_static {
                let Some(runtime_type) = self.runtime_type(receiver) else {
                    return Err(HostError::ArgumentError(format!(
                        "null receiver for {}",
                        d.name
                    )));
                };
                let declaring_kind = reg.type_entry(d.declaring_type)?.descriptor.kind;
                if d.modifiers.is_virtual || declaring_kind == TypeKind::Interface {
                    target = reg.resolve_override(method, runtime_type)?;
                }
            }
            match &reg.member_entry(target)?.implementation {
                Implementation::Body(Some(body)) => (body.clone(), d.type_arguments.clone()),
                _ => {
                    return Err(HostError::NotInvocable(format!(
                        "{} has no implementation",
                        d.name
                    )))
                }
            }
        };

        tracing::trace!(method = method.0, args = args.len(), "invoke");
        let frame = CallFrame {
            runtime: self,
            member: method,
            receiver,
            args,
            type_arguments: &type_arguments,
        };
        body(&frame)
    }

    fn construct(&self, constructor: MemberToken, args: &[Value]) -> HostResult<Value> {
        self.metrics.record_construct();
        let (ty, body, slots) = {
            let reg = self.registry.read();
            let entry = reg.member_entry(constructor)?;
            let d = &entry.descriptor;
            if d.kind != MemberKind::Constructor {
                return Err(HostError::NotInvocable(format!(
                    "{} is not a constructor",
                    d.name
                )));
            }
            Self::check_instantiable(&reg.type_entry(d.declaring_type)?.descriptor)?;
            Self::check_arity(d, args)?;
            if let Some(default) = reg.defaults.get(&d.declaring_type) {
                if args.is_empty() {
                    return Ok(default.clone());
                }
            }
            let body = match &entry.implementation {
                Implementation::Body(body) => body.clone(),
                _ => None,
            };
            (
                d.declaring_type,
                body,
                reg.instance_slots(d.declaring_type),
            )
        };

        let object = Value::Object(ObjectRef::with_slots(ty, slots));
        if let Some(body) = body {
            let frame = CallFrame {
                runtime: self,
                member: constructor,
                receiver: &object,
                args,
                type_arguments: &[],
            };
            body(&frame)?;
        }
        Ok(object)
    }

    fn get_value(&self, member: MemberToken, target: &Value) -> HostResult<Value> {
        let read = {
            let reg = self.registry.read();
            let entry = reg.member_entry(member)?;
            let d = &entry.descriptor;
            if !d.can_read {
                return Err(HostError::NotInvocable(format!(
                    "{} {} is not readable",
                    d.kind, d.name
                )));
            }
            match &entry.implementation {
                Implementation::Property {
                    getter: Some(getter),
                    ..
                } => Read::Run(getter.clone()),
                Implementation::Field | Implementation::Property { .. } => {
                    if d.is_static {
                        Read::Value(reg.statics.get(&member).cloned().unwrap_or_default())
                    } else {
                        let obj = Self::storage_target(d, target)?;
                        Read::Value(obj.get(&d.name).unwrap_or_default())
                    }
                }
                Implementation::Body(_) => {
                    return Err(HostError::NotInvocable(format!(
                        "{} is not a field or property",
                        d.name
                    )))
                }
            }
        };

        match read {
            Read::Value(v) => Ok(v),
            Read::Run(getter) => getter(&CallFrame {
                runtime: self,
                member,
                receiver: target,
                args: &[],
                type_arguments: &[],
            }),
        }
    }

    fn set_value(&self, member: MemberToken, target: &Value, value: Value) -> HostResult<()> {
        let setter = {
            let mut reg = self.registry.write();
            let entry = reg.member_entry(member)?;
            let d = entry.descriptor.clone();
            let implementation = entry.implementation.clone();
            if !d.can_write {
                return Err(HostError::NotInvocable(format!(
                    "{} {} is not writable",
                    d.kind, d.name
                )));
            }
            match implementation {
                Implementation::Property {
                    setter: Some(setter),
                    ..
                } => Some(setter),
                Implementation::Field | Implementation::Property { .. } => {
                    if d.is_static {
                        reg.statics.insert(member, value.clone());
                    } else {
                        Self::storage_target(&d, target)?.set(d.name.clone(), value.clone());
                    }
                    None
                }
                Implementation::Body(_) => {
                    return Err(HostError::NotInvocable(format!(
                        "{} is not a field or property",
                        d.name
                    )))
                }
            }
        };

        if let Some(setter) = setter {
            setter(&CallFrame {
                runtime: self,
                member,
                receiver: target,
                args: std::slice::from_ref(&value),
                type_arguments: &[],
            })?;
        }
        Ok(())
    }
}
