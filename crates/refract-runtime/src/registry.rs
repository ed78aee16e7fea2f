//! Type and member registry
//!
//! Owns every descriptor the runtime hands out. Tokens are indices into the
//! `types` and `members` tables and are never reused. Closed generic types
//! and methods are memoised so that closing the same definition with the
//! same arguments always yields the same token.

use rustc_hash::FxHashMap;

use refract_sdk::{
    ConstraintDescriptor, GenericParameterDescriptor, HostError, HostResult, MemberDescriptor,
    MemberKind, MemberToken, MethodModifiers, ParameterDescriptor, TypeDescriptor, TypeKind,
    TypeToken, Value,
};

use crate::definition::{
    ConstraintDefinition, GenericParameterDefinition, NativeBody, ParameterDefinition,
    TypeDefinition, TypeRef,
};
use crate::error::DefinitionError;

// ============================================================================
// Entries
// ============================================================================

/// How a member is executed or stored
#[derive(Clone)]
pub(crate) enum Implementation {
    /// Method or constructor body (`None` for abstract methods and empty initializers)
    Body(Option<NativeBody>),
    /// Field backed by the slot of the same name
    Field,
    /// Property; a missing accessor falls back to the slot of the same name
    Property {
        getter: Option<NativeBody>,
        setter: Option<NativeBody>,
    },
}

pub(crate) struct TypeEntry {
    pub descriptor: TypeDescriptor,
    pub members: Vec<MemberToken>,
}

pub(crate) struct MemberEntry {
    pub descriptor: MemberDescriptor,
    pub implementation: Implementation,
    /// Initial value of a field or auto-property slot
    pub initial_value: Value,
}

/// Table lengths used to undo a failed definition
#[derive(Clone, Copy)]
struct Mark {
    types: usize,
    members: usize,
}

/// Generic parameters visible while resolving a signature
struct Scope<'a> {
    type_params: &'a [(String, TypeToken)],
    method_params: &'a [(String, TypeToken)],
    context: &'a str,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<TypeToken> {
        self.method_params
            .iter()
            .chain(self.type_params.iter())
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
pub(crate) struct Registry {
    types: Vec<TypeEntry>,
    members: Vec<MemberEntry>,
    names: FxHashMap<String, TypeToken>,
    closed_types: FxHashMap<(TypeToken, Vec<TypeToken>), TypeToken>,
    closed_methods: FxHashMap<(MemberToken, Vec<TypeToken>), MemberToken>,
    pub anonymous: FxHashMap<Vec<(String, TypeToken)>, TypeToken>,
    pub statics: FxHashMap<MemberToken, Value>,
    /// Default slot values per type (primitives)
    pub defaults: FxHashMap<TypeToken, Value>,
    pub root: Option<TypeToken>,
    pub value_type: Option<TypeToken>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Primitive table operations
    // ------------------------------------------------------------------------

    /// Append a type without indexing its name
    pub fn push_type(&mut self, descriptor: TypeDescriptor) -> TypeToken {
        let token = TypeToken(self.types.len() as u32);
        self.types.push(TypeEntry {
            descriptor,
            members: Vec::new(),
        });
        token
    }

    /// Make a type findable by its full name
    pub fn register_name(&mut self, token: TypeToken) {
        if let Some(entry) = self.types.get(token.0 as usize) {
            let name = entry.descriptor.full_name();
            self.names.insert(name, token);
        }
    }

    /// Append a member to its declaring type
    pub fn push_member(
        &mut self,
        descriptor: MemberDescriptor,
        implementation: Implementation,
        initial_value: Value,
    ) -> MemberToken {
        let token = MemberToken(self.members.len() as u32);
        let owner = descriptor.declaring_type;
        let is_static_storage = descriptor.is_static
            && matches!(
                implementation,
                Implementation::Field | Implementation::Property { .. }
            );
        if is_static_storage {
            self.statics.insert(token, initial_value.clone());
        }
        self.members.push(MemberEntry {
            descriptor,
            implementation,
            initial_value,
        });
        if let Some(entry) = self.types.get_mut(owner.0 as usize) {
            entry.members.push(token);
        }
        token
    }

    pub fn type_entry(&self, token: TypeToken) -> HostResult<&TypeEntry> {
        self.types
            .get(token.0 as usize)
            .ok_or(HostError::UnknownType(token))
    }

    pub fn member_entry(&self, token: MemberToken) -> HostResult<&MemberEntry> {
        self.members
            .get(token.0 as usize)
            .ok_or(HostError::UnknownMember(token))
    }

    pub fn find(&self, full_name: &str) -> Option<TypeToken> {
        self.names.get(full_name).copied()
    }

    #[cfg(test)]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Default slot value for a type
    pub fn default_for(&self, ty: TypeToken) -> Value {
        self.defaults.get(&ty).cloned().unwrap_or_default()
    }

    fn mark(&self) -> Mark {
        Mark {
            types: self.types.len(),
            members: self.members.len(),
        }
    }

    fn rollback(&mut self, mark: Mark) {
        self.types.truncate(mark.types);
        self.members.truncate(mark.members);
        let type_alive = |t: &TypeToken| (t.0 as usize) < mark.types;
        let member_alive = |m: &MemberToken| (m.0 as usize) < mark.members;
        self.names.retain(|_, t| type_alive(t));
        self.closed_types.retain(|_, t| type_alive(t));
        self.closed_methods.retain(|_, m| member_alive(m));
        self.anonymous.retain(|_, t| type_alive(t));
        self.statics.retain(|m, _| member_alive(m));
        for entry in &mut self.types {
            entry.members.retain(|m| member_alive(m));
        }
    }

    /// Slots allocated for a new instance, base types first
    pub fn instance_slots(&self, ty: TypeToken) -> Vec<(String, Value)> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            let Ok(entry) = self.type_entry(t) else { break };
            chain.push(t);
            current = entry.descriptor.base;
        }

        let mut slots = Vec::new();
        for t in chain.into_iter().rev() {
            let Ok(entry) = self.type_entry(t) else { continue };
            for member in &entry.members {
                let Ok(m) = self.member_entry(*member) else { continue };
                if m.descriptor.is_static {
                    continue;
                }
                let stored = match &m.implementation {
                    Implementation::Field => true,
                    Implementation::Property { getter, setter } => {
                        getter.is_none() || setter.is_none()
                    }
                    Implementation::Body(_) => false,
                };
                if stored {
                    slots.push((m.descriptor.name.clone(), m.initial_value.clone()));
                }
            }
        }
        slots
    }

    /// Find the implementation a virtual call on `runtime_type` reaches
    pub fn resolve_override(
        &self,
        method: MemberToken,
        runtime_type: TypeToken,
    ) -> HostResult<MemberToken> {
        let declared = &self.member_entry(method)?.descriptor;
        let mut current = Some(runtime_type);
        while let Some(t) = current {
            let entry = self.type_entry(t)?;
            for candidate in &entry.members {
                if *candidate == method {
                    return Ok(method);
                }
                let c = self.member_entry(*candidate)?;
                let d = &c.descriptor;
                let same_signature = d.kind == MemberKind::Method
                    && !d.is_static
                    && d.name == declared.name
                    && d.parameters.len() == declared.parameters.len()
                    && d
                        .parameters
                        .iter()
                        .zip(&declared.parameters)
                        .all(|(a, b)| a.param_type == b.param_type);
                if same_signature && matches!(c.implementation, Implementation::Body(Some(_))) {
                    return Ok(*candidate);
                }
            }
            current = entry.descriptor.base;
        }
        Ok(method)
    }

    // ------------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------------

    /// Register a type definition; on failure the registry is left unchanged
    pub fn define(&mut self, def: TypeDefinition) -> Result<TypeToken, DefinitionError> {
        let mark = self.mark();
        match self.build_type(def) {
            Ok(token) => Ok(token),
            Err(e) => {
                self.rollback(mark);
                Err(e)
            }
        }
    }

    fn build_type(&mut self, def: TypeDefinition) -> Result<TypeToken, DefinitionError> {
        let full_name = def.full_name();
        if self.names.contains_key(&full_name) {
            return Err(DefinitionError::DuplicateType(full_name));
        }

        let mut descriptor = TypeDescriptor::new(def.name.clone(), def.assembly.clone(), def.kind);
        descriptor.namespace = def.namespace.clone();
        descriptor.access = def.access;
        descriptor.is_abstract = def.is_abstract;
        descriptor.is_sealed = def.is_sealed;
        let token = self.push_type(descriptor);

        let type_params = self.push_placeholders(&def.generic_parameters, &def.assembly);
        let scope = Scope {
            type_params: &type_params,
            method_params: &[],
            context: &full_name,
        };
        let generic_parameters =
            self.resolve_generic_parameters(&def.generic_parameters, &type_params, &scope)?;

        let base = match (&def.base, def.kind) {
            (Some(r), TypeKind::Class) => {
                let base = self.resolve(r, &scope)?;
                let b = &self.type_entry(base)?.descriptor;
                if b.kind != TypeKind::Class || b.is_sealed {
                    return Err(DefinitionError::InvalidBase {
                        name: full_name.clone(),
                        base: b.full_name(),
                    });
                }
                Some(base)
            }
            (Some(r), _) => {
                let base = self.resolve(r, &scope)?;
                return Err(DefinitionError::InvalidBase {
                    name: full_name.clone(),
                    base: self.type_entry(base)?.descriptor.full_name(),
                });
            }
            (None, TypeKind::Class) => self.root,
            (None, TypeKind::Struct) => self.value_type,
            (None, _) => None,
        };

        let mut interfaces = Vec::with_capacity(def.interfaces.len());
        for r in &def.interfaces {
            let iface = self.resolve(r, &scope)?;
            let d = &self.type_entry(iface)?.descriptor;
            if d.kind != TypeKind::Interface {
                return Err(DefinitionError::InvalidBase {
                    name: full_name.clone(),
                    base: d.full_name(),
                });
            }
            interfaces.push(iface);
        }

        {
            let entry = &mut self.types[token.0 as usize];
            entry.descriptor.base = base;
            entry.descriptor.interfaces = interfaces;
            entry.descriptor.generic_parameters = generic_parameters;
        }
        self.names.insert(full_name.clone(), token);

        for field in &def.fields {
            let field_type = self.resolve(&field.field_type, &scope)?;
            let mut d = MemberDescriptor::new(field.name.clone(), MemberKind::Field, token, field_type);
            d.access = field.access;
            d.is_static = field.is_static;
            d.can_write = !field.is_readonly;
            let initial = if field.initial_value.is_null() {
                self.default_for(field_type)
            } else {
                field.initial_value.clone()
            };
            self.push_member(d, Implementation::Field, initial);
        }

        for property in &def.properties {
            let property_type = self.resolve(&property.property_type, &scope)?;
            let mut d = MemberDescriptor::new(
                property.name.clone(),
                MemberKind::Property,
                token,
                property_type,
            );
            d.access = property.access;
            d.is_static = property.is_static;
            d.can_read = property.readable;
            d.can_write = property.writable;
            let initial = self.default_for(property_type);
            self.push_member(
                d,
                Implementation::Property {
                    getter: property.getter.clone(),
                    setter: property.setter.clone(),
                },
                initial,
            );
        }

        let implicit_constructor = def.constructors.is_empty()
            && match def.kind {
                TypeKind::Class => !def.is_abstract,
                TypeKind::Struct => true,
                _ => false,
            };
        if implicit_constructor {
            let d = MemberDescriptor::new(".ctor", MemberKind::Constructor, token, token);
            self.push_member(d, Implementation::Body(None), Value::Null);
        }
        for ctor in &def.constructors {
            let mut d = MemberDescriptor::new(".ctor", MemberKind::Constructor, token, token);
            d.access = ctor.access;
            d.parameters = self.resolve_parameters(&ctor.parameters, &scope)?;
            self.push_member(d, Implementation::Body(ctor.body.clone()), Value::Null);
        }

        for method in &def.methods {
            let context = format!("{}.{}", full_name, method.name);
            let method_params = self.push_placeholders(&method.generic_parameters, &def.assembly);
            let method_scope = Scope {
                type_params: &type_params,
                method_params: &method_params,
                context: &context,
            };
            let return_type = self.resolve(&method.return_type, &method_scope)?;
            let mut d =
                MemberDescriptor::new(method.name.clone(), MemberKind::Method, token, return_type);
            d.access = method.access;
            d.is_static = method.is_static;
            d.modifiers = MethodModifiers {
                is_virtual: method.is_virtual || def.kind == TypeKind::Interface,
                is_abstract: method.is_abstract || def.kind == TypeKind::Interface,
                is_final: method.is_final,
            };
            d.parameters = self.resolve_parameters(&method.parameters, &method_scope)?;
            d.generic_parameters = self.resolve_generic_parameters(
                &method.generic_parameters,
                &method_params,
                &method_scope,
            )?;
            let body = if d.modifiers.is_abstract {
                None
            } else {
                method.body.clone()
            };
            self.push_member(d, Implementation::Body(body), Value::Null);
        }

        tracing::debug!(
            type_name = %full_name,
            token = token.0,
            members = self.types[token.0 as usize].members.len(),
            "defined type"
        );
        Ok(token)
    }

    fn push_placeholders(
        &mut self,
        params: &[GenericParameterDefinition],
        assembly: &str,
    ) -> Vec<(String, TypeToken)> {
        params
            .iter()
            .map(|p| {
                let d = TypeDescriptor::new(p.name.clone(), assembly, TypeKind::GenericParameter);
                (p.name.clone(), self.push_type(d))
            })
            .collect()
    }

    fn resolve_generic_parameters(
        &mut self,
        params: &[GenericParameterDefinition],
        placeholders: &[(String, TypeToken)],
        scope: &Scope<'_>,
    ) -> Result<Vec<GenericParameterDescriptor>, DefinitionError> {
        let mut out = Vec::with_capacity(params.len());
        for (position, (param, (_, type_token))) in params.iter().zip(placeholders).enumerate() {
            let mut constraints = Vec::with_capacity(param.constraints.len());
            for c in &param.constraints {
                constraints.push(match c {
                    ConstraintDefinition::Inherits { required, invert } => {
                        ConstraintDescriptor::Inherits {
                            required: self.resolve(required, scope)?,
                            invert: *invert,
                        }
                    }
                    ConstraintDefinition::Constructor { parameters } => {
                        let mut resolved = Vec::with_capacity(parameters.len());
                        for p in parameters {
                            resolved.push(self.resolve(p, scope)?);
                        }
                        ConstraintDescriptor::Constructor {
                            parameters: resolved,
                        }
                    }
                });
            }
            out.push(GenericParameterDescriptor {
                name: param.name.clone(),
                position,
                type_token: *type_token,
                constraints,
            });
        }
        Ok(out)
    }

    fn resolve_parameters(
        &mut self,
        params: &[ParameterDefinition],
        scope: &Scope<'_>,
    ) -> Result<Vec<ParameterDescriptor>, DefinitionError> {
        let mut out = Vec::with_capacity(params.len());
        for (position, p) in params.iter().enumerate() {
            out.push(ParameterDescriptor {
                name: p.name.clone(),
                position,
                param_type: self.resolve(&p.param_type, scope)?,
                default_value: p.default_value.clone(),
            });
        }
        Ok(out)
    }

    fn resolve(&mut self, r: &TypeRef, scope: &Scope<'_>) -> Result<TypeToken, DefinitionError> {
        match r {
            TypeRef::Token(t) => {
                self.type_entry(*t)
                    .map_err(|_| DefinitionError::UnknownType(*t))?;
                Ok(*t)
            }
            TypeRef::Param(name) => {
                scope
                    .lookup(name)
                    .ok_or_else(|| DefinitionError::UnknownGenericParameter {
                        name: name.clone(),
                        context: scope.context.to_string(),
                    })
            }
            TypeRef::Generic {
                definition,
                arguments,
            } => {
                let mut args = Vec::with_capacity(arguments.len());
                for a in arguments {
                    args.push(self.resolve(a, scope)?);
                }
                Ok(self.close_type(*definition, &args)?)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Generic closing
    // ------------------------------------------------------------------------

    /// Close a generic type definition, memoised by (definition, arguments)
    pub fn close_type(&mut self, def: TypeToken, args: &[TypeToken]) -> HostResult<TypeToken> {
        let key = (def, args.to_vec());
        if let Some(closed) = self.closed_types.get(&key) {
            return Ok(*closed);
        }

        let open = self.type_entry(def)?;
        let template = open.descriptor.clone();
        let template_members = open.members.clone();
        if !template.is_generic_definition() {
            return Err(HostError::ArgumentError(format!(
                "{} is not a generic type definition",
                template.full_name()
            )));
        }
        if template.generic_parameters.len() != args.len() {
            return Err(HostError::ArgumentError(format!(
                "{} expects {} type arguments, got {}",
                template.full_name(),
                template.generic_parameters.len(),
                args.len()
            )));
        }
        let mut arg_names = Vec::with_capacity(args.len());
        for a in args {
            arg_names.push(self.type_entry(*a)?.descriptor.full_name());
        }

        let mut descriptor = template.clone();
        descriptor.name = format!("{}<{}>", template.name, arg_names.join(", "));
        descriptor.type_arguments = args.to_vec();
        descriptor.generic_definition = Some(def);
        let closed = self.push_type(descriptor);
        self.closed_types.insert(key, closed);

        let mut map: FxHashMap<TypeToken, TypeToken> = template
            .generic_parameters
            .iter()
            .map(|p| p.type_token)
            .zip(args.iter().copied())
            .collect();
        map.insert(def, closed);

        let base = match template.base {
            Some(b) => Some(self.substitute(b, &map)?),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(template.interfaces.len());
        for i in &template.interfaces {
            interfaces.push(self.substitute(*i, &map)?);
        }
        {
            let entry = &mut self.types[closed.0 as usize];
            entry.descriptor.base = base;
            entry.descriptor.interfaces = interfaces;
        }

        for member in template_members {
            let source = self.member_entry(member)?;
            let mut d = source.descriptor.clone();
            let implementation = source.implementation.clone();
            let initial_value = source.initial_value.clone();
            d.declaring_type = closed;
            self.substitute_signature(&mut d, &map)?;
            self.push_member(d, implementation, initial_value);
        }
        self.register_name(closed);

        tracing::trace!(definition = def.0, closed = closed.0, "closed generic type");
        Ok(closed)
    }

    /// Close a generic method definition, memoised by (definition, arguments)
    pub fn close_method(
        &mut self,
        def: MemberToken,
        args: &[TypeToken],
    ) -> HostResult<MemberToken> {
        let key = (def, args.to_vec());
        if let Some(closed) = self.closed_methods.get(&key) {
            return Ok(*closed);
        }

        let source = self.member_entry(def)?;
        let template = source.descriptor.clone();
        let implementation = source.implementation.clone();
        if template.kind != MemberKind::Method || !template.is_generic_definition() {
            return Err(HostError::ArgumentError(format!(
                "{} is not a generic method definition",
                template.name
            )));
        }
        if template.generic_parameters.len() != args.len() {
            return Err(HostError::ArgumentError(format!(
                "{} expects {} type arguments, got {}",
                template.name,
                template.generic_parameters.len(),
                args.len()
            )));
        }
        for a in args {
            self.type_entry(*a)?;
        }

        let map: FxHashMap<TypeToken, TypeToken> = template
            .generic_parameters
            .iter()
            .map(|p| p.type_token)
            .zip(args.iter().copied())
            .collect();
        let mut d = template;
        d.type_arguments = args.to_vec();
        d.generic_definition = Some(def);
        self.substitute_signature(&mut d, &map)?;

        let token = MemberToken(self.members.len() as u32);
        self.members.push(MemberEntry {
            descriptor: d,
            implementation,
            initial_value: Value::Null,
        });
        self.closed_methods.insert(key, token);

        tracing::trace!(definition = def.0, closed = token.0, "closed generic method");
        Ok(token)
    }

    fn substitute_signature(
        &mut self,
        d: &mut MemberDescriptor,
        map: &FxHashMap<TypeToken, TypeToken>,
    ) -> HostResult<()> {
        d.member_type = self.substitute(d.member_type, map)?;
        for p in &mut d.parameters {
            p.param_type = self.substitute(p.param_type, map)?;
        }
        for gp in &mut d.generic_parameters {
            for c in &mut gp.constraints {
                match c {
                    ConstraintDescriptor::Inherits { required, .. } => {
                        *required = self.substitute(*required, map)?;
                    }
                    ConstraintDescriptor::Constructor { parameters } => {
                        for p in parameters.iter_mut() {
                            *p = self.substitute(*p, map)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Replace generic placeholders in `ty`, closing constructed types as needed
    fn substitute(
        &mut self,
        ty: TypeToken,
        map: &FxHashMap<TypeToken, TypeToken>,
    ) -> HostResult<TypeToken> {
        if let Some(mapped) = map.get(&ty) {
            return Ok(*mapped);
        }
        let d = &self.type_entry(ty)?.descriptor;
        let Some(definition) = d.generic_definition else {
            return Ok(ty);
        };
        let args = d.type_arguments.clone();
        let mut substituted = Vec::with_capacity(args.len());
        for a in &args {
            substituted.push(self.substitute(*a, map)?);
        }
        if substituted == args {
            Ok(ty)
        } else {
            self.close_type(definition, &substituted)
        }
    }
}
