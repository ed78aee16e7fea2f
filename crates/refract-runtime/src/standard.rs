//! Standard type universe
//!
//! The types every runtime starts with: the root `System.Object`,
//! `System.ValueType`, the primitive structs, `System.String` and the two
//! core interfaces. Registered directly against the registry tables since
//! the definition path itself relies on the root and value-type tokens.

use std::cmp::Ordering;
use std::sync::Arc;

use refract_sdk::{
    HostError, HostResult, MemberDescriptor, MemberKind, MethodModifiers, ParameterDescriptor,
    TypeDescriptor, TypeKind, TypeToken, Value,
};

use crate::definition::{CallFrame, NativeBody};
use crate::registry::{Implementation, Registry};

/// Tokens of the standard types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardTypes {
    /// `System.Object`, the root type
    pub object: TypeToken,
    /// `System.ValueType`, base of all structs
    pub value_type: TypeToken,
    /// `System.Void`
    pub void: TypeToken,
    /// `System.Boolean`
    pub boolean: TypeToken,
    /// `System.Int32`
    pub int32: TypeToken,
    /// `System.Int64`
    pub int64: TypeToken,
    /// `System.Double`
    pub double: TypeToken,
    /// `System.String`
    pub string: TypeToken,
    /// `System.IComparable`
    pub comparable: TypeToken,
    /// `System.IDisposable`
    pub disposable: TypeToken,
}

const CORE_ASSEMBLY: &str = "System.Runtime";

fn system(name: &str, kind: TypeKind) -> TypeDescriptor {
    let mut d = TypeDescriptor::new(name, CORE_ASSEMBLY, kind);
    d.namespace = Some("System".to_string());
    d
}

fn add_type(reg: &mut Registry, descriptor: TypeDescriptor) -> TypeToken {
    let token = reg.push_type(descriptor);
    reg.register_name(token);
    token
}

fn add_method(
    reg: &mut Registry,
    owner: TypeToken,
    name: &str,
    returns: TypeToken,
    params: &[(&str, TypeToken)],
    modifiers: MethodModifiers,
    body: Option<NativeBody>,
) {
    let mut d = MemberDescriptor::new(name, MemberKind::Method, owner, returns);
    d.modifiers = modifiers;
    d.parameters = params
        .iter()
        .enumerate()
        .map(|(position, (name, ty))| ParameterDescriptor {
            name: name.to_string(),
            position,
            param_type: *ty,
            default_value: None,
        })
        .collect();
    reg.push_member(d, Implementation::Body(body), Value::Null);
}

fn add_default_constructor(reg: &mut Registry, owner: TypeToken) {
    let d = MemberDescriptor::new(".ctor", MemberKind::Constructor, owner, owner);
    reg.push_member(d, Implementation::Body(None), Value::Null);
}

/// Three-way comparison of two primitive values (`null` sorts first)
pub(crate) fn compare_values(a: &Value, b: &Value) -> HostResult<i32> {
    let ordering = match (a, b) {
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Double(x), Value::Double(y)) => x.partial_cmp(y),
        (Value::Int(_) | Value::Long(_), Value::Int(_) | Value::Long(_)) => {
            a.as_i64().zip(b.as_i64()).map(|(x, y)| x.cmp(&y))
        }
        _ => None,
    };
    match ordering {
        Some(Ordering::Less) => Ok(-1),
        Some(Ordering::Equal) => Ok(0),
        Some(Ordering::Greater) => Ok(1),
        None => Err(HostError::ArgumentError(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn to_string_body(frame: &CallFrame<'_>) -> HostResult<Value> {
    match frame.receiver {
        Value::Object(obj) => Ok(Value::string(
            frame
                .runtime
                .type_name(obj.type_token())
                .unwrap_or_else(|| "object".to_string()),
        )),
        other => Ok(Value::string(other.to_string())),
    }
}

impl StandardTypes {
    /// Register the standard universe and return its tokens
    pub(crate) fn install(reg: &mut Registry) -> Self {
        let object = add_type(reg, system("Object", TypeKind::Class));
        reg.root = Some(object);

        let mut value_type = system("ValueType", TypeKind::Class);
        value_type.is_abstract = true;
        value_type.base = Some(object);
        let value_type = add_type(reg, value_type);
        reg.value_type = Some(value_type);

        let mut comparable = system("IComparable", TypeKind::Interface);
        comparable.is_abstract = true;
        let comparable = add_type(reg, comparable);
        let mut disposable = system("IDisposable", TypeKind::Interface);
        disposable.is_abstract = true;
        let disposable = add_type(reg, disposable);

        let primitive = |reg: &mut Registry, name: &str, interfaces: Vec<TypeToken>| {
            let mut d = system(name, TypeKind::Struct);
            d.is_sealed = true;
            d.base = Some(value_type);
            d.interfaces = interfaces;
            add_type(reg, d)
        };
        let void = primitive(reg, "Void", Vec::new());
        let boolean = primitive(reg, "Boolean", vec![comparable]);
        let int32 = primitive(reg, "Int32", vec![comparable]);
        let int64 = primitive(reg, "Int64", vec![comparable]);
        let double = primitive(reg, "Double", vec![comparable]);

        let mut string = system("String", TypeKind::Class);
        string.is_sealed = true;
        string.base = Some(object);
        string.interfaces = vec![comparable];
        let string = add_type(reg, string);

        reg.defaults.insert(boolean, Value::Bool(false));
        reg.defaults.insert(int32, Value::Int(0));
        reg.defaults.insert(int64, Value::Long(0));
        reg.defaults.insert(double, Value::Double(0.0));

        let virtual_ = MethodModifiers {
            is_virtual: true,
            ..MethodModifiers::default()
        };
        let abstract_ = MethodModifiers {
            is_virtual: true,
            is_abstract: true,
            is_final: false,
        };

        // System.Object
        add_default_constructor(reg, object);
        add_method(
            reg,
            object,
            "ToString",
            string,
            &[],
            virtual_,
            Some(Arc::new(to_string_body)),
        );
        add_method(
            reg,
            object,
            "Equals",
            boolean,
            &[("obj", object)],
            virtual_,
            Some(Arc::new(|frame: &CallFrame<'_>| {
                Ok(Value::Bool(*frame.receiver == frame.arg(0)))
            })),
        );

        // Interfaces
        add_method(
            reg,
            comparable,
            "CompareTo",
            int32,
            &[("obj", object)],
            abstract_,
            None,
        );
        add_method(reg, disposable, "Dispose", void, &[], abstract_, None);

        // Primitives
        for ty in [boolean, int32, int64, double, string] {
            if ty != string {
                add_default_constructor(reg, ty);
            }
            add_method(
                reg,
                ty,
                "CompareTo",
                int32,
                &[("obj", object)],
                virtual_,
                Some(Arc::new(|frame: &CallFrame<'_>| {
                    compare_values(frame.receiver, &frame.arg(0)).map(Value::Int)
                })),
            );
        }

        StandardTypes {
            object,
            value_type,
            void,
            boolean,
            int32,
            int64,
            double,
            string,
            comparable,
            disposable,
        }
    }

    /// Runtime type of a primitive value; `None` for null and objects
    pub fn primitive_type_of(&self, value: &Value) -> Option<TypeToken> {
        match value {
            Value::Bool(_) => Some(self.boolean),
            Value::Int(_) => Some(self.int32),
            Value::Long(_) => Some(self.int64),
            Value::Double(_) => Some(self.double),
            Value::Str(_) => Some(self.string),
            Value::Null | Value::Object(_) => None,
        }
    }
}
