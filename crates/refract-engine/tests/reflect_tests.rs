//! Integration tests for the reflection engine
//!
//! Runs the engine against the in-memory host with a small demo universe:
//! - Generic instantiation, constraint checking and the instantiation cache
//! - Generic argument inference
//! - Positional, named-bag and by-name dispatch
//! - Field and property access
//! - Structural equality and the wrapper cache
//! - Hierarchy queries and method filters
//!
//! # Running Tests
//! ```bash
//! RUST_LOG=refract_engine=debug cargo test -p refract-engine --test reflect_tests
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use refract_engine::{
    infer_type_arguments, join_named_arguments, AmbiguityPolicy, Constraint, EngineConfig,
    ErrorKind, InferencePolicy, Member, MemberWrapper, MethodQuery, MethodWrapper, ReflectError,
    ReflectionCache, Reflector, TypeWrapper,
};
use refract_runtime::{
    ConstructorDefinition, FieldDefinition, GenericParameterDefinition, InMemoryRuntime,
    MethodDefinition, ParameterDefinition, PropertyDefinition, StandardTypes, TypeDefinition,
    TypeRef,
};
use refract_sdk::{HostError, MemberKind, TypeToken, Value};

// ============================================================================
// Fixture
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Demo {
    rt: Arc<InMemoryRuntime>,
    std: StandardTypes,
    boxed: TypeToken,
    numeric: TypeToken,
    keyed: TypeToken,
    reference: TypeToken,
    factory: TypeToken,
    widget: TypeToken,
    gadget: TypeToken,
    point: TypeToken,
    animal: TypeToken,
    dog: TypeToken,
    shape: TypeToken,
    cube: TypeToken,
    greeter: TypeToken,
}

impl Demo {
    fn reflector(&self) -> Reflector {
        Reflector::new(self.rt.clone())
    }

    fn reflector_with(&self, config: EngineConfig) -> Reflector {
        Reflector::with_config(self.rt.clone(), config)
    }
}

fn type_argument_name(frame: &refract_runtime::CallFrame<'_>) -> Value {
    let name = frame
        .type_arguments
        .first()
        .and_then(|t| frame.runtime.type_name(*t))
        .unwrap_or_default();
    Value::string(name)
}

fn demo() -> Demo {
    init_tracing();
    let rt = Arc::new(InMemoryRuntime::new());
    let std = *rt.standard();

    let boxed = rt
        .define_type(
            TypeDefinition::class("Demo", "Box")
                .generic_parameter(GenericParameterDefinition::new("T"))
                .field(FieldDefinition::new("value", TypeRef::param("T")))
                .method(MethodDefinition::new("Get", TypeRef::param("T")).body(|frame| {
                    match frame.receiver.as_object() {
                        Some(obj) => Ok(obj.get("value").unwrap_or_default()),
                        None => Err(HostError::ArgumentError("no receiver".into())),
                    }
                })),
        )
        .unwrap();

    let numeric = rt
        .define_type(
            TypeDefinition::class("Demo", "Numeric")
                .generic_parameter(GenericParameterDefinition::new("T").inherits(std.value_type)),
        )
        .unwrap();

    let keyed = rt
        .define_type(
            TypeDefinition::class("Demo", "Keyed")
                .generic_parameter(GenericParameterDefinition::new("TKey"))
                .generic_parameter(
                    GenericParameterDefinition::new("TValue").inherits(std.value_type),
                ),
        )
        .unwrap();

    let reference = rt
        .define_type(
            TypeDefinition::class("Demo", "Reference")
                .generic_parameter(
                    GenericParameterDefinition::new("T").not_inherits(std.value_type),
                ),
        )
        .unwrap();

    let factory = rt
        .define_type(
            TypeDefinition::class("Demo", "Factory")
                .generic_parameter(GenericParameterDefinition::new("T").default_constructor()),
        )
        .unwrap();

    let widget = rt
        .define_type(TypeDefinition::class("Demo", "Widget"))
        .unwrap();

    let gadget = rt
        .define_type(
            TypeDefinition::class("Demo", "Gadget")
                .field(FieldDefinition::new("size", std.int32))
                .constructor(ConstructorDefinition::new().param("size", std.int32).body(
                    |frame| {
                        if let Some(obj) = frame.receiver.as_object() {
                            obj.set("size", frame.arg(0));
                        }
                        Ok(Value::Null)
                    },
                )),
        )
        .unwrap();

    let point = rt
        .define_type(
            TypeDefinition::structure("Demo", "Point")
                .field(FieldDefinition::new("x", std.int32))
                .field(FieldDefinition::new("y", std.int32))
                .constructor(
                    ConstructorDefinition::new()
                        .param("x", std.int32)
                        .param("y", std.int32)
                        .body(|frame| {
                            if let Some(obj) = frame.receiver.as_object() {
                                obj.set("x", frame.arg(0));
                                obj.set("y", frame.arg(1));
                            }
                            Ok(Value::Null)
                        }),
                ),
        )
        .unwrap();

    let animal = rt
        .define_type(
            TypeDefinition::class("Demo", "Animal")
                .field(FieldDefinition::new("name", std.string))
                .field(
                    FieldDefinition::new("kingdom", std.string)
                        .initial_value("Animalia")
                        .as_readonly(),
                )
                .property(PropertyDefinition::new("Legs", std.int32).read_only())
                .method(
                    MethodDefinition::new("Speak", std.string)
                        .as_virtual()
                        .body(|_| Ok(Value::string("..."))),
                ),
        )
        .unwrap();

    let dog = rt
        .define_type(
            TypeDefinition::class("Demo", "Dog").extends(animal).method(
                MethodDefinition::new("Speak", std.string)
                    .as_virtual()
                    .body(|_| Ok(Value::string("Woof"))),
            ),
        )
        .unwrap();

    let shape = rt
        .define_type(TypeDefinition::interface("Demo", "IShape"))
        .unwrap();
    let solid = rt
        .define_type(TypeDefinition::interface("Demo", "ISolid").implements(shape))
        .unwrap();
    let cube = rt
        .define_type(TypeDefinition::class("Demo", "Cube").implements(solid))
        .unwrap();

    let greeter = rt
        .define_type(
            TypeDefinition::class("Demo", "Greeter")
                .field(FieldDefinition::new("calls", std.int32).as_static())
                .method(
                    MethodDefinition::new("GetString", std.string)
                        .param("age", std.int32)
                        .param("name", std.string)
                        .as_static()
                        .body(|frame| {
                            let age: i32 = frame.arg_as(0)?;
                            let name: String = frame.arg_as(1)?;
                            Ok(Value::string(format!("Name: {}, Age: {}", name, age)))
                        }),
                )
                .method(
                    MethodDefinition::new("Greet", std.string)
                        .param("name", std.string)
                        .with_param(
                            ParameterDefinition::new("greeting", std.string).default_value("Hello"),
                        )
                        .as_static()
                        .body(|frame| {
                            let name: String = frame.arg_as(0)?;
                            let greeting: String = frame.arg_as(1)?;
                            Ok(Value::string(format!("{}, {}", greeting, name)))
                        }),
                )
                .method(
                    MethodDefinition::new("Echo", std.string)
                        .generic_parameter(GenericParameterDefinition::new("T"))
                        .param("value", TypeRef::param("T"))
                        .as_static()
                        .body(|frame| Ok(type_argument_name(frame))),
                )
                .method(
                    MethodDefinition::new("Pair", std.string)
                        .generic_parameter(GenericParameterDefinition::new("T"))
                        .param("first", TypeRef::param("T"))
                        .param("second", TypeRef::param("T"))
                        .as_static()
                        .body(|frame| Ok(type_argument_name(frame))),
                )
                .method(
                    MethodDefinition::new("Constrained", std.string)
                        .generic_parameter(
                            GenericParameterDefinition::new("T").inherits(std.value_type),
                        )
                        .param("value", TypeRef::param("T"))
                        .as_static()
                        .body(|frame| Ok(type_argument_name(frame))),
                )
                .method(
                    MethodDefinition::new("Format", std.string)
                        .param("value", std.int32)
                        .as_static()
                        .body(|frame| Ok(Value::string(format!("int:{}", frame.arg(0))))),
                )
                .method(
                    MethodDefinition::new("Format", std.string)
                        .param("value", std.string)
                        .as_static()
                        .body(|frame| Ok(Value::string(format!("string:{}", frame.arg(0))))),
                )
                .method(
                    MethodDefinition::new("Describe", std.string)
                        .param("value", std.int32)
                        .as_static()
                        .body(|_| Ok(Value::string("int"))),
                )
                .method(
                    MethodDefinition::new("Describe", std.string)
                        .param("value", std.object)
                        .as_static()
                        .body(|_| Ok(Value::string("object"))),
                )
                .method(
                    MethodDefinition::new("Count", std.int32)
                        .as_static()
                        .body(|_| Ok(Value::Int(3))),
                )
                .method(
                    MethodDefinition::new("Nothing", std.void)
                        .as_static()
                        .body(|_| Ok(Value::Null)),
                )
                .method(
                    MethodDefinition::new("Fail", std.int32)
                        .as_static()
                        .body(|_| Err(HostError::Invocation("boom".into()))),
                )
                .method(
                    MethodDefinition::new("Hello", std.string)
                        .body(|_| Ok(Value::string("hello"))),
                ),
        )
        .unwrap();

    Demo {
        rt,
        std,
        boxed,
        numeric,
        keyed,
        reference,
        factory,
        widget,
        gadget,
        point,
        animal,
        dog,
        shape,
        cube,
        greeter,
    }
}

fn method(ty: &TypeWrapper, name: &str) -> MethodWrapper {
    ty.methods_named(name)
        .unwrap()
        .into_iter()
        .next()
        .expect("method exists")
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Generic instantiation
// ============================================================================

mod instantiation {
    use super::*;

    #[test]
    fn test_make_generic_is_idempotent() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.boxed).unwrap();
        let int32 = r.wrap_type(d.std.int32).unwrap();

        let before = d.rt.metrics().snapshot().make_generic_type;
        let first = definition.make_generic(&[int32.clone()]).unwrap();
        let second = definition.make_generic(&[int32]).unwrap();

        assert!(first.same_instance(&second));
        assert_eq!(first, second);
        assert_eq!(first.full_name(), "Demo.Box<System.Int32>");
        assert_eq!(d.rt.metrics().snapshot().make_generic_type - before, 1);
        assert_eq!(definition.instantiation_count(), 1);
    }

    #[test]
    fn test_closed_type_reports_its_arguments() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.boxed).unwrap();
        let int32 = r.wrap_type(d.std.int32).unwrap();
        let closed = definition.make_generic(&[int32.clone()]).unwrap();

        assert!(definition.is_generic_type_definition());
        assert!(!closed.is_generic_type_definition());
        assert!(closed.is_constructed_generic_type());
        assert_eq!(closed.type_arguments().unwrap(), vec![int32.clone()]);
        assert_eq!(closed.generic_type_definition().unwrap(), Some(definition));

        let field = closed.field("value").unwrap().expect("field");
        assert_eq!(field.member_type().unwrap(), int32);
    }

    #[test]
    fn test_distinct_arguments_give_distinct_constructs() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.boxed).unwrap();
        let ints = definition
            .make_generic(&[r.wrap_type(d.std.int32).unwrap()])
            .unwrap();
        let strings = definition
            .make_generic(&[r.wrap_type(d.std.string).unwrap()])
            .unwrap();

        assert_ne!(ints, strings);
        assert_eq!(definition.instantiation_count(), 2);
    }

    #[test]
    fn test_closed_instance_method_runs() {
        let d = demo();
        let r = d.reflector();
        let closed = r
            .wrap_type(d.boxed)
            .unwrap()
            .make_generic(&[r.wrap_type(d.std.string).unwrap()])
            .unwrap();

        let instance = closed.create_instance(&[]).unwrap();
        closed
            .field("value")
            .unwrap()
            .unwrap()
            .set_value(&instance, Value::string("boxed"))
            .unwrap();
        let got = method(&closed, "Get").invoke(&instance, &[]).unwrap();
        assert_eq!(got.as_str(), Some("boxed"));
    }

    #[test]
    fn test_struct_constraint_rejects_object() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.numeric).unwrap();
        let object = r.wrap_type(d.std.object).unwrap();

        let before = d.rt.metrics().snapshot().make_generic_type;
        let err = definition.make_generic(&[object]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        match err {
            ReflectError::ConstraintViolation {
                position,
                parameter,
                argument,
                constraint,
            } => {
                assert_eq!(position, 0);
                assert_eq!(parameter, "T");
                assert_eq!(argument, "System.Object");
                assert_eq!(constraint, "must derive from System.ValueType");
            }
            other => panic!("expected ConstraintViolation, got {:?}", other),
        }
        assert_eq!(d.rt.metrics().snapshot().make_generic_type, before);
        assert_eq!(definition.instantiation_count(), 0);
    }

    #[test]
    fn test_struct_constraint_accepts_primitive_and_user_struct() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.numeric).unwrap();
        assert!(definition
            .make_generic(&[r.wrap_type(d.std.int32).unwrap()])
            .is_ok());
        assert!(definition
            .make_generic(&[r.wrap_type(d.point).unwrap()])
            .is_ok());
    }

    #[test]
    fn test_violation_names_offending_position() {
        let d = demo();
        let r = d.reflector();
        let string = r.wrap_type(d.std.string).unwrap();
        let err = r
            .wrap_type(d.keyed)
            .unwrap()
            .make_generic(&[string.clone(), string])
            .unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ConstraintViolation { position: 1, ref parameter, .. } if parameter == "TValue"
        ));
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_negated_constraint() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.reference).unwrap();

        let err = definition
            .make_generic(&[r.wrap_type(d.std.int32).unwrap()])
            .unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ConstraintViolation { ref constraint, .. }
                if constraint == "must not derive from System.ValueType"
        ));
        assert!(definition
            .make_generic(&[r.wrap_type(d.std.string).unwrap()])
            .is_ok());
    }

    #[test]
    fn test_constructor_shape_constraint() {
        let d = demo();
        let r = d.reflector();
        let definition = r.wrap_type(d.factory).unwrap();

        assert!(definition
            .make_generic(&[r.wrap_type(d.widget).unwrap()])
            .is_ok());

        let err = definition
            .make_generic(&[r.wrap_type(d.gadget).unwrap()])
            .unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ConstraintViolation { ref constraint, .. }
                if constraint == "must expose a parameterless constructor"
        ));
    }

    #[test]
    fn test_struct_always_satisfies_constructor_shape() {
        let d = demo();
        let r = d.reflector();
        let point = r.wrap_type(d.point).unwrap();
        assert!(point
            .constructors()
            .unwrap()
            .iter()
            .all(|c| !c.parameters().is_empty()));

        let param = &r.wrap_type(d.factory).unwrap().generic_parameters()[0];
        assert!(param.matches_constraints(&point).unwrap());
        assert!(r
            .wrap_type(d.factory)
            .unwrap()
            .make_generic(&[point])
            .is_ok());
    }

    #[test]
    fn test_generic_parameter_reports_constraints() {
        let d = demo();
        let r = d.reflector();
        let params = r.wrap_type(d.numeric).unwrap().generic_parameters();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), "T");
        assert_eq!(params[0].owner(), "Demo.Numeric");
        assert!(params[0].placeholder().unwrap().is_generic_parameter());

        let value_type = r.wrap_type(d.std.value_type).unwrap();
        assert_eq!(
            params[0].constraints().unwrap(),
            vec![Constraint::Inheritance {
                required: value_type,
                invert: false
            }]
        );

        let object = r.wrap_type(d.std.object).unwrap();
        let unmet = params[0].unmet_constraint(&object).unwrap().expect("unmet");
        assert_eq!(unmet.to_string(), "must derive from System.ValueType");
        assert!(params[0]
            .unmet_constraint(&r.wrap_type(d.std.double).unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_not_generic_definition() {
        let d = demo();
        let r = d.reflector();
        let int32 = r.wrap_type(d.std.int32).unwrap();

        let err = r
            .wrap_type(d.widget)
            .unwrap()
            .make_generic(&[int32.clone()])
            .unwrap_err();
        assert!(matches!(err, ReflectError::NotGenericDefinition { ref name } if name == "Demo.Widget"));

        let closed = r
            .wrap_type(d.boxed)
            .unwrap()
            .make_generic(&[int32.clone()])
            .unwrap();
        assert!(matches!(
            closed.make_generic(&[int32]),
            Err(ReflectError::NotGenericDefinition { .. })
        ));
    }

    #[test]
    fn test_type_argument_arity() {
        let d = demo();
        let r = d.reflector();
        let err = r.wrap_type(d.boxed).unwrap().make_generic(&[]).unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ArityMismatch {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_make_generic_method_is_cached() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let echo = method(&greeter, "Echo");
        let int32 = r.wrap_type(d.std.int32).unwrap();

        let before = d.rt.metrics().snapshot().make_generic_method;
        let first = echo.make_generic(&[int32.clone()]).unwrap();
        let second = echo.make_generic(&[int32.clone()]).unwrap();

        assert!(first.same_instance(&second));
        assert_eq!(d.rt.metrics().snapshot().make_generic_method - before, 1);
        assert!(echo.is_generic_method_definition());
        assert!(first.is_constructed_generic_method());
        assert_eq!(first.type_arguments().unwrap(), vec![int32.clone()]);
        assert_eq!(first.generic_method_definition().unwrap(), Some(echo.clone()));
        assert_eq!(first.parameters()[0].member_type().unwrap(), int32);
        assert_eq!(echo.instantiation_count(), 1);
    }

    #[test]
    fn test_generic_method_constraint_violation() {
        let d = demo();
        let r = d.reflector();
        let constrained = method(&r.wrap_type(d.greeter).unwrap(), "Constrained");
        let object = r.wrap_type(d.std.object).unwrap();
        let instance = d.rt.instantiate(d.std.object).unwrap();

        let explicit = constrained
            .invoke_generic(&Value::Null, &[object], &[instance.clone()])
            .unwrap_err();
        assert!(matches!(explicit, ReflectError::ConstraintViolation { position: 0, .. }));

        let inferred = constrained.invoke(&Value::Null, &[instance]).unwrap_err();
        assert!(matches!(inferred, ReflectError::ConstraintViolation { .. }));

        let ok = constrained.invoke(&Value::Null, &[Value::Int(1)]).unwrap();
        assert_eq!(ok.as_str(), Some("System.Int32"));
    }

    #[test]
    fn test_constraint_on_sibling_parameter() {
        let d = demo();
        let pair = d
            .rt
            .define_type(
                TypeDefinition::class("Demo", "Pair")
                    .generic_parameter(GenericParameterDefinition::new("T"))
                    .generic_parameter(
                        GenericParameterDefinition::new("U").inherits(TypeRef::param("T")),
                    ),
            )
            .unwrap();
        let r = d.reflector();
        let definition = r.wrap_type(pair).unwrap();
        let animal = r.wrap_type(d.animal).unwrap();
        let dog = r.wrap_type(d.dog).unwrap();

        let closed = definition.make_generic(&[animal.clone(), dog.clone()]).unwrap();
        assert_eq!(closed.full_name(), "Demo.Pair<Demo.Animal, Demo.Dog>");
        assert!(definition.make_generic(&[animal.clone(), animal.clone()]).is_ok());

        let err = definition.make_generic(&[dog, animal]).unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ConstraintViolation { position: 1, ref parameter, ref constraint, .. }
                if parameter == "U" && constraint == "must derive from Demo.Dog"
        ));
        assert_eq!(definition.instantiation_count(), 2);
    }

    #[test]
    fn test_constraint_on_constructed_requirement() {
        let d = demo();
        let equatable = d
            .rt
            .define_type(
                TypeDefinition::interface("Demo", "IEquatable")
                    .generic_parameter(GenericParameterDefinition::new("T")),
            )
            .unwrap();
        let matcher = d
            .rt
            .define_type(
                TypeDefinition::class("Demo", "IntMatcher")
                    .implements(TypeRef::generic(equatable, vec![TypeRef::Token(d.std.int32)])),
            )
            .unwrap();
        let sorted = d
            .rt
            .define_type(
                TypeDefinition::class("Demo", "Sorted")
                    .generic_parameter(GenericParameterDefinition::new("T"))
                    .generic_parameter(GenericParameterDefinition::new("TComparer").inherits(
                        TypeRef::generic(equatable, vec![TypeRef::param("T")]),
                    )),
            )
            .unwrap();
        let r = d.reflector();
        let definition = r.wrap_type(sorted).unwrap();
        let matcher = r.wrap_type(matcher).unwrap();

        assert!(definition
            .make_generic(&[r.wrap_type(d.std.int32).unwrap(), matcher.clone()])
            .is_ok());
        let err = definition
            .make_generic(&[r.wrap_type(d.std.string).unwrap(), matcher])
            .unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ConstraintViolation { ref constraint, .. }
                if constraint == "must derive from Demo.IEquatable<System.String>"
        ));
    }

    #[test]
    fn test_generic_parameter_member_contract() {
        let d = demo();
        let r = d.reflector();
        let numeric = r.wrap_type(d.numeric).unwrap();
        let param = numeric.generic_parameters().remove(0);
        assert_eq!(Member::name(&param), "T");
        assert!(param.member_type().unwrap().is_generic_parameter());
        assert_eq!(param.declaring_type().unwrap(), numeric);

        let greeter = r.wrap_type(d.greeter).unwrap();
        let echo = method(&greeter, "Echo");
        let param = echo.generic_parameters().remove(0);
        assert_eq!(param.owner(), "Demo.Greeter.Echo");
        assert_eq!(param.declaring_type().unwrap(), greeter);
    }
}

// ============================================================================
// Generic inference
// ============================================================================

mod inference {
    use super::*;

    #[test]
    fn test_infers_int32_and_string() {
        let d = demo();
        let r = d.reflector();
        let echo = method(&r.wrap_type(d.greeter).unwrap(), "Echo");

        let from_int = echo.invoke(&Value::Null, &[Value::Int(5)]).unwrap();
        assert_eq!(from_int.as_str(), Some("System.Int32"));

        let from_str = echo.invoke(&Value::Null, &[Value::string("Hi!")]).unwrap();
        assert_eq!(from_str.as_str(), Some("System.String"));
        assert_eq!(echo.instantiation_count(), 2);
    }

    #[test]
    fn test_infer_type_arguments() {
        let d = demo();
        let r = d.reflector();
        let echo = method(&r.wrap_type(d.greeter).unwrap(), "Echo");
        let inferred = infer_type_arguments(&echo, &[Value::Long(7)]).unwrap();
        assert_eq!(inferred, vec![r.wrap_type(d.std.int64).unwrap()]);
    }

    #[test]
    fn test_null_argument_does_not_infer() {
        let d = demo();
        let r = d.reflector();
        let echo = method(&r.wrap_type(d.greeter).unwrap(), "Echo");
        let err = echo.invoke(&Value::Null, &[Value::Null]).unwrap_err();
        assert!(matches!(
            err,
            ReflectError::UninferredTypeParameter { ref parameter, .. } if parameter == "T"
        ));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let d = demo();
        let r = d.reflector();
        let pair = method(&r.wrap_type(d.greeter).unwrap(), "Pair");
        let result = pair
            .invoke(&Value::Null, &[Value::Int(1), Value::string("two")])
            .unwrap();
        assert_eq!(result.as_str(), Some("System.Int32"));

        let null_first = pair
            .invoke(&Value::Null, &[Value::Null, Value::string("two")])
            .unwrap();
        assert_eq!(null_first.as_str(), Some("System.String"));
    }

    #[test]
    fn test_require_consistent_inference() {
        let d = demo();
        let r = d.reflector_with(EngineConfig {
            inference: InferencePolicy::RequireConsistent,
            ..EngineConfig::default()
        });
        let pair = method(&r.wrap_type(d.greeter).unwrap(), "Pair");

        let err = pair
            .invoke(&Value::Null, &[Value::Int(1), Value::string("two")])
            .unwrap_err();
        match err {
            ReflectError::InconsistentInference {
                parameter,
                first,
                conflicting,
                ..
            } => {
                assert_eq!(parameter, "T");
                assert_eq!(first, "System.Int32");
                assert_eq!(conflicting, "System.String");
            }
            other => panic!("expected InconsistentInference, got {:?}", other),
        }

        assert!(pair
            .invoke(&Value::Null, &[Value::Int(1), Value::Int(2)])
            .is_ok());
    }
}

// ============================================================================
// Dispatch
// ============================================================================

mod dispatch {
    use super::*;

    #[test]
    fn test_named_bag_get_string() {
        let d = demo();
        let r = d.reflector();
        let get_string = method(&r.wrap_type(d.greeter).unwrap(), "GetString");
        let bag = d.rt.anonymous(&[
            ("age", Value::Int(10)),
            ("name", Value::string("My Name")),
        ]);

        let text = get_string.invoke_named(&Value::Null, &bag).unwrap();
        assert_eq!(text.as_str(), Some("Name: My Name, Age: 10"));
    }

    #[test]
    fn test_named_bag_ignores_member_order_and_extras() {
        let d = demo();
        let r = d.reflector();
        let get_string = method(&r.wrap_type(d.greeter).unwrap(), "GetString");
        let bag = d.rt.anonymous(&[
            ("mood", Value::string("cheerful")),
            ("name", Value::string("Ada")),
            ("age", Value::Int(36)),
        ]);
        let text = get_string.invoke_named(&Value::Null, &bag).unwrap();
        assert_eq!(text.as_str(), Some("Name: Ada, Age: 36"));
    }

    #[test]
    fn test_named_bag_missing_required_parameter() {
        let d = demo();
        let r = d.reflector();
        let get_string = method(&r.wrap_type(d.greeter).unwrap(), "GetString");
        let bag = d.rt.anonymous(&[("name", Value::string("Ada"))]);
        let err = get_string.invoke_named(&Value::Null, &bag).unwrap_err();
        assert!(matches!(err, ReflectError::ArityMismatch { expected: 2, .. }));
    }

    #[test]
    fn test_named_bag_fills_defaults() {
        let d = demo();
        let r = d.reflector();
        let greet = method(&r.wrap_type(d.greeter).unwrap(), "Greet");
        let bag = d.rt.anonymous(&[("name", Value::string("Ada"))]);
        let text = greet.invoke_named(&Value::Null, &bag).unwrap();
        assert_eq!(text.as_str(), Some("Hello, Ada"));
    }

    #[test]
    fn test_null_bag_is_absent() {
        let d = demo();
        let r = d.reflector();
        let greet = method(&r.wrap_type(d.greeter).unwrap(), "Greet");
        let err = greet.invoke_named(&Value::Null, &Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);
    }

    #[test]
    fn test_join_named_arguments() {
        let d = demo();
        let r = d.reflector();
        let get_string = method(&r.wrap_type(d.greeter).unwrap(), "GetString");
        let named = vec![
            ("name".to_string(), Value::string("Ada")),
            ("extra".to_string(), Value::Bool(true)),
            ("age".to_string(), Value::Int(36)),
        ];

        let joined = join_named_arguments(&get_string.parameters(), &named);
        let names: Vec<&str> = joined.iter().map(|(p, _)| p.name()).collect();
        assert_eq!(names, vec!["age", "name"]);
        assert_eq!(joined[0].1, Value::Int(36));
        assert_eq!(joined[1].1, Value::string("Ada"));
    }

    #[test]
    fn test_positional_defaults_and_arity() {
        let d = demo();
        let r = d.reflector();
        let greet = method(&r.wrap_type(d.greeter).unwrap(), "Greet");
        assert_eq!(greet.required_parameter_count(), 1);
        assert!(greet.parameters()[1].has_default_value());

        let short = greet.invoke(&Value::Null, &[Value::string("Ada")]).unwrap();
        assert_eq!(short.as_str(), Some("Hello, Ada"));

        let full = greet
            .invoke(&Value::Null, &[Value::string("Ada"), Value::string("Hi")])
            .unwrap();
        assert_eq!(full.as_str(), Some("Hi, Ada"));

        assert!(matches!(
            greet.invoke(&Value::Null, &[]),
            Err(ReflectError::ArityMismatch {
                expected: 2,
                actual: 0,
                ..
            })
        ));
        assert!(matches!(
            greet.invoke(
                &Value::Null,
                &[Value::string("a"), Value::string("b"), Value::string("c")]
            ),
            Err(ReflectError::ArityMismatch { actual: 3, .. })
        ));
    }

    #[test]
    fn test_instance_method_requires_receiver() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let hello = method(&greeter, "Hello");

        let err = hello.invoke(&Value::Null, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);

        let instance = greeter.create_instance(&[]).unwrap();
        assert_eq!(
            hello.invoke(&instance, &[]).unwrap().as_str(),
            Some("hello")
        );
    }

    #[test]
    fn test_generic_instance_method_checks_receiver_first() {
        let d = demo();
        let inspector = d
            .rt
            .define_type(
                TypeDefinition::class("Demo", "Inspector").method(
                    MethodDefinition::new("Inspect", d.std.string)
                        .generic_parameter(
                            GenericParameterDefinition::new("T").inherits(d.std.value_type),
                        )
                        .param("value", TypeRef::param("T"))
                        .body(|frame| Ok(type_argument_name(frame))),
                ),
            )
            .unwrap();
        let r = d.reflector();
        let ty = r.wrap_type(inspector).unwrap();
        let inspect = method(&ty, "Inspect");
        let int32 = r.wrap_type(d.std.int32).unwrap();
        let before = d.rt.metrics().snapshot().make_generic_method;

        let err = inspect.invoke(&Value::Null, &[Value::Int(5)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);
        let err = inspect.invoke(&Value::Null, &[Value::from("s")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);
        let err = inspect
            .invoke_generic(&Value::Null, &[int32.clone()], &[Value::Int(5)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);
        let err = inspect
            .invoke_as(&Value::Null, Some(&[int32][..]), &[Value::Int(5)], String::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentAbsent);

        assert_eq!(d.rt.metrics().snapshot().make_generic_method, before);
        assert_eq!(inspect.instantiation_count(), 0);

        let instance = ty.create_instance(&[]).unwrap();
        let name = inspect.invoke(&instance, &[Value::Int(5)]).unwrap();
        assert_eq!(name.as_str(), Some("System.Int32"));
        assert_eq!(inspect.instantiation_count(), 1);
    }

    #[test]
    fn test_overload_resolution_by_argument_type() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();

        let int = greeter
            .invoke_method(&Value::Null, "Format", &[Value::Int(5)])
            .unwrap();
        assert_eq!(int.as_str(), Some("int:5"));

        let string = greeter
            .invoke_method(&Value::Null, "Format", &[Value::string("x")])
            .unwrap();
        assert_eq!(string.as_str(), Some("string:x"));
    }

    #[test]
    fn test_null_argument_selects_reference_parameter() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let found = greeter.find_method("Format", &[Value::Null]).unwrap();
        assert_eq!(found.parameters()[0].type_name(), "System.String");
    }

    #[test]
    fn test_missing_method_names_signature() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let err = greeter
            .invoke_method(&Value::Null, "Format", &[Value::Bool(true)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMember);
        assert!(matches!(
            err,
            ReflectError::MemberNotFound { ref signature }
                if signature == "Demo.Greeter.Format(System.Boolean)"
        ));

        assert!(matches!(
            greeter.invoke_method(&Value::Null, "Missing", &[Value::Null]),
            Err(ReflectError::MemberNotFound { ref signature }) if signature == "Demo.Greeter.Missing(null)"
        ));
    }

    #[test]
    fn test_ambiguous_overload_rejected() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();

        let err = greeter
            .invoke_method(&Value::Null, "Describe", &[Value::Int(5)])
            .unwrap_err();
        assert!(matches!(err, ReflectError::AmbiguousMatch { candidates: 2, .. }));

        let object = greeter
            .invoke_method(&Value::Null, "Describe", &[Value::Bool(true)])
            .unwrap();
        assert_eq!(object.as_str(), Some("object"));
    }

    #[test]
    fn test_ambiguous_overload_first_declared() {
        let d = demo();
        let r = d.reflector_with(EngineConfig {
            ambiguity: AmbiguityPolicy::FirstDeclared,
            ..EngineConfig::default()
        });
        let greeter = r.wrap_type(d.greeter).unwrap();
        let result = greeter
            .invoke_method(&Value::Null, "Describe", &[Value::Int(5)])
            .unwrap();
        assert_eq!(result.as_str(), Some("int"));
    }

    #[test]
    fn test_invoke_as_converts_result() {
        let d = demo();
        let r = d.reflector();
        let count = method(&r.wrap_type(d.greeter).unwrap(), "Count");
        let n: i32 = count.invoke_as(&Value::Null, None, &[], -1).unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn test_invoke_as_default_for_void() {
        let d = demo();
        let r = d.reflector();
        let nothing = method(&r.wrap_type(d.greeter).unwrap(), "Nothing");
        let text = nothing
            .invoke_as(&Value::Null, None, &[], "fallback".to_string())
            .unwrap();
        assert_eq!(text, "fallback");
    }

    #[test]
    fn test_invoke_as_result_mismatch() {
        let d = demo();
        let r = d.reflector();
        let count = method(&r.wrap_type(d.greeter).unwrap(), "Count");
        let err = count
            .invoke_as(&Value::Null, None, &[], String::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeArgument);
        assert!(matches!(
            err,
            ReflectError::ResultTypeMismatch {
                source: HostError::TypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invoke_as_with_type_arguments() {
        let d = demo();
        let r = d.reflector();
        let echo = method(&r.wrap_type(d.greeter).unwrap(), "Echo");
        let double = r.wrap_type(d.std.double).unwrap();
        let name: String = echo
            .invoke_as(
                &Value::Null,
                Some(&[double][..]),
                &[Value::Double(1.5)],
                String::new(),
            )
            .unwrap();
        assert_eq!(name, "System.Double");
    }

    #[test]
    fn test_callee_error_passes_through() {
        let d = demo();
        let r = d.reflector();
        let fail = method(&r.wrap_type(d.greeter).unwrap(), "Fail");
        let err = fail.invoke(&Value::Null, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Host);
        assert!(matches!(err, ReflectError::Host(HostError::Invocation(ref m)) if m == "boom"));
    }

    #[test]
    fn test_virtual_dispatch_through_base_method() {
        let d = demo();
        let r = d.reflector();
        let animal = r.wrap_type(d.animal).unwrap();
        let dog = r.wrap_type(d.dog).unwrap();
        let rex = dog.create_instance(&[]).unwrap();

        let speak = method(&animal, "Speak");
        assert_eq!(speak.invoke(&rex, &[]).unwrap().as_str(), Some("Woof"));

        let speaks = dog.methods_named("Speak").unwrap();
        assert_eq!(speaks.len(), 1);
        assert_eq!(speaks[0].declaring_type().unwrap(), dog);
        assert_eq!(
            dog.invoke_method(&rex, "Speak", &[]).unwrap().as_str(),
            Some("Woof")
        );
    }

    #[test]
    fn test_interface_dispatch() {
        let d = demo();
        let r = d.reflector();
        let comparable = r.wrap_type(d.std.comparable).unwrap();
        let compare_to = method(&comparable, "CompareTo");
        let result = compare_to
            .invoke(&Value::Int(5), &[Value::Int(3)])
            .unwrap();
        assert_eq!(result, Value::Int(1));
    }

    #[test]
    fn test_create_instance_resolves_constructor() {
        let d = demo();
        let r = d.reflector();
        let gadget = r.wrap_type(d.gadget).unwrap();
        let instance = gadget.create_instance(&[Value::Int(7)]).unwrap();
        let size = gadget.field("size").unwrap().unwrap();
        assert_eq!(size.get_value(&instance).unwrap(), Value::Int(7));

        assert!(matches!(
            gadget.create_instance(&[]),
            Err(ReflectError::MemberNotFound { ref signature }) if signature == "Demo.Gadget..ctor()"
        ));

        let point = r.wrap_type(d.point).unwrap();
        let p = point.create_instance(&[Value::Int(1), Value::Int(2)]).unwrap();
        let y = point.field("y").unwrap().unwrap();
        assert_eq!(y.get_value(&p).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_invoke_method_named() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let bag = d.rt.anonymous(&[
            ("greeting", Value::string("Hey")),
            ("name", Value::string("Ada")),
        ]);
        let text = greeter
            .invoke_method_named(&Value::Null, "Greet", &bag)
            .unwrap();
        assert_eq!(text.as_str(), Some("Hey, Ada"));

        let unmatched = d.rt.anonymous(&[("nobody", Value::Int(0))]);
        assert!(matches!(
            greeter.invoke_method_named(&Value::Null, "Greet", &unmatched),
            Err(ReflectError::MemberNotFound { .. })
        ));
    }
}

// ============================================================================
// Fields and properties
// ============================================================================

mod storage {
    use super::*;

    #[test]
    fn test_field_round_trip() {
        let d = demo();
        let r = d.reflector();
        let animal = r.wrap_type(d.animal).unwrap();
        let instance = animal.create_instance(&[]).unwrap();
        let name = animal.field("name").unwrap().unwrap();

        name.set_value(&instance, Value::string("Rex")).unwrap();
        assert_eq!(name.get_value(&instance).unwrap(), Value::string("Rex"));
    }

    #[test]
    fn test_readonly_field_rejects_write() {
        let d = demo();
        let r = d.reflector();
        let animal = r.wrap_type(d.animal).unwrap();
        let instance = animal.create_instance(&[]).unwrap();
        let kingdom = animal.field("kingdom").unwrap().unwrap();

        assert!(kingdom.is_readonly());
        assert_eq!(
            kingdom.get_value(&instance).unwrap(),
            Value::string("Animalia")
        );
        assert!(matches!(
            kingdom.set_value(&instance, Value::string("Plantae")),
            Err(ReflectError::AccessDenied {
                operation: "write",
                ..
            })
        ));
    }

    #[test]
    fn test_read_only_property() {
        let d = demo();
        let r = d.reflector();
        let animal = r.wrap_type(d.animal).unwrap();
        let instance = animal.create_instance(&[]).unwrap();
        let legs = animal.property("Legs").unwrap().unwrap();

        assert!(legs.can_read());
        assert!(!legs.can_write());
        assert_eq!(legs.get_value(&instance).unwrap(), Value::Int(0));
        assert!(matches!(
            legs.set_value(&instance, Value::Int(4)),
            Err(ReflectError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_inherited_field_on_derived_instance() {
        let d = demo();
        let r = d.reflector();
        let dog = r.wrap_type(d.dog).unwrap();
        let rex = dog.create_instance(&[]).unwrap();
        let name = dog.field("name").unwrap().expect("inherited field");
        name.set_value(&rex, Value::string("Rex")).unwrap();
        assert_eq!(name.get_value(&rex).unwrap(), Value::string("Rex"));
    }

    #[test]
    fn test_static_field_ignores_target() {
        let d = demo();
        let r = d.reflector();
        let calls = r.wrap_type(d.greeter).unwrap().field("calls").unwrap().unwrap();
        assert!(calls.is_static());
        calls.set_value(&Value::Null, Value::Int(5)).unwrap();
        assert_eq!(calls.get_value(&Value::Null).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_instance_field_requires_target() {
        let d = demo();
        let r = d.reflector();
        let name = r.wrap_type(d.animal).unwrap().field("name").unwrap().unwrap();
        assert_eq!(
            name.get_value(&Value::Null).unwrap_err().kind(),
            ErrorKind::ArgumentAbsent
        );
    }
}

// ============================================================================
// Equality and caching
// ============================================================================

mod equality {
    use super::*;

    #[test]
    fn test_wrappers_from_independent_caches_are_equal() {
        let d = demo();
        let a = d.reflector().wrap_type(d.std.int32).unwrap();
        let b = d.reflector().wrap_type(d.std.int32).unwrap();

        assert!(!a.same_instance(&b));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_members_from_independent_caches_are_equal() {
        let d = demo();
        let a = method(&d.reflector().wrap_type(d.greeter).unwrap(), "GetString");
        let b = method(&d.reflector().wrap_type(d.greeter).unwrap(), "GetString");

        assert!(!a.same_instance(&b));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.parameters(), b.parameters());
    }

    #[test]
    fn test_distinct_types_differ() {
        let d = demo();
        let r = d.reflector();
        let set: HashSet<TypeWrapper> = [d.std.int32, d.std.int64, d.std.int32]
            .iter()
            .map(|t| r.wrap_type(*t).unwrap())
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_overloads_differ() {
        let d = demo();
        let r = d.reflector();
        let formats = r.wrap_type(d.greeter).unwrap().methods_named("Format").unwrap();
        assert_eq!(formats.len(), 2);
        assert_ne!(formats[0], formats[1]);
    }

    #[test]
    fn test_wrap_type_is_cached() {
        let d = demo();
        let r = d.reflector();
        let a = r.wrap_type(d.widget).unwrap();
        let b = r.wrap_type(d.widget).unwrap();
        assert!(a.same_instance(&b));

        let stats = r.cache_stats();
        assert!(stats.hits >= 1);
        assert!(stats.types >= 2);
    }

    #[test]
    fn test_shared_cache_shares_instances() {
        let d = demo();
        let cache = Arc::new(ReflectionCache::new());
        let a = Reflector::with_cache(d.rt.clone(), cache.clone(), EngineConfig::default());
        let b = Reflector::with_cache(d.rt.clone(), cache.clone(), EngineConfig::default());

        let x = a.wrap_type(d.boxed).unwrap();
        let y = b.wrap_type(d.boxed).unwrap();
        assert!(x.same_instance(&y));

        let int32 = a.wrap_type(d.std.int32).unwrap();
        let closed_x = x.make_generic(&[int32.clone()]).unwrap();
        let closed_y = y.make_generic(&[int32]).unwrap();
        assert!(closed_x.same_instance(&closed_y));

        cache.clear();
        assert_eq!(cache.stats().types, 0);
    }

    #[test]
    fn test_wrap_member_by_kind() {
        let d = demo();
        let r = d.reflector();
        let animal = r.wrap_type(d.animal).unwrap();
        let kinds: Vec<MemberKind> = animal
            .declared_members()
            .unwrap()
            .iter()
            .map(|m| m.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                MemberKind::Field,
                MemberKind::Field,
                MemberKind::Property,
                MemberKind::Constructor,
                MemberKind::Method,
            ]
        );

        let speak = method(&animal, "Speak");
        let wrapped = r.wrap_member(speak.token()).unwrap();
        assert!(matches!(wrapped, MemberWrapper::Method(ref m) if *m == speak));
        assert_eq!(wrapped.name(), "Speak");
        assert!(wrapped.as_method().is_some());
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

mod hierarchy {
    use super::*;

    #[test]
    fn test_base_chain() {
        let d = demo();
        let r = d.reflector();
        let dog = r.wrap_type(d.dog).unwrap();
        let animal = r.wrap_type(d.animal).unwrap();

        assert_eq!(dog.base_type().unwrap(), Some(animal.clone()));
        let names: Vec<String> = dog
            .hierarchy()
            .unwrap()
            .iter()
            .map(|t| t.full_name().to_string())
            .collect();
        assert_eq!(names, vec!["Demo.Dog", "Demo.Animal", "System.Object"]);

        assert!(dog.inherits_from(&animal).unwrap());
        assert!(!animal.inherits_from(&dog).unwrap());
        assert!(animal.is_assignable_from(&dog).unwrap());
        assert_eq!(dog.identity().base.as_deref(), Some("Demo.Animal"));
    }

    #[test]
    fn test_everything_derives_from_root() {
        let d = demo();
        let r = d.reflector();
        let root = r.root_type().unwrap();
        for ty in [d.std.int32, d.std.string, d.shape, d.widget] {
            assert!(r.wrap_type(ty).unwrap().inherits_from(&root).unwrap());
        }
    }

    #[test]
    fn test_interface_inheritance() {
        let d = demo();
        let r = d.reflector();
        let comparable = r.wrap_type(d.std.comparable).unwrap();
        let shape = r.wrap_type(d.shape).unwrap();

        assert!(r.wrap_type(d.std.int32).unwrap().inherits_from(&comparable).unwrap());
        assert!(r.wrap_type(d.std.string).unwrap().inherits_from(&comparable).unwrap());
        assert!(!r.wrap_type(d.widget).unwrap().inherits_from(&comparable).unwrap());

        let cube = r.wrap_type(d.cube).unwrap();
        assert!(cube.inherits_from(&shape).unwrap());
        assert!(shape.is_interface());
        assert_eq!(shape.base_type().unwrap(), None);
    }

    #[test]
    fn test_type_attributes() {
        let d = demo();
        let r = d.reflector();
        let int32 = r.wrap_type(d.std.int32).unwrap();
        assert!(int32.is_value_type());
        assert!(int32.is_sealed());
        assert_eq!(int32.namespace(), Some("System"));
        assert_eq!(int32.name(), "Int32");
        assert_eq!(int32.to_string(), "System.Int32");

        let point = r.wrap_type(d.point).unwrap();
        assert!(point.is_value_type());
        assert_eq!(point.assembly(), "app");
    }

    #[test]
    fn test_inherited_members_follow_config() {
        let d = demo();
        let with = d.reflector().wrap_type(d.widget).unwrap();
        let names: Vec<String> = with
            .methods()
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert!(names.contains(&"ToString".to_string()));

        let without = d
            .reflector_with(EngineConfig {
                include_inherited_members: false,
                ..EngineConfig::default()
            })
            .wrap_type(d.widget)
            .unwrap();
        assert!(without.methods().unwrap().is_empty());
    }
}

// ============================================================================
// Queries
// ============================================================================

mod queries {
    use super::*;

    #[test]
    fn test_method_filters() {
        let d = demo();
        let r = d.reflector();
        let greeter = r.wrap_type(d.greeter).unwrap();
        let int32 = r.wrap_type(d.std.int32).unwrap();
        let string = r.wrap_type(d.std.string).unwrap();
        let methods = greeter.methods().unwrap();

        assert_eq!(methods.named("Format").len(), 2);
        assert_eq!(
            methods
                .named("Format")
                .with_parameter_types(&[int32.clone()])
                .len(),
            1
        );
        assert_eq!(
            methods
                .with_signature("Format", &string, &[int32.clone()])
                .unwrap()
                .len(),
            1
        );
        assert!(methods
            .with_signature("Format", &int32, &[int32.clone()])
            .unwrap()
            .is_empty());

        let generic: Vec<String> = methods
            .generic_only()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(generic, vec!["Echo", "Pair", "Constrained"]);
    }

    #[test]
    fn test_signature_rendering() {
        let d = demo();
        let r = d.reflector();
        let get_string = method(&r.wrap_type(d.greeter).unwrap(), "GetString");
        assert_eq!(
            get_string.signature(),
            "Demo.Greeter.GetString(System.Int32, System.String)"
        );
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_from_manifest_drives_dispatch() {
        let d = demo();
        let config = EngineConfig::from_toml_str(
            r#"
            [reflect]
            ambiguity = "first_declared"
            "#,
        )
        .unwrap();
        let r = d.reflector_with(config);
        let result = r
            .wrap_type(d.greeter)
            .unwrap()
            .invoke_method(&Value::Null, "Describe", &[Value::Int(1)])
            .unwrap();
        assert_eq!(result.as_str(), Some("int"));
    }

    #[test]
    fn test_config_serializes_snake_case() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["ambiguity"], "reject");
        assert_eq!(json["inference"], "first_wins");
        assert_eq!(json["include_inherited_members"], true);
    }
}
