//! Constraint engine
//!
//! Two constraint shapes cover every generic-parameter restriction:
//!
//! - **Inheritance**: the argument must derive from (or implement) a type.
//!   Negation expresses "must not"; `where T: struct` is inheritance from
//!   `System.ValueType` and `where T: class` is its negation.
//! - **Constructor shape**: the argument must expose a constructor with a
//!   given parameter list. Value types always satisfy it.
//!
//! Matching reports `false` for an unsatisfied candidate; only host
//! failures surface as errors.

use std::fmt;

use refract_sdk::ConstraintDescriptor;

use super::reflector::Reflector;
use super::types::TypeWrapper;
use crate::error::ReflectResult;

/// Requirement on a generic type argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Argument must (or, inverted, must not) derive from `required`
    Inheritance {
        /// Required base type or interface
        required: TypeWrapper,
        /// Negate the requirement
        invert: bool,
    },
    /// Argument must expose a constructor with these parameter types
    ConstructorShape {
        /// Parameter types in order
        parameters: Vec<TypeWrapper>,
    },
}

impl Constraint {
    pub(crate) fn from_descriptor(
        descriptor: &ConstraintDescriptor,
        reflector: &Reflector,
    ) -> ReflectResult<Self> {
        Ok(match descriptor {
            ConstraintDescriptor::Inherits { required, invert } => Constraint::Inheritance {
                required: reflector.wrap_type(*required)?,
                invert: *invert,
            },
            ConstraintDescriptor::Constructor { parameters } => Constraint::ConstructorShape {
                parameters: parameters
                    .iter()
                    .map(|p| reflector.wrap_type(*p))
                    .collect::<ReflectResult<_>>()?,
            },
        })
    }

    /// Check if `candidate` satisfies this constraint
    pub fn matches(&self, candidate: &TypeWrapper) -> ReflectResult<bool> {
        match self {
            Constraint::Inheritance { required, invert } => {
                Ok(candidate.inherits_from(required)? != *invert)
            }
            Constraint::ConstructorShape { parameters } => {
                if candidate.is_value_type() {
                    return Ok(true);
                }
                for ctor in candidate.constructors()? {
                    let types = &ctor.data.descriptor.parameters;
                    let same = types.len() == parameters.len()
                        && types
                            .iter()
                            .zip(parameters)
                            .all(|(p, required)| p.param_type == required.token());
                    if same {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Inheritance {
                required,
                invert: false,
            } => write!(f, "must derive from {}", required),
            Constraint::Inheritance {
                required,
                invert: true,
            } => write!(f, "must not derive from {}", required),
            Constraint::ConstructorShape { parameters } if parameters.is_empty() => {
                write!(f, "must expose a parameterless constructor")
            }
            Constraint::ConstructorShape { parameters } => {
                let names: Vec<&str> = parameters.iter().map(|p| p.full_name()).collect();
                write!(f, "must expose a constructor ({})", names.join(", "))
            }
        }
    }
}

/// A constraint a candidate failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetConstraint {
    constraint: Constraint,
}

impl UnmetConstraint {
    pub(crate) fn new(constraint: Constraint) -> Self {
        Self { constraint }
    }

    /// The failed constraint
    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }
}

impl fmt::Display for UnmetConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.constraint.fmt(f)
    }
}
