//! Traits for converting between host values and Rust types.
//!
//! `FromValue` is how callers request a typed result from an invocation;
//! `IntoValue` lets them pass Rust values as arguments.
//!
//! # Example
//!
//! ```ignore
//! use refract_sdk::{FromValue, IntoValue, Value};
//!
//! let v = 42.into_value();
//! assert_eq!(i32::from_value(v).unwrap(), 42);
//! ```

use std::sync::Arc;

use crate::error::{HostError, HostResult};
use crate::value::{ObjectRef, Value};

/// Convert from a host value to a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning `HostError::TypeMismatch` if the value has the wrong shape
    fn from_value(value: Value) -> HostResult<Self>;
}

/// Convert from a Rust type to a host value.
pub trait IntoValue {
    /// Convert to a host value
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, value: &Value) -> HostError {
    HostError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

// ============================================================================
// Primitive implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(value: Value) -> HostResult<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> HostResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> HostResult<Self> {
        value.as_i32().ok_or_else(|| mismatch("i32", &value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> HostResult<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", &value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> HostResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> HostResult<Self> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Arc<str> {
    fn from_value(value: Value) -> HostResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> HostResult<Self> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch("object", &other)),
        }
    }
}

// Null maps to None
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> HostResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: Into<Value>> IntoValue for T {
    fn into_value(self) -> Value {
        self.into()
    }
}

// Unit type (for void-returning bodies)
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
