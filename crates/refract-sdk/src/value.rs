//! Value - host values crossing the reflection boundary
//!
//! Primitive values (null, bool, i32, i64, f64) are stored inline. Strings
//! are shared immutable slices. Objects are reference-counted handles with
//! reference identity: two `ObjectRef`s are equal only when they point at
//! the same allocation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::TypeToken;

/// Global counter for object identities
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Value
// ============================================================================

/// A host value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (null reference, or the result of a void call)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Heap object
    Object(ObjectRef),
}

impl Value {
    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract i32 value
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract i64 value (i32 values widen)
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            Value::Int(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Extract f64 value (i32 values widen)
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get type name for debugging
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "i32",
            Value::Long(_) => "i64",
            Value::Double(_) => "f64",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Long(i) => write!(f, "Value::Long({})", i),
            Value::Double(d) => write!(f, "Value::Double({})", d),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::Object(obj) => write!(f, "Value::Object({:?})", obj),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "<object #{}>", obj.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Long(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

struct ObjectData {
    id: u64,
    type_token: TypeToken,
    slots: RwLock<FxHashMap<String, Value>>,
}

/// Shared handle to a host object.
///
/// Slots are named storage cells; the host decides which slots back which
/// fields and properties.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    /// Allocate an empty object of the given type
    pub fn new(type_token: TypeToken) -> Self {
        Self::with_slots(type_token, std::iter::empty())
    }

    /// Allocate an object with initial slot values
    pub fn with_slots(
        type_token: TypeToken,
        slots: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        ObjectRef(Arc::new(ObjectData {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            type_token,
            slots: RwLock::new(slots.into_iter().collect()),
        }))
    }

    /// Unique object identity
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Runtime type of the object
    pub fn type_token(&self) -> TypeToken {
        self.0.type_token
    }

    /// Read a slot
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.slots.read().get(name).cloned()
    }

    /// Write a slot
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.slots.write().insert(name.into(), value);
    }

    /// Check if a slot exists
    pub fn has_slot(&self, name: &str) -> bool {
        self.0.slots.read().contains_key(name)
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.0.slots.read().len()
    }

    /// Check if two handles point at the same object
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        ObjectRef::ptr_eq(self, other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef(#{}, {})", self.0.id, self.0.type_token)
    }
}
