//! MetadataProvider trait - the host runtime surface
//!
//! Defines the narrow interface a host runtime implements so the reflection
//! layer can introspect its types, close generic definitions and call
//! members. The reflection layer programs against this trait only; it never
//! depends on a concrete host.
//!
//! Hosts must answer metadata queries consistently: describing the same
//! token twice yields equal descriptors, and closing the same definition
//! with the same arguments yields the same token.

use crate::error::HostResult;
use crate::types::{MemberDescriptor, MemberToken, TypeDescriptor, TypeToken};
use crate::value::Value;

/// Abstract host runtime.
///
/// All methods take `&self`; implementations are shared across threads.
pub trait MetadataProvider: Send + Sync {
    // ========================================================================
    // Type metadata
    // ========================================================================

    /// The universal root type every type derives from
    fn root_type(&self) -> TypeToken;

    /// Describe a type
    fn describe_type(&self, ty: TypeToken) -> HostResult<TypeDescriptor>;

    /// Members declared by a type (methods, constructors, fields, properties),
    /// in declaration order. Inherited members are not included.
    fn type_members(&self, ty: TypeToken) -> HostResult<Vec<MemberToken>>;

    /// Runtime type of a value, `None` for null
    fn type_of(&self, value: &Value) -> HostResult<Option<TypeToken>>;

    // ========================================================================
    // Member metadata
    // ========================================================================

    /// Describe a member
    fn describe_member(&self, member: MemberToken) -> HostResult<MemberDescriptor>;

    // ========================================================================
    // Generic closing
    // ========================================================================

    /// Close an open generic type definition over concrete type arguments
    fn make_generic_type(&self, definition: TypeToken, args: &[TypeToken]) -> HostResult<TypeToken>;

    /// Close an open generic method definition over concrete type arguments
    fn make_generic_method(
        &self,
        definition: MemberToken,
        args: &[TypeToken],
    ) -> HostResult<MemberToken>;

    // ========================================================================
    // Execution
    // ========================================================================

    /// Call a method. `receiver` is ignored for static methods.
    fn invoke(&self, method: MemberToken, receiver: &Value, args: &[Value]) -> HostResult<Value>;

    /// Allocate an instance and run a constructor on it
    fn construct(&self, constructor: MemberToken, args: &[Value]) -> HostResult<Value>;

    /// Read a field or property. `target` is ignored for static members.
    fn get_value(&self, member: MemberToken, target: &Value) -> HostResult<Value>;

    /// Write a field or property. `target` is ignored for static members.
    fn set_value(&self, member: MemberToken, target: &Value, value: Value) -> HostResult<()>;
}
