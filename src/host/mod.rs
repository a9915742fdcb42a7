//! Host object-model interface.
//!
//! The cache core never touches a runtime's object representation directly.
//! Everything it needs from the host — property enumeration, class lookup,
//! raw instantiation, hook-bypassing assignment — goes through the
//! [`ObjectModel`] trait. Implementations: [`InMemoryHost`] (in-crate
//! reference runtime, also the test double), or an adapter over a real
//! embedding runtime.
//!
//! **IMPORTANT:** All methods take `&self` to allow concurrent access from
//! many cache consumers. Implementations should use interior mutability
//! (sharded maps, atomics) rather than external locks.

use crate::error::Result;

pub mod memory;

pub use memory::{ClassSpec, InMemoryHost};

/// Opaque handle to a live object owned by the host runtime.
///
/// Using plain ids instead of references keeps the cache free of host
/// lifetimes; the host's arena owns every live object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjId(pub u64);

/// Opaque handle to a class owned by the host runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// A live runtime value, as exchanged across the host boundary.
///
/// Objects appear by handle only; their property storage stays inside the
/// host. Everything else is carried by value.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<LiveValue>),
    Object(ObjId),
}

impl LiveValue {
    /// True when this value is an object handle.
    pub fn is_object(&self) -> bool {
        matches!(self, LiveValue::Object(_))
    }

    /// True when this value is the runtime's null.
    pub fn is_null(&self) -> bool {
        matches!(self, LiveValue::Null)
    }
}

/// The narrow interface the cache consumes from the host runtime.
///
/// Class-name resolution may transitively acquire the host's class-loading
/// synchronization; every other method is expected to be non-blocking.
pub trait ObjectModel: Send + Sync {
    /// Enumerate an object's properties as an ordered sequence of
    /// `(raw key, value)` pairs, in declared-then-dynamic order.
    ///
    /// Raw keys carry mangled visibility (see [`crate::visibility`]).
    /// Order matters for reconstruction fidelity, not lookup.
    fn enumerate_properties(&self, obj: ObjId) -> Result<Vec<(String, LiveValue)>>;

    /// The class of a live object.
    fn class_of(&self, obj: ObjId) -> Result<ClassId>;

    /// Canonical name of a class.
    fn class_name(&self, class: ClassId) -> Result<String>;

    /// Resolve a class by name. `None` when no such class is loaded.
    fn resolve_class(&self, name: &str) -> Option<ClassId>;

    /// Whether a class handle stays valid for the lifetime of the cache.
    ///
    /// Entries record a resolved handle for persistent classes and fall back
    /// to a by-name identity (resolved lazily at reconstruction) otherwise.
    fn is_persistent_class(&self, class: ClassId) -> bool;

    /// Whether the object declares a custom/opaque serialization protocol.
    ///
    /// Such objects never get a structured entry.
    fn uses_custom_serializer(&self, obj: ObjId) -> bool;

    /// Whether the object's reachable graph contains an internal
    /// self-reference.
    fn has_internal_reference(&self, obj: ObjId) -> bool;

    /// Allocate a new, uninitialized instance of `class`, suppressing the
    /// host's default field-initialization side effects.
    fn new_uninitialized(&self, class: ClassId) -> Result<ObjId>;

    /// Assign a property on `obj` under the visibility context `ctx`,
    /// bypassing any user-overridable assignment hooks.
    fn set_property(&self, obj: ObjId, ctx: ClassId, name: &str, value: LiveValue) -> Result<()>;

    /// Invoke the object's one-time post-construction hook.
    fn invoke_wakeup(&self, obj: ObjId) -> Result<()>;

    /// Serialize an object through the host's opaque protocol.
    fn serialize_object(&self, obj: ObjId) -> Result<Vec<u8>>;

    /// Materialize an object from the host's opaque protocol.
    fn deserialize_object(&self, bytes: &[u8]) -> Result<ObjId>;
}
