//! Cache-resident value representation.
//!
//! A [`CachedValue`] is the immutable, cache-resident form of an arbitrary
//! runtime value, held behind an atomically reference-counted
//! [`CachedHandle`]. A handle's lifetime is the longest of its holders: cache
//! slots and parent property slots alike, so a child may outlive the entry
//! that first captured it when another entry shares it.
//!
//! Variant dispatch is by pattern match on [`CachedRepr`]; the flag word only
//! carries the two bookkeeping bits the build phase needs: object-ness
//! (write-once at construction) and "conversion attempted" (set at most once,
//! while the enclosing object is being considered for a structured entry).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::blob::OpaqueBlob;
use crate::entry::ObjectEntry;

/// Shared handle to a cached value.
///
/// Cloning a handle is the cache's sharing primitive: the count is atomic
/// because a child can be referenced from multiple independent entries.
pub type CachedHandle = Arc<CachedValue>;

/// Object-typed value (structured entry or opaque object blob).
const FLAG_IS_OBJECT: u8 = 1 << 0;
/// Structured conversion was already attempted for this value.
const FLAG_CONVERT_ATTEMPTED: u8 = 1 << 1;

/// The variant payload of a cached value.
#[derive(Debug)]
pub enum CachedRepr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
    List(Box<[CachedHandle]>),
    /// A structured object entry.
    Object(ObjectEntry),
    /// An opaque, host-serialized object.
    Blob(OpaqueBlob),
}

/// An immutable cached value with shared bookkeeping flags.
#[derive(Debug)]
pub struct CachedValue {
    flags: AtomicU8,
    repr: CachedRepr,
}

impl CachedValue {
    fn with_flags(repr: CachedRepr, flags: u8) -> CachedHandle {
        Arc::new(CachedValue {
            flags: AtomicU8::new(flags),
            repr,
        })
    }

    /// Cache the runtime's null.
    pub fn null() -> CachedHandle {
        Self::with_flags(CachedRepr::Null, 0)
    }

    /// Cache a boolean.
    pub fn bool(value: bool) -> CachedHandle {
        Self::with_flags(CachedRepr::Bool(value), 0)
    }

    /// Cache an integer.
    pub fn int(value: i64) -> CachedHandle {
        Self::with_flags(CachedRepr::Int(value), 0)
    }

    /// Cache a float.
    pub fn float(value: f64) -> CachedHandle {
        Self::with_flags(CachedRepr::Float(value), 0)
    }

    /// Cache a string.
    pub fn str(value: &str) -> CachedHandle {
        Self::with_flags(CachedRepr::Str(value.into()), 0)
    }

    /// Cache an ordered list of already-cached children.
    pub fn list(items: Vec<CachedHandle>) -> CachedHandle {
        Self::with_flags(CachedRepr::List(items.into_boxed_slice()), 0)
    }

    /// Wrap a completed structured entry.
    pub fn object(entry: ObjectEntry) -> CachedHandle {
        Self::with_flags(CachedRepr::Object(entry), FLAG_IS_OBJECT)
    }

    /// Wrap an opaque object blob.
    pub fn object_blob(blob: OpaqueBlob) -> CachedHandle {
        Self::with_flags(CachedRepr::Blob(blob), FLAG_IS_OBJECT)
    }

    /// The variant payload.
    pub fn repr(&self) -> &CachedRepr {
        &self.repr
    }

    /// True for object-typed values (structured or opaque).
    pub fn is_object(&self) -> bool {
        self.flags.load(Ordering::Relaxed) & FLAG_IS_OBJECT != 0
    }

    /// Whether a structured conversion was already attempted for this value.
    pub fn conversion_attempted(&self) -> bool {
        self.flags.load(Ordering::Acquire) & FLAG_CONVERT_ATTEMPTED != 0
    }

    /// Record that a structured conversion was attempted.
    ///
    /// Set unconditionally before the expensive precondition checks, so a
    /// rejected value short-circuits every later attempt.
    pub fn mark_conversion_attempted(&self) {
        self.flags.fetch_or(FLAG_CONVERT_ATTEMPTED, Ordering::Release);
    }
}
