//! Structured object entry: fixed header plus a frozen slot array.
//!
//! An [`ObjectEntry`] captures one live object: its class identity and an
//! ordered sequence of decoded property slots. The slot array is built once
//! from a fully populated `Vec` and frozen into a single `Box<[PropertySlot]>`
//! allocation; nothing about the entry changes after construction, which is
//! what makes unsynchronized concurrent reads safe.
//!
//! Teardown is the derived `Drop`: each slot releases its owned child
//! reference exactly once and the slot block is freed as one allocation.

use crate::host::ClassId;
use crate::intern::InternedStr;
use crate::value::CachedHandle;
use crate::visibility::Visibility;

/// The class identity recorded in an entry header.
///
/// Conversion records a resolved handle when the host vouches that the
/// handle outlives the cache (persistent class); otherwise the interned
/// class name is kept and resolved lazily at reconstruction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassIdentity {
    /// A class handle that stays valid for the cache's lifetime.
    Resolved(ClassId),
    /// A deferred by-name identity, resolved on each reconstruction.
    Named(InternedStr),
}

/// One captured property: decoded visibility, pooled name, owned child.
///
/// A `None` child records a property whose live value was null; it
/// reconstructs to the runtime's null, never to a missing property. A
/// `Some` child is owned exclusively by this slot within the entry's own
/// tree (the same child may still be shared with other, unrelated entries
/// through the reference-counting model).
#[derive(Debug)]
pub struct PropertySlot {
    pub visibility: Visibility,
    pub name: InternedStr,
    pub value: Option<CachedHandle>,
}

/// The structured representation of one cached object.
///
/// Immutable after construction: the slot count and slot contents are fixed
/// for the entry's whole lifetime.
#[derive(Debug)]
pub struct ObjectEntry {
    class: ClassIdentity,
    slots: Box<[PropertySlot]>,
}

impl ObjectEntry {
    /// Freeze a fully populated slot sequence into an entry.
    ///
    /// Callers fill `slots` in a single forward pass and only construct the
    /// entry once every slot is complete; there is no way to observe or
    /// produce a partially initialized entry.
    pub fn new(class: ClassIdentity, slots: Vec<PropertySlot>) -> Self {
        ObjectEntry {
            class,
            slots: slots.into_boxed_slice(),
        }
    }

    /// The recorded class identity.
    pub fn class_identity(&self) -> ClassIdentity {
        self.class
    }

    /// Number of captured properties, fixed at construction.
    pub fn property_count(&self) -> usize {
        self.slots.len()
    }

    /// The ordered property slots.
    pub fn slots(&self) -> &[PropertySlot] {
        &self.slots
    }
}
