//! Cache occupancy accounting.
//!
//! [`memory_size`] reports the bytes a cached value occupies, recursing into
//! every directly-owned child. No shared-node deduplication happens: within
//! one entry's own tree every child is exclusively owned by exactly one
//! slot, and a child shared across *different* entries is counted by each —
//! every entry's occupancy is reported independently.

use crate::entry::{ObjectEntry, PropertySlot};
use crate::value::{CachedHandle, CachedRepr, CachedValue};

/// Bytes of an entry's fixed header.
///
/// The cached-value node embeds the entry header (class identity, slot
/// count, flags), so one node size covers it.
pub fn entry_header_size() -> usize {
    std::mem::size_of::<CachedValue>()
}

/// Bytes of one property slot.
pub fn slot_size() -> usize {
    std::mem::size_of::<PropertySlot>()
}

/// Total bytes occupied by a cached value, children included.
pub fn memory_size(handle: &CachedHandle) -> usize {
    size_of_value(handle)
}

fn size_of_value(value: &CachedValue) -> usize {
    match value.repr() {
        CachedRepr::Null
        | CachedRepr::Bool(_)
        | CachedRepr::Int(_)
        | CachedRepr::Float(_) => std::mem::size_of::<CachedValue>(),
        CachedRepr::Str(s) => std::mem::size_of::<CachedValue>() + s.len(),
        CachedRepr::List(items) => {
            let mut size = std::mem::size_of::<CachedValue>()
                + items.len() * std::mem::size_of::<CachedHandle>();
            for item in items.iter() {
                size += size_of_value(item);
            }
            size
        }
        CachedRepr::Object(entry) => size_of_entry(entry),
        CachedRepr::Blob(blob) => std::mem::size_of::<CachedValue>() + blob.len(),
    }
}

fn size_of_entry(entry: &ObjectEntry) -> usize {
    let mut size = entry_header_size() + entry.property_count() * slot_size();
    for slot in entry.slots() {
        if let Some(child) = &slot.value {
            size += size_of_value(child);
        }
    }
    size
}

/// Aggregate occupancy of a whole store, reported by the container.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub structured_entries: usize,
    pub opaque_entries: usize,
    pub total_bytes: usize,
}
