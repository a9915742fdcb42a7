//! Process-wide interned string pool for property and class names.
//!
//! Cache entries never own their name strings. Every name is deduplicated
//! into a single global pool and entries hold `&'static str` references into
//! it. Pool strings are never individually freed; the pool outlives every
//! cache entry by construction.
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding, so
//! interning from concurrent store operations needs no external locking.

use dashmap::DashSet;
use once_cell::sync::Lazy;

/// An interned, process-wide-deduplicated name.
///
/// Two interned names are equal iff their pointers are equal, but callers
/// should rely only on `str` equality.
pub type InternedStr = &'static str;

static POOL: Lazy<DashSet<&'static str>> = Lazy::new(DashSet::new);

/// Intern a name into the global pool.
///
/// Returns the pooled `&'static str` for `name`, inserting it on first use.
/// The backing allocation is leaked intentionally: pooled names must outlive
/// every cache entry that references them.
pub fn intern(name: &str) -> InternedStr {
    if let Some(found) = POOL.get(name) {
        return *found;
    }

    let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
    // Two threads may race to insert the same name; the loser's allocation
    // stays leaked but unreferenced, which is harmless and rare.
    if POOL.insert(leaked) {
        leaked
    } else {
        POOL.get(name).map(|found| *found).unwrap_or(leaked)
    }
}

/// Number of distinct names currently pooled.
pub fn pooled_names() -> usize {
    POOL.len()
}
