//! Shared in-memory object cache container.
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Entries are immutable once published, so readers never synchronize;
//! store and delete are single-writer per key by the map's sharding.
//!
//! The container owns the store flow for objects: serialize to the opaque
//! representation first, then try to promote to a structured entry, and keep
//! whichever survived. Eviction and capacity policy stay with the embedding
//! application; this container only ever drops entries when told to.

use crate::blob::OpaqueBlob;
use crate::convert::{attempt_convert, to_cached};
use crate::error::Result;
use crate::host::{LiveValue, ObjectModel};
use crate::reconstruct::to_live;
use crate::stats::{memory_size, CacheStats};
use crate::value::{CachedHandle, CachedRepr, CachedValue};
use dashmap::DashMap;

/// Thread-safe shared object cache.
///
/// # Example
///
/// ```
/// use objcache::host::{ClassSpec, InMemoryHost, LiveValue};
/// use objcache::ObjectCache;
///
/// let host = InMemoryHost::new();
/// let class = host.register_class(ClassSpec::new("Point").declare_public("x"));
/// let obj = host.new_instance(class).unwrap();
/// host.set_raw(obj, "x", LiveValue::Int(3)).unwrap();
///
/// let cache = ObjectCache::new(host);
/// cache.store("points:origin", &LiveValue::Object(obj)).unwrap();
///
/// let fetched = cache.fetch("points:origin").unwrap();
/// assert!(matches!(fetched, Some(LiveValue::Object(_))));
/// ```
pub struct ObjectCache<M: ObjectModel> {
    host: M,
    entries: DashMap<String, CachedHandle>,
}

impl<M: ObjectModel> ObjectCache<M> {
    /// Create an empty cache over the given host runtime.
    pub fn new(host: M) -> Self {
        ObjectCache {
            host,
            entries: DashMap::new(),
        }
    }

    /// The host runtime this cache converts against.
    pub fn host(&self) -> &M {
        &self.host
    }

    /// Store a live value under `key`, overwriting any previous entry.
    ///
    /// Objects are captured opaque-first: the host's serialized form is the
    /// fallback, and a structured entry replaces it when the object
    /// qualifies. Overwriting tears the previous entry down (its owned
    /// children are released exactly once).
    pub fn store(&self, key: &str, value: &LiveValue) -> Result<()> {
        let handle = match value {
            LiveValue::Object(obj) => {
                let payload = self.host.serialize_object(*obj)?;
                let blob = CachedValue::object_blob(OpaqueBlob::from_host_bytes(&payload));
                match attempt_convert(&self.host, &blob, value) {
                    Some(structured) => {
                        debug!("✓ ObjectCache SET {} (structured)", key);
                        structured
                    }
                    None => {
                        debug!("✓ ObjectCache SET {} (opaque)", key);
                        blob
                    }
                }
            }
            other => {
                debug!("✓ ObjectCache SET {}", key);
                to_cached(&self.host, other)?
            }
        };
        self.entries.insert(key.to_string(), handle);
        Ok(())
    }

    /// Fetch a fresh live value for `key`.
    ///
    /// Every hit materializes a new live value; cached entries are never
    /// handed out to mutate.
    pub fn fetch(&self, key: &str) -> Result<Option<LiveValue>> {
        let Some(handle) = self.handle(key) else {
            debug!("✓ ObjectCache GET {} -> MISS", key);
            return Ok(None);
        };
        debug!("✓ ObjectCache GET {} -> HIT", key);
        to_live(&self.host, &handle).map(Some)
    }

    /// The stored handle for `key`, if any.
    ///
    /// Shares ownership with the cache slot; useful for size accounting and
    /// lifetime inspection without materializing a live value.
    pub fn handle(&self, key: &str) -> Option<CachedHandle> {
        self.entries.get(key).map(|entry| CachedHandle::clone(&entry))
    }

    /// Drop the entry under `key`, tearing it down if this was the last
    /// reference.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
        debug!("✓ ObjectCache DELETE {}", key);
    }

    /// Whether `key` currently holds an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (use with caution).
    pub fn clear_all(&self) {
        self.entries.clear();
        warn!("⚠ ObjectCache CLEAR_ALL executed - all cache cleared!");
    }

    /// Aggregate occupancy statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            total_entries: 0,
            structured_entries: 0,
            opaque_entries: 0,
            total_bytes: 0,
        };
        for entry in self.entries.iter() {
            stats.total_entries += 1;
            match entry.value().repr() {
                CachedRepr::Object(_) => stats.structured_entries += 1,
                CachedRepr::Blob(_) => stats.opaque_entries += 1,
                _ => {}
            }
            stats.total_bytes += memory_size(entry.value());
        }
        stats
    }

    /// Print occupancy statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {} entries ({} structured, {} opaque), {} bytes",
            stats.total_entries, stats.structured_entries, stats.opaque_entries, stats.total_bytes
        );
    }
}
