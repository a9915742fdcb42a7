//! # objcache
//!
//! A shared, read-mostly object cache core for embedding runtimes.
//!
//! ## Features
//!
//! - **Structured entries:** Live objects become immutable, compact,
//!   relocatable entries — class identity plus an ordered, frozen slot array
//! - **Opaque fallback:** Objects that do not qualify (custom serialization
//!   protocol, internal self-references) fall back to the host's serialized
//!   form behind the same handle type
//! - **Host Agnostic:** The runtime is consumed through the narrow
//!   [`host::ObjectModel`] trait; an [`host::InMemoryHost`] reference
//!   runtime ships in-crate
//! - **Read-Mostly:** Entries are immutable once published and safe for
//!   unsynchronized concurrent readers; only the shared reference counts
//!   are atomic
//! - **Accounted:** Exact recursive occupancy reporting per entry
//!
//! ## Quick Start
//!
//! ```
//! use objcache::host::{ClassSpec, InMemoryHost, LiveValue};
//! use objcache::ObjectCache;
//!
//! // 1. Describe the host's classes
//! let host = InMemoryHost::new();
//! let user = host.register_class(
//!     ClassSpec::new("User")
//!         .declare_public("name")
//!         .declare_protected("email"),
//! );
//!
//! // 2. Build a live object
//! let alice = host.new_instance(user).unwrap();
//! host.set_raw(alice, "name", LiveValue::Str("Alice".into())).unwrap();
//!
//! // 3. Cache it and fetch a fresh copy back
//! let cache = ObjectCache::new(host);
//! cache.store("user:alice", &LiveValue::Object(alice)).unwrap();
//! let copy = cache.fetch("user:alice").unwrap();
//! assert!(matches!(copy, Some(LiveValue::Object(id)) if id != alice));
//! ```
//!
//! ## Lower-Level API
//!
//! The conversion core is usable without the container: [`attempt_convert`]
//! promotes an object to a structured entry under the full precondition
//! checks, [`reconstruct`] materializes a fresh live object from any
//! object-typed handle, and [`memory_size`] reports per-entry occupancy.

#[macro_use]
extern crate log;

pub mod blob;
pub mod convert;
pub mod entry;
pub mod error;
pub mod host;
pub mod intern;
pub mod reconstruct;
pub mod stats;
pub mod store;
pub mod value;
pub mod visibility;

// Re-exports for convenience
pub use blob::OpaqueBlob;
pub use convert::{attempt_convert, to_cached};
pub use entry::{ClassIdentity, ObjectEntry, PropertySlot};
pub use error::{Error, Result};
pub use reconstruct::{reconstruct, to_live};
pub use stats::{memory_size, CacheStats};
pub use store::ObjectCache;
pub use value::{CachedHandle, CachedRepr, CachedValue};
pub use visibility::Visibility;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
