//! Error types for the object cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the object cache.
///
/// All fallible operations return `Result<T>` where `Result` is defined as
/// `std::result::Result<T, Error>`. Different variants represent different
/// failure modes:
#[derive(Debug, Clone)]
pub enum Error {
    /// The root class of a cached entry could not be resolved at
    /// reconstruction time.
    ///
    /// This aborts the whole reconstruction; no partial object is produced.
    /// Common causes:
    /// - The class was unloaded or renamed since the entry was stored
    /// - The entry was stored by a process with a different class set
    ///
    /// **Recovery:** Evict the entry; the next store recreates it against
    /// the current class set.
    ClassUnresolved(String),

    /// Serialization failed while producing the opaque representation.
    ///
    /// Raised by the host's opaque serializer when an object cannot be
    /// flattened to bytes.
    SerializationError(String),

    /// Deserialization of an opaque payload failed.
    ///
    /// This indicates corrupted or malformed data in cache.
    ///
    /// **Recovery:** Cache entry should be evicted and recomputed.
    DeserializationError(String),

    /// Invalid cache entry: corrupted envelope or bad magic.
    ///
    /// Returned when:
    /// - Magic header is not `b"OBJC"`
    /// - The envelope is shorter than its fixed prefix
    /// - Non-objcache data was handed to the decoder
    ///
    /// **Recovery:** Evict the cache entry and recompute.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and a cached payload.
    ///
    /// Raised when an opaque payload was framed by a different envelope
    /// version.
    ///
    /// **Recovery:** Cache entry is evicted and recomputed on next store.
    /// No action needed - this is expected during deployments.
    VersionMismatch {
        /// Expected envelope version (from compiled code)
        expected: u32,
        /// Found envelope version (from the cached payload)
        found: u32,
    },

    /// The cached value is not reconstructible as an object.
    ///
    /// Raised when an object fetch lands on an entry holding a plain value.
    NotAnObject(String),

    /// Host object-model failure.
    ///
    /// Raised when the host reports an invalid object or class handle.
    HostError(String),

    /// Generic error with custom message.
    ///
    /// Used for errors that don't fit into other variants.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ClassUnresolved(name) => write!(f, "Cannot resolve class: {}", name),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::NotAnObject(msg) => write!(f, "Not an object: {}", msg),
            Error::HostError(msg) => write!(f, "Host error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
