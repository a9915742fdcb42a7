//! Opaque-blob representation with versioned envelopes.
//!
//! When an object does not qualify for a structured entry (custom
//! serialization protocol, internal self-reference, or a rejected earlier
//! attempt), the cache falls back to the host's opaque byte serialization.
//! This module frames those bytes in a versioned envelope:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬─────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│ HOST PAYLOAD (N bytes)  │
//! └─────────────────┴─────────────────┴─────────────────────────┘
//!   "OBJC"              u32 (LE)          host serializer output
//! ```
//!
//! # Safety Guarantees
//!
//! - **Validated:** Magic and version checked on every payload access
//! - **Versioned:** Envelope changes force cache eviction, not silent reuse
//! - **Host-owned payload:** The cache never interprets the bytes itself

use crate::error::{Error, Result};

/// Magic header for objcache opaque blobs: b"OBJC"
///
/// This 4-byte signature identifies valid objcache blob envelopes. Any blob
/// without this magic is rejected during payload access.
pub const CACHE_MAGIC: [u8; 4] = *b"OBJC";

/// Current envelope version.
///
/// Increment when the envelope layout (not the host payload) changes.
/// Entries framed under another version fail with
/// [`Error::VersionMismatch`] and are expected to be evicted and restored.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Bytes occupied by the fixed envelope prefix.
const ENVELOPE_PREFIX: usize = CACHE_MAGIC.len() + 4;

/// An opaque, host-serialized object payload wrapped in the envelope.
///
/// Immutable after construction; the bytes live in a single frozen
/// allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueBlob {
    bytes: Box<[u8]>,
}

impl OpaqueBlob {
    /// Frame host-serialized bytes into an enveloped blob.
    pub fn from_host_bytes(payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(ENVELOPE_PREFIX + payload.len());
        bytes.extend_from_slice(&CACHE_MAGIC);
        bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
        bytes.extend_from_slice(payload);
        OpaqueBlob {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Reconstruct a blob from previously enveloped bytes.
    ///
    /// Validation is deferred to [`OpaqueBlob::payload`], mirroring how the
    /// store hands enveloped bytes around without interpreting them.
    pub fn from_enveloped(bytes: Vec<u8>) -> Self {
        OpaqueBlob {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// The host payload, after envelope validation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCacheEntry`]: envelope shorter than its prefix or
    ///   bad magic
    /// - [`Error::VersionMismatch`]: framed under a different version
    pub fn payload(&self) -> Result<&[u8]> {
        if self.bytes.len() < ENVELOPE_PREFIX {
            return Err(Error::InvalidCacheEntry(format!(
                "envelope truncated: {} bytes",
                self.bytes.len()
            )));
        }
        if self.bytes[..CACHE_MAGIC.len()] != CACHE_MAGIC {
            return Err(Error::InvalidCacheEntry(
                "bad magic header".to_string(),
            ));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&self.bytes[CACHE_MAGIC.len()..ENVELOPE_PREFIX]);
        let version = u32::from_le_bytes(version);
        if version != CURRENT_SCHEMA_VERSION {
            return Err(Error::VersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                found: version,
            });
        }
        Ok(&self.bytes[ENVELOPE_PREFIX..])
    }

    /// Total enveloped size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the blob holds no bytes at all (never produced by
    /// [`OpaqueBlob::from_host_bytes`]).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let blob = OpaqueBlob::from_host_bytes(b"host data");
        assert_eq!(blob.payload().expect("payload should validate"), b"host data");
    }

    #[test]
    fn test_envelope_prefix_layout() {
        let blob = OpaqueBlob::from_host_bytes(b"x");
        assert_eq!(blob.len(), ENVELOPE_PREFIX + 1);
    }

    #[test]
    fn test_empty_payload() {
        let blob = OpaqueBlob::from_host_bytes(b"");
        assert_eq!(blob.payload().expect("payload should validate"), b"");
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = b"NOPE".to_vec();
        bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
        bytes.extend_from_slice(b"data");
        let blob = OpaqueBlob::from_enveloped(bytes);
        assert!(matches!(
            blob.payload(),
            Err(Error::InvalidCacheEntry(_))
        ));
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let blob = OpaqueBlob::from_enveloped(b"OBJ".to_vec());
        assert!(matches!(
            blob.payload(),
            Err(Error::InvalidCacheEntry(_))
        ));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.extend_from_slice(&(CURRENT_SCHEMA_VERSION + 7).to_le_bytes());
        bytes.extend_from_slice(b"data");
        let blob = OpaqueBlob::from_enveloped(bytes);
        match blob.payload() {
            Err(Error::VersionMismatch { expected, found }) => {
                assert_eq!(expected, CURRENT_SCHEMA_VERSION);
                assert_eq!(found, CURRENT_SCHEMA_VERSION + 7);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
    }
}
