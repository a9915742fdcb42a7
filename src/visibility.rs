//! Property-key visibility codec.
//!
//! Host runtimes encode property visibility into the raw key string itself:
//!
//! ```text
//! "name"              public property
//! "\0*\0name"         protected property
//! "\0Owner\0name"     private property declared by class Owner
//! ```
//!
//! The codec decodes a raw key into `(Visibility, plain name)` exactly once,
//! at conversion time. The decoded form is what cache entries store; raw keys
//! are never re-parsed during reconstruction. The encoding direction is the
//! host-boundary contract and is used by hosts (and tests) to produce
//! well-formed raw keys.

use crate::intern::InternedStr;

/// Sentinel byte marking a mangled (non-public) raw key.
const MANGLE_SENTINEL: char = '\0';

/// Scope marker used for protected properties.
const PROTECTED_SCOPE: &str = "*";

/// Decoded visibility of a single property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Visible everywhere; installed relative to the reconstructed class.
    Public,
    /// Visible to the class hierarchy; also installed relative to the
    /// reconstructed class, since protected access is always resolved
    /// against the runtime class at hand.
    Protected,
    /// Declared by (and private to) the named class. The name is resolved
    /// back to a class handle at reconstruction time.
    Private(InternedStr),
}

impl Visibility {
    /// True for `Private(_)`.
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private(_))
    }
}

/// Decode a raw property key into `(visibility, plain name)`.
///
/// A key without the leading sentinel is public, with the whole key as the
/// plain name. A key that carries the sentinel but not the closing one is
/// treated as public too: the host contract was violated and the safest
/// reading is "no scope".
pub fn decode_key(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw.strip_prefix(MANGLE_SENTINEL) else {
        return (None, raw);
    };
    match rest.split_once(MANGLE_SENTINEL) {
        Some((scope, plain)) => (Some(scope), plain),
        None => (None, raw),
    }
}

/// Decode a raw property key into its stored [`Visibility`] form, interning
/// the private scope name.
pub fn decode_visibility(raw: &str) -> (Visibility, &str) {
    match decode_key(raw) {
        (None, plain) => (Visibility::Public, plain),
        (Some(PROTECTED_SCOPE), plain) => (Visibility::Protected, plain),
        (Some(scope), plain) => (Visibility::Private(crate::intern::intern(scope)), plain),
    }
}

/// Encode a plain name under `visibility` into a raw property key.
pub fn encode_key(visibility: &Visibility, name: &str) -> String {
    match visibility {
        Visibility::Public => name.to_string(),
        Visibility::Protected => format!("\0{}\0{}", PROTECTED_SCOPE, name),
        Visibility::Private(scope) => format!("\0{}\0{}", scope, name),
    }
}
