//! Live value → cached value conversion.
//!
//! Two layers live here. [`to_cached`] is the general conversion primitive:
//! it covers every value kind and recurses through lists and nested objects.
//! [`attempt_convert`] is the guarded entry point the store uses to promote
//! an object to a structured entry: it enforces the preconditions (object,
//! no custom serialization protocol, no internal self-reference) and
//! memoizes the attempt on the existing cached handle so repeated stores of
//! a rejected value skip the expensive checks.
//!
//! Building an entry is single-writer by contract: the enclosing store
//! serializes stores per key, and an entry under construction is not
//! reachable by readers until the completed handle is published.

use crate::entry::{ClassIdentity, ObjectEntry, PropertySlot};
use crate::error::Result;
use crate::host::{LiveValue, ObjId, ObjectModel};
use crate::intern::intern;
use crate::value::{CachedHandle, CachedValue};
use crate::visibility::decode_visibility;

/// Guarded promotion of a live object to a structured entry.
///
/// `existing` is the object's current cached handle (normally the opaque
/// blob produced when it was first stored). Returns `None` — degrade to the
/// opaque representation — when:
///
/// - `value` is not an object;
/// - a structured conversion was already attempted for `existing`
///   (the attempt bit short-circuits before any host checks rerun);
/// - the object declares a custom serialization protocol;
/// - the object's reachable graph contains an internal self-reference;
/// - any value in the tree fails to convert.
///
/// The attempt bit is set unconditionally before the checks, so even a
/// rejection is remembered.
pub fn attempt_convert<M: ObjectModel>(
    host: &M,
    existing: &CachedHandle,
    value: &LiveValue,
) -> Option<CachedHandle> {
    let LiveValue::Object(obj) = value else {
        return None;
    };
    if existing.conversion_attempted() {
        return None;
    }
    existing.mark_conversion_attempted();

    if host.uses_custom_serializer(*obj) {
        return None;
    }
    if host.has_internal_reference(*obj) {
        return None;
    }

    let converted = to_cached(host, value).ok()?;
    converted.mark_conversion_attempted();
    Some(converted)
}

/// Convert any live value to its cached representation.
///
/// Objects are built structurally without re-running the root preconditions:
/// the root's reachable-graph scan already covered every nested object. Use
/// [`attempt_convert`] at the root.
pub fn to_cached<M: ObjectModel>(host: &M, value: &LiveValue) -> Result<CachedHandle> {
    Ok(match value {
        LiveValue::Null => CachedValue::null(),
        LiveValue::Bool(b) => CachedValue::bool(*b),
        LiveValue::Int(i) => CachedValue::int(*i),
        LiveValue::Float(f) => CachedValue::float(*f),
        LiveValue::Str(s) => CachedValue::str(s),
        LiveValue::List(items) => {
            let mut cached = Vec::with_capacity(items.len());
            for item in items {
                cached.push(to_cached(host, item)?);
            }
            CachedValue::list(cached)
        }
        LiveValue::Object(obj) => CachedValue::object(build_entry(host, *obj)?),
    })
}

/// Capture one object into a frozen entry.
///
/// Slots are filled in a single forward pass; any conversion failure
/// abandons the whole allocation, so no partially initialized entry ever
/// escapes.
fn build_entry<M: ObjectModel>(host: &M, obj: ObjId) -> Result<ObjectEntry> {
    let props = host.enumerate_properties(obj)?;
    let mut slots = Vec::with_capacity(props.len());
    for (raw_key, value) in &props {
        let (visibility, name) = decode_visibility(raw_key);
        let child = match value {
            LiveValue::Null => None,
            other => Some(to_cached(host, other)?),
        };
        slots.push(PropertySlot {
            visibility,
            name: intern(name),
            value: child,
        });
    }

    let class = host.class_of(obj)?;
    let identity = if host.is_persistent_class(class) {
        ClassIdentity::Resolved(class)
    } else {
        ClassIdentity::Named(intern(&host.class_name(class)?))
    };
    Ok(ObjectEntry::new(identity, slots))
}
