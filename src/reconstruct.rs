//! Cached value → live value reconstruction.
//!
//! [`to_live`] is the general inverse of [`crate::convert::to_cached`];
//! [`reconstruct_object`] rebuilds a fresh live object from an object-typed
//! handle, structured or opaque.
//!
//! Failure policy is deliberately asymmetric: an unresolvable root class
//! aborts the whole reconstruction (reported through the logging
//! collaborator), while an unresolvable private-property scope skips only
//! that property and lets the rest of the object — and its one-time
//! post-construction hook — proceed.

use crate::entry::{ClassIdentity, ObjectEntry};
use crate::error::{Error, Result};
use crate::host::{ClassId, LiveValue, ObjId, ObjectModel};
use crate::value::{CachedHandle, CachedRepr};
use crate::visibility::Visibility;

/// Materialize any cached value back into a live one.
///
/// A null child reference becomes the runtime's null; object-typed values
/// go through [`reconstruct_object`].
pub fn to_live<M: ObjectModel>(host: &M, handle: &CachedHandle) -> Result<LiveValue> {
    Ok(match handle.repr() {
        CachedRepr::Null => LiveValue::Null,
        CachedRepr::Bool(b) => LiveValue::Bool(*b),
        CachedRepr::Int(i) => LiveValue::Int(*i),
        CachedRepr::Float(f) => LiveValue::Float(*f),
        CachedRepr::Str(s) => LiveValue::Str(s.to_string()),
        CachedRepr::List(items) => {
            let mut live = Vec::with_capacity(items.len());
            for item in items.iter() {
                live.push(to_live(host, item)?);
            }
            LiveValue::List(live)
        }
        CachedRepr::Object(entry) => LiveValue::Object(rebuild(host, entry)?),
        CachedRepr::Blob(blob) => LiveValue::Object(host.deserialize_object(blob.payload()?)?),
    })
}

/// Produce a new live object from an object-typed cached handle.
///
/// Dispatches on the variant: structured entries are rebuilt slot by slot,
/// opaque blobs are handed to the host's deserializer. This is the fetch-side
/// entry point; callers never need to know which representation was stored.
pub fn reconstruct<M: ObjectModel>(host: &M, handle: &CachedHandle) -> Result<ObjId> {
    match handle.repr() {
        CachedRepr::Object(entry) => rebuild(host, entry),
        CachedRepr::Blob(blob) => host.deserialize_object(blob.payload()?),
        other => Err(Error::NotAnObject(format!(
            "cached value is {}",
            repr_kind(other)
        ))),
    }
}

fn repr_kind(repr: &CachedRepr) -> &'static str {
    match repr {
        CachedRepr::Null => "null",
        CachedRepr::Bool(_) => "a boolean",
        CachedRepr::Int(_) => "an integer",
        CachedRepr::Float(_) => "a float",
        CachedRepr::Str(_) => "a string",
        CachedRepr::List(_) => "a list",
        CachedRepr::Object(_) => "an object entry",
        CachedRepr::Blob(_) => "an opaque blob",
    }
}

/// Rebuild a live object from a structured entry.
fn rebuild<M: ObjectModel>(host: &M, entry: &ObjectEntry) -> Result<ObjId> {
    let class = resolve_root_class(host, entry.class_identity())?;

    let obj = host.new_uninitialized(class)?;
    for slot in entry.slots() {
        let ctx = match slot.visibility {
            // Public and protected installs are always relative to the
            // runtime class at hand.
            Visibility::Public | Visibility::Protected => class,
            Visibility::Private(scope) => match host.resolve_class(scope) {
                Some(ctx) => ctx,
                // The declaring class is gone: skip this property only.
                None => continue,
            },
        };
        let value = match &slot.value {
            Some(child) => to_live(host, child)?,
            None => LiveValue::Null,
        };
        host.set_property(obj, ctx, slot.name, value)?;
    }

    // Runs exactly once, even when properties were skipped above.
    host.invoke_wakeup(obj)?;
    Ok(obj)
}

fn resolve_root_class<M: ObjectModel>(host: &M, identity: ClassIdentity) -> Result<ClassId> {
    match identity {
        ClassIdentity::Resolved(class) => Ok(class),
        ClassIdentity::Named(name) => host.resolve_class(name).ok_or_else(|| {
            error!("Cannot find class {} while rebuilding cache entry", name);
            Error::ClassUnresolved(name.to_string())
        }),
    }
}
