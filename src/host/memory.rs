//! In-memory reference host (default, thread-safe).
//!
//! A complete, self-contained implementation of [`ObjectModel`]: a class
//! registry, an object arena, context-sensitive property assignment, and a
//! cycle-safe opaque serializer. It backs the crate's tests, demos, and
//! benchmarks, and doubles as the template for adapting a real runtime.
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding; object
//! and class handles are arena ids, so no host lifetimes leak into the cache.

use super::{ClassId, LiveValue, ObjId, ObjectModel};
use crate::error::{Error, Result};
use crate::visibility::{encode_key, Visibility};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Declaration of a host class for [`InMemoryHost::register_class`].
///
/// Declared property keys are stored mangled, in declaration order, exactly
/// as the host's property storage would hold them.
#[derive(Clone, Debug)]
pub struct ClassSpec {
    name: String,
    persistent: bool,
    custom_serializer: bool,
    declared: Vec<String>,
}

impl ClassSpec {
    /// A persistent class with no declared properties.
    pub fn new(name: &str) -> Self {
        ClassSpec {
            name: name.to_string(),
            persistent: true,
            custom_serializer: false,
            declared: Vec::new(),
        }
    }

    /// Mark the class handle as not outliving the current class set.
    ///
    /// Entries capturing instances record the class by name instead of by
    /// handle.
    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    /// Declare a custom/opaque serialization protocol.
    ///
    /// Instances never qualify for structured entries.
    pub fn with_custom_serializer(mut self) -> Self {
        self.custom_serializer = true;
        self
    }

    /// Declare a public property.
    pub fn declare_public(mut self, name: &str) -> Self {
        self.declared.push(encode_key(&Visibility::Public, name));
        self
    }

    /// Declare a protected property.
    pub fn declare_protected(mut self, name: &str) -> Self {
        self.declared.push(encode_key(&Visibility::Protected, name));
        self
    }

    /// Declare a private property, scoped to this class.
    pub fn declare_private(mut self, name: &str) -> Self {
        let scope = crate::intern::intern(&self.name);
        self.declared
            .push(encode_key(&Visibility::Private(scope), name));
        self
    }
}

#[derive(Clone, Debug)]
struct ClassDef {
    name: String,
    persistent: bool,
    custom_serializer: bool,
    declared: Vec<String>,
}

#[derive(Clone, Debug)]
struct HostObject {
    class: ClassId,
    /// Raw (mangled) keys with values, declared-then-dynamic order.
    props: Vec<(String, LiveValue)>,
    wakeup_calls: u32,
}

/// Opaque wire form used by the reference host's serializer.
///
/// Objects are flattened in pre-order; a revisited object is written as a
/// back-reference into the flattening order, which keeps cyclic and shared
/// structures serializable.
#[derive(Serialize, Deserialize)]
enum SerValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SerValue>),
    Object(SerObject),
    BackRef(u32),
}

#[derive(Serialize, Deserialize)]
struct SerObject {
    class: String,
    props: Vec<(String, SerValue)>,
}

/// Thread-safe in-memory host runtime.
///
/// # Example
///
/// ```
/// use objcache::host::{ClassSpec, InMemoryHost, LiveValue, ObjectModel};
///
/// let host = InMemoryHost::new();
/// let point = host.register_class(ClassSpec::new("Point").declare_public("x"));
/// let obj = host.new_instance(point).unwrap();
/// host.set_raw(obj, "x", LiveValue::Int(3)).unwrap();
///
/// let props = host.enumerate_properties(obj).unwrap();
/// assert_eq!(props, vec![("x".to_string(), LiveValue::Int(3))]);
/// ```
pub struct InMemoryHost {
    classes: DashMap<u32, ClassDef>,
    by_name: DashMap<String, u32>,
    objects: DashMap<u64, HostObject>,
    next_class: AtomicU32,
    next_obj: AtomicU64,
    cycle_scans: AtomicUsize,
    serializer_checks: AtomicUsize,
}

impl InMemoryHost {
    /// Create an empty host runtime.
    pub fn new() -> Self {
        InMemoryHost {
            classes: DashMap::new(),
            by_name: DashMap::new(),
            objects: DashMap::new(),
            next_class: AtomicU32::new(0),
            next_obj: AtomicU64::new(0),
            cycle_scans: AtomicUsize::new(0),
            serializer_checks: AtomicUsize::new(0),
        }
    }

    /// Register a class and make it resolvable by name.
    pub fn register_class(&self, spec: ClassSpec) -> ClassId {
        let id = self.next_class.fetch_add(1, Ordering::Relaxed);
        self.by_name.insert(spec.name.clone(), id);
        self.classes.insert(
            id,
            ClassDef {
                name: spec.name,
                persistent: spec.persistent,
                custom_serializer: spec.custom_serializer,
                declared: spec.declared,
            },
        );
        ClassId(id)
    }

    /// Drop a class from by-name resolution, as if it were never loaded.
    ///
    /// Existing instances and handles stay valid; only `resolve_class`
    /// starts failing.
    pub fn unload_class(&self, name: &str) {
        self.by_name.remove(name);
    }

    /// Create an instance with its declared properties initialized to null.
    ///
    /// This is the ordinary instantiation path; the cache reconstructor uses
    /// [`ObjectModel::new_uninitialized`] instead.
    pub fn new_instance(&self, class: ClassId) -> Result<ObjId> {
        let def = self.class_def(class)?;
        let props = def
            .declared
            .iter()
            .map(|raw| (raw.clone(), LiveValue::Null))
            .collect();
        Ok(self.insert_object(class, props))
    }

    /// Set a property by its raw (mangled) key, appending it if absent.
    pub fn set_raw(&self, obj: ObjId, raw_key: &str, value: LiveValue) -> Result<()> {
        let mut entry = self
            .objects
            .get_mut(&obj.0)
            .ok_or_else(|| Error::HostError(format!("no such object: {:?}", obj)))?;
        if let Some(slot) = entry.props.iter_mut().find(|(k, _)| k == raw_key) {
            slot.1 = value;
        } else {
            entry.props.push((raw_key.to_string(), value));
        }
        Ok(())
    }

    /// Snapshot of an object's raw properties, for assertions.
    pub fn raw_properties(&self, obj: ObjId) -> Result<Vec<(String, LiveValue)>> {
        self.enumerate_properties(obj)
    }

    /// How many times the post-construction hook ran on `obj`.
    pub fn wakeup_count(&self, obj: ObjId) -> u32 {
        self.objects.get(&obj.0).map(|o| o.wakeup_calls).unwrap_or(0)
    }

    /// How many reachable-graph scans have run (test hook).
    pub fn cycle_scan_count(&self) -> usize {
        self.cycle_scans.load(Ordering::Relaxed)
    }

    /// How many serialization-protocol checks have run (test hook).
    pub fn serializer_check_count(&self) -> usize {
        self.serializer_checks.load(Ordering::Relaxed)
    }

    fn insert_object(&self, class: ClassId, props: Vec<(String, LiveValue)>) -> ObjId {
        let id = self.next_obj.fetch_add(1, Ordering::Relaxed);
        self.objects.insert(
            id,
            HostObject {
                class,
                props,
                wakeup_calls: 0,
            },
        );
        ObjId(id)
    }

    fn class_def(&self, class: ClassId) -> Result<ClassDef> {
        self.classes
            .get(&class.0)
            .map(|def| def.clone())
            .ok_or_else(|| Error::HostError(format!("no such class: {:?}", class)))
    }

    fn object(&self, obj: ObjId) -> Result<HostObject> {
        self.objects
            .get(&obj.0)
            .map(|o| o.clone())
            .ok_or_else(|| Error::HostError(format!("no such object: {:?}", obj)))
    }

    fn scan_for_internal_reference(&self, value: &LiveValue, seen: &mut HashSet<u64>) -> bool {
        match value {
            LiveValue::Object(obj) => {
                if !seen.insert(obj.0) {
                    return true;
                }
                let Ok(object) = self.object(*obj) else {
                    return false;
                };
                object
                    .props
                    .iter()
                    .any(|(_, v)| self.scan_for_internal_reference(v, seen))
            }
            LiveValue::List(items) => items
                .iter()
                .any(|v| self.scan_for_internal_reference(v, seen)),
            _ => false,
        }
    }

    fn flatten(
        &self,
        value: &LiveValue,
        order: &mut HashMap<u64, u32>,
    ) -> Result<SerValue> {
        Ok(match value {
            LiveValue::Null => SerValue::Null,
            LiveValue::Bool(b) => SerValue::Bool(*b),
            LiveValue::Int(i) => SerValue::Int(*i),
            LiveValue::Float(f) => SerValue::Float(*f),
            LiveValue::Str(s) => SerValue::Str(s.clone()),
            LiveValue::List(items) => SerValue::List(
                items
                    .iter()
                    .map(|v| self.flatten(v, order))
                    .collect::<Result<_>>()?,
            ),
            LiveValue::Object(obj) => {
                if let Some(index) = order.get(&obj.0) {
                    return Ok(SerValue::BackRef(*index));
                }
                order.insert(obj.0, order.len() as u32);
                let object = self.object(*obj)?;
                let class = self.class_def(object.class)?.name;
                let props = object
                    .props
                    .iter()
                    .map(|(raw, v)| Ok((raw.clone(), self.flatten(v, order)?)))
                    .collect::<Result<_>>()?;
                SerValue::Object(SerObject { class, props })
            }
        })
    }

    fn materialize(&self, value: &SerValue, table: &mut Vec<ObjId>) -> Result<LiveValue> {
        Ok(match value {
            SerValue::Null => LiveValue::Null,
            SerValue::Bool(b) => LiveValue::Bool(*b),
            SerValue::Int(i) => LiveValue::Int(*i),
            SerValue::Float(f) => LiveValue::Float(*f),
            SerValue::Str(s) => LiveValue::Str(s.clone()),
            SerValue::List(items) => LiveValue::List(
                items
                    .iter()
                    .map(|v| self.materialize(v, table))
                    .collect::<Result<_>>()?,
            ),
            SerValue::Object(ser) => {
                let class = self
                    .resolve_class(&ser.class)
                    .ok_or_else(|| Error::ClassUnresolved(ser.class.clone()))?;
                let obj = self.insert_object(class, Vec::new());
                // Register before recursing so back-references into this
                // object resolve while its properties are still being built.
                table.push(obj);
                for (raw, v) in &ser.props {
                    let live = self.materialize(v, table)?;
                    self.set_raw(obj, raw, live)?;
                }
                self.invoke_wakeup(obj)?;
                LiveValue::Object(obj)
            }
            SerValue::BackRef(index) => {
                let obj = table.get(*index as usize).ok_or_else(|| {
                    Error::DeserializationError(format!("dangling back-reference {}", index))
                })?;
                LiveValue::Object(*obj)
            }
        })
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectModel for InMemoryHost {
    fn enumerate_properties(&self, obj: ObjId) -> Result<Vec<(String, LiveValue)>> {
        Ok(self.object(obj)?.props)
    }

    fn class_of(&self, obj: ObjId) -> Result<ClassId> {
        Ok(self.object(obj)?.class)
    }

    fn class_name(&self, class: ClassId) -> Result<String> {
        Ok(self.class_def(class)?.name)
    }

    fn resolve_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).map(|id| ClassId(*id))
    }

    fn is_persistent_class(&self, class: ClassId) -> bool {
        self.class_def(class).map(|def| def.persistent).unwrap_or(false)
    }

    fn uses_custom_serializer(&self, obj: ObjId) -> bool {
        self.serializer_checks.fetch_add(1, Ordering::Relaxed);
        self.object(obj)
            .and_then(|o| self.class_def(o.class))
            .map(|def| def.custom_serializer)
            .unwrap_or(false)
    }

    fn has_internal_reference(&self, obj: ObjId) -> bool {
        self.cycle_scans.fetch_add(1, Ordering::Relaxed);
        let mut seen = HashSet::new();
        self.scan_for_internal_reference(&LiveValue::Object(obj), &mut seen)
    }

    fn new_uninitialized(&self, class: ClassId) -> Result<ObjId> {
        // No declared defaults: fields are installed explicitly afterwards.
        self.class_def(class)?;
        Ok(self.insert_object(class, Vec::new()))
    }

    fn set_property(&self, obj: ObjId, ctx: ClassId, name: &str, value: LiveValue) -> Result<()> {
        let object = self.object(obj)?;
        let def = self.class_def(object.class)?;
        let ctx_def = self.class_def(ctx)?;

        // Match the declared property tables the way the runtime would:
        // a private slot of the context class wins (whether declared on the
        // object's class or inherited from the context class), then a
        // protected slot, then a declared public slot; anything else lands
        // as a dynamic public property.
        let private_key = format!("\0{}\0{}", ctx_def.name, name);
        let protected_key = format!("\0*\0{}", name);
        let raw = if def.declared.iter().any(|k| k == &private_key)
            || ctx_def.declared.iter().any(|k| k == &private_key)
        {
            private_key
        } else if def.declared.iter().any(|k| k == &protected_key) {
            protected_key
        } else {
            name.to_string()
        };
        self.set_raw(obj, &raw, value)
    }

    fn invoke_wakeup(&self, obj: ObjId) -> Result<()> {
        let mut entry = self
            .objects
            .get_mut(&obj.0)
            .ok_or_else(|| Error::HostError(format!("no such object: {:?}", obj)))?;
        entry.wakeup_calls += 1;
        Ok(())
    }

    fn serialize_object(&self, obj: ObjId) -> Result<Vec<u8>> {
        let mut order = HashMap::new();
        let flat = self.flatten(&LiveValue::Object(obj), &mut order)?;
        postcard::to_allocvec(&flat).map_err(|e| {
            log::error!("Opaque serialization failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    fn deserialize_object(&self, bytes: &[u8]) -> Result<ObjId> {
        let flat: SerValue = postcard::from_bytes(bytes).map_err(|e| {
            log::error!("Opaque deserialization failed: {}", e);
            Error::DeserializationError(e.to_string())
        })?;
        let mut table = Vec::new();
        match self.materialize(&flat, &mut table)? {
            LiveValue::Object(obj) => Ok(obj),
            _ => Err(Error::DeserializationError(
                "opaque payload is not an object".to_string(),
            )),
        }
    }
}
