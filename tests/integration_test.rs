//! Integration tests for objcache
//!
//! These tests verify end-to-end cache behavior across all components:
//! conversion, reconstruction, the opaque fallback, teardown, and occupancy
//! accounting over the in-memory reference host.

use objcache::host::{ClassSpec, InMemoryHost, LiveValue};
use objcache::{
    attempt_convert, memory_size, reconstruct, CachedRepr, CachedValue, Error, ObjectCache,
    OpaqueBlob, Visibility,
};
use std::sync::Arc;

// Test class registrations shared across scenarios
fn account_host() -> (InMemoryHost, objcache::host::ClassId) {
    let host = InMemoryHost::new();
    let class = host.register_class(
        ClassSpec::new("Account")
            .declare_public("id")
            .declare_protected("balance")
            .declare_private("secret"),
    );
    (host, class)
}

fn stand_in_blob() -> objcache::CachedHandle {
    CachedValue::object_blob(OpaqueBlob::from_host_bytes(b"stand-in"))
}

/// Test 1: End-to-End Round Trip
///
/// Verifies the complete flow for a nested, cycle-free object:
/// - store converts to a structured entry
/// - fetch materializes a fresh object
/// - every (visibility, name, value) triple survives, at any nesting depth
#[test]
fn test_end_to_end_round_trip() {
    let (host, class) = account_host();

    let inner = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(inner, "id", LiveValue::Int(2)).expect("Failed to set");
    host.set_raw(inner, "\0*\0balance", LiveValue::Float(10.5))
        .expect("Failed to set");

    let outer = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(outer, "id", LiveValue::Int(1)).expect("Failed to set");
    host.set_raw(outer, "\0Account\0secret", LiveValue::Object(inner))
        .expect("Failed to set");
    host.set_raw(
        outer,
        "tags",
        LiveValue::List(vec![
            LiveValue::Str("vip".to_string()),
            LiveValue::Null,
        ]),
    )
    .expect("Failed to set");

    let cache = ObjectCache::new(host);
    cache
        .store("accounts:1", &LiveValue::Object(outer))
        .expect("Failed to store");

    // Stored as a structured entry, not an opaque blob
    let handle = cache.handle("accounts:1").expect("entry should exist");
    assert!(matches!(handle.repr(), CachedRepr::Object(_)));

    let fetched = cache.fetch("accounts:1").expect("Failed to fetch");
    let Some(LiveValue::Object(rebuilt)) = fetched else {
        panic!("expected an object back");
    };
    assert_ne!(rebuilt, outer, "fetch must materialize a fresh object");

    let host = cache.host();
    let props = host.raw_properties(rebuilt).expect("Failed to read back");
    assert_eq!(props.len(), 4);
    assert_eq!(props[0], ("id".to_string(), LiveValue::Int(1)));
    assert_eq!(props[1].0, "\0*\0balance");
    assert_eq!(props[1].1, LiveValue::Null);

    // The nested private object was itself rebuilt fresh
    let (raw_secret, secret_value) = &props[2];
    assert_eq!(raw_secret, "\0Account\0secret");
    let LiveValue::Object(rebuilt_inner) = secret_value else {
        panic!("expected nested object");
    };
    assert_ne!(*rebuilt_inner, inner);
    assert_eq!(
        host.raw_properties(*rebuilt_inner).expect("Failed to read back"),
        host.raw_properties(inner).expect("Failed to read back"),
    );

    assert_eq!(
        props[3],
        (
            "tags".to_string(),
            LiveValue::List(vec![LiveValue::Str("vip".to_string()), LiveValue::Null])
        )
    );
}

/// Test 2: Idempotent Rejection
///
/// A rejected object stays rejected, and the second attempt performs no
/// cycle scan or serialization-protocol check.
#[test]
fn test_idempotent_rejection_skips_checks() {
    let (host, class) = account_host();
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "id", LiveValue::Object(obj))
        .expect("Failed to set");

    let existing = stand_in_blob();
    assert!(attempt_convert(&host, &existing, &LiveValue::Object(obj)).is_none());

    let scans_after_first = host.cycle_scan_count();
    let checks_after_first = host.serializer_check_count();

    assert!(attempt_convert(&host, &existing, &LiveValue::Object(obj)).is_none());
    assert_eq!(host.cycle_scan_count(), scans_after_first);
    assert_eq!(host.serializer_check_count(), checks_after_first);
}

/// Test 3: Visibility Table
///
/// Raw keys `"\0*\0x"`, `"\0Foo\0y"`, `"z"` decode to protected, private
/// and public respectively, and survive a full store/fetch cycle.
#[test]
fn test_visibility_table() {
    let host = InMemoryHost::new();
    host.register_class(ClassSpec::new("Foo").declare_private("y"));
    let class = host.register_class(
        ClassSpec::new("Mixed")
            .declare_protected("x")
            .declare_public("z"),
    );
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "\0*\0x", LiveValue::Int(1)).expect("Failed to set");
    host.set_raw(obj, "z", LiveValue::Int(3)).expect("Failed to set");
    host.set_raw(obj, "\0Foo\0y", LiveValue::Int(2)).expect("Failed to set");

    let existing = stand_in_blob();
    let handle = attempt_convert(&host, &existing, &LiveValue::Object(obj))
        .expect("conversion should be accepted");
    let CachedRepr::Object(entry) = handle.repr() else {
        panic!("expected structured entry");
    };
    let visibilities: Vec<(Visibility, &str)> = entry
        .slots()
        .iter()
        .map(|slot| (slot.visibility, slot.name))
        .collect();
    assert_eq!(
        visibilities,
        vec![
            (Visibility::Protected, "x"),
            (Visibility::Public, "z"),
            (Visibility::Private("Foo"), "y"),
        ]
    );

    // And the triples survive reconstruction
    let rebuilt = reconstruct(&host, &handle).expect("Failed to rebuild");
    assert_eq!(
        host.raw_properties(rebuilt).expect("Failed to read back"),
        vec![
            ("\0*\0x".to_string(), LiveValue::Int(1)),
            ("z".to_string(), LiveValue::Int(3)),
            ("\0Foo\0y".to_string(), LiveValue::Int(2)),
        ]
    );
}

/// Test 4: Root Class Failure Aborts Reconstruction
///
/// An entry whose (by-name) class is no longer loadable reconstructs to an
/// explicit failure, never a partial object.
#[test]
fn test_root_class_failure_aborts_whole_fetch() {
    let host = InMemoryHost::new();
    let class = host.register_class(
        ClassSpec::new("Temp").transient().declare_public("p"),
    );
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "p", LiveValue::Int(1)).expect("Failed to set");

    let cache = ObjectCache::new(host);
    cache
        .store("temp", &LiveValue::Object(obj))
        .expect("Failed to store");

    cache.host().unload_class("Temp");
    match cache.fetch("temp") {
        Err(Error::ClassUnresolved(name)) => assert_eq!(name, "Temp"),
        other => panic!("expected root-class failure, got {:?}", other),
    }
}

/// Test 5: Partial Property Failure
///
/// One unresolvable private scope skips exactly that property; the other
/// properties land and the post-construction hook runs exactly once.
#[test]
fn test_partial_property_failure() {
    let (host, class) = account_host();
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "id", LiveValue::Int(9)).expect("Failed to set");
    host.set_raw(obj, "\0MissingClass\0hidden", LiveValue::Int(13))
        .expect("Failed to set");
    host.set_raw(obj, "\0*\0balance", LiveValue::Float(4.0))
        .expect("Failed to set");

    let cache = ObjectCache::new(host);
    cache
        .store("accounts:9", &LiveValue::Object(obj))
        .expect("Failed to store");

    let fetched = cache.fetch("accounts:9").expect("Failed to fetch");
    let Some(LiveValue::Object(rebuilt)) = fetched else {
        panic!("expected an object back");
    };

    let host = cache.host();
    let props = host.raw_properties(rebuilt).expect("Failed to read back");
    let keys: Vec<&str> = props.iter().map(|(k, _)| k.as_str()).collect();
    assert!(keys.contains(&"id"));
    assert!(keys.contains(&"\0*\0balance"));
    assert!(
        !keys.iter().any(|k| k.contains("hidden")),
        "the unresolvable property must be absent, got {:?}",
        keys
    );
    assert_eq!(host.wakeup_count(rebuilt), 1);
}

/// Test 6: Exclusive Release
///
/// Destroying an entry releases its exclusively-owned child; a child shared
/// with another, still-live entry survives.
#[test]
fn test_exclusive_release_on_delete() {
    let (host, class) = account_host();
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "id", LiveValue::Str("payload".to_string()))
        .expect("Failed to set");

    let cache = ObjectCache::new(host);
    cache
        .store("only", &LiveValue::Object(obj))
        .expect("Failed to store");

    let handle = cache.handle("only").expect("entry should exist");
    let CachedRepr::Object(entry) = handle.repr() else {
        panic!("expected structured entry");
    };
    let child = entry.slots()[0]
        .value
        .as_ref()
        .expect("child should be present");
    let weak_child = Arc::downgrade(child);
    // The slot is the child's only owner
    assert_eq!(Arc::strong_count(child), 1);

    drop(handle);
    cache.delete("only");
    assert!(
        weak_child.upgrade().is_none(),
        "deleting the entry must release its exclusively-owned child"
    );
}

/// Test 6b: a child shared across two entries outlives either one.
#[test]
fn test_shared_child_survives_sibling_entry() {
    let shared = CachedValue::str("shared across entries");

    let make_entry = |child: objcache::CachedHandle| {
        CachedValue::object(objcache::ObjectEntry::new(
            objcache::ClassIdentity::Named("Holder"),
            vec![objcache::PropertySlot {
                visibility: Visibility::Public,
                name: "x",
                value: Some(child),
            }],
        ))
    };

    let first = make_entry(Arc::clone(&shared));
    let second = make_entry(Arc::clone(&shared));
    let weak = Arc::downgrade(&shared);
    drop(shared);

    drop(first);
    assert!(
        weak.upgrade().is_some(),
        "child is still referenced by the second entry"
    );
    drop(second);
    assert!(weak.upgrade().is_none());
}

/// Test 7: Size Accounting
///
/// 0 properties cost exactly one header; N properties cost header plus N
/// slots plus the children's own sizes, with null children free.
#[test]
fn test_size_accounting() {
    use objcache::stats::{entry_header_size, slot_size};

    let (host, class) = account_host();
    let empty_class = host.register_class(ClassSpec::new("Empty"));
    let empty = host.new_instance(empty_class).expect("Failed to instantiate");

    let existing = stand_in_blob();
    let empty_handle = attempt_convert(&host, &existing, &LiveValue::Object(empty))
        .expect("conversion should be accepted");
    assert_eq!(memory_size(&empty_handle), entry_header_size());

    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "id", LiveValue::Int(5)).expect("Failed to set");
    // balance and secret stay null: they occupy slots but no children

    let existing = stand_in_blob();
    let handle = attempt_convert(&host, &existing, &LiveValue::Object(obj))
        .expect("conversion should be accepted");
    let CachedRepr::Object(entry) = handle.repr() else {
        panic!("expected structured entry");
    };
    let child_size: usize = entry
        .slots()
        .iter()
        .filter_map(|slot| slot.value.as_ref())
        .map(memory_size)
        .sum();
    assert_eq!(
        memory_size(&handle),
        entry_header_size() + 3 * slot_size() + child_size
    );
}

/// Test 8: Opaque Fallback Round Trip
///
/// A custom-serializer object never becomes a structured entry but still
/// round-trips through the host's opaque protocol.
#[test]
fn test_custom_serializer_falls_back_and_round_trips() {
    let host = InMemoryHost::new();
    let sealed = host.register_class(
        ClassSpec::new("Sealed")
            .with_custom_serializer()
            .declare_public("inner"),
    );
    let obj = host.new_instance(sealed).expect("Failed to instantiate");
    host.set_raw(obj, "inner", LiveValue::Str("kept".to_string()))
        .expect("Failed to set");

    let cache = ObjectCache::new(host);
    cache
        .store("sealed", &LiveValue::Object(obj))
        .expect("Failed to store");

    let handle = cache.handle("sealed").expect("entry should exist");
    assert!(matches!(handle.repr(), CachedRepr::Blob(_)));

    let fetched = cache.fetch("sealed").expect("Failed to fetch");
    let Some(LiveValue::Object(rebuilt)) = fetched else {
        panic!("expected an object back");
    };
    assert_eq!(
        cache
            .host()
            .raw_properties(rebuilt)
            .expect("Failed to read back"),
        vec![("inner".to_string(), LiveValue::Str("kept".to_string()))]
    );
}

/// Test 9: Concurrent readers over one shared entry.
///
/// Entries are immutable after publication; many threads fetch fresh
/// objects from the same entry without synchronization.
#[test]
fn test_concurrent_fetches() {
    let (host, class) = account_host();
    let obj = host.new_instance(class).expect("Failed to instantiate");
    host.set_raw(obj, "id", LiveValue::Int(77)).expect("Failed to set");

    let cache = Arc::new(ObjectCache::new(host));
    cache
        .store("hot", &LiveValue::Object(obj))
        .expect("Failed to store");

    let mut handles = vec![];
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for _ in 0..50 {
                let fetched = cache.fetch("hot").expect("Failed to fetch");
                let Some(LiveValue::Object(rebuilt)) = fetched else {
                    panic!("expected an object");
                };
                let props = cache
                    .host()
                    .raw_properties(rebuilt)
                    .expect("Failed to read back");
                assert_eq!(props[0], ("id".to_string(), LiveValue::Int(77)));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("reader thread failed");
    }
}
