//! Basic usage example of the object cache.

use objcache::error::Result;
use objcache::host::{ClassSpec, InMemoryHost, LiveValue};
use objcache::{CachedRepr, ObjectCache};

fn main() -> Result<()> {
    env_logger::init();

    println!("=== objcache basic usage ===\n");

    // Describe the host runtime: an Employment class with mixed visibility
    let host = InMemoryHost::new();
    let employment = host.register_class(
        ClassSpec::new("Employment")
            .declare_public("id")
            .declare_public("employer_name")
            .declare_protected("salary")
            .declare_private("review_notes"),
    );

    // Build a live object the way the runtime would
    let record = host.new_instance(employment)?;
    host.set_raw(record, "id", LiveValue::Str("emp_001".to_string()))?;
    host.set_raw(
        record,
        "employer_name",
        LiveValue::Str("Acme Corp".to_string()),
    )?;
    host.set_raw(record, "\0*\0salary", LiveValue::Float(75000.0))?;

    // Store it: the cache captures a structured, immutable entry
    let cache = ObjectCache::new(host);
    cache.store("employment:emp_001", &LiveValue::Object(record))?;

    let handle = cache
        .handle("employment:emp_001")
        .expect("entry was just stored");
    match handle.repr() {
        CachedRepr::Object(entry) => {
            println!(
                "stored structured entry: {} properties, {} bytes",
                entry.property_count(),
                objcache::memory_size(&handle)
            );
            for slot in entry.slots() {
                println!("  slot: {:?} {}", slot.visibility, slot.name);
            }
        }
        other => println!("stored {:?}", other),
    }

    // Fetch: every hit materializes a fresh live object
    let Some(LiveValue::Object(copy)) = cache.fetch("employment:emp_001")? else {
        println!("entry vanished?");
        return Ok(());
    };
    println!("\nfetched fresh object (distinct from the original):");
    for (raw, value) in cache.host().raw_properties(copy)? {
        println!("  {:?} = {:?}", raw, value);
    }

    // Occupancy telemetry for the whole store
    let stats = cache.stats();
    println!(
        "\ncache stats: {} entries ({} structured, {} opaque), {} bytes",
        stats.total_entries, stats.structured_entries, stats.opaque_entries, stats.total_bytes
    );

    Ok(())
}
