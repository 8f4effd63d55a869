//! CLI commands for `depot cache`
//!
//! Direct cache management: list, add, delete, info, clean.

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::output::status;
use crate::config::defaults::CACHE_DIR_KEY;
use crate::core::inspect::cache_info;
use crate::core::store::CacheStore;
use crate::error::DepotError;
use crate::infra::dirs;

fn open_store() -> Result<CacheStore, DepotError> {
    Ok(CacheStore::open(&dirs::cache_root())?)
}

/// Execute cache list subcommand
pub async fn execute_list() -> Result<()> {
    let store = open_store()?;
    let snapshot = store.snapshot();

    let mut keys: Vec<&String> = snapshot.keys().collect();
    keys.sort();
    for key in keys {
        println!("{key}={}", snapshot[key]);
    }
    Ok(())
}

/// Execute cache add subcommand
pub async fn execute_add(key: &str, path: &str) -> Result<()> {
    if !Path::new(path).is_file() {
        bail!("'{path}' does not exist or is not a regular file");
    }

    let store = open_store()?;
    if store.has_matching_entry(key, path) {
        println!("{} '{key}' already registered", status::SUCCESS);
        return Ok(());
    }

    let persisted = store.put(key, path)?;
    if persisted {
        println!("{} Added '{}'", status::SUCCESS, key.to_lowercase());
    } else {
        println!(
            "{} Added '{}' in memory, but the cache index could not be written",
            status::WARNING,
            key.to_lowercase()
        );
    }
    Ok(())
}

/// Execute cache delete subcommand
pub async fn execute_delete(key: &str) -> Result<()> {
    let store = open_store()?;

    if key.eq_ignore_ascii_case(CACHE_DIR_KEY) {
        let current = store.delete(key)?;
        println!(
            "{} '{CACHE_DIR_KEY}' is protected and was not removed (currently {})",
            status::WARNING,
            current.unwrap_or_default()
        );
        return Ok(());
    }

    match store.delete(key)? {
        Some(previous) => println!("{} Removed '{key}' (was {previous})", status::SUCCESS),
        None => println!("{} '{key}' was not in the cache", status::WARNING),
    }
    Ok(())
}

/// Execute cache info subcommand
pub async fn execute_info() -> Result<()> {
    let store = open_store()?;
    let info = cache_info(&store);

    println!("Location: {}", info.path.display());
    println!("Size: {}", info.format_size());
    println!("Entries: {}", info.entry_count);
    if info.stale_count > 0 {
        println!(
            "{} {} entr{} point at missing files (run 'depot cache clean')",
            status::WARNING,
            info.stale_count,
            if info.stale_count == 1 { "y" } else { "ies" }
        );
    }
    Ok(())
}

/// Execute cache clean subcommand
///
/// Removes entries whose files are gone; the files themselves are left
/// alone and the protected root key is never touched.
pub async fn execute_clean() -> Result<()> {
    let store = open_store()?;
    let mut removed = 0;

    for (key, value) in store.snapshot() {
        if key == CACHE_DIR_KEY {
            continue;
        }
        if !Path::new(&value).is_file() {
            store.delete(&key)?;
            removed += 1;
        }
    }

    if removed > 0 {
        println!(
            "{} Removed {removed} stale entr{}",
            status::SUCCESS,
            if removed == 1 { "y" } else { "ies" }
        );
    } else {
        println!("{} Cache is clean", status::SUCCESS);
    }
    Ok(())
}
