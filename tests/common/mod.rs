//! Common test utilities and helpers
//!
//! Shared utilities for integration tests. Not every test binary uses
//! every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated cache directory for one test
///
/// Commands run through this helper see `DEPOT_CACHE_DIR` pointed at a
/// temporary directory, so tests never touch the real cache.
pub struct TestCache {
    /// Temporary directory holding the cache root
    pub dir: TempDir,
}

impl TestCache {
    /// Create a fresh, empty cache
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Cache root path
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file inside the cache root, returning its path
    pub fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Read the cache index file
    #[allow(dead_code)]
    pub fn read_index(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("cache.index"))
            .expect("Failed to read cache index")
    }

    /// Run the depot binary with this cache as its root
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_depot"))
            .env("DEPOT_CACHE_DIR", self.dir.path())
            .args(args)
            .output()
            .expect("Failed to execute depot")
    }
}

impl Default for TestCache {
    fn default() -> Self {
        Self::new()
    }
}
