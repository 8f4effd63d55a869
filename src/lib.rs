//! Depot - local artifact cache and resolver
//!
//! This library resolves named software artifacts (installers and patches)
//! to files on local disk, backed by a persistent key/value cache and a
//! policy-driven fallback to a remote download catalog.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Cache store, resolver, and session cache (no network I/O)
//! - [`infra`] - Infrastructure layer (HTTP catalog, downloads, directories)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
