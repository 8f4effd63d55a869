//! Core artifact cache and resolution logic
//!
//! This module contains all business logic for depot. Network I/O happens
//! only behind the collaborator traits in [`remote`]; the implementations
//! live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`artifact`] - Artifact identity, cache keys, catalog model types
//! - [`policy`] - Cache policy (first / always / never)
//! - [`store`] - Durable key-to-path cache store
//! - [`session`] - Credential session cache
//! - [`resolver`] - Policy-driven resolution state machine
//! - [`remote`] - Collaborator traits (download, catalog, identity)
//! - [`inspect`] - Cache directory statistics

pub mod artifact;
pub mod inspect;
pub mod policy;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod store;
