//! Infrastructure layer
//!
//! Network and filesystem implementations of the collaborator traits in
//! [`crate::core::remote`], plus platform directory resolution.

pub mod catalog;
pub mod dirs;
pub mod download;
