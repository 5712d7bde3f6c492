//! fixalloc-core: Core types for the fixalloc partition simulator
//!
//! This crate provides the fundamental types used throughout fixalloc:
//! - Partitions, jobs and their identifiers
//! - Placement policies
//! - Configuration and scenario file types
//! - Error handling

pub mod config;
pub mod error;
pub mod memory;
pub mod policy;

pub use config::*;
pub use error::*;
pub use memory::*;
pub use policy::*;
