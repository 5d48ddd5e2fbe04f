//! State module for tracking crawl progress
//!
//! This module provides the in-memory model a crawl mutates.
//!
//! # Components
//!
//! - `Record`: a parsed person record with its degrees and advisors
//! - `Slot`: resolution state of a single id (pending, absent, present)
//! - `Registry`: the dense, contiguously growing array of slots

mod record;
mod registry;
mod slot;

// Re-export main types
pub use record::{Advisor, Degree, NodeId, Rank, Record};
pub use registry::{Registry, RegistryError};
pub use slot::Slot;
