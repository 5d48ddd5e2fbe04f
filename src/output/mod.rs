//! Output module for emitting harvest results
//!
//! This module handles:
//! - Writing the merged registry as a single JSON line
//! - Writing individual slots in single-id mode
//! - Summarizing a registry as statistics

pub mod stats;

pub use stats::{compute_statistics, format_statistics, log_statistics, RegistryStatistics};

use crate::state::{Registry, Slot};
use crate::HarvestError;
use std::io::Write;

/// Writes the whole registry as one JSON array followed by a newline
pub fn write_registry<W: Write>(mut writer: W, registry: &Registry) -> Result<(), HarvestError> {
    serde_json::to_writer(&mut writer, registry)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes one slot as a JSON line; an absent slot is written as `{}`
pub fn write_slot<W: Write>(mut writer: W, slot: &Slot) -> Result<(), HarvestError> {
    serde_json::to_writer(&mut writer, slot)?;
    writer.write_all(b"\n")?;
    Ok(())
}
