//! Live entity reconstruction over a read-only remote memory channel.
//!
//! - `core`: runtime globals, logging, configuration, the memory channel and
//!   the shared group-name interner
//! - `scatter`: multi-round scatter-gather read scheduler
//! - `entity`: skeleton tracking, classification, player assembly and the
//!   polling registry

pub mod core;
pub mod entity;
pub mod scatter;

#[cfg(test)]
pub mod tests;

pub use crate::core::{MemoryChannel, RadarConfig, ReadRequest};
pub use entity::{Player, PlayerBone, PlayerCategory, PlayerRegistry, Poller};
pub use scatter::{EntryBase, EntryHandle, ScatterPlan};
