//! Core plumbing shared by the scheduler and the entity pipeline.

pub mod atomic;
pub mod channel;
pub mod config;
pub mod globals;
pub mod interner;
pub mod logging;
#[cfg(target_os = "linux")]
pub mod process_channel;

pub use channel::{is_valid_address, MemoryChannel, ReadRequest};
pub use config::RadarConfig;
pub use globals::TOKIO_RUNTIME;
pub use interner::{GroupInterner, GROUP_INTERNER};
pub use logging::init_logger;
#[cfg(target_os = "linux")]
pub use process_channel::ProcessChannel;
