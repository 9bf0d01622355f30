//! Scatter-Gather Read Scheduler
//!
//! Reads over the remote channel pay a fixed latency per round trip, so the
//! scheduler batches every read whose address is already known into a single
//! call and only defers a read when its address is itself stored behind a
//! pointer that has not been fetched yet.
//!
//! # Architecture
//!
//! - `types`: entry handles, bases and execution counters
//! - `plan`: `ScatterPlan` (rounds, dependency resolution, execution) and
//!   pointer-chain helpers
//! - `results`: typed access to decoded buffers
//! - `strings`: remote length-prefixed UTF-16 strings
//!
//! # Usage
//!
//! ```ignore
//! let mut plan = ScatterPlan::new(2);
//! let info = plan.round(0).add_entry::<u64>(0, 0, profile, &[offsets.profile_info]);
//! let name = plan.round(1).add_entry::<u64>(0, 1, info, &[offsets.nickname]);
//! plan.execute(&channel);
//!
//! if let Some(name_ptr) = plan.try_get::<u64>(0, 1) { ... }
//! ```

pub mod plan;
pub mod results;
pub mod strings;
pub mod types;

pub use plan::{queue_ptr_chain, read_ptr_chain, RoundBuilder, ScatterPlan, ScatterRound};
pub use results::{ScatterResult, ScatterResults};
pub use strings::{decode_string, queue_string, read_string, transliterate_cyrillic, StringLayout};
pub use types::{EntryBase, EntryHandle, ExecutionStats, ScatterEntry};
