use std::fmt;

/// Identifies one entry inside a plan: the logical object it belongs to
/// (`scatter_index`, e.g. one player among many) and a caller-chosen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHandle {
    pub scatter_index: usize,
    pub entry_id: usize,
}

impl EntryHandle {
    pub fn new(scatter_index: usize, entry_id: usize) -> Self {
        Self { scatter_index, entry_id }
    }
}

impl fmt::Display for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.scatter_index, self.entry_id)
    }
}

/// Where an entry's address comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryBase {
    /// Known before the plan runs.
    Address(u64),
    /// The pointer-sized result of an entry in an earlier round.
    Entry(EntryHandle),
}

impl From<u64> for EntryBase {
    fn from(address: u64) -> Self {
        EntryBase::Address(address)
    }
}

impl From<EntryHandle> for EntryBase {
    fn from(handle: EntryHandle) -> Self {
        EntryBase::Entry(handle)
    }
}

impl From<&EntryHandle> for EntryBase {
    fn from(handle: &EntryHandle) -> Self {
        EntryBase::Entry(*handle)
    }
}

/// A registered read.
#[derive(Debug, Clone)]
pub struct ScatterEntry {
    pub handle: EntryHandle,
    pub base: EntryBase,
    /// Sum of the offset chain, added to the resolved base.
    pub displacement: u64,
    /// Bytes to read; `size_of::<T>()` unless overridden.
    pub size: usize,
    pub type_name: &'static str,
}

/// Counters from one `ScatterPlan::execute`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Physical batched calls made (empty rounds issue none).
    pub rounds_issued: usize,
    pub requests_issued: usize,
    /// Entries whose base was absent, zero or invalid.
    pub entries_skipped: usize,
    /// Entries whose read failed or returned a wrongly sized buffer.
    pub entries_failed: usize,
}
