//! Round-layered scatter read plan.

use crate::core::channel::{is_valid_address, MemoryChannel, ReadRequest};
use crate::scatter::results::ScatterResults;
use crate::scatter::types::{EntryBase, EntryHandle, ExecutionStats, ScatterEntry};
use bytemuck::Pod;
use log::{debug, log_enabled, warn, Level};
use std::collections::HashMap;

/// Entries whose addresses are all known when the round starts.
#[derive(Debug, Default)]
pub struct ScatterRound {
    entries: Vec<ScatterEntry>,
}

impl ScatterRound {
    pub fn entries(&self) -> &[ScatterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A set of dependent remote reads, executed as a sequence of batched rounds.
///
/// Round `k` may only use results of rounds `< k` as base addresses. Each
/// round costs one physical round trip, so the number of non-empty rounds is
/// what a caller should minimise.
///
/// Built once, executed once, read, dropped.
#[derive(Debug, Default)]
pub struct ScatterPlan {
    rounds: Vec<ScatterRound>,
    entry_rounds: HashMap<EntryHandle, usize>,
    results: ScatterResults,
    executed: bool,
}

/// Adds entries to one round of a plan.
pub struct RoundBuilder<'a> {
    plan: &'a mut ScatterPlan,
    round: usize,
}

impl RoundBuilder<'_> {
    pub fn index(&self) -> usize {
        self.round
    }

    /// Registers a read of `T` at `base + sum(offsets)`.
    pub fn add_entry<T: Pod>(
        &mut self,
        scatter_index: usize,
        entry_id: usize,
        base: impl Into<EntryBase>,
        offsets: &[u64],
    ) -> EntryHandle {
        self.plan.push_entry(
            self.round,
            scatter_index,
            entry_id,
            base.into(),
            offsets,
            size_of::<T>(),
            std::any::type_name::<T>(),
        )
    }

    /// Registers a raw read of `size` bytes at `base + sum(offsets)`.
    pub fn add_entry_sized(
        &mut self,
        scatter_index: usize,
        entry_id: usize,
        base: impl Into<EntryBase>,
        offsets: &[u64],
        size: usize,
    ) -> EntryHandle {
        self.plan
            .push_entry(self.round, scatter_index, entry_id, base.into(), offsets, size, "bytes")
    }
}

impl ScatterPlan {
    /// Plan with `round_count` empty rounds.
    pub fn new(round_count: usize) -> Self {
        let mut rounds = Vec::with_capacity(round_count);
        rounds.resize_with(round_count, ScatterRound::default);
        Self {
            rounds,
            ..Default::default()
        }
    }

    /// Plan whose rounds are chosen from the dependency depth of each entry.
    pub fn auto() -> Self {
        Self::new(0)
    }

    /// Builder for round `round`; rounds past the end are allocated.
    pub fn round(&mut self, round: usize) -> RoundBuilder<'_> {
        if round >= self.rounds.len() {
            self.rounds.resize_with(round + 1, ScatterRound::default);
        }
        RoundBuilder { plan: self, round }
    }

    /// Registers a read in the earliest round its base allows: round 0 for a
    /// literal address, one past the referenced entry's round otherwise.
    pub fn add_auto<T: Pod>(
        &mut self,
        scatter_index: usize,
        entry_id: usize,
        base: impl Into<EntryBase>,
        offsets: &[u64],
    ) -> EntryHandle {
        let base = base.into();
        let round = self.depth_of(&base);
        self.round(round).add_entry::<T>(scatter_index, entry_id, base, offsets)
    }

    /// `add_auto` for a raw read of `size` bytes.
    pub fn add_auto_sized(
        &mut self,
        scatter_index: usize,
        entry_id: usize,
        base: impl Into<EntryBase>,
        offsets: &[u64],
        size: usize,
    ) -> EntryHandle {
        let base = base.into();
        let round = self.depth_of(&base);
        self.round(round).add_entry_sized(scatter_index, entry_id, base, offsets, size)
    }

    fn depth_of(&self, base: &EntryBase) -> usize {
        match base {
            EntryBase::Address(_) => 0,
            EntryBase::Entry(handle) => match self.entry_rounds.get(handle) {
                Some(round) => round + 1,
                None => {
                    warn!("Scatter base {} is not registered, entry will be absent", handle);
                    0
                },
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_entry(
        &mut self,
        round: usize,
        scatter_index: usize,
        entry_id: usize,
        base: EntryBase,
        offsets: &[u64],
        size: usize,
        type_name: &'static str,
    ) -> EntryHandle {
        let handle = EntryHandle::new(scatter_index, entry_id);

        if self.entry_rounds.contains_key(&handle) {
            warn!("Duplicate scatter entry {} ignored", handle);
            return handle;
        }

        if let EntryBase::Entry(dependency) = base {
            match self.entry_rounds.get(&dependency) {
                Some(&dep_round) if dep_round < round => {},
                Some(&dep_round) => warn!(
                    "Scatter entry {} in round {} depends on {} from round {}, entry will be absent",
                    handle, round, dependency, dep_round
                ),
                None => warn!(
                    "Scatter entry {} depends on unregistered {}, entry will be absent",
                    handle, dependency
                ),
            }
        }

        let displacement = offsets.iter().fold(0u64, |acc, offset| acc.wrapping_add(*offset));
        self.rounds[round].entries.push(ScatterEntry {
            handle,
            base,
            displacement,
            size,
            type_name,
        });
        self.entry_rounds.insert(handle, round);
        handle
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn rounds(&self) -> &[ScatterRound] {
        &self.rounds
    }

    pub fn entry_count(&self) -> usize {
        self.entry_rounds.len()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Round an entry was registered in.
    pub fn round_of(&self, handle: EntryHandle) -> Option<usize> {
        self.entry_rounds.get(&handle).copied()
    }

    /// Runs every round in order against `channel`.
    ///
    /// Never fails: a broken chain, a failed read or a wrongly sized buffer
    /// leaves the affected entry (and everything depending on it) absent.
    pub fn execute(&mut self, channel: &dyn MemoryChannel) -> ExecutionStats {
        let mut stats = ExecutionStats::default();
        if self.executed {
            warn!("Scatter plan executed twice, ignoring");
            return stats;
        }
        self.executed = true;

        let Self { rounds, results, .. } = self;

        for (round_index, round) in rounds.iter().enumerate() {
            let mut pending: Vec<(EntryHandle, ReadRequest)> = Vec::with_capacity(round.entries.len());

            for entry in &round.entries {
                match resolve_address(entry, results) {
                    Some(address) => pending.push((entry.handle, ReadRequest::new(address, entry.size))),
                    None => stats.entries_skipped += 1,
                }
            }

            if pending.is_empty() {
                continue;
            }

            let requests: Vec<ReadRequest> = pending.iter().map(|(_, request)| *request).collect();
            let mut outputs = channel.batch_read(&requests).into_iter();
            stats.rounds_issued += 1;
            stats.requests_issued += requests.len();

            for (handle, request) in pending {
                match outputs.next() {
                    Some(Ok(bytes)) if bytes.len() == request.size => results.insert(handle, bytes),
                    Some(Ok(bytes)) => {
                        stats.entries_failed += 1;
                        debug!(
                            "Scatter entry {} at 0x{:X}: expected {} bytes, got {}",
                            handle,
                            request.address,
                            request.size,
                            bytes.len()
                        );
                    },
                    Some(Err(e)) => {
                        stats.entries_failed += 1;
                        debug!("Scatter entry {} at 0x{:X} failed: {:?}", handle, request.address, e);
                    },
                    None => {
                        stats.entries_failed += 1;
                        debug!("Scatter entry {} at 0x{:X}: no buffer returned", handle, request.address);
                    },
                }
            }

            if log_enabled!(Level::Debug) {
                debug!(
                    "Scatter round {} issued {} reads ({} skipped so far, {} failed so far)",
                    round_index, requests.len(), stats.entries_skipped, stats.entries_failed
                );
            }
        }

        stats
    }

    pub fn results(&self) -> &ScatterResults {
        &self.results
    }

    pub fn try_get<T: Pod>(&self, scatter_index: usize, entry_id: usize) -> Option<T> {
        self.results.try_get::<T>(scatter_index, entry_id)
    }

    pub fn try_get_handle<T: Pod>(&self, handle: EntryHandle) -> Option<T> {
        self.results.entry(handle).try_get::<T>()
    }

    /// Consumes the plan, keeping only its results.
    pub fn into_results(self) -> ScatterResults {
        self.results
    }
}

fn resolve_address(entry: &ScatterEntry, results: &ScatterResults) -> Option<u64> {
    let base = match entry.base {
        EntryBase::Address(address) => address,
        EntryBase::Entry(dependency) => results.entry(dependency).try_get::<u64>()?,
    };
    if !is_valid_address(base) {
        return None;
    }
    let address = base.wrapping_add(entry.displacement);
    is_valid_address(address).then_some(address)
}

/// Queues a pointer chain: one pointer-sized entry per offset, each in the
/// round after the previous one, starting at `first_round`. Ids run from
/// `first_id` upwards. Returns the handle of the last link.
pub fn queue_ptr_chain(
    plan: &mut ScatterPlan,
    first_round: usize,
    scatter_index: usize,
    first_id: usize,
    base: impl Into<EntryBase>,
    offsets: &[u64],
) -> Option<EntryHandle> {
    let mut base = base.into();
    let mut last = None;
    for (link, offset) in offsets.iter().enumerate() {
        let handle = plan
            .round(first_round + link)
            .add_entry::<u64>(scatter_index, first_id + link, base, &[*offset]);
        base = EntryBase::Entry(handle);
        last = Some(handle);
    }
    last
}

/// Follows `base + offsets[0] -> +offsets[1] -> ...`, one round per link.
/// Returns 0 when any link is absent or null.
pub fn read_ptr_chain(channel: &dyn MemoryChannel, base: u64, offsets: &[u64]) -> u64 {
    if offsets.is_empty() {
        return base;
    }
    let mut plan = ScatterPlan::auto();
    let Some(last) = queue_ptr_chain(&mut plan, 0, 0, 0, base, offsets) else {
        return 0;
    };
    plan.execute(channel);
    plan.try_get_handle::<u64>(last).unwrap_or(0)
}
