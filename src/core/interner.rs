//! Process-wide group-name interner.
//!
//! Remote group ids are strings; consumers only need to know whether two
//! players share a group, so each distinct name is mapped to a small integer.
//! The table only grows: an id is never reassigned to another name.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Shared interner used by every registry unless one is injected.
pub static GROUP_INTERNER: Lazy<Arc<GroupInterner>> = Lazy::new(|| Arc::new(GroupInterner::new()));

/// Group id of a player with no group.
pub const NO_GROUP: i32 = -1;

#[derive(Debug, Default)]
pub struct GroupInterner {
    ids: DashMap<String, i32>,
    next_id: AtomicI32,
}

impl GroupInterner {
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            next_id: AtomicI32::new(0),
        }
    }

    /// Clone of the process-wide instance.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&GROUP_INTERNER)
    }

    /// Returns the id for `name`, assigning the next free id on first sight.
    /// Matching is case-insensitive.
    pub fn intern(&self, name: &str) -> i32 {
        if name.is_empty() {
            return NO_GROUP;
        }
        let key = name.to_ascii_lowercase();
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        // entry() holds the shard lock, so two racing inserts agree on one id
        *self
            .ids
            .entry(key)
            .or_insert_with(|| self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.ids.get(&name.to_ascii_lowercase()).map(|id| *id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
