use crate::scatter::types::EntryHandle;
use bytemuck::Pod;
use std::collections::HashMap;

static ABSENT: ScatterResult = ScatterResult { bytes: None };

/// Raw bytes of one entry, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScatterResult {
    bytes: Option<Vec<u8>>,
}

impl ScatterResult {
    pub fn is_present(&self) -> bool {
        self.bytes.is_some()
    }

    /// Decodes the stored buffer as `T`.
    ///
    /// `None` when the entry was never issued, was skipped, failed, or was
    /// stored with a width other than `size_of::<T>()`.
    pub fn try_get<T: Pod>(&self) -> Option<T> {
        let bytes = self.bytes.as_deref()?;
        if bytes.len() != size_of::<T>() {
            return None;
        }
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Raw bytes, for entries registered with a custom size.
    pub fn try_get_bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

/// Results table keyed by `(scatter_index, entry_id)`.
#[derive(Debug, Default)]
pub struct ScatterResults {
    entries: HashMap<EntryHandle, ScatterResult>,
}

impl ScatterResults {
    pub(crate) fn insert(&mut self, handle: EntryHandle, bytes: Vec<u8>) {
        self.entries.insert(handle, ScatterResult { bytes: Some(bytes) });
    }

    /// Never fails; missing entries yield an absent result.
    pub fn get(&self, scatter_index: usize, entry_id: usize) -> &ScatterResult {
        self.entry(EntryHandle::new(scatter_index, entry_id))
    }

    pub fn entry(&self, handle: EntryHandle) -> &ScatterResult {
        self.entries.get(&handle).unwrap_or(&ABSENT)
    }

    pub fn try_get<T: Pod>(&self, scatter_index: usize, entry_id: usize) -> Option<T> {
        self.get(scatter_index, entry_id).try_get::<T>()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
