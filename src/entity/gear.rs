//! Equipped items, as far as classification needs them.
//!
//! Only the slot name and the item's short name are read. Valuation and
//! container contents are left to other consumers.

use crate::core::channel::{is_valid_address, MemoryChannel};
use crate::scatter::{decode_string, queue_string, ScatterPlan, StringLayout};
use log::debug;
use serde::{Deserialize, Serialize};

const ARRAY_ID: usize = 0;
const SLOT_NAME_PTR_ID: usize = 1;
const ITEM_ID: usize = 2;
const SLOT_NAME_ID: usize = 3;
const TEMPLATE_ID: usize = 4;
const SHORT_NAME_PTR_ID: usize = 5;
const SHORT_NAME_ID: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearOffsets {
    /// `i32` element count of the slot array.
    pub array_count: u64,
    /// First element pointer of the slot array.
    pub array_items: u64,
    /// Slots read past this are ignored.
    pub max_slots: usize,
    /// Slot -> slot name string.
    pub slot_name: u64,
    /// Slot -> contained item.
    pub contained_item: u64,
    /// Item -> template.
    pub item_template: u64,
    /// Template -> short name string.
    pub short_name: u64,
}

impl Default for GearOffsets {
    fn default() -> Self {
        Self {
            array_count: 0x18,
            array_items: 0x20,
            max_slots: 16,
            slot_name: 0x58,
            contained_item: 0x48,
            item_template: 0x40,
            short_name: 0x18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearItem {
    pub slot: String,
    pub short_name: String,
}

impl GearItem {
    pub fn new(slot: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            short_name: short_name.into(),
        }
    }
}

/// Items in occupied equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gear {
    items: Vec<GearItem>,
}

impl Gear {
    pub fn new(items: Vec<GearItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[GearItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_item(&self, short_name: &str) -> bool {
        self.items.iter().any(|item| item.short_name == short_name)
    }

    pub fn slot(&self, slot: &str) -> Option<&GearItem> {
        self.items.iter().find(|item| item.slot == slot)
    }
}

pub struct GearReader<'a> {
    channel: &'a dyn MemoryChannel,
    offsets: &'a GearOffsets,
    strings: &'a StringLayout,
}

impl<'a> GearReader<'a> {
    pub fn new(channel: &'a dyn MemoryChannel, offsets: &'a GearOffsets, strings: &'a StringLayout) -> Self {
        Self {
            channel,
            offsets,
            strings,
        }
    }

    /// Reads the slot array at `slots`. Any failure yields fewer items, never
    /// an error.
    pub fn read(&self, slots: u64) -> Gear {
        let slot_ptrs = self.read_slot_pointers(slots);
        if slot_ptrs.is_empty() {
            return Gear::default();
        }

        let mut plan = ScatterPlan::new(4);
        for (index, slot) in slot_ptrs.iter().enumerate() {
            let name_ptr = plan
                .round(0)
                .add_entry::<u64>(index, SLOT_NAME_PTR_ID, *slot, &[self.offsets.slot_name]);
            let item = plan
                .round(0)
                .add_entry::<u64>(index, ITEM_ID, *slot, &[self.offsets.contained_item]);
            queue_string(&mut plan, 1, index, SLOT_NAME_ID, name_ptr, self.strings);
            let template = plan
                .round(1)
                .add_entry::<u64>(index, TEMPLATE_ID, item, &[self.offsets.item_template]);
            let short_ptr = plan
                .round(2)
                .add_entry::<u64>(index, SHORT_NAME_PTR_ID, template, &[self.offsets.short_name]);
            queue_string(&mut plan, 3, index, SHORT_NAME_ID, short_ptr, self.strings);
        }
        plan.execute(self.channel);

        let results = plan.results();
        let items: Vec<GearItem> = (0..slot_ptrs.len())
            .filter_map(|index| {
                let slot = decode_string(results.get(index, SLOT_NAME_ID).try_get_bytes()?, self.strings)?;
                let short_name = decode_string(results.get(index, SHORT_NAME_ID).try_get_bytes()?, self.strings)?;
                Some(GearItem::new(slot, short_name))
            })
            .collect();

        debug!("Gear at 0x{:X}: {} of {} slots occupied", slots, items.len(), slot_ptrs.len());
        Gear::new(items)
    }

    fn read_slot_pointers(&self, slots: u64) -> Vec<u64> {
        if !is_valid_address(slots) {
            return Vec::new();
        }
        let header = self.offsets.array_items.saturating_sub(self.offsets.array_count) as usize;
        let size = header + self.offsets.max_slots * 8;

        let mut plan = ScatterPlan::new(1);
        plan.round(0)
            .add_entry_sized(0, ARRAY_ID, slots, &[self.offsets.array_count], size);
        plan.execute(self.channel);

        let Some(bytes) = plan.results().get(0, ARRAY_ID).try_get_bytes() else {
            return Vec::new();
        };
        let Some(count) = bytes.get(..4).and_then(|b| <[u8; 4]>::try_from(b).ok()).map(i32::from_le_bytes) else {
            return Vec::new();
        };
        if count <= 0 {
            return Vec::new();
        }
        let count = (count as usize).min(self.offsets.max_slots);

        bytes[header..]
            .chunks_exact(8)
            .take(count)
            .filter_map(|chunk| <[u8; 8]>::try_from(chunk).ok().map(u64::from_le_bytes))
            .filter(|ptr| is_valid_address(*ptr))
            .collect()
    }
}
