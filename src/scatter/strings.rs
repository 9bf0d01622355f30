//! Remote managed strings: a 32-bit character count followed by UTF-16LE
//! code units.
//!
//! A string is read in a single request covering the count and up to
//! `max_chars` code units, so it can ride in the same round as other reads.

use crate::core::channel::MemoryChannel;
use crate::scatter::plan::ScatterPlan;
use crate::scatter::types::{EntryBase, EntryHandle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringLayout {
    /// Offset of the `i32` character count from the string object.
    pub length_offset: u64,
    /// Offset of the first UTF-16 code unit.
    pub chars_offset: u64,
    /// Longer strings are truncated.
    pub max_chars: usize,
}

impl Default for StringLayout {
    fn default() -> Self {
        Self {
            length_offset: 0x10,
            chars_offset: 0x14,
            max_chars: 64,
        }
    }
}

impl StringLayout {
    /// Bytes fetched per string, starting at `length_offset`.
    pub fn read_size(&self) -> usize {
        self.chars_offset.saturating_sub(self.length_offset) as usize + self.max_chars * 2
    }
}

/// Queues a read of the string object whose address is `base`.
pub fn queue_string(
    plan: &mut ScatterPlan,
    round: usize,
    scatter_index: usize,
    entry_id: usize,
    base: impl Into<EntryBase>,
    layout: &StringLayout,
) -> EntryHandle {
    plan.round(round)
        .add_entry_sized(scatter_index, entry_id, base, &[layout.length_offset], layout.read_size())
}

/// Decodes a buffer produced by `queue_string`.
pub fn decode_string(bytes: &[u8], layout: &StringLayout) -> Option<String> {
    let header: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    let length = i32::from_le_bytes(header);
    if length < 0 {
        return None;
    }
    let length = (length as usize).min(layout.max_chars);
    let start = layout.chars_offset.saturating_sub(layout.length_offset) as usize;
    let raw = bytes.get(start..start + length * 2)?;
    let units: Vec<u16> = raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
    Some(String::from_utf16_lossy(&units).trim_end_matches('\0').to_string())
}

/// Reads one string outside of any plan. `None` for a null address or a
/// failed read.
pub fn read_string(channel: &dyn MemoryChannel, address: u64, layout: &StringLayout) -> Option<String> {
    let mut plan = ScatterPlan::new(1);
    let handle = queue_string(&mut plan, 0, 0, 0, address, layout);
    plan.execute(channel);
    decode_string(plan.results().entry(handle).try_get_bytes()?, layout)
}

/// Latin rendering of Cyrillic nicknames; other characters pass through.
pub fn transliterate_cyrillic(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        let mapped = match lower {
            'а' => "a",
            'б' => "b",
            'в' => "v",
            'г' => "g",
            'д' => "d",
            'е' => "e",
            'ё' => "yo",
            'ж' => "zh",
            'з' => "z",
            'и' => "i",
            'й' => "y",
            'к' => "k",
            'л' => "l",
            'м' => "m",
            'н' => "n",
            'о' => "o",
            'п' => "p",
            'р' => "r",
            'с' => "s",
            'т' => "t",
            'у' => "u",
            'ф' => "f",
            'х' => "kh",
            'ц' => "ts",
            'ч' => "ch",
            'ш' => "sh",
            'щ' => "shch",
            'ъ' => "",
            'ы' => "y",
            'ь' => "",
            'э' => "e",
            'ю' => "yu",
            'я' => "ya",
            _ => {
                out.push(c);
                continue;
            },
        };
        if c != lower {
            // keep the capital on the first letter only
            let mut chars = mapped.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(mapped);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str, layout: &StringLayout) -> Vec<u8> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut bytes = vec![0u8; layout.read_size()];
        bytes[..4].copy_from_slice(&(units.len() as i32).to_le_bytes());
        let start = (layout.chars_offset - layout.length_offset) as usize;
        for (i, unit) in units.iter().take(layout.max_chars).enumerate() {
            bytes[start + i * 2..start + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_string() {
        let layout = StringLayout::default();
        assert_eq!(decode_string(&encode("Killa", &layout), &layout).as_deref(), Some("Killa"));
        assert_eq!(decode_string(&encode("", &layout), &layout).as_deref(), Some(""));
    }

    #[test]
    fn test_decode_truncates_long_strings() {
        let layout = StringLayout {
            max_chars: 4,
            ..Default::default()
        };
        assert_eq!(decode_string(&encode("Shturman", &layout), &layout).as_deref(), Some("Shtu"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let layout = StringLayout::default();
        let mut bytes = encode("abc", &layout);
        bytes[..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(decode_string(&bytes, &layout), None);
        assert_eq!(decode_string(&[1, 0], &layout), None);
    }

    #[test]
    fn test_transliterate() {
        assert_eq!(transliterate_cyrillic("Решала"), "Reshala");
        assert_eq!(transliterate_cyrillic("Жора_99"), "Zhora_99");
        assert_eq!(transliterate_cyrillic("Killa"), "Killa");
    }
}
