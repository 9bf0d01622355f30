//! Player categories and the packed, atomically swapped classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerCategory {
    LocalPlayer = 0,
    Teammate = 1,
    Usec = 2,
    Bear = 3,
    PlayerScav = 4,
    Scav = 5,
    Boss = 6,
    BossFollower = 7,
    BossGuard = 8,
    Raider = 9,
    Rogue = 10,
    Cultist = 11,
    FollowerOfMorana = 12,
    Zombie = 13,
    /// Watch-list overlay.
    Special = 14,
}

impl PlayerCategory {
    pub const ALL: [PlayerCategory; 15] = [
        PlayerCategory::LocalPlayer,
        PlayerCategory::Teammate,
        PlayerCategory::Usec,
        PlayerCategory::Bear,
        PlayerCategory::PlayerScav,
        PlayerCategory::Scav,
        PlayerCategory::Boss,
        PlayerCategory::BossFollower,
        PlayerCategory::BossGuard,
        PlayerCategory::Raider,
        PlayerCategory::Rogue,
        PlayerCategory::Cultist,
        PlayerCategory::FollowerOfMorana,
        PlayerCategory::Zombie,
        PlayerCategory::Special,
    ];

    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn is_human(self) -> bool {
        matches!(
            self,
            Self::LocalPlayer | Self::Teammate | Self::Usec | Self::Bear | Self::PlayerScav | Self::Special
        )
    }

    pub fn is_human_hostile(self) -> bool {
        matches!(self, Self::Usec | Self::Bear | Self::PlayerScav | Self::Special)
    }

    pub fn is_pmc(self) -> bool {
        matches!(self, Self::Usec | Self::Bear)
    }

    pub fn is_boss_raider(self) -> bool {
        matches!(
            self,
            Self::Boss | Self::BossFollower | Self::BossGuard | Self::Raider | Self::Rogue | Self::Cultist
        )
    }

    pub fn is_event_ai(self) -> bool {
        matches!(self, Self::FollowerOfMorana | Self::Zombie)
    }

    pub fn is_friendly(self) -> bool {
        matches!(self, Self::LocalPlayer | Self::Teammate)
    }

    pub fn is_hostile(self) -> bool {
        !self.is_friendly()
    }
}

impl fmt::Display for PlayerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classification as seen by consumers at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Category consumers should use; `Special` while overlaid.
    pub category: PlayerCategory,
    /// Category computed from remote fields alone.
    pub base: PlayerCategory,
    /// Watch-listed streamer currently live.
    pub live: bool,
}

impl Classification {
    pub fn new(base: PlayerCategory) -> Self {
        Self {
            category: base,
            base,
            live: false,
        }
    }

    pub fn is_overlaid(&self) -> bool {
        self.category != self.base
    }

    fn pack(self) -> u64 {
        (self.category as u64) | ((self.base as u64) << 8) | ((self.live as u64) << 16)
    }

    fn unpack(bits: u64) -> Self {
        let category = PlayerCategory::from_u8((bits & 0xFF) as u8).unwrap_or(PlayerCategory::Scav);
        let base = PlayerCategory::from_u8(((bits >> 8) & 0xFF) as u8).unwrap_or(category);
        Self {
            category,
            base,
            live: (bits >> 16) & 1 == 1,
        }
    }
}

/// Classification stored in one atomic word so readers never see a
/// half-applied overlay.
#[derive(Debug)]
pub struct ClassificationCell(AtomicU64);

impl ClassificationCell {
    pub fn new(initial: Classification) -> Self {
        Self(AtomicU64::new(initial.pack()))
    }

    pub fn load(&self) -> Classification {
        Classification::unpack(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: Classification) {
        self.0.store(value.pack(), Ordering::Release);
    }

    /// Applies `f` with compare-and-swap; returns the value now stored.
    pub fn update<F>(&self, mut f: F) -> Classification
    where
        F: FnMut(Classification) -> Classification,
    {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = f(Classification::unpack(current)).pack();
            match self.0.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Classification::unpack(next),
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip_all_categories() {
        for category in PlayerCategory::ALL {
            for base in [PlayerCategory::Usec, PlayerCategory::Scav] {
                let value = Classification {
                    category,
                    base,
                    live: category as u8 % 2 == 0,
                };
                let cell = ClassificationCell::new(value);
                assert_eq!(cell.load(), value);
            }
        }
    }

    #[test]
    fn test_update_swaps_whole_value() {
        let cell = ClassificationCell::new(Classification::new(PlayerCategory::Bear));
        let after = cell.update(|c| Classification {
            category: PlayerCategory::Special,
            live: true,
            ..c
        });
        assert_eq!(after.base, PlayerCategory::Bear);
        assert!(after.is_overlaid());
        assert_eq!(cell.load(), after);
    }

    #[test]
    fn test_predicates() {
        assert!(PlayerCategory::Special.is_human_hostile());
        assert!(PlayerCategory::PlayerScav.is_human());
        assert!(!PlayerCategory::Scav.is_human());
        assert!(PlayerCategory::Cultist.is_boss_raider());
        assert!(PlayerCategory::Zombie.is_event_ai());
        assert!(PlayerCategory::Teammate.is_friendly());
        assert!(PlayerCategory::Scav.is_hostile());
    }
}
