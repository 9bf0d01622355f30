//! Category -> presentation lookup for overlay consumers.
//!
//! Consumers pick colours, labels and filter toggles from this table instead
//! of branching on categories themselves.

use crate::entity::category::PlayerCategory;

/// Overlay toggle a category is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterGroup {
    Team,
    Pmc,
    PlayerScav,
    Scav,
    Boss,
    Event,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationPolicy {
    pub label: &'static str,
    /// RGBA, 0..=1.
    pub color: [f32; 4],
    pub group: FilterGroup,
    pub draw_skeleton: bool,
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const ORANGE: [f32; 4] = [1.0, 0.65, 0.0, 1.0];
const PURPLE: [f32; 4] = [0.5, 0.0, 0.5, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
const GRAY: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

const fn policy(label: &'static str, color: [f32; 4], group: FilterGroup, draw_skeleton: bool) -> PresentationPolicy {
    PresentationPolicy {
        label,
        color,
        group,
        draw_skeleton,
    }
}

/// Indexed by `PlayerCategory as usize`.
static POLICIES: [PresentationPolicy; 15] = [
    policy("You", WHITE, FilterGroup::Hidden, false),
    policy("Team", GREEN, FilterGroup::Team, true),
    policy("USEC", RED, FilterGroup::Pmc, true),
    policy("BEAR", BLUE, FilterGroup::Pmc, true),
    policy("PScav", ORANGE, FilterGroup::PlayerScav, true),
    policy("Scav", YELLOW, FilterGroup::Scav, true),
    policy("Boss", MAGENTA, FilterGroup::Boss, true),
    policy("Follower", PURPLE, FilterGroup::Boss, true),
    policy("Guard", PURPLE, FilterGroup::Boss, true),
    policy("Raider", PURPLE, FilterGroup::Boss, true),
    policy("Rogue", PURPLE, FilterGroup::Boss, true),
    policy("Cultist", PURPLE, FilterGroup::Boss, true),
    policy("Morana", GRAY, FilterGroup::Event, true),
    policy("Zombie", GRAY, FilterGroup::Event, false),
    policy("Special", CYAN, FilterGroup::Pmc, true),
];

pub fn presentation(category: PlayerCategory) -> &'static PresentationPolicy {
    &POLICIES[category as usize]
}
