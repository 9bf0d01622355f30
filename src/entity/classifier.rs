//! Category resolution from decoded remote fields.
//!
//! `classify` is pure: it only looks at the context it is given and the
//! configured tables, so it can run again whenever a field changes.

use crate::core::interner::NO_GROUP;
use crate::entity::category::PlayerCategory;
use crate::entity::gear::Gear;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static name/side/role tables consulted by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionTables {
    /// Side id of a human player -> PMC faction.
    pub human_sides: HashMap<i32, PlayerCategory>,
    /// Cleaned AI name -> category.
    pub names: HashMap<String, PlayerCategory>,
    /// Raw archetype name -> canonical display name.
    pub aliases: HashMap<String, String>,
    /// Bot role ids that spawn PMC-type units.
    pub reserved_roles: HashMap<i32, PlayerCategory>,
    /// Name bots carry when the client hides it.
    pub unknown_name: String,
    /// Display name forced on event AI.
    pub event_ai_label: String,
    /// Substring carried by the BTR gunner's name.
    pub btr_marker: String,
    /// Slot whose item names a PvE bot's faction.
    pub dogtag_slot: String,
}

impl Default for FactionTables {
    fn default() -> Self {
        use PlayerCategory::*;

        let names = [
            ("Reshala", Boss),
            ("Killa", Boss),
            ("Shturman", Boss),
            ("Glukhar", Boss),
            ("Sanitar", Boss),
            ("Tagilla", Boss),
            ("Kaban", Boss),
            ("Kollontay", Boss),
            ("Knight", Boss),
            ("Big Pipe", Boss),
            ("Birdeye", Boss),
            ("Zryachiy", Boss),
            ("Partisan", Boss),
            ("BTR", Boss),
            ("Follower", BossFollower),
            ("FollowerBully", BossFollower),
            ("FollowerKojaniy", BossFollower),
            ("FollowerGluharAssault", BossFollower),
            ("FollowerSanitar", BossFollower),
            ("FollowerTagilla", BossFollower),
            ("FollowerZryachiy", BossFollower),
            ("FollowerBoar", BossFollower),
            ("FollowerGluharSecurity", BossGuard),
            ("FollowerGluharScout", BossGuard),
            ("FollowerGluharSnipe", BossGuard),
            ("BossBoarSniper", BossGuard),
            ("Raider", Raider),
            ("PmcBot", Raider),
            ("ExUsec", Rogue),
            ("Rogue", Rogue),
            ("Cultist", Cultist),
            ("SectantPriest", Cultist),
            ("ArenaFighterEvent", FollowerOfMorana),
            ("FollowerOfMorana", FollowerOfMorana),
            ("Infected", Zombie),
        ]
        .into_iter()
        .map(|(name, category)| (name.to_string(), category))
        .collect();

        let aliases = [
            ("BigPipe", "Big Pipe"),
            ("BirdEye", "Birdeye"),
            ("Usec", "Rogue"),
            ("Bully", "Reshala"),
            ("Sturman", "Shturman"),
            ("Gluhar", "Glukhar"),
            ("SectantWarrior", "Cultist"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            human_sides: HashMap::from([(1, Usec), (2, Bear)]),
            names,
            aliases,
            reserved_roles: HashMap::from([(51, Bear), (52, Usec)]),
            unknown_name: "???".to_string(),
            event_ai_label: "Zombie".to_string(),
            btr_marker: "(BTR)".to_string(),
            dogtag_slot: "Dogtag".to_string(),
        }
    }
}

/// Fields the classifier decides on.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierContext<'a> {
    pub is_human: bool,
    /// The player this client controls.
    pub is_local: bool,
    pub side: i32,
    pub role: i32,
    /// Cleaned name for AI, display name for humans.
    pub name: &'a str,
    pub gear: &'a Gear,
    pub group_id: i32,
    /// Group of the local player, `NO_GROUP` when unknown.
    pub local_group: i32,
    pub pve_mode: bool,
}

impl<'a> ClassifierContext<'a> {
    pub fn ai(name: &'a str, role: i32, gear: &'a Gear) -> Self {
        Self {
            is_human: false,
            is_local: false,
            side: 0,
            role,
            name,
            gear,
            group_id: NO_GROUP,
            local_group: NO_GROUP,
            pve_mode: false,
        }
    }

    pub fn human(name: &'a str, side: i32, gear: &'a Gear) -> Self {
        Self {
            is_human: true,
            side,
            ..Self::ai(name, 0, gear)
        }
    }
}

/// First matching rule wins; always yields a category.
pub fn classify(ctx: &ClassifierContext<'_>, tables: &FactionTables) -> PlayerCategory {
    if ctx.is_local {
        return PlayerCategory::LocalPlayer;
    }

    if ctx.is_human {
        if ctx.group_id != NO_GROUP && ctx.group_id == ctx.local_group {
            return PlayerCategory::Teammate;
        }
        return tables
            .human_sides
            .get(&ctx.side)
            .copied()
            .unwrap_or(PlayerCategory::PlayerScav);
    }

    if let Some(category) = tables.names.get(ctx.name) {
        return *category;
    }
    if !tables.btr_marker.is_empty() && ctx.name.contains(&tables.btr_marker) {
        return PlayerCategory::Boss;
    }

    if let Some(category) = tables.reserved_roles.get(&ctx.role) {
        return *category;
    }

    if ctx.pve_mode {
        if let Some(dogtag) = ctx.gear.slot(&tables.dogtag_slot) {
            return if dogtag.short_name == "BEAR" {
                PlayerCategory::Bear
            } else {
                PlayerCategory::Usec
            };
        }
    }

    if ctx.name == tables.unknown_name {
        return PlayerCategory::Zombie;
    }

    PlayerCategory::Scav
}

/// Normalises a bot archetype name.
///
/// Drops a leading `Boss`/`Boss_` (any case), every underscore and digit,
/// then applies the alias table. Two gear rules disambiguate archetypes that
/// share a base name.
pub fn clean_ai_name(raw: &str, gear: &Gear, tables: &FactionTables) -> String {
    let stripped = strip_prefix_ignore_case(raw, "boss");
    let stripped = stripped.strip_prefix('_').unwrap_or(stripped);
    let cleaned: String = stripped.chars().filter(|c| *c != '_' && !c.is_ascii_digit()).collect();

    match cleaned.as_str() {
        "SectantPriest" if gear.has_item("Zryachiy") => return "Zryachiy".to_string(),
        "Scav" if gear.len() == 1 && gear.has_item("AVS") => return "BTR".to_string(),
        _ => {}
    }

    match tables.aliases.get(&cleaned) {
        Some(alias) => alias.clone(),
        None => cleaned,
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &value[prefix.len()..],
        _ => value,
    }
}
