//! Player assembly and the per-player read model.
//!
//! A `Player` is built once from one multi-round plan and then refreshed in
//! place. Every field a consumer reads is either immutable after assembly or
//! stored in an atomic/lock that is valid on its own at any instant.

use crate::core::atomic::{AtomicF32, AtomicVec2, AtomicVec3};
use crate::core::channel::MemoryChannel;
use crate::core::config::RadarConfig;
use crate::core::interner::{GroupInterner, NO_GROUP};
use crate::entity::bones::{BoneTracker, PendingSkeleton, PlayerBone, SKELETON_SEGMENTS};
use crate::entity::category::{Classification, ClassificationCell, PlayerCategory};
use crate::entity::classifier::{classify, clean_ai_name, ClassifierContext, FactionTables};
use crate::entity::gear::{Gear, GearReader};
use crate::entity::stats::{PlayerStats, StatsDispatcher};
use crate::entity::watchlist::Watchlist;
use crate::scatter::{
    decode_string, queue_ptr_chain, queue_string, transliterate_cyrillic, EntryHandle, ScatterPlan, ScatterResults,
};
use anyhow::{anyhow, bail, Result};
use glam::{Vec2, Vec3};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Runtime classes assembled through the local branch.
pub const CLIENT_PLAYER_CLASSES: [&str; 3] = ["ClientPlayer", "LocalPlayer", "HideoutPlayer"];
pub const OBSERVED_PLAYER_CLASS: &str = "ObservedPlayerView";

/// Placeholder shown for a human until its stats lookup completes.
pub const HUMAN_PLACEHOLDER: &str = "Human";
const AI_PLACEHOLDER: &str = "AI";
const LIVE_SUFFIX: &str = " (LIVE)";

// Entry ids, local branch.
mod offline_id {
    pub const PROFILE: usize = 0;
    pub const INVENTORY_CONTROLLER: usize = 1;
    pub const BODY: usize = 2;
    pub const MOVEMENT_CONTEXT: usize = 3;
    pub const HEALTH_CONTROLLER: usize = 4;
    pub const CHARACTER_CONTROLLER: usize = 5;
    pub const WEAPON_ANIMATION: usize = 6;
    pub const INFO: usize = 7;
    pub const INVENTORY: usize = 8;
    pub const FIREARM_CONTROLLER: usize = 9;
    pub const VELOCITY: usize = 10;
    pub const ROTATION: usize = 11;
    pub const HEALTH_STATUS: usize = 12;
    pub const NAME_PTR: usize = 13;
    pub const GROUP_PTR: usize = 14;
    pub const SETTINGS: usize = 15;
    pub const REGISTRATION_DATE: usize = 16;
    pub const EQUIPMENT: usize = 17;
    pub const FIREPORT: usize = 18;
    pub const ROLE: usize = 19;
    pub const NAME: usize = 20;
    pub const GROUP: usize = 21;
    pub const SLOTS: usize = 22;
}

// Entry ids, observed branch. Chains take consecutive ids from their base.
mod observed_id {
    pub const ACCOUNT_PTR: usize = 0;
    pub const SIDE: usize = 1;
    pub const GROUP_PTR: usize = 2;
    pub const BODY: usize = 3;
    pub const MEMBER_CATEGORY: usize = 4;
    pub const VOICE_PTR: usize = 5;
    pub const ACCOUNT: usize = 6;
    pub const GROUP: usize = 7;
    pub const VOICE: usize = 8;
    pub const INVENTORY: usize = 9;
    pub const EQUIPMENT: usize = 10;
    pub const SLOTS: usize = 11;
    pub const VELOCITY: usize = 12;
    pub const ROTATION: usize = 13;
    pub const HEALTH_STATUS: usize = 14;
    pub const MOVEMENT_CHAIN: usize = 0x10;
    pub const INVENTORY_CHAIN: usize = 0x20;
    pub const HEALTH_CHAIN: usize = 0x30;
}

// Entry ids, per-tick refresh.
const REFRESH_HEALTH_ID: usize = 1;
const REFRESH_VELOCITY_ID: usize = 2;
const REFRESH_ROTATION_ID: usize = 3;

/// One entry of the external player enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedPlayer {
    /// Stable key for the lifetime of the raid.
    pub profile_id: String,
    /// Runtime class name of the object at `base`.
    pub class_name: String,
    pub base: u64,
}

impl ObservedPlayer {
    pub fn new(profile_id: impl Into<String>, class_name: impl Into<String>, base: u64) -> Self {
        Self {
            profile_id: profile_id.into(),
            class_name: class_name.into(),
            base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    /// Simulated on this client: offline raids, the hideout, and the local player.
    Client,
    /// Replicated from the server.
    Observed,
}

impl PlayerKind {
    pub fn from_class(class_name: &str) -> Option<Self> {
        if CLIENT_PLAYER_CLASSES.contains(&class_name) {
            Some(Self::Client)
        } else if class_name == OBSERVED_PLAYER_CLASS {
            Some(Self::Observed)
        } else {
            None
        }
    }
}

/// Collaborators needed while assembling players.
pub struct AssemblyContext<'a> {
    pub channel: &'a dyn MemoryChannel,
    pub config: &'a RadarConfig,
    pub interner: &'a GroupInterner,
    pub stats: &'a StatsDispatcher,
    pub watchlist: &'a Watchlist,
    /// Group of the local player, `NO_GROUP` while unknown.
    pub local_group: i32,
}

/// Maps a health status tag to a percentage.
pub fn health_from_status(tag: i32) -> i32 {
    match tag {
        1024 => 100,
        2048 => 75,
        4096 => 45,
        8192 => 20,
        _ => 100,
    }
}

pub fn health_status_text(health: i32) -> &'static str {
    match health {
        100 => "Healthy",
        h if h >= 75 => "Moderate",
        h if h >= 45 => "Poor",
        h if h >= 20 => "Critical",
        _ => "n/a",
    }
}

/// Yaw shifted so that 0 points north; both axes wrapped to one turn.
pub fn normalize_rotation(raw: Vec2) -> Vec2 {
    Vec2::new((raw.x - 90.0 + 360.0) % 360.0, raw.y % 360.0)
}

/// Decoded fields both branches produce before the player is built.
struct Parts {
    account_id: String,
    is_human: bool,
    is_local: bool,
    side: i32,
    role: i32,
    member_category: i32,
    name: String,
    classifier_name: String,
    group_id: i32,
    health_status: u64,
    velocity: u64,
    rotation: u64,
    fireport: u64,
    slots: u64,
    initial_velocity: Option<Vec3>,
    initial_rotation: Option<Vec2>,
    initial_health: Option<i32>,
}

pub struct Player {
    profile_id: String,
    account_id: String,
    base: u64,
    kind: PlayerKind,
    is_human: bool,
    is_local: bool,
    side: i32,
    role: i32,
    member_category: i32,
    group_id: i32,
    fireport: u64,
    /// Name the classifier sees; the display name may be replaced later.
    classifier_name: String,
    name: RwLock<String>,
    tag: RwLock<String>,
    level: AtomicI32,
    kd: AtomicF32,
    hours: AtomicI32,
    classification: ClassificationCell,
    gear: Gear,
    bones: BoneTracker,
    health: AtomicI32,
    velocity: AtomicVec3,
    rotation: AtomicVec2,
    health_status_address: u64,
    velocity_address: u64,
    rotation_address: u64,
    is_alive: AtomicBool,
    is_active: AtomicBool,
    exfiltrated: AtomicBool,
    finalized: AtomicBool,
    refresh_errors: AtomicU32,
}

impl Player {
    /// Assembles a player. An `Err` means a required field was absent; the
    /// caller discards the attempt and tries again on a later tick.
    pub fn new(ctx: &AssemblyContext<'_>, observed: &ObservedPlayer) -> Result<Self> {
        let kind = PlayerKind::from_class(&observed.class_name)
            .ok_or_else(|| anyhow!("unsupported player class {}", observed.class_name))?;

        let mut plan = ScatterPlan::auto();
        let (mut parts, skeleton) = match kind {
            PlayerKind::Client => Self::assemble_client(ctx, observed.base, &mut plan)?,
            PlayerKind::Observed => Self::assemble_observed(ctx, observed.base, &mut plan)?,
        };
        let bones = skeleton.finish(plan.results());

        let offsets = &ctx.config.offsets;
        let gear = GearReader::new(ctx.channel, &offsets.gear, &offsets.string).read(parts.slots);
        if !parts.is_human {
            parts.classifier_name = clean_ai_name(&parts.classifier_name, &gear, &ctx.config.factions);
            parts.name = parts.classifier_name.clone();
        }

        let player = Self::build(observed, kind, parts, gear, bones);
        player.reclassify_base(&ctx.config.factions, ctx.local_group, ctx.config.pve_mode);

        if kind == PlayerKind::Observed && player.is_human {
            ctx.stats.request(&player.profile_id, &player.account_id);
        } else {
            player.finalize(ctx.watchlist, &ctx.config.factions);
        }

        info!(
            "Player {} at 0x{:X}: {} '{}' ({} joints, {} items)",
            player.profile_id,
            player.base,
            player.category(),
            player.name(),
            player.bones.len(),
            player.gear.len()
        );
        Ok(player)
    }

    fn assemble_client(
        ctx: &AssemblyContext<'_>,
        base: u64,
        plan: &mut ScatterPlan,
    ) -> Result<(Parts, PendingSkeleton)> {
        use offline_id::*;
        let offsets = &ctx.config.offsets;
        let p = &offsets.player;
        let info = &offsets.profile_info;
        let c = &offsets.controllers;
        let inv = &offsets.inventory;

        let profile = plan.round(0).add_entry::<u64>(0, PROFILE, base, &[p.profile]);
        let inventory_controller = plan
            .round(0)
            .add_entry::<u64>(0, INVENTORY_CONTROLLER, base, &[p.inventory_controller]);
        let body = plan.round(0).add_entry::<u64>(0, BODY, base, &[p.player_body]);
        let movement = plan.round(0).add_entry::<u64>(0, MOVEMENT_CONTEXT, base, &[p.movement_context]);
        let health_controller = plan
            .round(0)
            .add_entry::<u64>(0, HEALTH_CONTROLLER, base, &[p.health_controller]);
        let character_controller = plan
            .round(0)
            .add_entry::<u64>(0, CHARACTER_CONTROLLER, base, &[p.character_controller]);
        let weapon_animation = plan
            .round(0)
            .add_entry::<u64>(0, WEAPON_ANIMATION, base, &[p.weapon_animation]);

        let profile_info = plan.round(1).add_entry::<u64>(0, INFO, profile, &[p.profile_info]);
        let inventory = plan
            .round(1)
            .add_entry::<u64>(0, INVENTORY, inventory_controller, &[inv.inventory]);
        let firearm = plan
            .round(1)
            .add_entry::<u64>(0, FIREARM_CONTROLLER, weapon_animation, &[c.firearm_controller]);
        plan.round(1)
            .add_entry::<Vec3>(0, VELOCITY, character_controller, &[c.velocity]);
        plan.round(1).add_entry::<Vec2>(0, ROTATION, movement, &[c.rotation]);
        plan.round(1)
            .add_entry::<i32>(0, HEALTH_STATUS, health_controller, &[c.health_status]);

        let name_ptr = plan.round(2).add_entry::<u64>(0, NAME_PTR, profile_info, &[info.nickname]);
        let group_ptr = plan.round(2).add_entry::<u64>(0, GROUP_PTR, profile_info, &[info.group_id]);
        let settings = plan.round(2).add_entry::<u64>(0, SETTINGS, profile_info, &[info.settings]);
        plan.round(2)
            .add_entry::<i32>(0, REGISTRATION_DATE, profile_info, &[info.registration_date]);
        let equipment = plan.round(2).add_entry::<u64>(0, EQUIPMENT, inventory, &[inv.equipment]);
        plan.round(2).add_entry::<u64>(0, FIREPORT, firearm, &[c.fireport]);

        plan.round(3).add_entry::<i32>(0, ROLE, settings, &[info.settings_role]);
        queue_string(plan, 3, 0, NAME, name_ptr, &offsets.string);
        queue_string(plan, 3, 0, GROUP, group_ptr, &offsets.string);
        plan.round(3).add_entry::<u64>(0, SLOTS, equipment, &[inv.slots]);

        let skeleton = BoneTracker::queue_setup(plan, 1, 0, body, &ctx.config.bones, &offsets.skeleton);
        plan.execute(ctx.channel);
        let results = plan.results();

        let required = |id: usize, field: &str| -> Result<u64> {
            results
                .try_get::<u64>(0, id)
                .ok_or_else(|| anyhow!("client player 0x{:X}: missing {}", base, field))
        };
        required(INFO, "profile info")?;
        required(INVENTORY_CONTROLLER, "inventory controller")?;
        required(BODY, "body")?;
        let movement = required(MOVEMENT_CONTEXT, "movement context")?;
        let health_controller = required(HEALTH_CONTROLLER, "health controller")?;
        required(NAME_PTR, "name")?;
        required(GROUP_PTR, "group id")?;
        let role = results
            .try_get::<i32>(0, ROLE)
            .ok_or_else(|| anyhow!("client player 0x{:X}: missing role", base))?;
        let slots = required(SLOTS, "slots")?;
        let character_controller = required(CHARACTER_CONTROLLER, "character controller")?;
        let fireport = required(FIREPORT, "fireport")?;

        let name = read_string_result(results, NAME, ctx)
            .map(|n| transliterate_cyrillic(&n))
            .unwrap_or_default();
        let group = read_string_result(results, GROUP, ctx).unwrap_or_default();
        let is_human = results.try_get::<i32>(0, REGISTRATION_DATE).is_some_and(|date| date != 0);

        let parts = Parts {
            account_id: String::new(),
            is_human,
            is_local: is_human,
            side: 0,
            role,
            member_category: 0,
            classifier_name: name.clone(),
            name,
            group_id: ctx.interner.intern(&group),
            health_status: health_controller.wrapping_add(c.health_status),
            velocity: character_controller.wrapping_add(c.velocity),
            rotation: movement.wrapping_add(c.rotation),
            fireport,
            slots,
            initial_velocity: results.try_get::<Vec3>(0, VELOCITY),
            initial_rotation: results.try_get::<Vec2>(0, ROTATION),
            initial_health: results.try_get::<i32>(0, HEALTH_STATUS),
        };
        Ok((parts, skeleton))
    }

    fn assemble_observed(
        ctx: &AssemblyContext<'_>,
        base: u64,
        plan: &mut ScatterPlan,
    ) -> Result<(Parts, PendingSkeleton)> {
        use observed_id::*;
        let offsets = &ctx.config.offsets;
        let o = &offsets.observed;
        let inv = &offsets.inventory;

        let movement = queue_ptr_chain(plan, 0, 0, MOVEMENT_CHAIN, base, &o.to_movement_context);
        let inventory_controller = queue_ptr_chain(plan, 0, 0, INVENTORY_CHAIN, base, &o.to_inventory_controller);
        let health_controller = queue_ptr_chain(plan, 0, 0, HEALTH_CHAIN, base, &o.to_health_controller);
        let (Some(movement), Some(inventory_controller), Some(health_controller)) =
            (movement, inventory_controller, health_controller)
        else {
            bail!("observed player 0x{:X}: empty controller chain in layout", base);
        };

        let account_ptr = plan.round(0).add_entry::<u64>(0, ACCOUNT_PTR, base, &[o.account_id]);
        plan.round(0).add_entry::<i32>(0, SIDE, base, &[o.player_side]);
        let group_ptr = plan.round(0).add_entry::<u64>(0, GROUP_PTR, base, &[o.group_id]);
        let body = plan.round(0).add_entry::<u64>(0, BODY, base, &[o.player_body]);
        plan.round(0)
            .add_entry::<i32>(0, MEMBER_CATEGORY, base, &[o.member_category]);
        let voice_ptr = plan.round(0).add_entry::<u64>(0, VOICE_PTR, base, &[o.voice_name]);

        queue_string(plan, 1, 0, ACCOUNT, account_ptr, &offsets.string);
        queue_string(plan, 1, 0, GROUP, group_ptr, &offsets.string);
        queue_string(plan, 1, 0, VOICE, voice_ptr, &offsets.string);

        let inventory = plan.add_auto::<u64>(0, INVENTORY, inventory_controller, &[inv.inventory]);
        let equipment = plan.add_auto::<u64>(0, EQUIPMENT, inventory, &[inv.equipment]);
        plan.add_auto::<u64>(0, SLOTS, equipment, &[inv.slots]);
        plan.add_auto::<Vec3>(0, VELOCITY, movement, &[o.velocity]);
        plan.add_auto::<Vec2>(0, ROTATION, movement, &[o.rotation]);
        plan.add_auto::<i32>(0, HEALTH_STATUS, health_controller, &[o.health_status]);

        let skeleton = BoneTracker::queue_setup(plan, 1, 0, body, &ctx.config.bones, &offsets.skeleton);
        plan.execute(ctx.channel);
        let results = plan.results();

        let required = |handle: EntryHandle, field: &str| -> Result<u64> {
            results
                .entry(handle)
                .try_get::<u64>()
                .ok_or_else(|| anyhow!("observed player 0x{:X}: missing {}", base, field))
        };
        let missing = |field: &str| anyhow!("observed player 0x{:X}: missing {}", base, field);

        required(account_ptr, "account id")?;
        let side = results.try_get::<i32>(0, SIDE).ok_or_else(|| missing("side"))?;
        required(group_ptr, "group id")?;
        required(body, "body")?;
        let member_category = results
            .try_get::<i32>(0, MEMBER_CATEGORY)
            .ok_or_else(|| missing("member category"))?;
        required(voice_ptr, "voice name")?;
        required(inventory_controller, "inventory controller")?;
        let health_controller = required(health_controller, "health controller")?;
        let movement = required(movement, "movement context")?;
        let slots = results.try_get::<u64>(0, SLOTS).ok_or_else(|| missing("slots"))?;
        let account_id = read_string_result(results, ACCOUNT, ctx).ok_or_else(|| missing("account id string"))?;

        let is_human = account_id != "0";
        let group = read_string_result(results, GROUP, ctx).unwrap_or_default();

        // AI names are cleaned once gear is known.
        let (name, classifier_name) = if is_human {
            (HUMAN_PLACEHOLDER.to_string(), String::new())
        } else {
            let voice = read_string_result(results, VOICE, ctx).unwrap_or_else(|| AI_PLACEHOLDER.to_string());
            (voice.clone(), voice)
        };

        let parts = Parts {
            account_id,
            is_human,
            is_local: false,
            side,
            role: 0,
            member_category,
            name,
            classifier_name,
            group_id: ctx.interner.intern(&group),
            health_status: health_controller.wrapping_add(o.health_status),
            velocity: movement.wrapping_add(o.velocity),
            rotation: movement.wrapping_add(o.rotation),
            fireport: 0,
            slots,
            initial_velocity: results.try_get::<Vec3>(0, VELOCITY),
            initial_rotation: results.try_get::<Vec2>(0, ROTATION),
            initial_health: results.try_get::<i32>(0, HEALTH_STATUS),
        };
        Ok((parts, skeleton))
    }

    fn build(observed: &ObservedPlayer, kind: PlayerKind, parts: Parts, gear: Gear, bones: BoneTracker) -> Self {
        Self {
            profile_id: observed.profile_id.clone(),
            account_id: parts.account_id,
            base: observed.base,
            kind,
            is_human: parts.is_human,
            is_local: parts.is_local,
            side: parts.side,
            role: parts.role,
            member_category: parts.member_category,
            group_id: parts.group_id,
            fireport: parts.fireport,
            classifier_name: parts.classifier_name,
            name: RwLock::new(parts.name),
            tag: RwLock::new(String::new()),
            level: AtomicI32::new(0),
            kd: AtomicF32::new(0.0),
            hours: AtomicI32::new(0),
            classification: ClassificationCell::new(Classification::new(PlayerCategory::Scav)),
            gear,
            bones,
            health: AtomicI32::new(parts.initial_health.map(health_from_status).unwrap_or(100)),
            velocity: AtomicVec3::new(parts.initial_velocity.unwrap_or(Vec3::ZERO)),
            rotation: AtomicVec2::new(parts.initial_rotation.map(normalize_rotation).unwrap_or(Vec2::ZERO)),
            health_status_address: parts.health_status,
            velocity_address: parts.velocity,
            rotation_address: parts.rotation,
            is_alive: AtomicBool::new(true),
            is_active: AtomicBool::new(true),
            exfiltrated: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            refresh_errors: AtomicU32::new(0),
        }
    }

    fn classifier_context(&self, local_group: i32, pve_mode: bool) -> ClassifierContext<'_> {
        ClassifierContext {
            is_human: self.is_human,
            is_local: self.is_local,
            side: self.side,
            role: self.role,
            name: &self.classifier_name,
            gear: &self.gear,
            group_id: self.group_id,
            local_group,
            pve_mode,
        }
    }

    /// Recomputes the base category from decoded fields. An active overlay
    /// stays in place; only its base changes.
    pub(crate) fn reclassify_base(&self, tables: &FactionTables, local_group: i32, pve_mode: bool) -> Classification {
        let base = classify(&self.classifier_context(local_group, pve_mode), tables);
        self.classification.update(|current| Classification {
            category: if current.is_overlaid() { current.category } else { base },
            base,
            live: current.live,
        })
    }

    /// Base classification followed by the watch-list overlay, in that order.
    pub(crate) fn reclassify(&self, tables: &FactionTables, watchlist: &Watchlist, local_group: i32, pve_mode: bool) {
        let current = self.reclassify_base(tables, local_group, pve_mode);
        if !self.is_finalized() {
            return;
        }
        if current.base.is_human_hostile() {
            self.refresh_watchlist_status(watchlist);
        } else if current.is_overlaid() || current.live {
            self.clear_overlay();
        }
    }

    /// Post-processing once every classification input is known.
    pub fn finalize(&self, watchlist: &Watchlist, tables: &FactionTables) {
        if self.category().is_human_hostile() {
            self.refresh_watchlist_status(watchlist);
        }
        if self.category() == PlayerCategory::Zombie {
            *write_lock(&self.name) = tables.event_ai_label.clone();
        }
        self.finalized.store(true, Ordering::Release);
    }

    /// Applies or removes the watch-list overlay. Calling it again with the
    /// same watch-list state changes nothing.
    pub fn refresh_watchlist_status(&self, watchlist: &Watchlist) {
        let Some(entry) = watchlist.is_listed(&self.account_id) else {
            self.clear_overlay();
            return;
        };

        let live = entry.is_streamer && watchlist.is_live(&entry.account_id);
        if entry.tag.is_empty() {
            write_lock(&self.tag).clear();
            self.classification.update(|current| Classification {
                live,
                ..Classification::new(current.base)
            });
        } else {
            *write_lock(&self.tag) = entry.tag.clone();
            self.classification.update(|current| Classification {
                category: PlayerCategory::Special,
                base: current.base,
                live,
            });
        }
    }

    fn clear_overlay(&self) {
        write_lock(&self.tag).clear();
        self.classification.update(|current| Classification::new(current.base));
    }

    /// Writes a completed stats lookup. A failed lookup leaves the fields as
    /// they were.
    pub(crate) fn apply_stats(&self, stats: Option<&PlayerStats>) {
        let Some(stats) = stats else {
            return;
        };
        if !stats.nickname.is_empty() {
            *write_lock(&self.name) = stats.nickname.clone();
        }
        self.level.store(stats.level, Ordering::Relaxed);
        self.kd.store(stats.kd);
        self.hours.store(stats.hours, Ordering::Relaxed);
    }

    /// Queues this player's per-tick reads into round 0 of `plan`.
    pub(crate) fn queue_refresh(&self, plan: &mut ScatterPlan, scatter_index: usize) {
        self.bones.queue_refresh(plan, 0, scatter_index);
        let mut round = plan.round(0);
        round.add_entry::<i32>(scatter_index, REFRESH_HEALTH_ID, self.health_status_address, &[]);
        round.add_entry::<Vec3>(scatter_index, REFRESH_VELOCITY_ID, self.velocity_address, &[]);
        round.add_entry::<Vec2>(scatter_index, REFRESH_ROTATION_ID, self.rotation_address, &[]);
    }

    /// Stores refreshed values. Returns false when nothing could be read.
    pub(crate) fn apply_refresh(&self, results: &ScatterResults, scatter_index: usize) -> bool {
        let joints = self.bones.apply_refresh(results, scatter_index);
        let health = results.try_get::<i32>(scatter_index, REFRESH_HEALTH_ID);
        if let Some(tag) = health {
            self.health.store(health_from_status(tag), Ordering::Relaxed);
        }
        if let Some(velocity) = results.try_get::<Vec3>(scatter_index, REFRESH_VELOCITY_ID) {
            self.velocity.store(velocity);
        }
        if let Some(rotation) = results.try_get::<Vec2>(scatter_index, REFRESH_ROTATION_ID) {
            self.rotation.store(normalize_rotation(rotation));
        }
        joints > 0 || health.is_some()
    }

    /// Tracks consecutive failed refreshes; the player goes inactive once
    /// `max_errors` is reached. Returns whether the player is still active.
    pub(crate) fn record_refresh(&self, success: bool, max_errors: u32) -> bool {
        if success {
            self.refresh_errors.store(0, Ordering::Relaxed);
            return self.is_active();
        }
        let errors = self.refresh_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if errors >= max_errors && self.is_active.swap(false, Ordering::AcqRel) {
            // objects of dead players stop resolving
            self.is_alive.store(false, Ordering::Release);
            debug!("Player {} inactive after {} failed refreshes", self.profile_id, errors);
        }
        self.is_active()
    }

    pub(crate) fn mark_departed(&self) {
        if self.is_active() && self.is_alive() {
            self.exfiltrated.store(true, Ordering::Release);
        }
        self.is_active.store(false, Ordering::Release);
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn classification(&self) -> Classification {
        self.classification.load()
    }

    pub fn category(&self) -> PlayerCategory {
        self.classification.load().category
    }

    pub fn base_category(&self) -> PlayerCategory {
        self.classification.load().base
    }

    pub fn is_human(&self) -> bool {
        self.is_human
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn is_hostile(&self) -> bool {
        self.category().is_hostile()
    }

    pub fn is_human_hostile(&self) -> bool {
        self.category().is_human_hostile()
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }

    pub fn is_exfiltrated(&self) -> bool {
        self.exfiltrated.load(Ordering::Acquire)
    }

    pub fn is_live(&self) -> bool {
        self.classification.load().live
    }

    /// False for observed humans until their stats lookup completes.
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    pub fn name(&self) -> String {
        read_lock(&self.name).clone()
    }

    pub fn display_name(&self) -> String {
        let name = read_lock(&self.name);
        if self.is_live() {
            format!("{}{}", name, LIVE_SUFFIX)
        } else {
            name.clone()
        }
    }

    pub fn tag(&self) -> String {
        read_lock(&self.tag).clone()
    }

    pub fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }

    pub fn kd(&self) -> f32 {
        self.kd.load()
    }

    pub fn hours(&self) -> i32 {
        self.hours.load(Ordering::Relaxed)
    }

    pub fn side(&self) -> i32 {
        self.side
    }

    pub fn role(&self) -> i32 {
        self.role
    }

    pub fn member_category(&self) -> i32 {
        self.member_category
    }

    pub fn group_id(&self) -> i32 {
        self.group_id
    }

    pub fn has_group(&self) -> bool {
        self.group_id != NO_GROUP
    }

    pub fn fireport(&self) -> u64 {
        self.fireport
    }

    pub fn health(&self) -> i32 {
        self.health.load(Ordering::Relaxed)
    }

    pub fn health_status(&self) -> &'static str {
        health_status_text(self.health())
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity.load()
    }

    /// Normalised rotation, degrees.
    pub fn rotation(&self) -> Vec2 {
        self.rotation.load()
    }

    pub fn gear(&self) -> &Gear {
        &self.gear
    }

    pub fn bones(&self) -> &BoneTracker {
        &self.bones
    }

    /// Zero when the joint never resolved.
    pub fn bone_position(&self, bone: PlayerBone) -> Vec3 {
        self.bones.position(bone)
    }

    pub fn position(&self) -> Vec3 {
        self.bones.position(PlayerBone::HumanBase)
    }

    pub fn head_position(&self) -> Vec3 {
        self.bones.position(PlayerBone::HumanHead)
    }

    pub fn neck_position(&self) -> Vec3 {
        self.bones.position(PlayerBone::HumanNeck)
    }

    pub fn pelvis_position(&self) -> Vec3 {
        self.bones.position(PlayerBone::HumanPelvis)
    }

    /// Line segments for a skeleton overlay. Unresolved joints contribute
    /// the origin.
    pub fn skeleton_lines(&self) -> Vec<(Vec3, Vec3)> {
        SKELETON_SEGMENTS
            .iter()
            .map(|(from, to)| (self.bones.position(*from), self.bones.position(*to)))
            .collect()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("profile_id", &self.profile_id)
            .field("base", &format_args!("0x{:X}", self.base))
            .field("kind", &self.kind)
            .field("classification", &self.classification())
            .field("name", &self.name())
            .finish()
    }
}

fn read_string_result(results: &ScatterResults, entry_id: usize, ctx: &AssemblyContext<'_>) -> Option<String> {
    decode_string(results.get(0, entry_id).try_get_bytes()?, &ctx.config.offsets.string)
}

fn read_lock(lock: &RwLock<String>) -> RwLockReadGuard<'_, String> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock(lock: &RwLock<String>) -> RwLockWriteGuard<'_, String> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_mapping() {
        assert_eq!(health_from_status(1024), 100);
        assert_eq!(health_from_status(2048), 75);
        assert_eq!(health_from_status(4096), 45);
        assert_eq!(health_from_status(8192), 20);
        assert_eq!(health_from_status(0), 100);
        assert_eq!(health_status_text(100), "Healthy");
        assert_eq!(health_status_text(75), "Moderate");
        assert_eq!(health_status_text(45), "Poor");
        assert_eq!(health_status_text(20), "Critical");
        assert_eq!(health_status_text(5), "n/a");
    }

    #[test]
    fn test_rotation_normalisation() {
        let r = normalize_rotation(Vec2::new(90.0, 45.0));
        assert_eq!(r, Vec2::new(0.0, 45.0));
        let r = normalize_rotation(Vec2::new(0.0, 400.0));
        assert_eq!(r, Vec2::new(270.0, 40.0));
    }

    #[test]
    fn test_kind_from_class() {
        assert_eq!(PlayerKind::from_class("ClientPlayer"), Some(PlayerKind::Client));
        assert_eq!(PlayerKind::from_class("HideoutPlayer"), Some(PlayerKind::Client));
        assert_eq!(PlayerKind::from_class("ObservedPlayerView"), Some(PlayerKind::Observed));
        assert_eq!(PlayerKind::from_class("Corpse"), None);
    }
}
