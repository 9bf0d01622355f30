//! Remote object layout.
//!
//! Every value here depends on the exact build of the target process and is
//! expected to come from configuration. The defaults only describe the shape
//! of the object graph (how many indirections each field needs).

use crate::entity::bones::SkeletonLayout;
use crate::entity::gear::GearOffsets;
use crate::scatter::StringLayout;
use serde::{Deserialize, Serialize};

/// Locally controlled player object (`ClientPlayer` / `LocalPlayer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOffsets {
    pub profile: u64,
    /// From the profile object.
    pub profile_info: u64,
    pub movement_context: u64,
    pub character_controller: u64,
    pub player_body: u64,
    pub weapon_animation: u64,
    pub inventory_controller: u64,
    pub health_controller: u64,
}

impl Default for PlayerOffsets {
    fn default() -> Self {
        Self {
            profile: 0x5E8,
            profile_info: 0x28,
            movement_context: 0x40,
            character_controller: 0x38,
            player_body: 0xA8,
            weapon_animation: 0x1C0,
            inventory_controller: 0x658,
            health_controller: 0x680,
        }
    }
}

/// Profile info object of a local player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInfoOffsets {
    pub nickname: u64,
    pub group_id: u64,
    pub settings: u64,
    /// `i32`; zero for bots.
    pub registration_date: u64,
    /// `i32`, in the settings object.
    pub settings_role: u64,
}

impl Default for ProfileInfoOffsets {
    fn default() -> Self {
        Self {
            nickname: 0x10,
            group_id: 0x20,
            settings: 0x50,
            registration_date: 0x6C,
            settings_role: 0x10,
        }
    }
}

/// Everything hanging off the local player's controllers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOffsets {
    /// `Vec3`, in the character controller.
    pub velocity: u64,
    /// `Vec2`, in the movement context.
    pub rotation: u64,
    /// In the weapon animation object.
    pub firearm_controller: u64,
    /// In the firearm controller.
    pub fireport: u64,
    /// `i32` health status tag, in the health controller.
    pub health_status: u64,
}

impl Default for ControllerOffsets {
    fn default() -> Self {
        Self {
            velocity: 0xE8,
            rotation: 0x3D0,
            firearm_controller: 0x88,
            fireport: 0x138,
            health_status: 0xD8,
        }
    }
}

/// Inventory chain shared by both player kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryOffsets {
    /// Inventory controller -> inventory.
    pub inventory: u64,
    /// Inventory -> equipment.
    pub equipment: u64,
    /// Equipment -> slot array.
    pub slots: u64,
}

impl Default for InventoryOffsets {
    fn default() -> Self {
        Self {
            inventory: 0x138,
            equipment: 0x10,
            slots: 0x80,
        }
    }
}

/// Network-observed player view. Controllers sit behind handle objects, so
/// each of them is a chain of dereferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservedOffsets {
    pub to_movement_context: Vec<u64>,
    pub to_inventory_controller: Vec<u64>,
    pub to_health_controller: Vec<u64>,
    /// String pointer.
    pub account_id: u64,
    /// `i32`.
    pub player_side: u64,
    /// String pointer.
    pub group_id: u64,
    pub player_body: u64,
    /// `i32`.
    pub member_category: u64,
    /// String pointer; bots carry their archetype here.
    pub voice_name: u64,
    /// `Vec3`, in the movement context.
    pub velocity: u64,
    /// `Vec2`, in the movement context.
    pub rotation: u64,
    /// `i32` health status tag, in the health controller.
    pub health_status: u64,
}

impl Default for ObservedOffsets {
    fn default() -> Self {
        Self {
            to_movement_context: vec![0x80, 0xD8, 0x10],
            to_inventory_controller: vec![0x88, 0x118],
            to_health_controller: vec![0x90, 0xF0],
            account_id: 0x40,
            player_side: 0xF8,
            group_id: 0x20,
            player_body: 0x60,
            member_category: 0xE0,
            voice_name: 0x38,
            velocity: 0x10C,
            rotation: 0x28,
            health_status: 0x10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOffsets {
    pub player: PlayerOffsets,
    pub profile_info: ProfileInfoOffsets,
    pub controllers: ControllerOffsets,
    pub inventory: InventoryOffsets,
    pub observed: ObservedOffsets,
    pub skeleton: SkeletonLayout,
    pub gear: GearOffsets,
    pub string: StringLayout,
}
