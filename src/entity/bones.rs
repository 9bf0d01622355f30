//! Skeleton tracking.
//!
//! A player's body object leads, through a short pointer chain, to a table of
//! joint pointers. Each joint points at a transform whose 4x4 matrix holds the
//! joint's world position in its translation column.
//!
//! Joint pointers are resolved once when the tracker is set up; refreshes
//! only re-read the matrices and write the new position into the existing
//! `Bone`, so references held by consumers stay valid.

use crate::core::atomic::AtomicVec3;
use crate::core::channel::{is_valid_address, MemoryChannel};
use crate::scatter::{queue_ptr_chain, read_ptr_chain, EntryBase, EntryHandle, ScatterPlan, ScatterResults};
use glam::{Mat4, Vec3};
use itertools::Itertools;
use log::{debug, log_enabled, Level};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ROOT_CHAIN_ID: usize = 0x1000;
const JOINT_SLOT_ID: usize = 0x2000;
const TRANSFORM_ID: usize = 0x3000;
const MATRIX_ID: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum PlayerBone {
    HumanBase = 13,
    HumanPelvis = 14,
    HumanLThigh1 = 15,
    HumanLCalf = 17,
    HumanLFoot = 18,
    HumanRThigh1 = 20,
    HumanRCalf = 22,
    HumanRFoot = 23,
    HumanSpine1 = 29,
    HumanSpine2 = 36,
    HumanSpine3 = 37,
    HumanLUpperarm = 90,
    HumanLForearm1 = 91,
    HumanLPalm = 94,
    HumanRUpperarm = 111,
    HumanRForearm1 = 112,
    HumanRPalm = 115,
    HumanNeck = 132,
    HumanHead = 133,
}

impl PlayerBone {
    /// Joints tracked by default.
    pub const REQUIRED: [PlayerBone; 13] = [
        PlayerBone::HumanBase,
        PlayerBone::HumanHead,
        PlayerBone::HumanNeck,
        PlayerBone::HumanSpine3,
        PlayerBone::HumanLPalm,
        PlayerBone::HumanRPalm,
        PlayerBone::HumanPelvis,
        PlayerBone::HumanLFoot,
        PlayerBone::HumanRFoot,
        PlayerBone::HumanLForearm1,
        PlayerBone::HumanRForearm1,
        PlayerBone::HumanLCalf,
        PlayerBone::HumanRCalf,
    ];

    #[inline]
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Joint pairs a skeleton overlay draws as lines.
pub const SKELETON_SEGMENTS: [(PlayerBone, PlayerBone); 11] = [
    (PlayerBone::HumanHead, PlayerBone::HumanNeck),
    (PlayerBone::HumanNeck, PlayerBone::HumanSpine3),
    (PlayerBone::HumanSpine3, PlayerBone::HumanPelvis),
    (PlayerBone::HumanSpine3, PlayerBone::HumanLForearm1),
    (PlayerBone::HumanLForearm1, PlayerBone::HumanLPalm),
    (PlayerBone::HumanSpine3, PlayerBone::HumanRForearm1),
    (PlayerBone::HumanRForearm1, PlayerBone::HumanRPalm),
    (PlayerBone::HumanPelvis, PlayerBone::HumanLCalf),
    (PlayerBone::HumanLCalf, PlayerBone::HumanLFoot),
    (PlayerBone::HumanPelvis, PlayerBone::HumanRCalf),
    (PlayerBone::HumanRCalf, PlayerBone::HumanRFoot),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonLayout {
    /// Body object -> joint table root.
    pub root_chain: Vec<u64>,
    /// Offset of the first joint slot in the table.
    pub table_base: u64,
    /// Bytes per joint slot.
    pub entry_stride: u64,
    /// Joint object -> transform pointer.
    pub transform_deref: u64,
    /// Offset of the world matrix inside the transform.
    pub matrix_offset: u64,
}

impl Default for SkeletonLayout {
    fn default() -> Self {
        Self {
            root_chain: vec![0x30, 0x30, 0x10],
            table_base: 0x20,
            entry_stride: 0x8,
            transform_deref: 0x10,
            matrix_offset: 0x40,
        }
    }
}

impl SkeletonLayout {
    /// Offset of `bone`'s slot from the table root.
    #[inline]
    pub fn joint_slot_offset(&self, bone: PlayerBone) -> u64 {
        self.table_base.wrapping_add((bone.id() as u64).wrapping_mul(self.entry_stride))
    }

    /// Address of `bone`'s slot in the table at `root`.
    #[inline]
    pub fn joint_slot_address(&self, root: u64, bone: PlayerBone) -> u64 {
        root.wrapping_add(self.joint_slot_offset(bone))
    }
}

/// Table root for a body object; 0 when any link is null.
pub fn resolve_root(channel: &dyn MemoryChannel, body: u64, layout: &SkeletonLayout) -> u64 {
    if !is_valid_address(body) {
        return 0;
    }
    read_ptr_chain(channel, body, &layout.root_chain)
}

/// Transform pointer of one joint; 0 when unresolved.
pub fn resolve_joint(channel: &dyn MemoryChannel, root: u64, bone: PlayerBone, layout: &SkeletonLayout) -> u64 {
    if !is_valid_address(root) {
        return 0;
    }
    read_ptr_chain(channel, root, &[layout.joint_slot_offset(bone), layout.transform_deref])
}

/// One tracked joint.
#[derive(Debug)]
pub struct Bone {
    transform: u64,
    position: AtomicVec3,
}

impl Bone {
    pub fn new(transform: u64) -> Self {
        Self {
            transform,
            position: AtomicVec3::default(),
        }
    }

    pub fn transform(&self) -> u64 {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.position.load()
    }

    pub(crate) fn update(&self, matrix: &Mat4) {
        self.position.store(matrix.w_axis.truncate());
    }
}

/// Entries queued for a skeleton inside a larger plan.
#[derive(Debug, Clone)]
pub struct PendingSkeleton {
    scatter_index: usize,
    root: Option<EntryHandle>,
    root_literal: u64,
    joints: Vec<PlayerBone>,
    layout: SkeletonLayout,
}

impl PendingSkeleton {
    /// Builds the tracker from an executed plan.
    pub fn finish(self, results: &ScatterResults) -> BoneTracker {
        let root = match self.root {
            Some(handle) => results.entry(handle).try_get::<u64>().unwrap_or(0),
            None => self.root_literal,
        };

        let mut bones = HashMap::with_capacity(self.joints.len());
        for bone in &self.joints {
            let id = bone.id() as usize;
            let Some(transform) = results.try_get::<u64>(self.scatter_index, TRANSFORM_ID + id) else {
                continue;
            };
            if !is_valid_address(transform) {
                continue;
            }
            let joint = Bone::new(transform);
            if let Some(matrix) = results.try_get::<Mat4>(self.scatter_index, MATRIX_ID + id) {
                joint.update(&matrix);
            }
            bones.insert(*bone, joint);
        }

        if bones.len() < self.joints.len() && log_enabled!(Level::Debug) {
            let missing = self.joints.iter().filter(|b| !bones.contains_key(*b)).map(|b| format!("{:?}", b)).join(", ");
            debug!("Skeleton root 0x{:X}: unresolved joints [{}]", root, missing);
        }

        BoneTracker {
            root,
            bones,
            layout: self.layout,
        }
    }
}

/// Named joint positions of one player.
#[derive(Debug, Default)]
pub struct BoneTracker {
    root: u64,
    bones: HashMap<PlayerBone, Bone>,
    layout: SkeletonLayout,
}

impl BoneTracker {
    /// Queues root resolution, joint resolution and the first matrix read of
    /// every joint into `plan`, starting at `first_round`. With the default
    /// layout this takes six rounds.
    pub fn queue_setup(
        plan: &mut ScatterPlan,
        first_round: usize,
        scatter_index: usize,
        body: impl Into<EntryBase>,
        joints: &[PlayerBone],
        layout: &SkeletonLayout,
    ) -> PendingSkeleton {
        let body = body.into();
        let root = queue_ptr_chain(plan, first_round, scatter_index, ROOT_CHAIN_ID, body, &layout.root_chain);
        let root_base = root.map(EntryBase::Entry).unwrap_or(body);
        let slot_round = first_round + layout.root_chain.len();

        for bone in joints {
            let id = bone.id() as usize;
            let slot = plan.round(slot_round).add_entry::<u64>(
                scatter_index,
                JOINT_SLOT_ID + id,
                root_base,
                &[layout.joint_slot_offset(*bone)],
            );
            let transform = plan.round(slot_round + 1).add_entry::<u64>(
                scatter_index,
                TRANSFORM_ID + id,
                slot,
                &[layout.transform_deref],
            );
            plan.round(slot_round + 2)
                .add_entry::<Mat4>(scatter_index, MATRIX_ID + id, transform, &[layout.matrix_offset]);
        }

        PendingSkeleton {
            scatter_index,
            root: match root_base {
                EntryBase::Entry(handle) => Some(handle),
                EntryBase::Address(_) => None,
            },
            root_literal: match root_base {
                EntryBase::Address(address) => address,
                EntryBase::Entry(_) => 0,
            },
            joints: joints.to_vec(),
            layout: layout.clone(),
        }
    }

    /// Resolves `joints` for the body at `body` in one dedicated plan.
    /// Joints that fail to resolve are left out of the map.
    pub fn setup(channel: &dyn MemoryChannel, body: u64, joints: &[PlayerBone], layout: &SkeletonLayout) -> Self {
        let mut plan = ScatterPlan::auto();
        let pending = Self::queue_setup(&mut plan, 0, 0, body, joints, layout);
        plan.execute(channel);
        pending.finish(plan.results())
    }

    /// Queues a matrix read for every resolved joint into one round.
    pub fn queue_refresh(&self, plan: &mut ScatterPlan, round: usize, scatter_index: usize) {
        let mut builder = plan.round(round);
        for (bone, joint) in &self.bones {
            builder.add_entry::<Mat4>(
                scatter_index,
                MATRIX_ID + bone.id() as usize,
                joint.transform,
                &[self.layout.matrix_offset],
            );
        }
    }

    /// Writes refreshed positions in place. Returns how many joints updated.
    pub fn apply_refresh(&self, results: &ScatterResults, scatter_index: usize) -> usize {
        let mut updated = 0;
        for (bone, joint) in &self.bones {
            if let Some(matrix) = results.try_get::<Mat4>(scatter_index, MATRIX_ID + bone.id() as usize) {
                joint.update(&matrix);
                updated += 1;
            }
        }
        updated
    }

    /// Re-reads every joint's matrix in a single round.
    pub fn refresh(&self, channel: &dyn MemoryChannel) -> usize {
        if self.bones.is_empty() {
            return 0;
        }
        let mut plan = ScatterPlan::new(1);
        self.queue_refresh(&mut plan, 0, 0);
        plan.execute(channel);
        self.apply_refresh(plan.results(), 0)
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn get(&self, bone: PlayerBone) -> Option<&Bone> {
        self.bones.get(&bone)
    }

    /// Position of `bone`, or the origin when it was never resolved.
    pub fn position(&self, bone: PlayerBone) -> Vec3 {
        self.bones.get(&bone).map(Bone::position).unwrap_or(Vec3::ZERO)
    }

    pub fn bones(&self) -> &HashMap<PlayerBone, Bone> {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}
