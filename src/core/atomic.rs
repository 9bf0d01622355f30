//! Lock-free cells for values written by the polling thread and read by
//! consumers at any time.
//!
//! Each component is stored in its own atomic, so a reader may observe a
//! vector whose components come from two consecutive writes. Every component
//! is a valid value on its own, which is all consumers rely on.

use glam::{Vec2, Vec3};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct AtomicVec2 {
    x: AtomicF32,
    y: AtomicF32,
}

impl AtomicVec2 {
    pub fn new(value: Vec2) -> Self {
        Self {
            x: AtomicF32::new(value.x),
            y: AtomicF32::new(value.y),
        }
    }

    #[inline]
    pub fn load(&self) -> Vec2 {
        Vec2::new(self.x.load(), self.y.load())
    }

    #[inline]
    pub fn store(&self, value: Vec2) {
        self.x.store(value.x);
        self.y.store(value.y);
    }
}

#[derive(Debug, Default)]
pub struct AtomicVec3 {
    x: AtomicF32,
    y: AtomicF32,
    z: AtomicF32,
}

impl AtomicVec3 {
    pub fn new(value: Vec3) -> Self {
        Self {
            x: AtomicF32::new(value.x),
            y: AtomicF32::new(value.y),
            z: AtomicF32::new(value.z),
        }
    }

    #[inline]
    pub fn load(&self) -> Vec3 {
        Vec3::new(self.x.load(), self.y.load(), self.z.load())
    }

    #[inline]
    pub fn store(&self, value: Vec3) {
        self.x.store(value.x);
        self.y.store(value.y);
        self.z.store(value.z);
    }
}
