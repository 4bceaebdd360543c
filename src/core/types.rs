//! Common geometric types shared across the chain model.

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::config::TINY;

/// A rigid transform: rotation and translation, no scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Frame {
    pub pos: DVec3,
    pub att: DQuat,
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Frame {
    pub const IDENTITY: Frame = Frame {
        pos: DVec3::ZERO,
        att: DQuat::IDENTITY,
    };

    pub fn new(pos: DVec3, att: DQuat) -> Self {
        Self { pos, att }
    }

    pub fn from_pos(pos: DVec3) -> Self {
        Self {
            pos,
            ..Self::IDENTITY
        }
    }

    pub fn from_att(att: DQuat) -> Self {
        Self {
            att,
            ..Self::IDENTITY
        }
    }

    /// Applies another frame on top of this one, returning the composition.
    pub fn combine(&self, other: &Frame) -> Frame {
        Frame {
            pos: self.pos + self.att * other.pos,
            att: (self.att * other.att).normalize(),
        }
    }

    pub fn inverse(&self) -> Frame {
        let att = self.att.inverse();
        Frame {
            pos: -(att * self.pos),
            att,
        }
    }

    /// Maps a point from this frame into the parent frame.
    pub fn xform(&self, p: DVec3) -> DVec3 {
        self.pos + self.att * p
    }

    /// Maps a point from the parent frame into this frame.
    pub fn xform_inv(&self, p: DVec3) -> DVec3 {
        self.att.inverse() * (p - self.pos)
    }

    /// Attitude as a 3×3 rotation matrix.
    pub fn att_mat(&self) -> DMat3 {
        DMat3::from_quat(self.att)
    }

    pub fn is_identity(&self) -> bool {
        self.pos.length() < TINY && self.att.angle_between(DQuat::IDENTITY) < TINY
    }
}

/// Inertia tensor builders for solid primitives.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: DVec3, mass: f64) -> DMat3;
    fn for_solid_sphere(radius: f64, mass: f64) -> DMat3;
    fn for_solid_cylinder(radius: f64, height: f64, mass: f64) -> DMat3;
}

impl InertiaTensorExt for DMat3 {
    fn for_solid_box(half_extents: DVec3, mass: f64) -> DMat3 {
        let lx = half_extents.x * 2.0;
        let ly = half_extents.y * 2.0;
        let lz = half_extents.z * 2.0;
        let factor = mass / 12.0;
        DMat3::from_diagonal(DVec3::new(
            factor * (ly * ly + lz * lz),
            factor * (lx * lx + lz * lz),
            factor * (lx * lx + ly * ly),
        ))
    }

    fn for_solid_sphere(radius: f64, mass: f64) -> DMat3 {
        DMat3::from_diagonal(DVec3::splat(0.4 * mass * radius * radius))
    }

    fn for_solid_cylinder(radius: f64, height: f64, mass: f64) -> DMat3 {
        let side = mass * (3.0 * radius * radius + height * height) / 12.0;
        DMat3::from_diagonal(DVec3::new(side, side, 0.5 * mass * radius * radius))
    }
}
