//! 6D spatial vectors used by the kinematics and dynamics sweeps.

use glam::{DQuat, DVec3};

use crate::config::TINY;
use crate::core::types::Frame;

/// A 6D spatial vector combining angular and linear components.
/// In motion space, angular is rotational rate and linear is translational
/// rate; in force space, angular is torque and linear is force.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialVec {
    pub ang: DVec3,
    pub lin: DVec3,
}

impl SpatialVec {
    pub const ZERO: SpatialVec = SpatialVec {
        ang: DVec3::ZERO,
        lin: DVec3::ZERO,
    };

    pub fn new(ang: DVec3, lin: DVec3) -> Self {
        Self { ang, lin }
    }

    pub fn dot(&self, other: &SpatialVec) -> f64 {
        self.ang.dot(other.ang) + self.lin.dot(other.lin)
    }

    /// Spatial motion cross product: v1 ×ₘ v2
    pub fn cross_motion(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang),
            lin: self.ang.cross(other.lin) + self.lin.cross(other.ang),
        }
    }

    /// Spatial force cross product: v ×f f
    pub fn cross_force(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang) + self.lin.cross(other.lin),
            lin: self.ang.cross(other.lin),
        }
    }

    /// Rotates both halves by `q`.
    pub fn rotate(&self, q: DQuat) -> SpatialVec {
        SpatialVec {
            ang: q * self.ang,
            lin: q * self.lin,
        }
    }

    /// Rotates both halves by the inverse of `q`.
    pub fn rotate_inv(&self, q: DQuat) -> SpatialVec {
        let inv = q.inverse();
        SpatialVec {
            ang: inv * self.ang,
            lin: inv * self.lin,
        }
    }

    /// Shifts the linear half of a motion vector to a point offset by `p`:
    /// lin ← lin + ang × p.
    pub fn lin_shift(&self, p: DVec3) -> SpatialVec {
        SpatialVec {
            ang: self.ang,
            lin: self.lin + self.ang.cross(p),
        }
    }

    /// Shifts the angular half of a force vector to a new origin offset by
    /// −`p`: ang ← ang + p × lin.
    pub fn ang_shift(&self, p: DVec3) -> SpatialVec {
        SpatialVec {
            ang: self.ang + p.cross(self.lin),
            lin: self.lin,
        }
    }

    pub fn is_tiny(&self) -> bool {
        self.ang.length() < TINY && self.lin.length() < TINY
    }
}

/// Expresses a parent-frame twist at the child frame origin, in child
/// coordinates. `f` is the child's pose in the parent frame.
pub fn transport_motion(v: &SpatialVec, f: &Frame) -> SpatialVec {
    v.lin_shift(f.pos).rotate_inv(f.att)
}

/// Transports a child-frame wrench to the parent frame origin, in parent
/// coordinates. `f` is the child's pose in the parent frame.
pub fn transport_wrench(w: &SpatialVec, f: &Frame) -> SpatialVec {
    w.rotate(f.att).ang_shift(f.pos)
}

impl std::ops::Add for SpatialVec {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            ang: self.ang + other.ang,
            lin: self.lin + other.lin,
        }
    }
}

impl std::ops::AddAssign for SpatialVec {
    fn add_assign(&mut self, other: Self) {
        self.ang += other.ang;
        self.lin += other.lin;
    }
}

impl std::ops::Sub for SpatialVec {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            ang: self.ang - other.ang,
            lin: self.lin - other.lin,
        }
    }
}

impl std::ops::Mul<f64> for SpatialVec {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            ang: self.ang * rhs,
            lin: self.lin * rhs,
        }
    }
}
