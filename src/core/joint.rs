//! Joint kinds and per-joint state.
//!
//! Every joint exposes the same capability set; kinds with no degrees of
//! freedom reduce most operations to no-ops. Displacements use kind-specific
//! encodings (angles for the revolute family, rotation vectors for the
//! spherical and free kinds) with the all-zero encoding meaning identity.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::config::{JOINT_STATE_SLOTS, TINY};
use crate::core::types::Frame;
use crate::utils::math::{quat_from_rotvec, rotvec_from_quat, signed_angle, wrap_to_pi};
use crate::utils::spatial::SpatialVec;

/// Closed set of joint kinds supported by a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointKind {
    /// Rigid connection.
    Fixed,
    /// Rotation about the local Z axis.
    Revolute,
    /// Translation along the local Z axis.
    Prismatic,
    /// Translation then rotation, both about the local Z axis.
    Cylindrical,
    /// Two successive rotations: local Z, then the rotated local Y.
    Universal,
    /// Free 3D rotation, encoded as a rotation vector.
    Spherical,
    /// Full 6-DOF pose: translation plus a rotation vector.
    Free,
    /// Rigid join marking a breakable connection point.
    Break,
}

impl JointKind {
    pub const ALL: [JointKind; 8] = [
        JointKind::Fixed,
        JointKind::Revolute,
        JointKind::Prismatic,
        JointKind::Cylindrical,
        JointKind::Universal,
        JointKind::Spherical,
        JointKind::Free,
        JointKind::Break,
    ];

    /// Degrees of freedom of the kind.
    pub fn dof(&self) -> usize {
        match self {
            JointKind::Fixed | JointKind::Break => 0,
            JointKind::Revolute | JointKind::Prismatic => 1,
            JointKind::Cylindrical | JointKind::Universal => 2,
            JointKind::Spherical => 3,
            JointKind::Free => 6,
        }
    }

    /// Kind name as used by the chain file format.
    pub fn name(&self) -> &'static str {
        match self {
            JointKind::Fixed => "fixed",
            JointKind::Revolute => "revolute",
            JointKind::Prismatic => "prismatic",
            JointKind::Cylindrical => "cylindrical",
            JointKind::Universal => "universal",
            JointKind::Spherical => "spherical",
            JointKind::Free => "free",
            JointKind::Break => "break",
        }
    }

    /// Resolves a kind from its format name.
    pub fn from_name(name: &str) -> Option<JointKind> {
        JointKind::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// State of one joint instance: displacement, velocity, acceleration, and
/// generalized force, together with the bound kind and an optional motor
/// reference into the owning chain's motor table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joint {
    kind: JointKind,
    dis: [f64; JOINT_STATE_SLOTS],
    vel: [f64; JOINT_STATE_SLOTS],
    acc: [f64; JOINT_STATE_SLOTS],
    trq: [f64; JOINT_STATE_SLOTS],
    pub motor: Option<usize>,
}

impl Joint {
    /// Creates a joint of the given kind in the neutral state.
    pub fn new(kind: JointKind) -> Self {
        Self {
            kind,
            dis: [0.0; JOINT_STATE_SLOTS],
            vel: [0.0; JOINT_STATE_SLOTS],
            acc: [0.0; JOINT_STATE_SLOTS],
            trq: [0.0; JOINT_STATE_SLOTS],
            motor: None,
        }
    }

    pub fn kind(&self) -> JointKind {
        self.kind
    }

    pub fn dof(&self) -> usize {
        self.kind.dof()
    }

    pub fn dis(&self) -> &[f64] {
        &self.dis[..self.dof()]
    }

    pub fn vel(&self) -> &[f64] {
        &self.vel[..self.dof()]
    }

    pub fn acc(&self) -> &[f64] {
        &self.acc[..self.dof()]
    }

    pub fn trq(&self) -> &[f64] {
        &self.trq[..self.dof()]
    }

    /// Writes the displacement, respecting the kind encoding. Angles of the
    /// revolute family are normalized into (−π, π]. `q` must hold `dof()`
    /// values.
    pub fn set_dis(&mut self, q: &[f64]) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => self.dis[0] = wrap_to_pi(q[0]),
            JointKind::Prismatic => self.dis[0] = q[0],
            JointKind::Cylindrical => {
                self.dis[0] = q[0];
                self.dis[1] = wrap_to_pi(q[1]);
            }
            JointKind::Universal => {
                self.dis[0] = wrap_to_pi(q[0]);
                self.dis[1] = wrap_to_pi(q[1]);
            }
            JointKind::Spherical => self.dis[..3].copy_from_slice(&q[..3]),
            JointKind::Free => self.dis[..6].copy_from_slice(&q[..6]),
        }
    }

    /// Reads the displacement into `q`, which must hold `dof()` values.
    pub fn get_dis(&self, q: &mut [f64]) {
        q[..self.dof()].copy_from_slice(self.dis());
    }

    /// Sets the displacement while inferring velocity and acceleration by
    /// finite differencing over `dt`. Angle slots difference through the
    /// principal range so wraparound does not spike the rates; the
    /// spherical and free kinds difference on the rotation manifold.
    pub fn set_dis_continuous(&mut self, q: &[f64], dt: f64) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => self.continuous_angle(0, q[0], dt),
            JointKind::Prismatic => self.continuous_linear(0, q[0], dt),
            JointKind::Cylindrical => {
                self.continuous_linear(0, q[0], dt);
                self.continuous_angle(1, q[1], dt);
            }
            JointKind::Universal => {
                self.continuous_angle(0, q[0], dt);
                self.continuous_angle(1, q[1], dt);
            }
            JointKind::Spherical => self.continuous_rotation(0, &q[..3], dt),
            JointKind::Free => {
                let att_new = quat_from_rotvec(DVec3::from_slice(&q[3..6]));
                let pos_old = DVec3::from_slice(&self.dis[..3]);
                let pos_new = DVec3::from_slice(&q[..3]);
                let vel_old = DVec3::from_slice(&self.vel[..3]);
                let vel_new = att_new.inverse() * ((pos_new - pos_old) / dt);
                self.dis[..3].copy_from_slice(&q[..3]);
                vel_new.write_to_slice(&mut self.vel[..3]);
                ((vel_new - vel_old) / dt).write_to_slice(&mut self.acc[..3]);
                self.continuous_rotation(3, &q[3..6], dt);
            }
        }
    }

    fn continuous_linear(&mut self, i: usize, q: f64, dt: f64) {
        let old_vel = self.vel[i];
        self.vel[i] = (q - self.dis[i]) / dt;
        self.acc[i] = (self.vel[i] - old_vel) / dt;
        self.dis[i] = q;
    }

    fn continuous_angle(&mut self, i: usize, q: f64, dt: f64) {
        let old_dis = self.dis[i];
        let old_vel = self.vel[i];
        self.dis[i] = wrap_to_pi(q);
        self.vel[i] = wrap_to_pi(self.dis[i] - old_dis) / dt;
        self.acc[i] = (self.vel[i] - old_vel) / dt;
    }

    fn continuous_rotation(&mut self, i: usize, q: &[f64], dt: f64) {
        let att_old = quat_from_rotvec(DVec3::from_slice(&self.dis[i..i + 3]));
        let vel_old = DVec3::from_slice(&self.vel[i..i + 3]);
        let att_new = quat_from_rotvec(DVec3::from_slice(q));
        self.dis[i..i + 3].copy_from_slice(q);
        let step = rotvec_from_quat(att_new * att_old.inverse()) / dt;
        let vel_new = att_new.inverse() * step;
        vel_new.write_to_slice(&mut self.vel[i..i + 3]);
        ((vel_new - vel_old) / dt).write_to_slice(&mut self.acc[i..i + 3]);
    }

    /// q_out ← q_out ⊕ (k · dq) in the kind's manifold.
    pub fn cat_dis(&self, q_out: &mut [f64], k: f64, dq: &[f64]) {
        match self.kind {
            JointKind::Spherical => cat_rotvec(&mut q_out[..3], k, &dq[..3]),
            JointKind::Free => {
                for i in 0..3 {
                    q_out[i] += k * dq[i];
                }
                cat_rotvec(&mut q_out[3..6], k, &dq[3..6]);
            }
            _ => {
                for i in 0..self.dof() {
                    q_out[i] += k * dq[i];
                }
            }
        }
    }

    /// q_a ← q_a ⊖ q_b in the kind's manifold.
    pub fn sub_dis(&self, q_a: &mut [f64], q_b: &[f64]) {
        match self.kind {
            JointKind::Spherical => sub_rotvec(&mut q_a[..3], &q_b[..3]),
            JointKind::Free => {
                for i in 0..3 {
                    q_a[i] -= q_b[i];
                }
                sub_rotvec(&mut q_a[3..6], &q_b[3..6]);
            }
            _ => {
                for i in 0..self.dof() {
                    q_a[i] -= q_b[i];
                }
            }
        }
    }

    pub fn set_vel(&mut self, v: &[f64]) {
        let n = self.dof();
        self.vel[..n].copy_from_slice(&v[..n]);
    }

    pub fn get_vel(&self, v: &mut [f64]) {
        v[..self.dof()].copy_from_slice(self.vel());
    }

    pub fn set_acc(&mut self, a: &[f64]) {
        let n = self.dof();
        self.acc[..n].copy_from_slice(&a[..n]);
    }

    pub fn get_acc(&self, a: &mut [f64]) {
        a[..self.dof()].copy_from_slice(self.acc());
    }

    pub fn set_trq(&mut self, t: &[f64]) {
        let n = self.dof();
        self.trq[..n].copy_from_slice(&t[..n]);
    }

    pub fn get_trq(&self, t: &mut [f64]) {
        t[..self.dof()].copy_from_slice(self.trq());
    }

    /// Rigid transform induced by the current displacement.
    pub fn joint_transform(&self) -> Frame {
        match self.kind {
            JointKind::Fixed | JointKind::Break => Frame::IDENTITY,
            JointKind::Revolute => Frame::from_att(DQuat::from_rotation_z(self.dis[0])),
            JointKind::Prismatic => Frame::from_pos(DVec3::new(0.0, 0.0, self.dis[0])),
            JointKind::Cylindrical => Frame::new(
                DVec3::new(0.0, 0.0, self.dis[0]),
                DQuat::from_rotation_z(self.dis[1]),
            ),
            JointKind::Universal => Frame::from_att(
                DQuat::from_rotation_z(self.dis[0]) * DQuat::from_rotation_y(self.dis[1]),
            ),
            JointKind::Spherical => {
                Frame::from_att(quat_from_rotvec(DVec3::from_slice(&self.dis[..3])))
            }
            JointKind::Free => Frame::new(
                DVec3::from_slice(&self.dis[..3]),
                quat_from_rotvec(DVec3::from_slice(&self.dis[3..6])),
            ),
        }
    }

    /// Motion axis in the coordinates of `frame`, where a single local-Z
    /// axis is defined for the kind.
    pub fn axis(&self, frame: &Frame) -> Option<DVec3> {
        match self.kind {
            JointKind::Revolute | JointKind::Prismatic | JointKind::Cylindrical => {
                Some(frame.att * DVec3::Z)
            }
            _ => None,
        }
    }

    /// First universal axis (the pre-joint Z) in child-frame coordinates.
    fn universal_axis0(&self) -> DVec3 {
        let (s, c) = self.dis[1].sin_cos();
        DVec3::new(-s, 0.0, c)
    }

    fn vel3(&self, i: usize) -> DVec3 {
        DVec3::from_slice(&self.vel[i..i + 3])
    }

    fn acc3(&self, i: usize) -> DVec3 {
        DVec3::from_slice(&self.acc[i..i + 3])
    }

    /// Adds the joint's own motion rate to the child link's spatial
    /// velocity, in child-frame coordinates.
    pub fn inc_vel(&self, v: &mut SpatialVec) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => v.ang.z += self.vel[0],
            JointKind::Prismatic => v.lin.z += self.vel[0],
            JointKind::Cylindrical => {
                v.lin.z += self.vel[0];
                v.ang.z += self.vel[1];
            }
            JointKind::Universal => {
                v.ang += self.vel[0] * self.universal_axis0() + self.vel[1] * DVec3::Y;
            }
            JointKind::Spherical => v.ang += self.vel3(0),
            JointKind::Free => {
                v.lin += self.vel3(0);
                v.ang += self.vel3(3);
            }
        }
    }

    /// Adds the velocity-dependent part of the joint's motion to the child
    /// link's spatial acceleration. `w` is the child link's angular
    /// velocity after [`Joint::inc_vel`].
    pub fn inc_acc_on_vel(&self, w: DVec3, a: &mut SpatialVec) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => {
                a.ang.x += self.vel[0] * w.y;
                a.ang.y -= self.vel[0] * w.x;
            }
            JointKind::Prismatic => {
                a.lin.x += 2.0 * self.vel[0] * w.y;
                a.lin.y -= 2.0 * self.vel[0] * w.x;
            }
            JointKind::Cylindrical => {
                a.lin.x += 2.0 * self.vel[0] * w.y;
                a.lin.y -= 2.0 * self.vel[0] * w.x;
                a.ang.x += self.vel[1] * w.y;
                a.ang.y -= self.vel[1] * w.x;
            }
            JointKind::Universal => {
                let (s, c) = self.dis[1].sin_cos();
                let wj = self.vel[0] * self.universal_axis0() + self.vel[1] * DVec3::Y;
                a.ang += w.cross(wj) + self.vel[0] * self.vel[1] * DVec3::new(-c, 0.0, -s);
            }
            JointKind::Spherical => a.ang += w.cross(self.vel3(0)),
            JointKind::Free => {
                a.lin += 2.0 * w.cross(self.vel3(0));
                a.ang += w.cross(self.vel3(3));
            }
        }
    }

    /// Adds the joint's own acceleration to the child link's spatial
    /// acceleration, in child-frame coordinates.
    pub fn inc_acc(&self, a: &mut SpatialVec) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => a.ang.z += self.acc[0],
            JointKind::Prismatic => a.lin.z += self.acc[0],
            JointKind::Cylindrical => {
                a.lin.z += self.acc[0];
                a.ang.z += self.acc[1];
            }
            JointKind::Universal => {
                a.ang += self.acc[0] * self.universal_axis0() + self.acc[1] * DVec3::Y;
            }
            JointKind::Spherical => a.ang += self.acc3(0),
            JointKind::Free => {
                a.lin += self.acc3(0);
                a.ang += self.acc3(3);
            }
        }
    }

    /// Extracts the generalized joint forces from the spatial wrench
    /// transmitted across the joint, in child-frame coordinates.
    pub fn calc_trq(&mut self, w: &SpatialVec) {
        match self.kind {
            JointKind::Fixed | JointKind::Break => {}
            JointKind::Revolute => self.trq[0] = w.ang.z,
            JointKind::Prismatic => self.trq[0] = w.lin.z,
            JointKind::Cylindrical => {
                self.trq[0] = w.lin.z;
                self.trq[1] = w.ang.z;
            }
            JointKind::Universal => {
                self.trq[0] = w.ang.dot(self.universal_axis0());
                self.trq[1] = w.ang.y;
            }
            JointKind::Spherical => w.ang.write_to_slice(&mut self.trq[..3]),
            JointKind::Free => {
                w.lin.write_to_slice(&mut self.trq[..3]);
                w.ang.write_to_slice(&mut self.trq[3..6]);
            }
        }
    }

    /// Decomposes a deviation frame into the DOF-aligned displacement and
    /// the orthogonal residual. The displacement is returned in full-width
    /// slot form; only the first `dof()` entries are meaningful.
    pub fn torsion(&self, dev: &Frame) -> ([f64; JOINT_STATE_SLOTS], SpatialVec) {
        let mut q = [0.0; JOINT_STATE_SLOTS];
        let residual = match self.kind {
            JointKind::Fixed | JointKind::Break => {
                SpatialVec::new(rotvec_from_quat(dev.att), dev.pos)
            }
            JointKind::Revolute => {
                let (dis, t) = revolute_torsion(dev);
                q[0] = dis;
                t
            }
            JointKind::Prismatic => {
                let (dis, t) = prismatic_torsion(dev);
                q[0] = dis;
                t
            }
            JointKind::Cylindrical => {
                let lin = dev.att.inverse() * dev.pos;
                q[0] = lin.z;
                let (dis, t) = revolute_torsion(dev);
                q[1] = dis;
                SpatialVec::new(t.ang, DVec3::new(lin.x, lin.y, 0.0))
            }
            JointKind::Universal => {
                // Z–Y–X factorization: the Z and Y angles are the joint's
                // displacement; the leftover X rotation is the residual.
                let m = dev.att_mat();
                q[0] = m.x_axis.y.atan2(m.x_axis.x);
                q[1] = (-m.x_axis.z).asin();
                let c = m.y_axis.z.atan2(m.z_axis.z);
                SpatialVec::new(DVec3::new(c, 0.0, 0.0), dev.pos)
            }
            JointKind::Spherical => {
                rotvec_from_quat(dev.att).write_to_slice(&mut q[..3]);
                SpatialVec::new(DVec3::ZERO, dev.pos)
            }
            JointKind::Free => {
                dev.pos.write_to_slice(&mut q[..3]);
                rotvec_from_quat(dev.att).write_to_slice(&mut q[3..6]);
                SpatialVec::ZERO
            }
        };
        (q, residual)
    }

    /// Resets the displacement to the identity encoding.
    pub fn neutral(&mut self) {
        self.dis = [0.0; JOINT_STATE_SLOTS];
    }

    /// True when every displacement slot is within tolerance of zero.
    pub fn is_neutral(&self) -> bool {
        self.dis().iter().all(|d| d.abs() < TINY)
    }

    /// Copies displacement, velocity, acceleration, and torque from `src`.
    /// Both joints must be of the same kind.
    pub fn copy_state(&mut self, src: &Joint) {
        debug_assert_eq!(self.kind, src.kind);
        self.dis = src.dis;
        self.vel = src.vel;
        self.acc = src.acc;
        self.trq = src.trq;
    }
}

fn cat_rotvec(q_out: &mut [f64], k: f64, dq: &[f64]) {
    let base = quat_from_rotvec(DVec3::from_slice(q_out));
    let step = quat_from_rotvec(DVec3::from_slice(dq) * k);
    rotvec_from_quat(step * base).write_to_slice(q_out);
}

fn sub_rotvec(q_a: &mut [f64], q_b: &[f64]) {
    let a = quat_from_rotvec(DVec3::from_slice(q_a));
    let b = quat_from_rotvec(DVec3::from_slice(q_b));
    rotvec_from_quat(a * b.inverse()).write_to_slice(q_a);
}

/// Axis-angle decomposition of a deviation frame about the local Z axis.
/// Returns the scalar displacement (the average of the two principal-angle
/// measurements between pre- and post-frames about the shared Z axis) and
/// the residual: the remaining rotation projected away from Z, in
/// child-frame coordinates, with the translation passed through.
pub fn revolute_torsion(dev: &Frame) -> (f64, SpatialVec) {
    let m = dev.att_mat();
    let zp = m.z_axis;
    let mut aa = DVec3::new(-zp.y, zp.x, 0.0);
    let l = aa.length();
    let angle = l.atan2(zp.z);
    if angle.abs() < TINY || l < TINY {
        aa = DVec3::ZERO;
    } else {
        aa *= angle / l;
    }
    let residual_ang = dev.att.inverse() * aa;
    // Intermediate attitude that tilts Z without twisting about it.
    let rm = glam::DMat3::from_quat(quat_from_rotvec(aa));
    let dis = 0.5
        * (signed_angle(rm.x_axis, m.x_axis, rm.z_axis)
            + signed_angle(rm.y_axis, m.y_axis, rm.z_axis));
    (dis, SpatialVec::new(residual_ang, dev.pos))
}

/// Local-Z component of the deviation translation as the displacement; the
/// other two components form the linear residual and the rotation passes
/// through unchanged as a rotation vector.
pub fn prismatic_torsion(dev: &Frame) -> (f64, SpatialVec) {
    let lin = dev.att.inverse() * dev.pos;
    let residual = SpatialVec::new(rotvec_from_quat(dev.att), DVec3::new(lin.x, lin.y, 0.0));
    (lin.z, residual)
}
