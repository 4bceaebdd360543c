//! A single rigid body in a kinematic chain.

use glam::{DMat3, DVec3};

use crate::core::joint::{Joint, JointKind};
use crate::core::types::Frame;
use crate::utils::spatial::SpatialVec;

/// An external wrench applied to a link at a point, all in link-frame
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ExtWrench {
    pub force: DVec3,
    pub torque: DVec3,
    /// Application point in the link frame.
    pub point: DVec3,
}

impl ExtWrench {
    pub fn new(force: DVec3, torque: DVec3, point: DVec3) -> Self {
        Self {
            force,
            torque,
            point,
        }
    }

    pub fn force_at(force: DVec3, point: DVec3) -> Self {
        Self::new(force, DVec3::ZERO, point)
    }

    /// The wrench expressed at the link frame origin.
    pub fn at_origin(&self) -> SpatialVec {
        SpatialVec::new(self.torque + self.point.cross(self.force), self.force)
    }
}

/// One body of the kinematic tree. Mass properties and the rest transform
/// are configuration; the frames, rates, and wrench are recomputed by the
/// kinematics and dynamics sweeps.
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    /// Mass in kilograms.
    pub mass: f64,
    /// Center of mass in the link frame.
    pub com: DVec3,
    /// Inertia tensor about the COM, in link-frame coordinates.
    pub inertia: DMat3,
    /// Rest transform from the parent frame at neutral joint displacement.
    pub org_frame: Frame,
    /// The joint connecting this link to its parent.
    pub joint: Joint,
    /// Indices into the owning chain's shape table.
    pub shapes: Vec<usize>,
    pub(crate) adj_frame: Frame,
    pub(crate) wld_frame: Frame,
    pub(crate) vel: SpatialVec,
    pub(crate) acc: SpatialVec,
    pub(crate) com_vel: DVec3,
    pub(crate) com_acc: DVec3,
    pub(crate) wrench: SpatialVec,
    pub(crate) parent: Option<usize>,
    pub(crate) child: Option<usize>,
    pub(crate) sibling: Option<usize>,
    pub(crate) offset: Option<usize>,
    ext_wrenches: Vec<ExtWrench>,
}

impl Link {
    pub fn new(name: &str, kind: JointKind) -> Self {
        Self {
            name: name.to_string(),
            mass: 0.0,
            com: DVec3::ZERO,
            inertia: DMat3::ZERO,
            org_frame: Frame::IDENTITY,
            joint: Joint::new(kind),
            shapes: Vec::new(),
            adj_frame: Frame::IDENTITY,
            wld_frame: Frame::IDENTITY,
            vel: SpatialVec::ZERO,
            acc: SpatialVec::ZERO,
            com_vel: DVec3::ZERO,
            com_acc: DVec3::ZERO,
            wrench: SpatialVec::ZERO,
            parent: None,
            child: None,
            sibling: None,
            offset: None,
            ext_wrenches: Vec::new(),
        }
    }

    /// Origin frame composed with the current joint transform.
    pub fn adj_frame(&self) -> &Frame {
        &self.adj_frame
    }

    /// Current world frame, maintained by forward kinematics.
    pub fn wld_frame(&self) -> &Frame {
        &self.wld_frame
    }

    /// COM position in world coordinates, per the current world frame.
    pub fn wld_com(&self) -> DVec3 {
        self.wld_frame.xform(self.com)
    }

    /// Spatial velocity in the link frame.
    pub fn vel(&self) -> &SpatialVec {
        &self.vel
    }

    /// Spatial acceleration in the link frame.
    pub fn acc(&self) -> &SpatialVec {
        &self.acc
    }

    /// COM velocity in the link frame.
    pub fn com_vel(&self) -> DVec3 {
        self.com_vel
    }

    /// COM acceleration in the link frame.
    pub fn com_acc(&self) -> DVec3 {
        self.com_acc
    }

    /// Wrench transmitted through the joint, at the link frame.
    pub fn wrench(&self) -> &SpatialVec {
        &self.wrench
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn child(&self) -> Option<usize> {
        self.child
    }

    pub fn sibling(&self) -> Option<usize> {
        self.sibling
    }

    /// Start column in packed joint-state vectors; `None` when DOF = 0.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: Option<usize>) {
        self.offset = offset;
    }

    pub fn joint_size(&self) -> usize {
        self.joint.dof()
    }

    /// Copies joint state and link-level rates from `src`.
    pub fn copy_state(&mut self, src: &Link) {
        self.joint.copy_state(&src.joint);
        self.adj_frame = src.adj_frame;
        self.wld_frame = src.wld_frame;
        self.vel = src.vel;
        self.acc = src.acc;
        self.com_vel = src.com_vel;
        self.com_acc = src.com_acc;
        self.wrench = src.wrench;
    }

    /// Acceleration of a point fixed to the link, in link-frame
    /// coordinates: a + α × p + ω × (ω × p).
    pub fn point_acc(&self, p: DVec3) -> DVec3 {
        self.acc.lin + self.acc.ang.cross(p) + self.vel.ang.cross(self.vel.ang.cross(p))
    }

    /// Angular momentum of the link about the point `p` (link frame), in
    /// link-frame coordinates.
    pub fn angular_momentum(&self, p: DVec3) -> DVec3 {
        self.mass * (self.com - p).cross(self.com_vel) + self.inertia * self.vel.ang
    }

    /// Kinetic energy of the link at its current rates.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.vel.ang.dot(self.inertia * self.vel.ang)
            + 0.5 * self.mass * self.com_vel.length_squared()
    }

    pub fn add_ext_wrench(&mut self, w: ExtWrench) {
        self.ext_wrenches.push(w);
    }

    pub fn clear_ext_wrenches(&mut self) {
        self.ext_wrenches.clear();
    }

    pub fn ext_wrenches(&self) -> &[ExtWrench] {
        &self.ext_wrenches
    }

    /// Resultant of the attached external wrenches at the link frame.
    pub fn net_ext_wrench(&self) -> SpatialVec {
        self.ext_wrenches
            .iter()
            .fold(SpatialVec::ZERO, |acc, w| acc + w.at_origin())
    }
}
