//! Recursive Newton–Euler sweeps over the chain.
//!
//! The outward sweep propagates spatial velocity and acceleration from the
//! root toward the leaves; the inward sweep accumulates spatial wrenches
//! from the leaves back to the root and extracts joint torques. Gravity
//! enters as a −g acceleration seeded at the root, so the computed torques
//! carry the gravity load without a separate force pass.

use glam::DVec3;

use crate::core::chain::Chain;
use crate::core::error::Result;
use crate::utils::spatial::{transport_motion, transport_wrench, SpatialVec};

impl Chain {
    /// Outward sweep: recomputes every link's spatial velocity and
    /// acceleration in its own frame from the current joint rates,
    /// parents before children.
    pub fn update_rate(&mut self) {
        let world_acc = SpatialVec::new(DVec3::ZERO, -self.gravity);
        for i in 0..self.link_num() {
            let (pvel, pacc) = match self.link(i).parent() {
                Some(p) => (*self.link(p).vel(), *self.link(p).acc()),
                None => (SpatialVec::ZERO, world_acc),
            };
            let f = *self.link(i).adj_frame();
            let mut vel = transport_motion(&pvel, &f);
            self.link(i).joint.inc_vel(&mut vel);
            // Transport the parent acceleration, including the centripetal
            // term of the frame offset, then add the joint's own motion.
            let mut acc = SpatialVec::new(
                pacc.ang,
                pacc.lin + pacc.ang.cross(f.pos) + pvel.ang.cross(pvel.ang.cross(f.pos)),
            )
            .rotate_inv(f.att);
            self.link(i).joint.inc_acc_on_vel(vel.ang, &mut acc);
            self.link(i).joint.inc_acc(&mut acc);
            let com = self.link(i).com;
            let link = self.link_mut(i);
            link.vel = vel;
            link.acc = acc;
            link.com_vel = vel.lin + vel.ang.cross(com);
            link.com_acc =
                acc.lin + acc.ang.cross(com) + vel.ang.cross(vel.ang.cross(com));
        }
    }

    /// Inward sweep: recomputes every link's spatial wrench, children
    /// before parents, and extracts the generalized joint torques.
    pub fn update_wrench(&mut self) {
        for i in (0..self.link_num()).rev() {
            let link = self.link(i);
            let inertia_torque = link.inertia * link.acc().ang
                + link.vel().ang.cross(link.inertia * link.vel().ang)
                + link.com.cross(link.mass * link.com_acc());
            let mut wrench = SpatialVec::new(inertia_torque, link.mass * link.com_acc())
                - link.net_ext_wrench();
            for c in self.children(i) {
                wrench += transport_wrench(self.link(c).wrench(), self.link(c).adj_frame());
            }
            let link = self.link_mut(i);
            link.wrench = wrench;
            link.joint.calc_trq(&wrench);
        }
    }

    /// World COM velocity: the mass-weighted mean of per-link COM
    /// velocities rotated into world coordinates.
    pub fn update_com_vel(&mut self) -> DVec3 {
        let mut vel = DVec3::ZERO;
        for link in self.links() {
            vel += link.mass / self.mass() * (link.wld_frame().att * link.com_vel());
        }
        self.set_com_state(vel, self.com_acc());
        vel
    }

    /// World COM acceleration, as [`Chain::update_com_vel`].
    pub fn update_com_acc(&mut self) -> DVec3 {
        let mut acc = DVec3::ZERO;
        for link in self.links() {
            acc += link.mass / self.mass() * (link.wld_frame().att * link.com_acc());
        }
        self.set_com_state(self.com_vel(), acc);
        acc
    }

    /// Inverse-dynamics update from the current joint state: rate sweep,
    /// wrench sweep, then the COM rate aggregates.
    pub fn update_id(&mut self) {
        self.update_rate();
        self.update_wrench();
        self.update_com_vel();
        self.update_com_acc();
    }

    /// Solves inverse dynamics for packed velocity and acceleration
    /// vectors; torques are left on the joints.
    pub fn id(&mut self, vel: &[f64], acc: &[f64]) -> Result<()> {
        self.set_joint_rate_all(vel, acc)?;
        self.update_id();
        Ok(())
    }

    /// Continuous forward kinematics over a time step: displacements are
    /// set in continuous mode (inferring rates by finite differencing),
    /// then full FK and ID run.
    pub fn fk_cnt(&mut self, dis: &[f64], dt: f64) -> Result<()> {
        self.set_joint_dis_cnt_all(dis, dt)?;
        self.update_fk();
        self.update_id();
        Ok(())
    }

    /// Acceleration of a point fixed to link `id` under zero joint
    /// acceleration, as a world-frame spatial vector. Overwrites the
    /// chain's joint accelerations.
    pub fn link_zero_acc(&mut self, id: usize, p: DVec3) -> SpatialVec {
        self.zero_joint_acc_all();
        self.update_rate();
        let link = self.link(id);
        SpatialVec::new(
            link.wld_frame().att * link.acc().ang,
            link.wld_frame().att * link.point_acc(p),
        )
    }
}
