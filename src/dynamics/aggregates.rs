//! Aggregate quantities over the whole chain: momentum, energy, the
//! zero-moment point, and net external load.

use glam::DVec3;

use crate::config::TINY;
use crate::core::chain::Chain;
use crate::utils::spatial::SpatialVec;

impl Chain {
    /// Angular momentum of the chain about the world point `p`, in world
    /// coordinates.
    pub fn angular_momentum(&self, p: DVec3) -> DVec3 {
        let mut am = DVec3::ZERO;
        for link in self.links() {
            let local_p = link.wld_frame().xform_inv(p);
            am += link.wld_frame().att * link.angular_momentum(local_p);
        }
        am
    }

    /// Total kinetic energy at the current link rates.
    pub fn kinetic_energy(&self) -> f64 {
        self.links().iter().map(|l| l.kinetic_energy()).sum()
    }

    /// Zero-moment point on the horizontal plane at height `z`, in world
    /// coordinates. `None` when the vertical contact force vanishes (a
    /// floating chain has no ZMP).
    pub fn zmp(&self, z: f64) -> Option<DVec3> {
        let d = self.gravity_dir();
        let root = self.root_link();
        let f = root.wrench().lin;
        let denom = d.dot(f);
        if denom.abs() < TINY {
            return None;
        }
        let zmp =
            (d.cross(root.wrench().ang) + (z - root.wld_frame().pos.z) * f) / denom;
        Some(root.wld_frame().xform(zmp))
    }

    /// Net torque about the gravity axis transmitted at the root. `None`
    /// when the root torque is orthogonal to the gravity direction, which
    /// leaves the quotient undefined.
    pub fn yaw_torque(&self) -> Option<f64> {
        let d = self.gravity_dir();
        let root = self.root_link();
        let denom = root.wrench().ang.dot(d);
        if denom.abs() < TINY {
            return None;
        }
        Some(root.wrench().ang.dot(root.wrench().lin) / denom)
    }

    /// Sum of every link's external wrenches, rotated into world attitude
    /// and shifted to the world origin.
    pub fn net_ext_wrench(&self) -> SpatialVec {
        let mut total = SpatialVec::ZERO;
        for link in self.links() {
            let ew = link.net_ext_wrench();
            if ew.is_tiny() {
                continue;
            }
            total += ew.rotate(link.wld_frame().att).ang_shift(link.wld_frame().pos);
        }
        total
    }
}
