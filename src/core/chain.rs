//! The kinematic chain: a tree of links with packed joint-state access.

use glam::DVec3;
use log::warn;

use crate::config::{DEFAULT_GRAVITY, JOINT_STATE_SLOTS};
use crate::core::error::{ChainError, Result};
use crate::core::link::Link;
use crate::core::motor::Motor;
use crate::core::shape::Shape;
use crate::core::types::Frame;
use crate::utils::bounding::{bounding_ball, BoundingBall};
use crate::utils::math::{quat_from_rotvec, rotvec_from_quat};

/// An articulated mechanism: links in a topologically sorted array (index 0
/// is the root; every parent precedes its children), the motor and shape
/// tables they reference, and the aggregate mass state.
#[derive(Debug, Clone)]
pub struct Chain {
    pub name: String,
    /// Gravity acceleration vector in world coordinates.
    pub gravity: DVec3,
    links: Vec<Link>,
    motors: Vec<Motor>,
    shapes: Vec<Shape>,
    mass: f64,
    wld_com: DVec3,
    com_vel: DVec3,
    com_acc: DVec3,
}

impl Chain {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gravity: DVec3::from_array(DEFAULT_GRAVITY),
            links: Vec::new(),
            motors: Vec::new(),
            shapes: Vec::new(),
            mass: 0.0,
            wld_com: DVec3::ZERO,
            com_vel: DVec3::ZERO,
            com_acc: DVec3::ZERO,
        }
    }

    /// Appends a link under `parent` and returns its index. The first link
    /// added must be the root (no parent); children must name an existing
    /// parent, which keeps the array topologically sorted by construction.
    pub fn add_link(&mut self, mut link: Link, parent: Option<usize>) -> usize {
        let idx = self.links.len();
        match parent {
            None => assert!(idx == 0, "only link 0 may be the root"),
            Some(p) => assert!(p < idx, "parent must precede its child"),
        }
        link.parent = parent;
        link.child = None;
        link.sibling = None;
        self.links.push(link);
        if let Some(p) = parent {
            // Append to the end of the parent's child list.
            match self.links[p].child {
                None => self.links[p].child = Some(idx),
                Some(first) => {
                    let mut c = first;
                    while let Some(s) = self.links[c].sibling {
                        c = s;
                    }
                    self.links[c].sibling = Some(idx);
                }
            }
        }
        idx
    }

    pub fn link_num(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, i: usize) -> &Link {
        &self.links[i]
    }

    pub fn link_mut(&mut self, i: usize) -> &mut Link {
        &mut self.links[i]
    }

    pub fn find_link(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|l| l.name == name)
    }

    pub fn root_link(&self) -> &Link {
        &self.links[0]
    }

    /// World frame of the root link.
    pub fn root_frame(&self) -> &Frame {
        self.links[0].wld_frame()
    }

    /// Iterates over the direct children of link `i` through the
    /// first-child/next-sibling encoding.
    pub fn children(&self, i: usize) -> Children<'_> {
        Children {
            chain: self,
            next: self.links[i].child,
        }
    }

    pub fn motors(&self) -> &[Motor] {
        &self.motors
    }

    pub fn motor_mut(&mut self, i: usize) -> &mut Motor {
        &mut self.motors[i]
    }

    pub fn add_motor(&mut self, motor: Motor) -> usize {
        self.motors.push(motor);
        self.motors.len() - 1
    }

    pub fn find_motor(&self, name: &str) -> Option<usize> {
        self.motors.iter().position(|m| m.name == name)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn find_shape(&self, name: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.name == name)
    }

    /// Total mass, as last computed by [`Chain::calc_mass`].
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// World COM position, maintained by forward kinematics.
    pub fn wld_com(&self) -> DVec3 {
        self.wld_com
    }

    /// World COM velocity, maintained by inverse dynamics.
    pub fn com_vel(&self) -> DVec3 {
        self.com_vel
    }

    /// World COM acceleration, maintained by inverse dynamics.
    pub fn com_acc(&self) -> DVec3 {
        self.com_acc
    }

    pub(crate) fn set_com_state(&mut self, vel: DVec3, acc: DVec3) {
        self.com_vel = vel;
        self.com_acc = acc;
    }

    /// Sums link masses into the chain total and returns it.
    pub fn calc_mass(&mut self) -> f64 {
        self.mass = self.links.iter().map(|l| l.mass).sum();
        self.mass
    }

    /// Prepares a populated chain for evaluation: total mass (with the
    /// dummy fallback for massless models), offset table, forward
    /// kinematics, and inverse dynamics.
    pub fn initialize(&mut self) -> Result<()> {
        if self.links.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        if self.calc_mass() == 0.0 {
            warn!("chain '{}' is massless; using dummy mass 1.0", self.name);
            self.mass = 1.0;
        }
        self.set_offsets();
        self.update_fk();
        self.update_id();
        Ok(())
    }

    // --- packed joint-state layout ---------------------------------------

    /// Total joint size: Σ DOF over every link.
    pub fn joint_size(&self) -> usize {
        self.links.iter().map(|l| l.joint_size()).sum()
    }

    /// Rebuilds the offset table mapping each link to its first column in
    /// packed joint-state vectors.
    pub fn set_offsets(&mut self) {
        let mut s = 0;
        for link in &mut self.links {
            let n = link.joint_size();
            if n > 0 {
                link.set_offset(Some(s));
                s += n;
            } else {
                link.set_offset(None);
            }
        }
    }

    /// Default index list: every link with DOF > 0, in link order.
    pub fn default_joint_index(&self) -> Vec<usize> {
        (0..self.links.len())
            .filter(|&i| self.links[i].joint_size() > 0)
            .collect()
    }

    /// Total joint size over an index list.
    pub fn joint_index_size(&self, index: &[usize]) -> usize {
        index.iter().map(|&i| self.links[i].joint_size()).sum()
    }

    fn check_index_size(&self, index: &[usize], len: usize) -> Result<()> {
        let expected = self.joint_index_size(index);
        if len != expected {
            return Err(ChainError::SizeMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    fn check_all_size(&self, len: usize) -> Result<()> {
        let expected = self.joint_size();
        if len != expected {
            return Err(ChainError::SizeMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    // --- sparse (indexed) access -----------------------------------------

    /// Sets joint displacements for the links in `index`, slicing `dis` in
    /// index order.
    pub fn set_joint_dis(&mut self, index: &[usize], dis: &[f64]) -> Result<()> {
        self.check_index_size(index, dis.len())?;
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            self.links[i].joint.set_dis(&dis[pos..pos + n]);
            pos += n;
        }
        Ok(())
    }

    /// Continuously updates joint displacements for the links in `index`,
    /// inferring rates over `dt`.
    pub fn set_joint_dis_cnt(&mut self, index: &[usize], dis: &[f64], dt: f64) -> Result<()> {
        self.check_index_size(index, dis.len())?;
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            self.links[i].joint.set_dis_continuous(&dis[pos..pos + n], dt);
            pos += n;
        }
        Ok(())
    }

    pub fn set_joint_vel(&mut self, index: &[usize], vel: &[f64]) -> Result<()> {
        self.check_index_size(index, vel.len())?;
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            self.links[i].joint.set_vel(&vel[pos..pos + n]);
            pos += n;
        }
        Ok(())
    }

    pub fn set_joint_acc(&mut self, index: &[usize], acc: &[f64]) -> Result<()> {
        self.check_index_size(index, acc.len())?;
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            self.links[i].joint.set_acc(&acc[pos..pos + n]);
            pos += n;
        }
        Ok(())
    }

    /// Sets velocities and accelerations together for the links in `index`.
    pub fn set_joint_rate(&mut self, index: &[usize], vel: &[f64], acc: &[f64]) -> Result<()> {
        self.set_joint_vel(index, vel)?;
        self.set_joint_acc(index, acc)
    }

    pub fn get_joint_dis(&self, index: &[usize]) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_index_size(index)];
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            out[pos..pos + n].copy_from_slice(self.links[i].joint.dis());
            pos += n;
        }
        out
    }

    pub fn get_joint_vel(&self, index: &[usize]) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_index_size(index)];
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            out[pos..pos + n].copy_from_slice(self.links[i].joint.vel());
            pos += n;
        }
        out
    }

    pub fn get_joint_acc(&self, index: &[usize]) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_index_size(index)];
        let mut pos = 0;
        for &i in index {
            let n = self.links[i].joint_size();
            out[pos..pos + n].copy_from_slice(self.links[i].joint.acc());
            pos += n;
        }
        out
    }

    // --- dense (whole-chain) access --------------------------------------

    pub fn set_joint_dis_all(&mut self, dis: &[f64]) -> Result<()> {
        self.check_all_size(dis.len())?;
        for link in &mut self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.set_dis(&dis[off..off + n]);
            }
        }
        Ok(())
    }

    pub fn set_joint_dis_cnt_all(&mut self, dis: &[f64], dt: f64) -> Result<()> {
        self.check_all_size(dis.len())?;
        for link in &mut self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.set_dis_continuous(&dis[off..off + n], dt);
            }
        }
        Ok(())
    }

    pub fn set_joint_vel_all(&mut self, vel: &[f64]) -> Result<()> {
        self.check_all_size(vel.len())?;
        for link in &mut self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.set_vel(&vel[off..off + n]);
            }
        }
        Ok(())
    }

    pub fn set_joint_acc_all(&mut self, acc: &[f64]) -> Result<()> {
        self.check_all_size(acc.len())?;
        for link in &mut self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.set_acc(&acc[off..off + n]);
            }
        }
        Ok(())
    }

    pub fn set_joint_rate_all(&mut self, vel: &[f64], acc: &[f64]) -> Result<()> {
        self.set_joint_vel_all(vel)?;
        self.set_joint_acc_all(acc)
    }

    /// Resets every joint displacement to the neutral encoding.
    pub fn neutralize_joints(&mut self) {
        for link in &mut self.links {
            link.joint.neutral();
        }
    }

    pub fn zero_joint_vel_all(&mut self) {
        let zero = [0.0; JOINT_STATE_SLOTS];
        for link in &mut self.links {
            link.joint.set_vel(&zero);
        }
    }

    pub fn zero_joint_acc_all(&mut self) {
        let zero = [0.0; JOINT_STATE_SLOTS];
        for link in &mut self.links {
            link.joint.set_acc(&zero);
        }
    }

    pub fn get_joint_dis_all(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_size()];
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                out[off..off + n].copy_from_slice(link.joint.dis());
            }
        }
        out
    }

    pub fn get_joint_vel_all(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_size()];
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                out[off..off + n].copy_from_slice(link.joint.vel());
            }
        }
        out
    }

    pub fn get_joint_acc_all(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_size()];
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                out[off..off + n].copy_from_slice(link.joint.acc());
            }
        }
        out
    }

    pub fn get_joint_trq_all(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.joint_size()];
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                out[off..off + n].copy_from_slice(link.joint.trq());
            }
        }
        out
    }

    /// dis ← dis ⊕ (k · v), applying each joint's manifold-aware
    /// accumulation to the packed vector.
    pub fn cat_joint_dis_all(&self, dis: &mut [f64], k: f64, v: &[f64]) -> Result<()> {
        self.check_all_size(dis.len())?;
        self.check_all_size(v.len())?;
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.cat_dis(&mut dis[off..off + n], k, &v[off..off + n]);
            }
        }
        Ok(())
    }

    /// dis ← dis ⊖ sdis per joint manifold.
    pub fn sub_joint_dis_all(&self, dis: &mut [f64], sdis: &[f64]) -> Result<()> {
        self.check_all_size(dis.len())?;
        self.check_all_size(sdis.len())?;
        for link in &self.links {
            if let Some(off) = link.offset {
                let n = link.joint_size();
                link.joint.sub_dis(&mut dis[off..off + n], &sdis[off..off + n]);
            }
        }
        Ok(())
    }

    /// Routes a packed input vector to the motors referenced by each joint.
    pub fn set_motor_input_all(&mut self, input: &[f64]) -> Result<()> {
        self.check_all_size(input.len())?;
        for i in 0..self.links.len() {
            if let (Some(off), Some(m)) = (self.links[i].offset, self.links[i].joint.motor) {
                let n = self.links[i].joint_size();
                self.motors[m].set_input(&input[off..off + n]);
            }
        }
        Ok(())
    }

    // --- link configurations ---------------------------------------------

    /// Packs every link's world frame as position plus rotation vector,
    /// six values per link.
    pub fn get_conf(&self) -> Vec<f64> {
        let mut out = vec![0.0; 6 * self.links.len()];
        for (i, link) in self.links.iter().enumerate() {
            link.wld_frame.pos.write_to_slice(&mut out[6 * i..6 * i + 3]);
            rotvec_from_quat(link.wld_frame.att).write_to_slice(&mut out[6 * i + 3..6 * i + 6]);
        }
        out
    }

    /// Writes link world frames from a packed configuration and recovers
    /// each joint displacement through its torsion decomposition; the
    /// off-DOF residual is discarded.
    pub fn set_conf(&mut self, conf: &[f64]) -> Result<()> {
        let expected = 6 * self.links.len();
        if conf.len() != expected {
            return Err(ChainError::SizeMismatch {
                expected,
                actual: conf.len(),
            });
        }
        for (i, link) in self.links.iter_mut().enumerate() {
            link.wld_frame = Frame::new(
                DVec3::from_slice(&conf[6 * i..6 * i + 3]),
                quat_from_rotvec(DVec3::from_slice(&conf[6 * i + 3..6 * i + 6])),
            );
        }
        for i in 0..self.links.len() {
            let pre = match self.links[i].parent {
                Some(p) => self.links[p].wld_frame.combine(&self.links[i].org_frame),
                None => self.links[i].org_frame,
            };
            let dev = pre.inverse().combine(&self.links[i].wld_frame);
            let (q, _residual) = self.links[i].joint.torsion(&dev);
            self.links[i].joint.set_dis(&q);
        }
        Ok(())
    }

    // --- forward kinematics ----------------------------------------------

    /// Recomputes adjacent and world frames, parents before children.
    pub fn update_frame(&mut self) {
        for i in 0..self.links.len() {
            let adj = self.links[i]
                .org_frame
                .combine(&self.links[i].joint.joint_transform());
            let wld = match self.links[i].parent {
                Some(p) => self.links[p].wld_frame.combine(&adj),
                None => adj,
            };
            let link = &mut self.links[i];
            link.adj_frame = adj;
            link.wld_frame = wld;
        }
    }

    /// Recomputes the world COM as the mass-weighted mean of link COMs.
    /// The total mass must have been established (see
    /// [`Chain::initialize`], which substitutes a dummy mass for massless
    /// models so this division stays defined).
    pub fn update_com(&mut self) -> DVec3 {
        let mut com = DVec3::ZERO;
        for link in &self.links {
            com += link.mass * link.wld_com();
        }
        self.wld_com = com / self.mass;
        self.wld_com
    }

    /// Forward kinematics: frames then COM.
    pub fn update_fk(&mut self) {
        self.update_frame();
        self.update_com();
    }

    /// Solves forward kinematics for the packed displacement vector.
    pub fn fk(&mut self, dis: &[f64]) -> Result<()> {
        self.set_joint_dis_all(dis)?;
        self.update_fk();
        Ok(())
    }

    /// Direction of gravity with respect to the root body frame: the third
    /// row of the root's attitude matrix.
    pub fn gravity_dir(&self) -> DVec3 {
        self.links[0].wld_frame.att.inverse() * DVec3::Z
    }

    // --- state copy -------------------------------------------------------

    /// Copies joint and link state plus the COM aggregates from an
    /// equally-shaped chain.
    pub fn copy_state_from(&mut self, src: &Chain) -> Result<()> {
        if self.links.len() != src.links.len() {
            return Err(ChainError::SizeMismatch {
                expected: src.links.len(),
                actual: self.links.len(),
            });
        }
        for (dst, s) in self.links.iter_mut().zip(&src.links) {
            dst.copy_state(s);
        }
        self.wld_com = src.wld_com;
        self.com_vel = src.com_vel;
        self.com_acc = src.com_acc;
        Ok(())
    }

    /// Clears the external wrench lists of every link.
    pub fn clear_ext_wrenches(&mut self) {
        for link in &mut self.links {
            link.clear_ext_wrenches();
        }
    }

    // --- geometry surface -------------------------------------------------

    /// World-space vertices of every shape attached to every link, in
    /// polyhedral form.
    pub fn vert_list(&self) -> Vec<DVec3> {
        let mut verts = Vec::new();
        for link in &self.links {
            for &si in &link.shapes {
                verts.extend(self.shapes[si].world_vertices(link.wld_frame()));
            }
        }
        verts
    }

    /// Smallest enclosing ball of the chain's shape vertices. `None` when
    /// no link carries a shape.
    pub fn bounding_ball(&self) -> Option<BoundingBall> {
        bounding_ball(&self.vert_list())
    }
}

/// Iterator over the direct children of a link.
pub struct Children<'a> {
    chain: &'a Chain,
    next: Option<usize>,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.chain.links[current].sibling;
        Some(current)
    }
}
