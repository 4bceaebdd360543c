//! Geometry attached to links, used for bounding-volume computation.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::core::types::Frame;

/// Ring divisions used when a curved shape is converted to a polyhedron.
const CURVE_DIVISIONS: usize = 16;

/// Enumeration of supported shape geometries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    Box { half_extents: DVec3 },
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
    Polyhedron { vertices: Vec<DVec3> },
}

impl ShapeKind {
    /// Vertices of the polyhedral form of the shape, in shape-local
    /// coordinates. Curved shapes are approximated by inscribed polyhedra.
    pub fn polyhedron_vertices(&self) -> Vec<DVec3> {
        match self {
            ShapeKind::Box { half_extents } => {
                let h = *half_extents;
                let mut verts = Vec::with_capacity(8);
                for &x in &[-h.x, h.x] {
                    for &y in &[-h.y, h.y] {
                        for &z in &[-h.z, h.z] {
                            verts.push(DVec3::new(x, y, z));
                        }
                    }
                }
                verts
            }
            ShapeKind::Sphere { radius } => {
                // Icosahedron vertices scaled to the radius.
                let phi = (1.0 + 5.0f64.sqrt()) / 2.0;
                let scale = radius / (1.0 + phi * phi).sqrt();
                let mut verts = Vec::with_capacity(12);
                for &a in &[-1.0, 1.0] {
                    for &b in &[-phi, phi] {
                        verts.push(DVec3::new(0.0, a, b) * scale);
                        verts.push(DVec3::new(a, b, 0.0) * scale);
                        verts.push(DVec3::new(b, 0.0, a) * scale);
                    }
                }
                verts
            }
            ShapeKind::Cylinder { radius, height } => {
                let half = height / 2.0;
                let mut verts = Vec::with_capacity(2 * CURVE_DIVISIONS);
                for i in 0..CURVE_DIVISIONS {
                    let angle = std::f64::consts::TAU * i as f64 / CURVE_DIVISIONS as f64;
                    let (s, c) = angle.sin_cos();
                    verts.push(DVec3::new(radius * c, radius * s, -half));
                    verts.push(DVec3::new(radius * c, radius * s, half));
                }
                verts
            }
            ShapeKind::Polyhedron { vertices } => vertices.clone(),
        }
    }
}

/// A named shape table entry, placed in the owning link's frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub name: String,
    pub kind: ShapeKind,
    /// Placement in the owning link's frame.
    pub frame: Frame,
}

impl Shape {
    pub fn new(name: &str, kind: ShapeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            frame: Frame::IDENTITY,
        }
    }

    /// Vertices of the polyhedral form, transformed into world coordinates
    /// through the owning link's world frame.
    pub fn world_vertices(&self, link_frame: &Frame) -> Vec<DVec3> {
        let frame = link_frame.combine(&self.frame);
        self.kind
            .polyhedron_vertices()
            .into_iter()
            .map(|v| frame.xform(v))
            .collect()
    }
}
