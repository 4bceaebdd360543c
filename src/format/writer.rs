//! Writer for the chain description format.

use std::fmt::Write as _;
use std::path::Path;

use glam::{DMat3, DVec3};

use crate::core::chain::Chain;
use crate::core::error::Result;
use crate::core::shape::ShapeKind;
use crate::core::types::Frame;

fn push_vec3(out: &mut String, key: &str, v: DVec3) {
    let _ = writeln!(out, "{key}: {} {} {}", v.x, v.y, v.z);
}

fn push_mat3(out: &mut String, key: &str, m: DMat3) {
    // Rows of the matrix; glam stores columns.
    let _ = writeln!(
        out,
        "{key}: {} {} {}  {} {} {}  {} {} {}",
        m.x_axis.x, m.y_axis.x, m.z_axis.x, m.x_axis.y, m.y_axis.y, m.z_axis.y, m.x_axis.z,
        m.y_axis.z, m.z_axis.z
    );
}

fn push_frame(out: &mut String, frame: &Frame) {
    push_vec3(out, "pos", frame.pos);
    push_mat3(out, "att", frame.att_mat());
}

/// Renders a chain back into its description format. Reloading the output
/// reproduces the chain up to the joint displacements of neutral joints,
/// which the `[init]` section omits.
pub fn write_chain(chain: &Chain) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[chain]");
    let _ = writeln!(out, "name: {}", chain.name);
    for shape in chain.shapes() {
        let _ = writeln!(out, "\n[shape]");
        let _ = writeln!(out, "name: {}", shape.name);
        match &shape.kind {
            ShapeKind::Box { half_extents } => {
                let _ = writeln!(out, "type: box");
                push_vec3(&mut out, "size", *half_extents);
            }
            ShapeKind::Sphere { radius } => {
                let _ = writeln!(out, "type: sphere");
                let _ = writeln!(out, "radius: {radius}");
            }
            ShapeKind::Cylinder { radius, height } => {
                let _ = writeln!(out, "type: cylinder");
                let _ = writeln!(out, "radius: {radius}");
                let _ = writeln!(out, "height: {height}");
            }
            ShapeKind::Polyhedron { vertices } => {
                let _ = writeln!(out, "type: polyhedron");
                for v in vertices {
                    push_vec3(&mut out, "vert", *v);
                }
            }
        }
        push_frame(&mut out, &shape.frame);
    }
    for motor in chain.motors() {
        let _ = writeln!(out, "\n[motor]");
        let _ = writeln!(out, "name: {}", motor.name);
    }
    for link in chain.links() {
        let _ = writeln!(out, "\n[link]");
        let _ = writeln!(out, "name: {}", link.name);
        let _ = writeln!(out, "jointtype: {}", link.joint.kind().name());
        let _ = writeln!(out, "mass: {}", link.mass);
        push_vec3(&mut out, "com", link.com);
        push_mat3(&mut out, "inertia", link.inertia);
        push_frame(&mut out, &link.org_frame);
        if let Some(p) = link.parent() {
            let _ = writeln!(out, "parent: {}", chain.link(p).name);
        }
        for &si in &link.shapes {
            let _ = writeln!(out, "shape: {}", chain.shapes()[si].name);
        }
        if let Some(m) = link.joint.motor {
            let _ = writeln!(out, "motor: {}", chain.motors()[m].name);
        }
    }
    out.push('\n');
    out.push_str(&write_init(chain));
    out
}

/// Renders only the `[init]` section: the root origin pose and the
/// displacement of every joint not at neutral.
pub fn write_init(chain: &Chain) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[init]");
    if chain.link_num() == 0 {
        return out;
    }
    push_frame(&mut out, &chain.root_link().org_frame);
    for link in chain.links() {
        if link.joint_size() == 0 || link.joint.is_neutral() {
            continue;
        }
        let _ = write!(out, "joint: {}", link.name);
        for v in link.joint.dis() {
            let _ = write!(out, " {v}");
        }
        out.push('\n');
    }
    out
}

/// Writes a chain description to a file.
pub fn save_chain<P: AsRef<Path>>(chain: &Chain, path: P) -> Result<()> {
    std::fs::write(path, write_chain(chain))?;
    Ok(())
}
