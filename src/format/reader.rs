//! Parser and loader for the chain description format.

use std::path::Path;

use glam::{DMat3, DQuat, DVec3};
use log::{debug, warn};

use crate::core::chain::Chain;
use crate::core::error::{ChainError, Result};
use crate::core::joint::JointKind;
use crate::core::link::Link;
use crate::core::motor::Motor;
use crate::core::shape::{Shape, ShapeKind};
use crate::core::types::Frame;

struct Entry<'a> {
    line: usize,
    key: &'a str,
    value: &'a str,
}

struct Record<'a> {
    line: usize,
    tag: &'a str,
    entries: Vec<Entry<'a>>,
}

fn parse_err(line: usize, message: impl Into<String>) -> ChainError {
    ChainError::Parse {
        line,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<Record<'_>>> {
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        if let Some(tag) = content.strip_prefix('[') {
            let tag = tag
                .strip_suffix(']')
                .ok_or_else(|| parse_err(line, "unterminated section header"))?
                .trim();
            records.push(Record {
                line,
                tag,
                entries: Vec::new(),
            });
            continue;
        }
        let (key, value) = content
            .split_once(':')
            .ok_or_else(|| parse_err(line, format!("expected 'key: value', got '{content}'")))?;
        let record = records
            .last_mut()
            .ok_or_else(|| parse_err(line, "entry before any section header"))?;
        record.entries.push(Entry {
            line,
            key: key.trim(),
            value: value.trim(),
        });
    }
    Ok(records)
}

fn parse_values(entry: &Entry<'_>) -> Result<Vec<f64>> {
    entry
        .value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| parse_err(entry.line, format!("bad number '{tok}'")))
        })
        .collect()
}

fn parse_scalar(entry: &Entry<'_>) -> Result<f64> {
    let values = parse_values(entry)?;
    if values.len() != 1 {
        return Err(parse_err(entry.line, "expected a single value"));
    }
    Ok(values[0])
}

fn parse_vec3(entry: &Entry<'_>) -> Result<DVec3> {
    let values = parse_values(entry)?;
    if values.len() != 3 {
        return Err(parse_err(entry.line, "expected 3 values"));
    }
    Ok(DVec3::new(values[0], values[1], values[2]))
}

fn mat3_from_rows(v: &[f64]) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(v[0], v[3], v[6]),
        DVec3::new(v[1], v[4], v[7]),
        DVec3::new(v[2], v[5], v[8]),
    )
}

fn parse_mat3(entry: &Entry<'_>) -> Result<DMat3> {
    let values = parse_values(entry)?;
    if values.len() != 9 {
        return Err(parse_err(entry.line, "expected 9 values"));
    }
    Ok(mat3_from_rows(&values))
}

fn parse_att(entry: &Entry<'_>) -> Result<DQuat> {
    Ok(DQuat::from_mat3(&parse_mat3(entry)?).normalize())
}

/// A `frame` entry holds three rows of rotation followed by the position
/// component: r11 r12 r13 x  r21 r22 r23 y  r31 r32 r33 z.
fn parse_frame(entry: &Entry<'_>) -> Result<Frame> {
    let values = parse_values(entry)?;
    if values.len() != 12 {
        return Err(parse_err(entry.line, "expected 12 values"));
    }
    let rot = [
        values[0], values[1], values[2], values[4], values[5], values[6], values[8], values[9],
        values[10],
    ];
    Ok(Frame::new(
        DVec3::new(values[3], values[7], values[11]),
        DQuat::from_mat3(&mat3_from_rows(&rot)).normalize(),
    ))
}

fn parse_shape(record: &Record<'_>) -> Result<Shape> {
    let mut name = None;
    let mut kind_name = None;
    let mut half_extents = None;
    let mut radius = None;
    let mut height = None;
    let mut vertices = Vec::new();
    let mut frame = Frame::IDENTITY;
    for entry in &record.entries {
        match entry.key {
            "name" => name = Some(entry.value.to_string()),
            "type" => kind_name = Some((entry.line, entry.value)),
            "size" => half_extents = Some(parse_vec3(entry)?),
            "radius" => radius = Some(parse_scalar(entry)?),
            "height" => height = Some(parse_scalar(entry)?),
            "vert" => vertices.push(parse_vec3(entry)?),
            "pos" => frame.pos = parse_vec3(entry)?,
            "att" => frame.att = parse_att(entry)?,
            "frame" => frame = parse_frame(entry)?,
            other => return Err(parse_err(entry.line, format!("unknown shape key '{other}'"))),
        }
    }
    let name = name.ok_or_else(|| parse_err(record.line, "shape without a name"))?;
    let (line, kind_name) =
        kind_name.ok_or_else(|| parse_err(record.line, format!("shape '{name}' has no type")))?;
    let kind = match kind_name {
        "box" => ShapeKind::Box {
            half_extents: half_extents
                .ok_or_else(|| parse_err(line, "box shape needs 'size'"))?,
        },
        "sphere" => ShapeKind::Sphere {
            radius: radius.ok_or_else(|| parse_err(line, "sphere shape needs 'radius'"))?,
        },
        "cylinder" => ShapeKind::Cylinder {
            radius: radius.ok_or_else(|| parse_err(line, "cylinder shape needs 'radius'"))?,
            height: height.ok_or_else(|| parse_err(line, "cylinder shape needs 'height'"))?,
        },
        "polyhedron" => ShapeKind::Polyhedron { vertices },
        other => return Err(parse_err(line, format!("unknown shape type '{other}'"))),
    };
    let mut shape = Shape::new(&name, kind);
    shape.frame = frame;
    Ok(shape)
}

struct LinkSpec {
    line: usize,
    name: String,
    kind: JointKind,
    mass: f64,
    com: DVec3,
    inertia: DMat3,
    frame: Frame,
    parent: Option<String>,
    shapes: Vec<String>,
    motor: Option<String>,
}

fn parse_link(record: &Record<'_>) -> Result<LinkSpec> {
    let mut spec = LinkSpec {
        line: record.line,
        name: String::new(),
        kind: JointKind::Fixed,
        mass: 0.0,
        com: DVec3::ZERO,
        inertia: DMat3::ZERO,
        frame: Frame::IDENTITY,
        parent: None,
        shapes: Vec::new(),
        motor: None,
    };
    for entry in &record.entries {
        match entry.key {
            "name" => spec.name = entry.value.to_string(),
            "jointtype" => {
                spec.kind = JointKind::from_name(entry.value)
                    .ok_or_else(|| ChainError::UnknownJointKind(entry.value.to_string()))?;
            }
            "mass" => spec.mass = parse_scalar(entry)?,
            "com" => spec.com = parse_vec3(entry)?,
            "inertia" => spec.inertia = parse_mat3(entry)?,
            "pos" => spec.frame.pos = parse_vec3(entry)?,
            "att" => spec.frame.att = parse_att(entry)?,
            "frame" => spec.frame = parse_frame(entry)?,
            "parent" => spec.parent = Some(entry.value.to_string()),
            "shape" => spec.shapes.push(entry.value.to_string()),
            "motor" => spec.motor = Some(entry.value.to_string()),
            other => return Err(parse_err(entry.line, format!("unknown link key '{other}'"))),
        }
    }
    if spec.name.is_empty() {
        return Err(parse_err(record.line, "link without a name"));
    }
    Ok(spec)
}

/// Orders link specs so that every parent precedes its children, keeping
/// the file order among unrelated links.
fn topological_order(specs: &[LinkSpec]) -> Result<Vec<usize>> {
    let roots = specs.iter().filter(|s| s.parent.is_none()).count();
    if roots == 0 {
        return Err(parse_err(specs[0].line, "no root link"));
    }
    if roots > 1 {
        return Err(parse_err(specs[0].line, "more than one root link"));
    }
    let mut order = Vec::with_capacity(specs.len());
    let mut placed = vec![false; specs.len()];
    while order.len() < specs.len() {
        let before = order.len();
        for (i, spec) in specs.iter().enumerate() {
            if placed[i] {
                continue;
            }
            let ready = match &spec.parent {
                None => true,
                Some(parent) => specs
                    .iter()
                    .position(|s| &s.name == parent)
                    .map(|p| placed[p])
                    .ok_or_else(|| ChainError::UnknownLink(parent.clone()))?,
            };
            if ready {
                placed[i] = true;
                order.push(i);
            }
        }
        if order.len() == before {
            // Only a parent cycle can stall the scan.
            let stuck = specs.iter().enumerate().find(|(i, _)| !placed[*i]).unwrap();
            return Err(parse_err(
                stuck.1.line,
                format!("link '{}' is part of a parent cycle", stuck.1.name),
            ));
        }
    }
    Ok(order)
}

fn apply_init_record(chain: &mut Chain, record: &Record<'_>) -> Result<()> {
    for entry in &record.entries {
        match entry.key {
            "pos" => chain.link_mut(0).org_frame.pos = parse_vec3(entry)?,
            "att" => chain.link_mut(0).org_frame.att = parse_att(entry)?,
            "frame" => chain.link_mut(0).org_frame = parse_frame(entry)?,
            "joint" => {
                let (name, rest) = entry
                    .value
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| parse_err(entry.line, "joint entry needs displacement values"))?;
                let li = chain
                    .find_link(name)
                    .ok_or_else(|| ChainError::UnknownLink(name.to_string()))?;
                let values: Vec<f64> = rest
                    .split_whitespace()
                    .map(|tok| {
                        tok.parse::<f64>()
                            .map_err(|_| parse_err(entry.line, format!("bad number '{tok}'")))
                    })
                    .collect::<Result<_>>()?;
                let dof = chain.link(li).joint_size();
                if values.len() != dof {
                    return Err(ChainError::SizeMismatch {
                        expected: dof,
                        actual: values.len(),
                    });
                }
                chain.link_mut(li).joint.set_dis(&values);
            }
            other => return Err(parse_err(entry.line, format!("unknown init key '{other}'"))),
        }
    }
    Ok(())
}

/// Parses a chain description and runs the post-load pass: total mass with
/// the dummy fallback, offset table, forward kinematics, inverse dynamics.
pub fn parse_chain(text: &str) -> Result<Chain> {
    let records = tokenize(text)?;
    let mut chain = Chain::new("chain");
    let mut specs = Vec::new();
    let mut init = None;
    for record in &records {
        match record.tag {
            "chain" => {
                for entry in &record.entries {
                    if entry.key == "name" {
                        chain.name = entry.value.to_string();
                    }
                }
            }
            "shape" => {
                let shape = parse_shape(record)?;
                chain.add_shape(shape);
            }
            "motor" => {
                let name = record
                    .entries
                    .iter()
                    .find(|e| e.key == "name")
                    .ok_or_else(|| parse_err(record.line, "motor without a name"))?;
                chain.add_motor(Motor::new(name.value));
            }
            "link" => specs.push(parse_link(record)?),
            "init" => init = Some(record),
            "optic" => {} // optical properties are opaque to the chain model
            other => warn!("ignoring unknown section [{other}]"),
        }
    }
    if specs.is_empty() {
        return Err(ChainError::EmptyChain);
    }
    for i in topological_order(&specs)? {
        let spec = &specs[i];
        let mut link = Link::new(&spec.name, spec.kind);
        link.mass = spec.mass;
        link.com = spec.com;
        link.inertia = spec.inertia;
        link.org_frame = spec.frame;
        for shape_name in &spec.shapes {
            let si = chain
                .find_shape(shape_name)
                .ok_or_else(|| ChainError::UnknownShape(shape_name.clone()))?;
            link.shapes.push(si);
        }
        if let Some(motor_name) = &spec.motor {
            let mi = chain
                .find_motor(motor_name)
                .ok_or_else(|| ChainError::UnknownMotor(motor_name.clone()))?;
            link.joint.motor = Some(mi);
        }
        let parent = match &spec.parent {
            None => None,
            // Resolved against the already-placed prefix of the array.
            Some(name) => Some(
                chain
                    .find_link(name)
                    .ok_or_else(|| ChainError::UnknownLink(name.clone()))?,
            ),
        };
        chain.add_link(link, parent);
    }
    if let Some(record) = init {
        apply_init_record(&mut chain, record)?;
    }
    chain.initialize()?;
    debug!(
        "loaded chain '{}': {} links, joint size {}",
        chain.name,
        chain.link_num(),
        chain.joint_size()
    );
    Ok(chain)
}

/// Reads and parses a chain description file.
pub fn read_chain<P: AsRef<Path>>(path: P) -> Result<Chain> {
    let text = std::fs::read_to_string(path)?;
    parse_chain(&text)
}

/// Applies only the `[init]` section of a description to an existing
/// chain, then refreshes kinematics and dynamics.
pub fn apply_init(chain: &mut Chain, text: &str) -> Result<()> {
    for record in tokenize(text)? {
        if record.tag == "init" {
            apply_init_record(chain, &record)?;
        }
    }
    chain.update_fk();
    chain.update_id();
    Ok(())
}

/// Reads an `[init]` section from a file and applies it.
pub fn read_init<P: AsRef<Path>>(chain: &mut Chain, path: P) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    apply_init(chain, &text)
}
