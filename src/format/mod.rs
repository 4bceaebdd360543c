//! Declarative chain description format.
//!
//! A chain file is line-oriented text split into tagged sections. Sections
//! may appear in any order, except that `[link]` definitions must precede
//! the `[init]` block that references them by name. `#` starts a comment.
//!
//! ```text
//! [chain]
//! name: arm
//!
//! [link]
//! name: base
//! jointtype: fixed
//!
//! [link]
//! name: upper
//! jointtype: revolute
//! mass: 1.0
//! com: 0.5 0 0
//! inertia: 0.1 0 0  0 0.1 0  0 0 0.1
//! pos: 0 0 0.2
//! parent: base
//!
//! [init]
//! joint: upper 0.5
//! ```
//!
//! Per link: `name`, `jointtype`, `mass`, `com` (3 values), `inertia`
//! (9 values, row-major), the origin frame as `pos`/`att` (3 + 9 values)
//! or `frame` (12 values, three rows of rotation then position), `parent`,
//! and repeatable `shape:`/single `motor:` references. `[shape]` sections
//! define the shape table (`type: box|sphere|cylinder|polyhedron` with
//! `size`, `radius`, `height`, or repeated `vert` lines), `[motor]`
//! sections the motor table. `[init]` holds the root origin pose and
//! `joint: <link> <values…>` overrides; the writer omits joints that sit
//! at neutral.
//!
//! Loading ends with the post-pass the chain contract requires: total mass
//! (dummy fallback for massless models), offset table, forward kinematics,
//! and inverse dynamics.

mod reader;
mod writer;

pub use reader::{apply_init, parse_chain, read_chain, read_init};
pub use writer::{save_chain, write_chain, write_init};
