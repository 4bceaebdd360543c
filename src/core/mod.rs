//! Core types describing the chain model: links, joints, motors, shapes,
//! and the chain container itself.

pub mod chain;
pub mod error;
pub mod joint;
pub mod link;
pub mod motor;
pub mod shape;
pub mod types;

pub use chain::Chain;
pub use error::{ChainError, Result};
pub use joint::{prismatic_torsion, revolute_torsion, Joint, JointKind};
pub use link::{ExtWrench, Link};
pub use motor::Motor;
pub use shape::{Shape, ShapeKind};
pub use types::{Frame, InertiaTensorExt};
