//! Kinetic Chain – robot kinetics for Rust.
//!
//! This crate models an articulated rigid-body mechanism as a kinematic
//! tree of links connected by joints and computes its kinematics and
//! dynamics: forward kinematics, recursive Newton–Euler inverse dynamics,
//! mass properties, center-of-mass state, angular momentum, kinetic
//! energy, the zero-moment point, and the joint-space inertia matrix with
//! bias forces. Chains are populated programmatically or loaded from a
//! declarative text description (see [`format`]).

pub mod config;
pub mod core;
pub mod dynamics;
pub mod format;
pub mod utils;

pub use glam::{DMat3, DQuat, DVec3};

pub use core::{
    chain::Chain,
    error::{ChainError, Result},
    joint::{Joint, JointKind},
    link::{ExtWrench, Link},
    motor::Motor,
    shape::{Shape, ShapeKind},
    types::{Frame, InertiaTensorExt},
};
pub use format::{parse_chain, read_chain, save_chain, write_chain};
pub use utils::{bounding::BoundingBall, spatial::SpatialVec};
