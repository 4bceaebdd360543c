//! Utility helpers: math extensions, spatial algebra, and bounding volumes.

pub mod bounding;
pub mod math;
pub mod spatial;

pub use bounding::BoundingBall;
pub use spatial::SpatialVec;

pub use math::*;
