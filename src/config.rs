//! Global configuration constants for the Kinetic Chain engine.

/// Standard gravitational acceleration magnitude (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Default gravity vector applied to a chain (Z-up world).
pub const DEFAULT_GRAVITY: [f64; 3] = [0.0, 0.0, -STANDARD_GRAVITY];

/// Magnitudes below this threshold are treated as numerically zero.
pub const TINY: f64 = 1.0e-12;

/// State slots reserved per joint, enough for a free joint.
pub const JOINT_STATE_SLOTS: usize = 6;
