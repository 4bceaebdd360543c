//! Additional math helpers layered on top of `glam`.

use std::f64::consts::{PI, TAU};

use glam::{DQuat, DVec3};

use crate::config::TINY;

/// Normalizes an angle into the principal range (−π, π]. Angles already
/// in range pass through unchanged.
pub fn wrap_to_pi(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Converts a rotation vector (axis × angle, radians) into a quaternion.
pub fn quat_from_rotvec(v: DVec3) -> DQuat {
    let angle = v.length();
    if angle < TINY {
        DQuat::IDENTITY
    } else {
        DQuat::from_axis_angle(v / angle, angle)
    }
}

/// Converts a quaternion into a rotation vector with angle in [0, π].
pub fn rotvec_from_quat(q: DQuat) -> DVec3 {
    let q = if q.w < 0.0 { -q } else { q };
    let (axis, angle) = q.to_axis_angle();
    if angle.abs() < TINY {
        DVec3::ZERO
    } else {
        axis * angle
    }
}

/// Signed angle from `a` to `b` around the axis `about`.
pub fn signed_angle(a: DVec3, b: DVec3, about: DVec3) -> f64 {
    let cross = a.cross(b);
    let angle = cross.length().atan2(a.dot(b));
    if cross.dot(about) < 0.0 {
        -angle
    } else {
        angle
    }
}
