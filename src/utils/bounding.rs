//! Smallest enclosing ball of a point set.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::config::TINY;

/// A sphere enclosing a set of points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBall {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingBall {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: DVec3) -> bool {
        (p - self.center).length() <= self.radius + 1.0e-10
    }
}

/// Computes the smallest enclosing ball of `points` with Welzl's algorithm.
/// Returns `None` for an empty set.
pub fn bounding_ball(points: &[DVec3]) -> Option<BoundingBall> {
    if points.is_empty() {
        return None;
    }
    let mut boundary = Vec::with_capacity(4);
    Some(welzl(points, points.len(), &mut boundary))
}

fn welzl(points: &[DVec3], n: usize, boundary: &mut Vec<DVec3>) -> BoundingBall {
    if n == 0 || boundary.len() == 4 {
        return ball_of_boundary(boundary);
    }
    let p = points[n - 1];
    let ball = welzl(points, n - 1, boundary);
    if ball.contains(p) {
        return ball;
    }
    boundary.push(p);
    let ball = welzl(points, n - 1, boundary);
    boundary.pop();
    ball
}

fn ball_of_boundary(boundary: &[DVec3]) -> BoundingBall {
    match boundary.len() {
        0 => BoundingBall::new(DVec3::ZERO, 0.0),
        1 => BoundingBall::new(boundary[0], 0.0),
        2 => ball_of_two(boundary[0], boundary[1]),
        3 => ball_of_three(boundary[0], boundary[1], boundary[2]),
        _ => ball_of_four(boundary[0], boundary[1], boundary[2], boundary[3]),
    }
}

fn ball_of_two(a: DVec3, b: DVec3) -> BoundingBall {
    let center = 0.5 * (a + b);
    BoundingBall::new(center, (a - center).length())
}

fn ball_of_three(a: DVec3, b: DVec3, c: DVec3) -> BoundingBall {
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(ac);
    let nn = n.length_squared();
    if nn < TINY {
        // Collinear support set: span the farthest pair.
        let mut ball = ball_of_two(a, b);
        for &p in &[ball_of_two(a, c), ball_of_two(b, c)] {
            if p.radius > ball.radius {
                ball = p;
            }
        }
        return ball;
    }
    let offset = (ac.length_squared() * n.cross(ab) + ab.length_squared() * ac.cross(n))
        / (2.0 * nn);
    let center = a + offset;
    BoundingBall::new(center, (a - center).length())
}

fn ball_of_four(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> BoundingBall {
    let rows = [b - a, c - a, d - a];
    let m = DMat3::from_cols(
        DVec3::new(rows[0].x, rows[1].x, rows[2].x),
        DVec3::new(rows[0].y, rows[1].y, rows[2].y),
        DVec3::new(rows[0].z, rows[1].z, rows[2].z),
    );
    if m.determinant().abs() < TINY {
        return ball_of_three(a, b, c);
    }
    let rhs = DVec3::new(
        0.5 * (b.length_squared() - a.length_squared()),
        0.5 * (c.length_squared() - a.length_squared()),
        0.5 * (d.length_squared() - a.length_squared()),
    );
    let center = m.inverse() * rhs;
    BoundingBall::new(center, (a - center).length())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_of_cube_corners() {
        let mut pts = Vec::new();
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    pts.push(DVec3::new(x, y, z));
                }
            }
        }
        let ball = bounding_ball(&pts).unwrap();
        assert!(ball.center.length() < 1e-9);
        assert!((ball.radius - 3.0f64.sqrt()).abs() < 1e-9);
        for p in pts {
            assert!(ball.contains(p));
        }
    }

    #[test]
    fn ball_of_pair() {
        let pts = [DVec3::new(1.0, 0.0, 0.0), DVec3::new(5.0, 0.0, 0.0)];
        let ball = bounding_ball(&pts).unwrap();
        assert!((ball.center - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-12);
        assert!((ball.radius - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_set_has_no_ball() {
        assert!(bounding_ball(&[]).is_none());
    }
}
