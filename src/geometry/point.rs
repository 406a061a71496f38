// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Input data model: lattice points, oriented triangles, barycentrics

use crate::config::BARYCENTRIC_INSIDE_EPSILON;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Input vertex on the integer lattice. Exact equality and hashing make
/// shared-edge detection between input triangles robust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LatticePoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl LatticePoint {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Lift to the floating-point domain used from S1 onward.
    pub fn to_real(self) -> Point3<f64> {
        Point3::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

/// Input triangle: an ordered corner triple plus a reference point that
/// disambiguates orientation. The outward normal points away from
/// `missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub a: LatticePoint,
    pub b: LatticePoint,
    pub c: LatticePoint,
    /// Reference point on the interior side of the triangle's plane.
    pub missing: LatticePoint,
}

impl Triangle {
    pub fn new(a: LatticePoint, b: LatticePoint, c: LatticePoint, missing: LatticePoint) -> Self {
        Self { a, b, c, missing }
    }

    /// Exact orientation of `missing` against the plane of (a, b, c).
    /// Positive means `missing` is on the side the stored winding's normal
    /// points toward.
    fn missing_side(&self) -> i128 {
        let ab = [
            (self.b.x - self.a.x) as i128,
            (self.b.y - self.a.y) as i128,
            (self.b.z - self.a.z) as i128,
        ];
        let ac = [
            (self.c.x - self.a.x) as i128,
            (self.c.y - self.a.y) as i128,
            (self.c.z - self.a.z) as i128,
        ];
        let am = [
            (self.missing.x - self.a.x) as i128,
            (self.missing.y - self.a.y) as i128,
            (self.missing.z - self.a.z) as i128,
        ];
        let n = [
            ab[1] * ac[2] - ab[2] * ac[1],
            ab[2] * ac[0] - ab[0] * ac[2],
            ab[0] * ac[1] - ab[1] * ac[0],
        ];
        n[0] * am[0] + n[1] * am[1] + n[2] * am[2]
    }

    /// True when the corner triple spans zero area or the reference point
    /// lies in the triangle's plane.
    pub fn is_degenerate(&self) -> bool {
        self.missing_side() == 0
    }

    /// Corner triple wound so the outward normal (away from `missing`) is
    /// the winding normal.
    pub fn oriented_corners(&self) -> [LatticePoint; 3] {
        if self.missing_side() > 0 {
            [self.a, self.c, self.b]
        } else {
            [self.a, self.b, self.c]
        }
    }

    /// Outward-wound corners in the floating-point domain.
    pub fn oriented_real(&self) -> [Point3<f64>; 3] {
        let [a, b, c] = self.oriented_corners();
        [a.to_real(), b.to_real(), c.to_real()]
    }
}

/// Coordinates on a reference triangle with u + v + w = 1 algebraically.
/// The UV chart maps corner 0 to (1, 0), corner 1 to (0, 1) and corner 2
/// to (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Barycentric {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl Barycentric {
    pub fn new(u: f64, v: f64, w: f64) -> Self {
        Self { u, v, w }
    }

    /// Recover barycentrics of a world point on a triangle, then apply the
    /// corner policy: negative components clamp to zero, components below
    /// `BARYCENTRIC_INSIDE_EPSILON` snap to zero, and the triple is
    /// renormalized to sum to one after each step.
    pub fn from_world(point: &Point3<f64>, corners: &[Point3<f64>; 3]) -> Self {
        let mut bary = Self::from_world_unsnapped(point, corners);
        if bary.u < BARYCENTRIC_INSIDE_EPSILON {
            bary.u = 0.0;
        }
        if bary.v < BARYCENTRIC_INSIDE_EPSILON {
            bary.v = 0.0;
        }
        if bary.w < BARYCENTRIC_INSIDE_EPSILON {
            bary.w = 0.0;
        }
        let sum = bary.u + bary.v + bary.w;
        if sum > 0.0 {
            bary.u /= sum;
            bary.v /= sum;
            bary.w /= sum;
        }
        bary
    }

    /// Clamped barycentrics without the near-zero snap. Used for lattice
    /// membership tests, where the snap would move the mapped point off
    /// its cell.
    pub fn from_world_unsnapped(point: &Point3<f64>, corners: &[Point3<f64>; 3]) -> Self {
        let v0 = corners[1] - corners[0];
        let v1 = corners[2] - corners[0];
        let v2 = point - corners[0];
        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let d20 = v2.dot(&v0);
        let d21 = v2.dot(&v1);
        let denom = d00 * d11 - d01 * d01;

        let (mut v, mut w) = if denom.abs() > 0.0 {
            (
                (d11 * d20 - d01 * d21) / denom,
                (d00 * d21 - d01 * d20) / denom,
            )
        } else {
            (0.0, 0.0)
        };
        let mut u = 1.0 - v - w;

        // Clamp negatives and renormalize to an algebraic sum of one.
        u = u.max(0.0);
        v = v.max(0.0);
        w = w.max(0.0);
        let sum = u + v + w;
        if sum > 0.0 {
            u /= sum;
            v /= sum;
            w /= sum;
        }

        Self { u, v, w }
    }

    /// Evaluate the barycentric point on a triangle.
    pub fn to_world(&self, corners: &[Point3<f64>; 3]) -> Point3<f64> {
        Point3::from(
            corners[0].coords * self.u + corners[1].coords * self.v + corners[2].coords * self.w,
        )
    }

    /// Position in the reference UV chart.
    pub fn uv(&self) -> (f64, f64) {
        (self.u, self.v)
    }
}

/// A positively oriented triangle in world space.
pub type RealTriangle = [Point3<f64>; 3];

/// Unnormalized normal of a world-space triangle.
pub fn triangle_normal(tri: &RealTriangle) -> Vector3<f64> {
    (tri[1] - tri[0]).cross(&(tri[2] - tri[0]))
}

/// Area of a world-space triangle.
pub fn triangle_area(tri: &RealTriangle) -> f64 {
    triangle_normal(tri).norm() * 0.5
}

/// Centroid of a world-space triangle.
pub fn triangle_centroid(tri: &RealTriangle) -> Point3<f64> {
    Point3::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0)
}

/// Reverse a triangle's winding.
pub fn flip_triangle(tri: &RealTriangle) -> RealTriangle {
    [tri[0], tri[2], tri[1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_triangle() -> Triangle {
        Triangle::new(
            LatticePoint::new(0, 0, 0),
            LatticePoint::new(2, 0, 0),
            LatticePoint::new(0, 2, 0),
            LatticePoint::new(0, 0, -1),
        )
    }

    #[test]
    fn test_oriented_corners_flips_when_missing_is_above() {
        let tri = reference_triangle();
        // Missing below the plane: winding normal (+z) already points away.
        assert_eq!(tri.oriented_corners(), [tri.a, tri.b, tri.c]);

        let above = Triangle::new(tri.a, tri.b, tri.c, LatticePoint::new(0, 0, 1));
        assert_eq!(above.oriented_corners(), [tri.a, tri.c, tri.b]);
    }

    #[test]
    fn test_degenerate_when_missing_coplanar() {
        let tri = reference_triangle();
        let flat = Triangle::new(tri.a, tri.b, tri.c, LatticePoint::new(5, 5, 0));
        assert!(flat.is_degenerate());
        assert!(!tri.is_degenerate());
    }

    #[test]
    fn test_barycentric_roundtrip() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let bary = Barycentric::new(0.25, 0.5, 0.25);
        let world = bary.to_world(&corners);
        let back = Barycentric::from_world(&world, &corners);
        assert_relative_eq!(back.u, 0.25, epsilon = 1e-12);
        assert_relative_eq!(back.v, 0.5, epsilon = 1e-12);
        assert_relative_eq!(back.w, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_snaps_near_edge() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let bary = Barycentric::from_world(&Point3::new(0.5, 1e-9, 0.0), &corners);
        assert_eq!(bary.w, 0.0);
        assert_relative_eq!(bary.u + bary.v + bary.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_clamps_outside_point() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let bary = Barycentric::from_world(&Point3::new(-0.5, -0.5, 0.0), &corners);
        assert!(bary.u >= 0.0 && bary.v >= 0.0 && bary.w >= 0.0);
        assert_relative_eq!(bary.u + bary.v + bary.w, 1.0, epsilon = 1e-12);
    }
}
