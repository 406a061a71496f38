// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Lattice-valued shape factories
//!
//! Collaborators with a fixed interface: each factory emits input triangles
//! whose `missing` reference is a strictly interior point of the solid, so
//! outward orientation is unambiguous. Curved shapes round their vertices
//! to the integer lattice.

use super::point::{LatticePoint, Triangle};
use nalgebra::Vector3;

/// Principal axis selector for prisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn assemble(self, radial_a: f64, radial_b: f64, along: f64) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::new(along, radial_a, radial_b),
            Axis::Y => Vector3::new(radial_b, along, radial_a),
            Axis::Z => Vector3::new(radial_a, radial_b, along),
        }
    }
}

fn round_lattice(v: Vector3<f64>) -> LatticePoint {
    LatticePoint::new(
        v.x.round() as i64,
        v.y.round() as i64,
        v.z.round() as i64,
    )
}

/// Axis-aligned box between two opposite corners.
pub fn make_box(min: LatticePoint, max: LatticePoint) -> Vec<Triangle> {
    let center = LatticePoint::new(
        (min.x + max.x) / 2,
        (min.y + max.y) / 2,
        (min.z + max.z) / 2,
    );
    let corner = |x, y, z| {
        LatticePoint::new(
            if x == 0 { min.x } else { max.x },
            if y == 0 { min.y } else { max.y },
            if z == 0 { min.z } else { max.z },
        )
    };

    // Two triangles per face; orientation is resolved by `missing`.
    let quads = [
        [corner(0, 0, 0), corner(0, 1, 0), corner(1, 1, 0), corner(1, 0, 0)], // z-
        [corner(0, 0, 1), corner(1, 0, 1), corner(1, 1, 1), corner(0, 1, 1)], // z+
        [corner(0, 0, 0), corner(1, 0, 0), corner(1, 0, 1), corner(0, 0, 1)], // y-
        [corner(0, 1, 0), corner(0, 1, 1), corner(1, 1, 1), corner(1, 1, 0)], // y+
        [corner(0, 0, 0), corner(0, 0, 1), corner(0, 1, 1), corner(0, 1, 0)], // x-
        [corner(1, 0, 0), corner(1, 1, 0), corner(1, 1, 1), corner(1, 0, 1)], // x+
    ];

    let mut triangles = Vec::with_capacity(12);
    for quad in quads {
        triangles.push(Triangle::new(quad[0], quad[1], quad[2], center));
        triangles.push(Triangle::new(quad[0], quad[2], quad[3], center));
    }
    triangles
}

/// Tetrahedron over four corners; each face's `missing` is its opposite
/// corner.
pub fn make_tetrahedron(corners: [LatticePoint; 4]) -> Vec<Triangle> {
    let [p0, p1, p2, p3] = corners;
    vec![
        Triangle::new(p1, p2, p3, p0),
        Triangle::new(p0, p2, p3, p1),
        Triangle::new(p0, p1, p3, p2),
        Triangle::new(p0, p1, p2, p3),
    ]
}

/// Icosphere: subdivided icosahedron of the given radius around a center,
/// rounded to the lattice. `level` 0 is the raw icosahedron.
pub fn make_icosphere(center: LatticePoint, radius: f64, level: u32) -> Vec<Triangle> {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut verts: Vec<Vector3<f64>> = vec![
        Vector3::new(-1.0, phi, 0.0),
        Vector3::new(1.0, phi, 0.0),
        Vector3::new(-1.0, -phi, 0.0),
        Vector3::new(1.0, -phi, 0.0),
        Vector3::new(0.0, -1.0, phi),
        Vector3::new(0.0, 1.0, phi),
        Vector3::new(0.0, -1.0, -phi),
        Vector3::new(0.0, 1.0, -phi),
        Vector3::new(phi, 0.0, -1.0),
        Vector3::new(phi, 0.0, 1.0),
        Vector3::new(-phi, 0.0, -1.0),
        Vector3::new(-phi, 0.0, 1.0),
    ];
    for v in &mut verts {
        *v = v.normalize();
    }

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    // Midpoint subdivision; shared midpoints are reused so rounding cannot
    // crack the surface.
    for _ in 0..level {
        let mut midpoint: ahash::AHashMap<(usize, usize), usize> = ahash::AHashMap::new();
        let mut next_faces = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let mut mid = |i: usize, j: usize, verts: &mut Vec<Vector3<f64>>| {
                let key = (i.min(j), i.max(j));
                *midpoint.entry(key).or_insert_with(|| {
                    let m = ((verts[i] + verts[j]) / 2.0).normalize();
                    verts.push(m);
                    verts.len() - 1
                })
            };
            let ab = mid(a, b, &mut verts);
            let bc = mid(b, c, &mut verts);
            let ca = mid(c, a, &mut verts);
            next_faces.push([a, ab, ca]);
            next_faces.push([b, bc, ab]);
            next_faces.push([c, ca, bc]);
            next_faces.push([ab, bc, ca]);
        }
        faces = next_faces;
    }

    let origin = Vector3::new(center.x as f64, center.y as f64, center.z as f64);
    let lattice: Vec<LatticePoint> = verts
        .iter()
        .map(|v| round_lattice(origin + v * radius))
        .collect();

    faces
        .into_iter()
        .map(|[a, b, c]| Triangle::new(lattice[a], lattice[b], lattice[c], center))
        .collect()
}

/// Closed prism (cylinder approximation) with `segments` rim points,
/// centered at the origin, extending `half_length` along `axis`.
pub fn make_cylinder(axis: Axis, radius: f64, half_length: i64, segments: u32) -> Vec<Triangle> {
    let center = LatticePoint::new(0, 0, 0);
    let mut rim_lo = Vec::with_capacity(segments as usize);
    let mut rim_hi = Vec::with_capacity(segments as usize);
    for i in 0..segments {
        let angle = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
        let (ra, rb) = (radius * angle.cos(), radius * angle.sin());
        rim_lo.push(round_lattice(axis.assemble(ra, rb, -(half_length as f64))));
        rim_hi.push(round_lattice(axis.assemble(ra, rb, half_length as f64)));
    }
    let cap_lo = round_lattice(axis.assemble(0.0, 0.0, -(half_length as f64)));
    let cap_hi = round_lattice(axis.assemble(0.0, 0.0, half_length as f64));

    let mut triangles = Vec::with_capacity(segments as usize * 4);
    for i in 0..segments as usize {
        let next = (i + 1) % segments as usize;
        triangles.push(Triangle::new(cap_lo, rim_lo[i], rim_lo[next], center));
        triangles.push(Triangle::new(cap_hi, rim_hi[i], rim_hi[next], center));
        triangles.push(Triangle::new(rim_lo[i], rim_hi[i], rim_hi[next], center));
        triangles.push(Triangle::new(rim_lo[i], rim_hi[next], rim_lo[next], center));
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    fn edge_use_counts(triangles: &[Triangle]) -> AHashMap<(LatticePoint, LatticePoint), u32> {
        let mut counts = AHashMap::new();
        for tri in triangles {
            let [a, b, c] = tri.oriented_corners();
            for (p, q) in [(a, b), (b, c), (c, a)] {
                let key = if (p.x, p.y, p.z) < (q.x, q.y, q.z) {
                    (p, q)
                } else {
                    (q, p)
                };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_box_is_closed() {
        let tris = make_box(LatticePoint::new(-5, -5, -5), LatticePoint::new(5, 5, 5));
        assert_eq!(tris.len(), 12);
        assert!(tris.iter().all(|t| !t.is_degenerate()));
        assert!(edge_use_counts(&tris).values().all(|&c| c == 2));
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let tris = make_tetrahedron([
            LatticePoint::new(0, 0, 0),
            LatticePoint::new(2, 0, 0),
            LatticePoint::new(0, 2, 0),
            LatticePoint::new(0, 0, 2),
        ]);
        assert_eq!(tris.len(), 4);
        assert!(edge_use_counts(&tris).values().all(|&c| c == 2));
    }

    #[test]
    fn test_icosphere_counts_and_closure() {
        let tris = make_icosphere(LatticePoint::new(0, 0, 0), 200.0, 2);
        // 20 * 4^2 faces after two subdivisions.
        assert_eq!(tris.len(), 320);
        assert!(tris.iter().all(|t| !t.is_degenerate()));
        assert!(edge_use_counts(&tris).values().all(|&c| c == 2));
    }

    #[test]
    fn test_cylinder_is_closed() {
        let tris = make_cylinder(Axis::Y, 60.0, 150, 24);
        assert_eq!(tris.len(), 96);
        assert!(tris.iter().all(|t| !t.is_degenerate()));
        assert!(edge_use_counts(&tris).values().all(|&c| c == 2));
    }
}
