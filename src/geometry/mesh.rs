// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Output mesh representation and connectivity checks

use super::point::{LatticePoint, Triangle};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Undirected edge key with canonical index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub v0: usize,
    pub v1: usize,
}

impl EdgeKey {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Indexed triangle mesh produced by the boolean pipeline.
///
/// Invariants on a pipeline result: every edge is used by exactly two
/// triangles and no triangle repeats a vertex index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealMesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

impl RealMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of a triangle by index.
    pub fn triangle_corners(&self, index: usize) -> [Point3<f64>; 3] {
        let [i0, i1, i2] = self.triangles[index];
        [self.vertices[i0], self.vertices[i1], self.vertices[i2]]
    }

    /// Count triangle incidences per undirected edge, with the incident
    /// triangle indices.
    pub fn edge_incidence(&self) -> AHashMap<EdgeKey, Vec<usize>> {
        let mut incidence: AHashMap<EdgeKey, Vec<usize>> = AHashMap::new();
        for (tri_idx, tri) in self.triangles.iter().enumerate() {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                incidence.entry(EdgeKey::new(a, b)).or_default().push(tri_idx);
            }
        }
        incidence
    }

    /// True when every edge is shared by exactly two triangles.
    pub fn is_manifold(&self) -> bool {
        self.edge_incidence().values().all(|tris| tris.len() == 2)
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| {
                let a = self.vertices[tri[0]];
                let b = self.vertices[tri[1]];
                let c = self.vertices[tri[2]];
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Convert a lattice-valued result mesh back into input triangles so a
    /// further boolean stage can consume it. Each triangle's `missing`
    /// reference is the corner stepped back by the exact integer normal,
    /// which lies strictly on the solid side. Triangles that collapse
    /// under rounding are dropped.
    pub fn to_lattice_triangles(&self) -> Vec<Triangle> {
        let round = |p: &Point3<f64>| {
            LatticePoint::new(
                p.x.round() as i64,
                p.y.round() as i64,
                p.z.round() as i64,
            )
        };
        self.triangles
            .iter()
            .filter_map(|tri| {
                let [a, b, c] = [
                    round(&self.vertices[tri[0]]),
                    round(&self.vertices[tri[1]]),
                    round(&self.vertices[tri[2]]),
                ];
                let ab = [b.x - a.x, b.y - a.y, b.z - a.z];
                let ac = [c.x - a.x, c.y - a.y, c.z - a.z];
                let normal = [
                    ab[1] * ac[2] - ab[2] * ac[1],
                    ab[2] * ac[0] - ab[0] * ac[2],
                    ab[0] * ac[1] - ab[1] * ac[0],
                ];
                if normal == [0, 0, 0] {
                    return None;
                }
                let missing =
                    LatticePoint::new(a.x - normal[0], a.y - normal[1], a.z - normal[2]);
                Some(Triangle::new(a, b, c, missing))
            })
            .collect()
    }

    /// Signed volume of the bounded solid, positive for outward-wound
    /// closed surfaces.
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| {
                let a = self.vertices[tri[0]].coords;
                let b = self.vertices[tri[1]].coords;
                let c = self.vertices[tri[2]].coords;
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }
}
