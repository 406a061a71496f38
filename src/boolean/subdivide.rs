// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Per-triangle planar subdivision into patches (stage S4)
//!
//! Triangles carrying intersection vertices or edges run through the PSLG
//! pipeline; the resulting UV triangles map back to world space through the
//! triangle's barycentric chart. Untouched triangles pass through as a
//! single patch.

use crate::config::EPS_AREA;
use crate::error::BooleanError;
use crate::geometry::{triangle_normal, Barycentric, RealTriangle};
use ahash::AHashMap;
use log::debug;
use nalgebra::Point3;

use super::graph::IntersectionGraph;
use super::pslg::{extract_faces, Pslg};
use super::topology::MeshTopology;
use super::triangulate::triangulate_face;

/// Patches per input triangle, in input order.
#[derive(Debug, Clone)]
pub struct TrianglePatchSet {
    pub patches: Vec<Vec<RealTriangle>>,
}

impl TrianglePatchSet {
    pub fn patch_count(&self) -> usize {
        self.patches.iter().map(Vec::len).sum()
    }
}

/// Subdivide every triangle of one side.
pub fn subdivide_side(
    triangles: &[RealTriangle],
    topology: &MeshTopology,
    graph: &IntersectionGraph,
) -> Result<TrianglePatchSet, BooleanError> {
    let mut patches = Vec::with_capacity(triangles.len());
    for (tri_idx, corners) in triangles.iter().enumerate() {
        let entries = &topology.triangle_vertices[tri_idx];
        let edges = &topology.triangle_edges[tri_idx];
        if entries.is_empty() && edges.is_empty() {
            patches.push(vec![*corners]);
            continue;
        }
        patches.push(subdivide_triangle(corners, tri_idx, topology, graph)?);
    }

    let set = TrianglePatchSet { patches };
    debug!(
        "subdivision {:?}: {} triangles into {} patches",
        topology.side,
        triangles.len(),
        set.patch_count()
    );
    Ok(set)
}

fn subdivide_triangle(
    corners: &RealTriangle,
    tri_idx: usize,
    topology: &MeshTopology,
    graph: &IntersectionGraph,
) -> Result<Vec<RealTriangle>, BooleanError> {
    let entries = &topology.triangle_vertices[tri_idx];

    let points: Vec<(f64, f64)> = entries.iter().map(|e| e.bary.uv()).collect();
    let slot: AHashMap<usize, usize> = entries
        .iter()
        .enumerate()
        .map(|(pos, e)| (e.vertex, 3 + pos))
        .collect();

    let mut constraints = Vec::with_capacity(topology.triangle_edges[tri_idx].len());
    for &edge in &topology.triangle_edges[tri_idx] {
        let (u, v) = graph.edges[edge];
        // Attachment guarantees both endpoints are indexed on the triangle.
        let (Some(&su), Some(&sv)) = (slot.get(&u), slot.get(&v)) else {
            return Err(BooleanError::invariant(
                "subdivision",
                format!("edge {edge} attached to triangle {tri_idx} without its endpoints"),
            ));
        };
        constraints.push((su, sv));
    }

    let pslg = Pslg::build(&points, &constraints)?;
    let faces = extract_faces(&pslg)?;

    let constraint_geometry: Vec<_> = pslg
        .edges
        .iter()
        .map(|e| (pslg.vertices[e.a], pslg.vertices[e.b]))
        .collect();

    let reference_normal = triangle_normal(corners);
    let mut result = Vec::new();
    for face in &faces {
        for tri in triangulate_face(&pslg.vertices, face, &constraint_geometry)? {
            let mapped = tri.map(|idx| {
                let p = pslg.vertices[idx];
                Barycentric::new(p.x, p.y, 1.0 - p.x - p.y).to_world(corners)
            });
            check_positive(&mapped, &reference_normal, tri_idx)?;
            result.push(mapped);
        }
    }
    Ok(result)
}

fn check_positive(
    patch: &RealTriangle,
    reference_normal: &nalgebra::Vector3<f64>,
    tri_idx: usize,
) -> Result<(), BooleanError> {
    let normal = triangle_normal(patch);
    if normal.dot(reference_normal) <= 0.0 || normal.norm() * 0.5 < EPS_AREA {
        return Err(BooleanError::invariant(
            "subdivision",
            format!(
                "patch of triangle {tri_idx} has non-positive area: ({:?}, {:?}, {:?})",
                point_triple(&patch[0]),
                point_triple(&patch[1]),
                point_triple(&patch[2]),
            ),
        ));
    }
    Ok(())
}

fn point_triple(p: &Point3<f64>) -> (f64, f64, f64) {
    (p.x, p.y, p.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::features::build_pair_features;
    use crate::boolean::index::TriangleIntersectionIndex;
    use crate::boolean::intersect::compute_pair_intersections;
    use crate::boolean::topology::Side;
    use crate::geometry::{triangle_area, LatticePoint, Triangle};
    use approx::assert_relative_eq;

    fn lp(x: i64, y: i64, z: i64) -> LatticePoint {
        LatticePoint::new(x, y, z)
    }

    fn pipeline_through_subdivision(
        mesh_a: &[Triangle],
        mesh_b: &[Triangle],
    ) -> (TrianglePatchSet, Vec<RealTriangle>) {
        let real_a: Vec<RealTriangle> = mesh_a.iter().map(|t| t.oriented_real()).collect();
        let real_b: Vec<RealTriangle> = mesh_b.iter().map(|t| t.oriented_real()).collect();
        let set = compute_pair_intersections(real_a.clone(), real_b);
        let features = build_pair_features(&set);
        let graph = IntersectionGraph::build(&features);
        let index = TriangleIntersectionIndex::build(&set.triangles_a, &set.triangles_b, &graph);
        let topo = MeshTopology::build(Side::A, mesh_a, &features, &graph, &index);
        let patches = subdivide_side(&set.triangles_a, &topo, &graph).unwrap();
        (patches, real_a)
    }

    #[test]
    fn test_untouched_triangle_passes_through() {
        let mesh_a = vec![Triangle::new(
            lp(0, 0, 0),
            lp(4, 0, 0),
            lp(0, 4, 0),
            lp(0, 0, -1),
        )];
        let (patches, real_a) = pipeline_through_subdivision(&mesh_a, &[]);
        assert_eq!(patches.patches[0], vec![real_a[0]]);
    }

    #[test]
    fn test_crossed_triangle_splits_and_conserves_area() {
        let mesh_a = vec![Triangle::new(
            lp(0, 0, 0),
            lp(8, 0, 0),
            lp(0, 8, 0),
            lp(0, 0, -1),
        )];
        // A vertical triangle cutting across the interior, wide enough for
        // its cross segment to span the whole of A.
        let mesh_b = vec![Triangle::new(
            lp(-10, 2, -10),
            lp(20, 2, -10),
            lp(5, 2, 20),
            lp(0, 10, 0),
        )];
        let (patches, real_a) = pipeline_through_subdivision(&mesh_a, &mesh_b);

        assert!(patches.patches[0].len() >= 3);
        let total: f64 = patches.patches[0].iter().map(triangle_area).sum();
        assert_relative_eq!(total, triangle_area(&real_a[0]), epsilon = 1e-6);

        // Every patch keeps the outward orientation of its parent.
        let parent_normal = triangle_normal(&real_a[0]);
        for patch in &patches.patches[0] {
            assert!(triangle_normal(patch).dot(&parent_normal) > 0.0);
        }
    }
}
