// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Per-triangle intersection vertex index (stage S3)
//!
//! Lists, for each input triangle on each side, the graph vertices lying on
//! it together with their local barycentrics. Membership is decided on the
//! quantization lattice: the vertex position and its barycentric-mapped
//! image must land on the same or adjacent cells.

use crate::geometry::{Barycentric, BoundingBox, Bvh, RealTriangle};

use super::graph::{lattice_close, IntersectionGraph, VertexId};

/// One graph vertex on one triangle.
#[derive(Debug, Clone, Copy)]
pub struct TriangleVertexEntry {
    pub vertex: VertexId,
    pub bary: Barycentric,
}

/// Per-triangle vertex lists for both sides.
#[derive(Debug, Clone)]
pub struct TriangleIntersectionIndex {
    pub per_triangle_a: Vec<Vec<TriangleVertexEntry>>,
    pub per_triangle_b: Vec<Vec<TriangleVertexEntry>>,
}

impl TriangleIntersectionIndex {
    pub fn build(
        triangles_a: &[RealTriangle],
        triangles_b: &[RealTriangle],
        graph: &IntersectionGraph,
    ) -> Self {
        Self {
            per_triangle_a: index_side(triangles_a, graph),
            per_triangle_b: index_side(triangles_b, graph),
        }
    }
}

fn index_side(
    triangles: &[RealTriangle],
    graph: &IntersectionGraph,
) -> Vec<Vec<TriangleVertexEntry>> {
    // Broadphase over the graph vertices so each triangle only tests
    // vertices near its bounding box.
    let vertex_bvh = Bvh::over_points(&graph.vertices);

    triangles
        .iter()
        .map(|corners| {
            let query = BoundingBox::from_triangle(corners)
                .inflated(crate::config::FEATURE_WORLD_DISTANCE_EPSILON);
            let mut candidates = vertex_bvh.query(&query);
            candidates.sort_unstable();

            let mut entries: Vec<TriangleVertexEntry> = Vec::new();
            for vertex in candidates {
                let world = graph.vertices[vertex];
                // Membership on the raw clamped barycentric; the stored
                // entry carries the snapped policy form.
                let raw = Barycentric::from_world_unsnapped(&world, corners);
                if lattice_close(&raw.to_world(corners), &world) {
                    entries.push(TriangleVertexEntry {
                        vertex,
                        bary: Barycentric::from_world(&world, corners),
                    });
                }
            }
            entries
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::features::build_pair_features;
    use crate::boolean::intersect::compute_pair_intersections;
    use nalgebra::Point3;

    fn crossing_setup() -> (Vec<RealTriangle>, Vec<RealTriangle>) {
        let a: RealTriangle = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let b: RealTriangle = [
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.0, 1.0, 1.0),
        ];
        (vec![a], vec![b])
    }

    #[test]
    fn test_index_lists_vertices_on_both_sides() {
        let (tris_a, tris_b) = crossing_setup();
        let set = compute_pair_intersections(tris_a, tris_b);
        let features = build_pair_features(&set);
        let graph = IntersectionGraph::build(&features);
        let index = TriangleIntersectionIndex::build(&set.triangles_a, &set.triangles_b, &graph);

        assert_eq!(index.per_triangle_a[0].len(), graph.vertices.len());
        assert_eq!(index.per_triangle_b[0].len(), graph.vertices.len());
    }

    #[test]
    fn test_far_vertices_not_indexed() {
        let (tris_a, tris_b) = crossing_setup();
        let far: RealTriangle = [
            Point3::new(100.0, 100.0, 100.0),
            Point3::new(101.0, 100.0, 100.0),
            Point3::new(100.0, 101.0, 100.0),
        ];
        let mut all_a = tris_a.clone();
        all_a.push(far);
        let set = compute_pair_intersections(all_a, tris_b);
        let features = build_pair_features(&set);
        let graph = IntersectionGraph::build(&features);
        let index = TriangleIntersectionIndex::build(&set.triangles_a, &set.triangles_b, &graph);

        assert!(!index.per_triangle_a[0].is_empty());
        assert!(index.per_triangle_a[1].is_empty());
    }
}
