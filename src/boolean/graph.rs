// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Global intersection graph (stage S2)
//!
//! Merges every pair's local features into one deduplicated graph of
//! intersection vertices and edges. Vertices are unique under the
//! quantization lattice; edge endpoints are stored in canonical (min, max)
//! order. Super-edges are decomposed into chains over existing vertices at
//! insert time, so the edge table only holds atomic edges.

use crate::config::{
    BARYCENTRIC_INSIDE_EPSILON, SUPER_EDGE_PERPENDICULAR_EPSILON, TRIANGLE_PREDICATE_EPSILON,
};
use ahash::AHashMap;
use log::debug;
use nalgebra::Point3;

use super::features::PairFeatures;

/// Stable id of a graph vertex; dense from zero in first-seen order.
pub type VertexId = usize;
/// Stable id of a graph edge; dense from zero in insertion order.
pub type EdgeId = usize;

/// Quantize a world position onto the predicate lattice.
pub fn lattice_key(p: &Point3<f64>) -> (i64, i64, i64) {
    let scale = 1.0 / TRIANGLE_PREDICATE_EPSILON;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

/// True when two positions land on the same or an adjacent lattice cell.
pub fn lattice_close(p: &Point3<f64>, q: &Point3<f64>) -> bool {
    let a = lattice_key(p);
    let b = lattice_key(q);
    (a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1 && (a.2 - b.2).abs() <= 1
}

/// Globally deduplicated intersection topology.
#[derive(Debug, Clone)]
pub struct IntersectionGraph {
    /// Vertex positions; the index is the vertex id.
    pub vertices: Vec<Point3<f64>>,
    /// Canonical (min, max) endpoint pairs; the index is the edge id.
    pub edges: Vec<(VertexId, VertexId)>,
    /// Global vertex ids per pair, parallel to each pair's local vertices.
    pub pair_vertex_ids: Vec<Vec<VertexId>>,
    edge_table: AHashMap<(VertexId, VertexId), EdgeId>,
}

impl IntersectionGraph {
    /// Build the graph from all pair features. Vertices first (so chain
    /// decomposition sees the complete vertex set), then edges.
    pub fn build(features: &[PairFeatures]) -> Self {
        let mut graph = Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            pair_vertex_ids: Vec::with_capacity(features.len()),
            edge_table: AHashMap::new(),
        };

        let mut key_to_vertex: AHashMap<(i64, i64, i64), VertexId> = AHashMap::new();
        for pair in features {
            let ids = pair
                .vertices
                .iter()
                .map(|v| {
                    *key_to_vertex.entry(lattice_key(&v.world)).or_insert_with(|| {
                        graph.vertices.push(v.world);
                        graph.vertices.len() - 1
                    })
                })
                .collect();
            graph.pair_vertex_ids.push(ids);
        }

        for (pair_idx, pair) in features.iter().enumerate() {
            let ids = graph.pair_vertex_ids[pair_idx].clone();
            for &(la, lb) in &pair.segments {
                let (ga, gb) = (ids[la], ids[lb]);
                if ga == gb {
                    continue;
                }
                let chain = graph.decompose_segment(ga, gb);
                for (u, v) in chain {
                    graph.insert_edge(u, v);
                }
            }
        }

        debug!(
            "intersection graph: {} vertices, {} edges from {} pairs",
            graph.vertices.len(),
            graph.edges.len(),
            features.len()
        );
        graph
    }

    fn insert_edge(&mut self, u: VertexId, v: VertexId) {
        if u == v {
            return;
        }
        let key = (u.min(v), u.max(v));
        if !self.edge_table.contains_key(&key) {
            self.edge_table.insert(key, self.edges.len());
            self.edges.push(key);
        }
    }

    /// Edge id for a canonical endpoint pair, if present.
    pub fn edge_between(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.edge_table.get(&(u.min(v), u.max(v))).copied()
    }

    /// Decompose a segment into consecutive endpoint pairs over the graph
    /// vertices lying on its interior: projection parameter strictly inside
    /// (relative epsilon) and perpendicular distance under the super-edge
    /// tolerance.
    pub fn decompose_segment(&self, u: VertexId, v: VertexId) -> Vec<(VertexId, VertexId)> {
        let pu = self.vertices[u];
        let pv = self.vertices[v];
        let dir = pv - pu;
        let len_sq = dir.norm_squared();
        if len_sq == 0.0 {
            return Vec::new();
        }

        let mut interior: Vec<(f64, VertexId)> = Vec::new();
        for (w, pw) in self.vertices.iter().enumerate() {
            if w == u || w == v {
                continue;
            }
            let t = (pw - pu).dot(&dir) / len_sq;
            if t <= BARYCENTRIC_INSIDE_EPSILON || t >= 1.0 - BARYCENTRIC_INSIDE_EPSILON {
                continue;
            }
            let perp = (pw - pu) - dir * t;
            if perp.norm() < SUPER_EDGE_PERPENDICULAR_EPSILON {
                interior.push((t, w));
            }
        }
        interior.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut chain = Vec::with_capacity(interior.len() + 1);
        let mut prev = u;
        for (_, w) in interior {
            if w != prev {
                chain.push((prev, w));
                prev = w;
            }
        }
        chain.push((prev, v));
        chain
    }
}
