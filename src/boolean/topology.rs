// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Mesh-local intersection topology (stage S3)
//!
//! Attaches graph edges to the triangles they lie on, propagates edge
//! assignments across shared mesh edges, and traces the intersection loops
//! on each surface. One struct serves both sides; the side is a flag.

use crate::config::BARYCENTRIC_INSIDE_EPSILON;
use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::geometry::{LatticePoint, Triangle};

use super::features::PairFeatures;
use super::graph::{EdgeId, IntersectionGraph, VertexId};
use super::index::{TriangleIntersectionIndex, TriangleVertexEntry};

/// Which input surface a topology is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// Intersection decoration of one input mesh.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    pub side: Side,
    /// Graph vertices on each triangle, with local barycentrics.
    pub triangle_vertices: Vec<Vec<TriangleVertexEntry>>,
    /// Graph edges attached to each triangle.
    pub triangle_edges: Vec<Vec<EdgeId>>,
    /// All edges touching this mesh, ascending.
    pub mesh_edges: Vec<EdgeId>,
    /// Vertex adjacency restricted to this mesh's edges.
    pub adjacency: AHashMap<VertexId, Vec<EdgeId>>,
    /// Closed cycles traced on this mesh.
    pub loops: Vec<Vec<EdgeId>>,
    /// Open chains; local degeneracies, kept for diagnostics.
    pub open_chains: Vec<Vec<EdgeId>>,
}

impl MeshTopology {
    pub fn build(
        side: Side,
        input: &[Triangle],
        features: &[PairFeatures],
        graph: &IntersectionGraph,
        index: &TriangleIntersectionIndex,
    ) -> Self {
        let triangle_vertices = match side {
            Side::A => index.per_triangle_a.clone(),
            Side::B => index.per_triangle_b.clone(),
        };
        let mut triangle_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); input.len()];

        // Pair-scoped attachment: an edge lands on a triangle only through
        // a PairSegment whose triangle index on this side matches.
        for (pair_idx, pair) in features.iter().enumerate() {
            let tri = match side {
                Side::A => pair.tri_a,
                Side::B => pair.tri_b,
            };
            let ids = &graph.pair_vertex_ids[pair_idx];
            for &(la, lb) in &pair.segments {
                let (ga, gb) = (ids[la], ids[lb]);
                if ga == gb {
                    continue;
                }
                for (u, v) in graph.decompose_segment(ga, gb) {
                    let Some(edge) = graph.edge_between(u, v) else {
                        continue;
                    };
                    if has_vertex(&triangle_vertices[tri], u)
                        && has_vertex(&triangle_vertices[tri], v)
                        && !triangle_edges[tri].contains(&edge)
                    {
                        triangle_edges[tri].push(edge);
                    }
                }
            }
        }

        propagate_shared_edges(input, graph, &triangle_vertices, &mut triangle_edges);

        let mut mesh_edges: Vec<EdgeId> = triangle_edges.iter().flatten().copied().collect();
        mesh_edges.sort_unstable();
        mesh_edges.dedup();

        let mut adjacency: AHashMap<VertexId, Vec<EdgeId>> = AHashMap::new();
        for &edge in &mesh_edges {
            let (u, v) = graph.edges[edge];
            adjacency.entry(u).or_default().push(edge);
            adjacency.entry(v).or_default().push(edge);
        }

        let (loops, open_chains) = trace_loops(&mesh_edges, &adjacency, graph);
        debug!(
            "topology {:?}: {} mesh edges, {} loops, {} open chains",
            side,
            mesh_edges.len(),
            loops.len(),
            open_chains.len()
        );

        Self {
            side,
            triangle_vertices,
            triangle_edges,
            mesh_edges,
            adjacency,
            loops,
            open_chains,
        }
    }
}

fn has_vertex(entries: &[TriangleVertexEntry], vertex: VertexId) -> bool {
    entries.iter().any(|e| e.vertex == vertex)
}

/// Barycentric component of the corner opposite a triangle side. Side `k`
/// connects corners `k` and `k + 1`.
fn opposite_component(entry: &TriangleVertexEntry, side_index: usize) -> f64 {
    match (side_index + 2) % 3 {
        0 => entry.bary.u,
        1 => entry.bary.v,
        _ => entry.bary.w,
    }
}

/// For every pair of input triangles sharing a mesh edge (exact lattice
/// endpoint equality), edges whose endpoints lie on the shared edge
/// contribute the same assignment to both triangles, provided both
/// endpoints are indexed on both triangles.
fn propagate_shared_edges(
    input: &[Triangle],
    graph: &IntersectionGraph,
    triangle_vertices: &[Vec<TriangleVertexEntry>],
    triangle_edges: &mut [Vec<EdgeId>],
) {
    let mut side_map: AHashMap<(LatticePoint, LatticePoint), Vec<(usize, usize)>> = AHashMap::new();
    for (tri_idx, tri) in input.iter().enumerate() {
        let corners = tri.oriented_corners();
        for k in 0..3 {
            let (p, q) = (corners[k], corners[(k + 1) % 3]);
            let key = if (p.x, p.y, p.z) < (q.x, q.y, q.z) {
                (p, q)
            } else {
                (q, p)
            };
            side_map.entry(key).or_default().push((tri_idx, k));
        }
    }

    // Triangles in input index order; the map is lookup-only so the
    // propagation order is deterministic.
    for (from, tri) in input.iter().enumerate() {
        let corners = tri.oriented_corners();
        for from_side in 0..3 {
            let (p, q) = (corners[from_side], corners[(from_side + 1) % 3]);
            let key = if (p.x, p.y, p.z) < (q.x, q.y, q.z) {
                (p, q)
            } else {
                (q, p)
            };
            let incident = &side_map[&key];
            if incident.len() != 2 {
                continue;
            }
            let (to, _) = incident[if incident[0].0 == from && incident[0].1 == from_side {
                1
            } else {
                0
            }];
            let from_edges = triangle_edges[from].clone();
            for edge in from_edges {
                let (u, v) = graph.edges[edge];
                let on_shared = |vertex: VertexId| {
                    triangle_vertices[from]
                        .iter()
                        .find(|e| e.vertex == vertex)
                        .is_some_and(|e| {
                            opposite_component(e, from_side) <= BARYCENTRIC_INSIDE_EPSILON
                        })
                };
                if on_shared(u)
                    && on_shared(v)
                    && has_vertex(&triangle_vertices[to], u)
                    && has_vertex(&triangle_vertices[to], v)
                    && !triangle_edges[to].contains(&edge)
                {
                    triangle_edges[to].push(edge);
                }
            }
        }
    }
}

/// Walk the vertex-edge adjacency; each edge ends up in exactly one closed
/// loop or open chain.
fn trace_loops(
    mesh_edges: &[EdgeId],
    adjacency: &AHashMap<VertexId, Vec<EdgeId>>,
    graph: &IntersectionGraph,
) -> (Vec<Vec<EdgeId>>, Vec<Vec<EdgeId>>) {
    let mut visited: AHashSet<EdgeId> = AHashSet::new();
    let mut loops = Vec::new();
    let mut open_chains = Vec::new();

    for &seed in mesh_edges {
        if visited.contains(&seed) {
            continue;
        }
        visited.insert(seed);
        let (start, mut cursor) = graph.edges[seed];
        let mut chain = vec![seed];
        let mut closed = false;

        // Forward from the seed's far endpoint.
        loop {
            let Some(next) = next_unvisited(adjacency, &visited, cursor) else {
                break;
            };
            visited.insert(next);
            chain.push(next);
            cursor = other_endpoint(graph, next, cursor);
            if cursor == start {
                closed = true;
                break;
            }
        }

        if closed {
            loops.push(chain);
            continue;
        }

        // Extend backward from the seed's near endpoint.
        let mut cursor = start;
        loop {
            let Some(next) = next_unvisited(adjacency, &visited, cursor) else {
                break;
            };
            visited.insert(next);
            chain.insert(0, next);
            cursor = other_endpoint(graph, next, cursor);
        }
        open_chains.push(chain);
    }

    (loops, open_chains)
}

fn next_unvisited(
    adjacency: &AHashMap<VertexId, Vec<EdgeId>>,
    visited: &AHashSet<EdgeId>,
    vertex: VertexId,
) -> Option<EdgeId> {
    adjacency
        .get(&vertex)?
        .iter()
        .copied()
        .find(|edge| !visited.contains(edge))
}

fn other_endpoint(graph: &IntersectionGraph, edge: EdgeId, vertex: VertexId) -> VertexId {
    let (u, v) = graph.edges[edge];
    if u == vertex {
        v
    } else {
        u
    }
}
