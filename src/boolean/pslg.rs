// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Planar straight-line graph in the reference triangle chart (stage S4)
//!
//! A subdivided triangle is modeled in the UV chart with corners (1,0),
//! (0,1), (0,0). The PSLG carries the triangle boundary split at every
//! on-side vertex plus the interior constraint edges; a half-edge walk
//! extracts the faces, and negative cycles become holes of the positive
//! cycle that contains them.

use crate::config::{
    BARYCENTRIC_INSIDE_EPSILON, EPS_AREA, EPS_CORNER, EPS_SIDE, EPS_VERTEX,
    PSLG_VERTEX_MERGE_EPSILON, PSLG_VERTEX_MERGE_EPSILON_SQUARED,
};
use crate::error::BooleanError;
use nalgebra::Point2;

/// One PSLG edge between representative vertex indices.
#[derive(Debug, Clone, Copy)]
pub struct PslgEdge {
    pub a: usize,
    pub b: usize,
    pub boundary: bool,
}

/// Planar subdivision of one reference triangle.
#[derive(Debug, Clone)]
pub struct Pslg {
    /// Vertex positions; indices 0, 1, 2 are the corners.
    pub vertices: Vec<Point2<f64>>,
    pub edges: Vec<PslgEdge>,
    /// Input index (3 corners, then the input points) to representative.
    pub rep: Vec<usize>,
}

/// A face of the subdivision: CCW outer ring plus CW hole rings, with the
/// net signed area.
#[derive(Debug, Clone)]
pub struct Face {
    pub outer: Vec<usize>,
    pub holes: Vec<Vec<usize>>,
    pub area: f64,
}

const CORNERS: [(f64, f64); 3] = [(1.0, 0.0), (0.0, 1.0), (0.0, 0.0)];

impl Pslg {
    /// Build the PSLG from intersection vertex UVs and constraint pairs.
    /// Constraint indices are in the input domain: 0..3 are the corners,
    /// `3 + i` is `points[i]`.
    pub fn build(
        points: &[(f64, f64)],
        constraints: &[(usize, usize)],
    ) -> Result<Self, BooleanError> {
        let mut pslg = Self {
            vertices: CORNERS.iter().map(|&(u, v)| Point2::new(u, v)).collect(),
            edges: Vec::new(),
            rep: vec![0, 1, 2],
        };

        for &(u, v) in points {
            let p = clamp_to_chart(u, v);
            let rep = pslg.insert_vertex(p);
            pslg.rep.push(rep);
        }

        pslg.add_boundary_edges();

        for &(i, j) in constraints {
            let (a, b) = (pslg.rep[i], pslg.rep[j]);
            if a == b {
                continue;
            }
            // A segment whose endpoints share a triangle side lies along
            // the boundary; the side chain already realizes it.
            if (0..3).any(|side| pslg.on_side(a, side) && pslg.on_side(b, side)) {
                continue;
            }
            pslg.add_edge(a, b, false);
        }

        pslg.check_crossings()?;
        Ok(pslg)
    }

    /// Add the point, snapping to a corner inside `EPS_CORNER`, then to any
    /// existing vertex inside `EPS_VERTEX`, then merging within the merge
    /// epsilon; the first vertex wins.
    fn insert_vertex(&mut self, p: Point2<f64>) -> usize {
        for corner in 0..3 {
            if (p - self.vertices[corner]).norm() < EPS_CORNER {
                return corner;
            }
        }
        for (idx, q) in self.vertices.iter().enumerate() {
            let dist_sq = (p - q).norm_squared();
            if dist_sq < EPS_VERTEX * EPS_VERTEX || dist_sq < PSLG_VERTEX_MERGE_EPSILON_SQUARED {
                return idx;
            }
        }
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    fn on_side(&self, vertex: usize, side: usize) -> bool {
        let p = self.vertices[vertex];
        let w = 1.0 - p.x - p.y;
        match side {
            0 => w.abs() <= EPS_SIDE,
            1 => p.x.abs() <= EPS_SIDE,
            _ => p.y.abs() <= EPS_SIDE,
        }
    }

    /// Split each triangle side at every on-side vertex, traversing the
    /// boundary V0 -> V1 -> V2 -> V0.
    fn add_boundary_edges(&mut self) {
        for side in 0..3 {
            let mut on_side: Vec<(f64, usize)> = (0..self.vertices.len())
                .filter(|&idx| self.on_side(idx, side))
                .map(|idx| {
                    let p = self.vertices[idx];
                    let param = match side {
                        0 => p.y,       // V0 (1,0) -> V1 (0,1)
                        1 => 1.0 - p.y, // V1 (0,1) -> V2 (0,0)
                        _ => p.x,       // V2 (0,0) -> V0 (1,0)
                    };
                    (param, idx)
                })
                .collect();
            on_side.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            for window in on_side.windows(2) {
                self.add_edge(window[0].1, window[1].1, true);
            }
        }
    }

    fn add_edge(&mut self, a: usize, b: usize, boundary: bool) {
        if a == b {
            return;
        }
        if self
            .edges
            .iter()
            .any(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
        {
            return;
        }
        self.edges.push(PslgEdge { a, b, boundary });
    }

    /// Edges may only meet at shared vertices; a crossing away from every
    /// PSLG vertex means the upstream subdivision was inconsistent.
    fn check_crossings(&self) -> Result<(), BooleanError> {
        for i in 0..self.edges.len() {
            for j in (i + 1)..self.edges.len() {
                let (e, f) = (self.edges[i], self.edges[j]);
                if e.a == f.a || e.a == f.b || e.b == f.a || e.b == f.b {
                    continue;
                }
                let Some(crossing) = segment_crossing(
                    self.vertices[e.a],
                    self.vertices[e.b],
                    self.vertices[f.a],
                    self.vertices[f.b],
                ) else {
                    continue;
                };
                let near_vertex = self
                    .vertices
                    .iter()
                    .any(|v| (crossing - v).norm() < PSLG_VERTEX_MERGE_EPSILON);
                if !near_vertex {
                    return Err(BooleanError::invariant(
                        "pslg",
                        format!(
                            "edges ({}, {}) and ({}, {}) cross at ({:.9}, {:.9}) with no vertex",
                            e.a, e.b, f.a, f.b, crossing.x, crossing.y
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn clamp_to_chart(u: f64, v: f64) -> Point2<f64> {
    let mut u = u.max(0.0);
    let mut v = v.max(0.0);
    let sum = u + v;
    if sum > 1.0 {
        u /= sum;
        v /= sum;
    }
    Point2::new(u, v)
}

/// Intersection point of two 2D segments, if any: a proper crossing, an
/// endpoint touch, or a representative point of a collinear overlap.
fn segment_crossing(
    p0: Point2<f64>,
    p1: Point2<f64>,
    q0: Point2<f64>,
    q1: Point2<f64>,
) -> Option<Point2<f64>> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.x * s.y - r.y * s.x;
    let qp = q0 - p0;

    if denom.abs() > EPS_AREA {
        let t = (qp.x * s.y - qp.y * s.x) / denom;
        let u = (qp.x * r.y - qp.y * r.x) / denom;
        if (-1e-12..=1.0 + 1e-12).contains(&t) && (-1e-12..=1.0 + 1e-12).contains(&u) {
            return Some(Point2::new(p0.x + r.x * t, p0.y + r.y * t));
        }
        return None;
    }

    // Parallel. Only collinear segments can overlap.
    if (qp.x * r.y - qp.y * r.x).abs() > PSLG_VERTEX_MERGE_EPSILON * r.norm().max(1e-30) {
        return None;
    }
    let len_sq = r.norm_squared();
    if len_sq < EPS_AREA {
        return None;
    }
    let t0 = (q0 - p0).dot(&r) / len_sq;
    let t1 = (q1 - p0).dot(&r) / len_sq;
    let (lo, hi) = (t0.min(t1).max(0.0), t0.max(t1).min(1.0));
    if lo > hi {
        return None;
    }
    let mid = (lo + hi) / 2.0;
    Some(Point2::new(p0.x + r.x * mid, p0.y + r.y * mid))
}

fn ring_area(vertices: &[Point2<f64>], ring: &[usize]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let p = vertices[ring[i]];
        let q = vertices[ring[(i + 1) % ring.len()]];
        area += p.x * q.y - q.x * p.y;
    }
    area * 0.5
}

fn point_in_ring(vertices: &[Point2<f64>], ring: &[usize], point: Point2<f64>) -> bool {
    let mut inside = false;
    for i in 0..ring.len() {
        let p = vertices[ring[i]];
        let q = vertices[ring[(i + 1) % ring.len()]];
        if (p.y > point.y) != (q.y > point.y) {
            let x = p.x + (point.y - p.y) / (q.y - p.y) * (q.x - p.x);
            if point.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

fn ring_centroid(vertices: &[Point2<f64>], ring: &[usize]) -> Point2<f64> {
    let mut sum = nalgebra::Vector2::zeros();
    for &idx in ring {
        sum += vertices[idx].coords;
    }
    Point2::from(sum / ring.len() as f64)
}

struct Cycle {
    ring: Vec<usize>,
    area: f64,
    /// Undirected PSLG edge ids used by the cycle.
    edges: ahash::AHashSet<usize>,
}

/// Extract the faces of the subdivision and select the interior ones.
///
/// Half-edges walk with the face on their left; the single most-negative
/// cycle is the unbounded walk and is discarded, every other negative
/// cycle is a hole of the smallest edge-disjoint positive cycle containing
/// its sample point. The retained faces must tile the reference triangle.
pub fn extract_faces(pslg: &Pslg) -> Result<Vec<Face>, BooleanError> {
    if pslg.edges.is_empty() {
        return Err(BooleanError::invariant("pslg", "no edges to subdivide"));
    }

    let cycles = walk_cycles(pslg);

    // The unbounded face is the negative cycle of largest magnitude.
    let unbounded = cycles
        .iter()
        .enumerate()
        .filter(|(_, c)| c.area < 0.0)
        .min_by(|(_, a), (_, b)| {
            a.area
                .partial_cmp(&b.area)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(idx, _)| idx);
    let Some(unbounded) = unbounded else {
        return Err(BooleanError::invariant(
            "pslg",
            "half-edge walk produced no outer cycle",
        ));
    };

    let mut faces: Vec<Face> = cycles
        .iter()
        .enumerate()
        .filter(|&(idx, c)| idx != unbounded && c.area > 0.0)
        .map(|(_, c)| Face {
            outer: c.ring.clone(),
            holes: Vec::new(),
            area: c.area,
        })
        .collect();

    // Assign holes to their smallest containing, edge-disjoint face.
    for (idx, cycle) in cycles.iter().enumerate() {
        if idx == unbounded || cycle.area >= 0.0 {
            continue;
        }
        let sample = ring_centroid(&pslg.vertices, &cycle.ring);
        let parent = faces
            .iter_mut()
            .filter(|face| {
                point_in_ring(&pslg.vertices, &face.outer, sample)
                    && cycle_edges(pslg, &face.outer).is_disjoint(&cycle.edges)
            })
            .min_by(|a, b| {
                a.area
                    .partial_cmp(&b.area)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(parent) = parent else {
            return Err(BooleanError::invariant(
                "pslg",
                format!(
                    "hole cycle at ({:.9}, {:.9}) has no containing face",
                    sample.x, sample.y
                ),
            ));
        };
        parent.area += cycle.area;
        parent.holes.push(cycle.ring.clone());
    }

    select_interior_faces(faces)
}

fn select_interior_faces(mut faces: Vec<Face>) -> Result<Vec<Face>, BooleanError> {
    let full_area_tol = EPS_AREA.max(BARYCENTRIC_INSIDE_EPSILON * 0.5);
    let all_faces = faces.clone();

    faces.retain(|face| face.area >= EPS_AREA);

    // A face spanning the whole reference triangle alongside other faces is
    // the spurious outer shell of a degenerate walk; it reveals itself by
    // pushing the area total past the chart.
    if faces.len() > 1 {
        let total: f64 = faces.iter().map(|f| f.area.abs()).sum();
        if total > 0.5 + full_area_tol {
            if let Some(pos) = faces
                .iter()
                .position(|face| (face.area - 0.5).abs() <= full_area_tol)
            {
                faces.remove(pos);
            }
        }
    }

    if faces.is_empty() {
        // Degenerate subdivision: keep the single largest face.
        let largest = all_faces.into_iter().max_by(|a, b| {
            a.area
                .partial_cmp(&b.area)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        match largest {
            Some(face) => faces.push(face),
            None => {
                return Err(BooleanError::invariant("pslg", "subdivision has no faces"));
            }
        }
    }

    let total: f64 = faces.iter().map(|f| f.area.abs()).sum();
    if (total - 0.5).abs() > EPS_CORNER {
        return Err(BooleanError::invariant(
            "pslg",
            format!("retained face area {total:.9} does not tile the reference triangle"),
        ));
    }
    Ok(faces)
}

fn cycle_edges(pslg: &Pslg, ring: &[usize]) -> ahash::AHashSet<usize> {
    let mut set = ahash::AHashSet::new();
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
        if let Some(idx) = pslg
            .edges
            .iter()
            .position(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
        {
            set.insert(idx);
        }
    }
    set
}

/// Walk every half-edge cycle. The `next` of a half-edge into vertex v is
/// the first outgoing half-edge clockwise from its twin in the angular
/// order around v, which keeps each face on the left of its boundary:
/// bounded faces come out counter-clockwise, the unbounded walk clockwise.
fn walk_cycles(pslg: &Pslg) -> Vec<Cycle> {
    let half_count = pslg.edges.len() * 2;
    // Half-edge 2e runs a -> b, 2e + 1 runs b -> a.
    let from = |h: usize| {
        let e = pslg.edges[h / 2];
        if h % 2 == 0 {
            e.a
        } else {
            e.b
        }
    };
    let to = |h: usize| {
        let e = pslg.edges[h / 2];
        if h % 2 == 0 {
            e.b
        } else {
            e.a
        }
    };

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); pslg.vertices.len()];
    for h in 0..half_count {
        outgoing[from(h)].push(h);
    }
    for (vertex, list) in outgoing.iter_mut().enumerate() {
        let origin = pslg.vertices[vertex];
        list.sort_by(|&g, &h| {
            let pg = pslg.vertices[to(g)] - origin;
            let ph = pslg.vertices[to(h)] - origin;
            pg.y.atan2(pg.x)
                .partial_cmp(&ph.y.atan2(ph.x))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let mut next = vec![0usize; half_count];
    for h in 0..half_count {
        let twin = h ^ 1;
        let at = to(h);
        let list = &outgoing[at];
        let pos = list.iter().position(|&g| g == twin).unwrap_or(0);
        next[h] = list[(pos + list.len() - 1) % list.len()];
    }

    let mut visited = vec![false; half_count];
    let mut cycles = Vec::new();
    for start in 0..half_count {
        if visited[start] {
            continue;
        }
        let mut ring = Vec::new();
        let mut edges = ahash::AHashSet::new();
        let mut h = start;
        loop {
            visited[h] = true;
            ring.push(from(h));
            edges.insert(h / 2);
            h = next[h];
            if h == start {
                break;
            }
        }
        let area = ring_area(&pslg.vertices, &ring);
        cycles.push(Cycle { ring, area, edges });
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_triangle_single_face() {
        let pslg = Pslg::build(&[], &[]).unwrap();
        assert_eq!(pslg.vertices.len(), 3);
        assert_eq!(pslg.edges.len(), 3);

        let faces = extract_faces(&pslg).unwrap();
        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].area, 0.5, epsilon = 1e-12);
        assert!(faces[0].holes.is_empty());
    }

    #[test]
    fn test_chord_splits_into_two_faces() {
        // Vertices on side w=0 and side v=0, joined by a constraint.
        let points = [(0.5, 0.5), (0.5, 0.0)];
        let constraints = [(3, 4)];
        let pslg = Pslg::build(&points, &constraints).unwrap();
        let faces = extract_faces(&pslg).unwrap();

        assert_eq!(faces.len(), 2);
        let total: f64 = faces.iter().map(|f| f.area).sum();
        assert_relative_eq!(total, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_interior_ring_becomes_hole() {
        let ring = [(0.2, 0.2), (0.4, 0.2), (0.4, 0.4), (0.2, 0.4)];
        let constraints = [(3, 4), (4, 5), (5, 6), (6, 3)];
        let pslg = Pslg::build(&ring, &constraints).unwrap();
        let faces = extract_faces(&pslg).unwrap();

        assert_eq!(faces.len(), 2);
        let outer = faces.iter().find(|f| !f.holes.is_empty()).unwrap();
        let inner = faces.iter().find(|f| f.holes.is_empty()).unwrap();
        assert_relative_eq!(inner.area, 0.04, epsilon = 1e-9);
        assert_relative_eq!(outer.area, 0.5 - 0.04, epsilon = 1e-9);
        let total: f64 = faces.iter().map(|f| f.area).sum();
        assert_relative_eq!(total, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_corner_snap_and_merge() {
        let points = [(1.0 - 1e-7, 1e-8), (0.3, 0.3), (0.3 + 1e-8, 0.3)];
        let pslg = Pslg::build(&points, &[]).unwrap();
        // First point snaps to corner 0; the near-duplicates merge.
        assert_eq!(pslg.rep[3], 0);
        assert_eq!(pslg.rep[4], pslg.rep[5]);
        assert_eq!(pslg.vertices.len(), 4);
    }

    #[test]
    fn test_unsplit_crossing_is_rejected() {
        // Two constraints crossing mid-air without a shared vertex.
        let points = [(0.6, 0.05), (0.05, 0.6), (0.05, 0.05), (0.45, 0.45)];
        let constraints = [(3, 4), (5, 6)];
        let pslg = Pslg::build(&points, &constraints).unwrap_err();
        assert!(pslg.to_string().contains("pslg"));
    }

    #[test]
    fn test_determinism() {
        let points = [(0.5, 0.5), (0.5, 0.0), (0.0, 0.5)];
        let constraints = [(3, 4), (3, 5)];
        let a = Pslg::build(&points, &constraints).unwrap();
        let b = Pslg::build(&points, &constraints).unwrap();
        let fa = extract_faces(&a).unwrap();
        let fb = extract_faces(&b).unwrap();
        assert_eq!(fa.len(), fb.len());
        for (x, y) in fa.iter().zip(fb.iter()) {
            assert_eq!(x.outer, y.outer);
            assert_eq!(x.area, y.area);
        }
    }
}
