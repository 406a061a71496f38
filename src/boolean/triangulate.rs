// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Face triangulation: ear clipping with hole bridging (stage S4)

use crate::config::{EPS_AREA, PSLG_VERTEX_MERGE_EPSILON, PSLG_VERTEX_MERGE_EPSILON_SQUARED};
use crate::error::BooleanError;
use nalgebra::Point2;

use super::pslg::Face;

/// Triangulate one face of a planar subdivision into index triples.
///
/// `constraints` carries the geometry of every PSLG edge; an ear diagonal
/// may not cross any of them.
pub fn triangulate_face(
    vertices: &[Point2<f64>],
    face: &Face,
    constraints: &[(Point2<f64>, Point2<f64>)],
) -> Result<Vec<[usize; 3]>, BooleanError> {
    let mut ring = face.outer.clone();
    for hole in &face.holes {
        ring = bridge_hole(vertices, ring, hole, face)?;
    }
    ear_clip(vertices, ring, constraints)
}

fn orient(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn orient_sign(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> i32 {
    let v = orient(a, b, c);
    if v > EPS_AREA {
        1
    } else if v < -EPS_AREA {
        -1
    } else {
        0
    }
}

/// Strict interior crossing of two segments.
fn properly_cross(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, d: Point2<f64>) -> bool {
    orient_sign(a, b, c) * orient_sign(a, b, d) < 0
        && orient_sign(c, d, a) * orient_sign(c, d, b) < 0
}

fn coincident(a: Point2<f64>, b: Point2<f64>) -> bool {
    (a - b).norm_squared() < PSLG_VERTEX_MERGE_EPSILON_SQUARED
}

/// Any contact between segment (a, b) and segment (c, d), endpoints
/// included.
fn segments_touch(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, d: Point2<f64>) -> bool {
    if properly_cross(a, b, c, d) {
        return true;
    }
    let on = |p: Point2<f64>, q: Point2<f64>, r: Point2<f64>| {
        // r on the closed segment (p, q).
        orient_sign(p, q, r) == 0
            && r.x >= p.x.min(q.x) - PSLG_VERTEX_MERGE_EPSILON
            && r.x <= p.x.max(q.x) + PSLG_VERTEX_MERGE_EPSILON
            && r.y >= p.y.min(q.y) - PSLG_VERTEX_MERGE_EPSILON
            && r.y <= p.y.max(q.y) + PSLG_VERTEX_MERGE_EPSILON
    };
    on(a, b, c) || on(a, b, d) || on(c, d, a) || on(c, d, b)
}

/// Splice a hole ring into the outer ring through a visible bridge vertex.
///
/// The hole vertex with smallest (x, y) connects to the nearest outer
/// vertex it can see; the hole cycle is inserted in its walked (CW) order
/// between two copies of the chosen outer vertex.
fn bridge_hole(
    vertices: &[Point2<f64>],
    ring: Vec<usize>,
    hole: &[usize],
    face: &Face,
) -> Result<Vec<usize>, BooleanError> {
    let expected_area = ring_signed_area(vertices, &ring) + ring_signed_area(vertices, hole);

    let hole_pos = hole
        .iter()
        .enumerate()
        .min_by(|(_, &a), (_, &b)| {
            let (pa, pb) = (vertices[a], vertices[b]);
            (pa.x, pa.y)
                .partial_cmp(&(pb.x, pb.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .ok_or_else(|| BooleanError::invariant("triangulation", "empty hole ring"))?;
    let hole_vertex = hole[hole_pos];
    let hp = vertices[hole_vertex];

    // Obstacles: every segment of the current ring and of every hole of
    // this face, except those incident to a bridge endpoint.
    let mut obstacles: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();
    let mut collect = |cycle: &[usize]| {
        for i in 0..cycle.len() {
            let s0 = vertices[cycle[i]];
            let s1 = vertices[cycle[(i + 1) % cycle.len()]];
            obstacles.push((s0, s1));
        }
    };
    collect(&ring);
    for other in &face.holes {
        collect(other);
    }

    let mut candidates: Vec<usize> = (0..ring.len()).collect();
    candidates.sort_by(|&i, &j| {
        let di = (vertices[ring[i]] - hp).norm_squared();
        let dj = (vertices[ring[j]] - hp).norm_squared();
        di.partial_cmp(&dj).unwrap_or(std::cmp::Ordering::Equal)
    });

    let visible = candidates.into_iter().find(|&i| {
        let op = vertices[ring[i]];
        if coincident(op, hp) {
            return false;
        }
        obstacles.iter().all(|&(s0, s1)| {
            let incident = coincident(s0, hp)
                || coincident(s1, hp)
                || coincident(s0, op)
                || coincident(s1, op);
            incident || !segments_touch(hp, op, s0, s1)
        })
    });
    let Some(outer_pos) = visible else {
        return Err(BooleanError::invariant(
            "triangulation",
            format!("no visible bridge for hole vertex ({:.9}, {:.9})", hp.x, hp.y),
        ));
    };

    let mut stitched = Vec::with_capacity(ring.len() + hole.len() + 2);
    stitched.extend_from_slice(&ring[..=outer_pos]);
    for k in 0..hole.len() {
        stitched.push(hole[(hole_pos + k) % hole.len()]);
    }
    stitched.push(hole_vertex);
    stitched.push(ring[outer_pos]);
    stitched.extend_from_slice(&ring[outer_pos + 1..]);

    // Compress consecutive duplicates.
    stitched.dedup();
    if stitched.len() > 1 && stitched.first() == stitched.last() {
        stitched.pop();
    }

    verify_stitched(vertices, &stitched, expected_area)?;
    Ok(stitched)
}

/// The stitched polygon must be simple away from the duplicated bridge
/// vertices, and its signed area must match the face's.
fn verify_stitched(
    vertices: &[Point2<f64>],
    ring: &[usize],
    expected_area: f64,
) -> Result<(), BooleanError> {
    let n = ring.len();
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent segments share a vertex by construction.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a, b) = (vertices[ring[i]], vertices[ring[(i + 1) % n]]);
            let (c, d) = (vertices[ring[j]], vertices[ring[(j + 1) % n]]);
            if properly_cross(a, b, c, d) {
                return Err(BooleanError::invariant(
                    "triangulation",
                    "stitched polygon self-intersects away from its bridge",
                ));
            }
        }
    }

    let area = ring_signed_area(vertices, ring);
    if (area - expected_area).abs() > EPS_AREA.max(expected_area.abs() * 1e-9) + 1e-12 {
        return Err(BooleanError::invariant(
            "triangulation",
            format!("stitched area {area:.12} differs from face area {expected_area:.12}"),
        ));
    }
    Ok(())
}

fn ring_signed_area(vertices: &[Point2<f64>], ring: &[usize]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let p = vertices[ring[i]];
        let q = vertices[ring[(i + 1) % ring.len()]];
        area += p.x * q.y - q.x * p.y;
    }
    area * 0.5
}

/// Ear clipping over a CCW ring, fanning convex polygons directly.
fn ear_clip(
    vertices: &[Point2<f64>],
    mut ring: Vec<usize>,
    constraints: &[(Point2<f64>, Point2<f64>)],
) -> Result<Vec<[usize; 3]>, BooleanError> {
    let mut triangles = Vec::new();
    remove_spikes(&mut ring);
    if ring.len() < 3 {
        return Ok(triangles);
    }

    // The fan shortcut needs strict convexity: a collinear run on a side
    // would fan into zero-area triangles and lose its split vertices.
    let strictly_convex = (0..ring.len()).all(|i| {
        let n = ring.len();
        let prev = vertices[ring[(i + n - 1) % n]];
        let cur = vertices[ring[i]];
        let next = vertices[ring[(i + 1) % n]];
        orient(prev, cur, next) > EPS_AREA
    });

    if strictly_convex {
        for i in 1..ring.len() - 1 {
            let tri = [ring[0], ring[i], ring[i + 1]];
            if triangle_area_indices(vertices, tri) >= EPS_AREA {
                triangles.push(tri);
            }
        }
        return Ok(triangles);
    }

    while ring.len() > 3 {
        let Some(ear) = find_ear(vertices, &ring, constraints) else {
            return Err(BooleanError::invariant(
                "triangulation",
                format!("no ear found on a {}-gon", ring.len()),
            ));
        };
        let n = ring.len();
        let tri = [ring[(ear + n - 1) % n], ring[ear], ring[(ear + 1) % n]];
        triangles.push(tri);
        ring.remove(ear);
        remove_spikes(&mut ring);
        if ring.len() < 3 {
            return Ok(triangles);
        }
    }
    let last = [ring[0], ring[1], ring[2]];
    if triangle_area_indices(vertices, last) >= EPS_AREA {
        triangles.push(last);
    }
    Ok(triangles)
}

fn triangle_area_indices(vertices: &[Point2<f64>], tri: [usize; 3]) -> f64 {
    orient(vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]) * 0.5
}

/// Drop spike patterns (a, x, a) left behind by bridge splices.
fn remove_spikes(ring: &mut Vec<usize>) {
    loop {
        let n = ring.len();
        if n < 3 {
            return;
        }
        let spike = (0..n).find(|&i| ring[(i + n - 1) % n] == ring[(i + 1) % n]);
        let Some(i) = spike else {
            return;
        };
        // Remove the spike tip and one copy of its duplicated neighbor.
        let tip = i;
        let dup = (i + 1) % ring.len();
        if dup > tip {
            ring.remove(dup);
            ring.remove(tip);
        } else {
            ring.remove(tip);
            ring.remove(dup);
        }
    }
}

fn find_ear(
    vertices: &[Point2<f64>],
    ring: &[usize],
    constraints: &[(Point2<f64>, Point2<f64>)],
) -> Option<usize> {
    let n = ring.len();
    for i in 0..n {
        let (pi, ci, ni) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
        let (p, c, q) = (vertices[pi], vertices[ci], vertices[ni]);

        if orient(p, c, q) <= EPS_AREA {
            continue;
        }

        // No other ring vertex inside the closed candidate ear; a vertex
        // on the diagonal would leave a T-junction behind.
        let blocked = ring.iter().any(|&other| {
            let o = vertices[other];
            if coincident(o, p) || coincident(o, c) || coincident(o, q) {
                return false;
            }
            orient_sign(p, c, o) >= 0 && orient_sign(c, q, o) >= 0 && orient_sign(q, p, o) >= 0
        });
        if blocked {
            continue;
        }

        // The new diagonal may not cross a constraint segment.
        let diagonal_blocked = constraints.iter().any(|&(s0, s1)| {
            if coincident(s0, p) || coincident(s1, p) || coincident(s0, q) || coincident(s1, q) {
                return false;
            }
            properly_cross(p, q, s0, s1)
        });
        if diagonal_blocked {
            continue;
        }

        return Some(i);
    }
    None
}
