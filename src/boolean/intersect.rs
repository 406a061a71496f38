// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Triangle-triangle pair intersection (stage S1)
//!
//! Classifies every candidate pair as no contact, point touch, segment or
//! coplanar overlap, and computes the defining intersection points. Numeric
//! ties resolve toward the smaller kind.

use crate::config::{EPS_AREA, MERGE_EPSILON, TRIANGLE_PREDICATE_EPSILON};
use crate::geometry::{triangle_area, BoundingBox, Bvh, RealTriangle};
use log::debug;
use nalgebra::{Point2, Point3, Vector3};

/// Classification of a single triangle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// Disjoint or touching outside numeric tolerance.
    None,
    /// A single shared point.
    PointTouch,
    /// A proper intersection segment; two endpoints.
    Segment,
    /// Numerically coplanar triangles; the points are the overlap polygon.
    Coplanar,
}

/// One intersecting pair with its intersection feature.
#[derive(Debug, Clone)]
pub struct PairIntersection {
    pub tri_a: usize,
    pub tri_b: usize,
    pub kind: PairKind,
    pub points: Vec<Point3<f64>>,
}

/// Immutable pairing of the two input surfaces with every contact found.
#[derive(Debug, Clone)]
pub struct IntersectionSet {
    pub triangles_a: Vec<RealTriangle>,
    pub triangles_b: Vec<RealTriangle>,
    /// Pairs with `kind != None`, in (tri_a, tri_b) input index order.
    pub pairs: Vec<PairIntersection>,
}

/// Find every intersecting (triangle of A, triangle of B) pair.
///
/// Candidates come from a BVH over B's triangle boxes; each candidate runs
/// the full numeric classification.
pub fn compute_pair_intersections(
    triangles_a: Vec<RealTriangle>,
    triangles_b: Vec<RealTriangle>,
) -> IntersectionSet {
    let bvh_b = Bvh::over_triangles(&triangles_b);

    let mut pairs = Vec::new();
    for (ia, tri_a) in triangles_a.iter().enumerate() {
        let query = BoundingBox::from_triangle(tri_a).inflated(MERGE_EPSILON);
        let mut candidates = bvh_b.query(&query);
        candidates.sort_unstable();
        for ib in candidates {
            let (kind, points) = intersect_triangles(tri_a, &triangles_b[ib]);
            if kind != PairKind::None {
                pairs.push(PairIntersection {
                    tri_a: ia,
                    tri_b: ib,
                    kind,
                    points,
                });
            }
        }
    }
    debug!(
        "pair intersection: {} x {} triangles, {} contact pairs",
        triangles_a.len(),
        triangles_b.len(),
        pairs.len()
    );

    IntersectionSet {
        triangles_a,
        triangles_b,
        pairs,
    }
}

/// Classify one triangle pair and compute its intersection points.
pub fn intersect_triangles(
    tri_a: &RealTriangle,
    tri_b: &RealTriangle,
) -> (PairKind, Vec<Point3<f64>>) {
    if triangle_area(tri_a) < EPS_AREA || triangle_area(tri_b) < EPS_AREA {
        return (PairKind::None, Vec::new());
    }

    let normal_a = plane_normal(tri_a);
    let d_a = normal_a.dot(&tri_a[0].coords);
    let dist_b: [f64; 3] = [
        normal_a.dot(&tri_b[0].coords) - d_a,
        normal_a.dot(&tri_b[1].coords) - d_a,
        normal_a.dot(&tri_b[2].coords) - d_a,
    ];
    let signs_b = dist_b.map(plane_sign);

    if signs_b == [0, 0, 0] {
        return intersect_coplanar(tri_a, tri_b, &normal_a, d_a);
    }
    if signs_b.iter().all(|&s| s > 0) || signs_b.iter().all(|&s| s < 0) {
        return (PairKind::None, Vec::new());
    }

    let normal_b = plane_normal(tri_b);
    let d_b = normal_b.dot(&tri_b[0].coords);
    let dist_a: [f64; 3] = [
        normal_b.dot(&tri_a[0].coords) - d_b,
        normal_b.dot(&tri_a[1].coords) - d_b,
        normal_b.dot(&tri_a[2].coords) - d_b,
    ];
    let signs_a = dist_a.map(plane_sign);

    if signs_a.iter().all(|&s| s > 0) || signs_a.iter().all(|&s| s < 0) {
        return (PairKind::None, Vec::new());
    }

    // Line of plane intersection.
    let dir = normal_a.cross(&normal_b);
    if dir.norm_squared() < EPS_AREA {
        return (PairKind::None, Vec::new());
    }

    let span_a = plane_cross_span(tri_a, &dist_a, &signs_a);
    let span_b = plane_cross_span(tri_b, &dist_b, &signs_b);
    let (span_a, span_b) = match (span_a, span_b) {
        (Some(a), Some(b)) => (a, b),
        _ => return (PairKind::None, Vec::new()),
    };

    overlap_interval(span_a, span_b, &dir)
}

fn plane_normal(tri: &RealTriangle) -> Vector3<f64> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    n / n.norm()
}

fn plane_sign(dist: f64) -> i32 {
    if dist > TRIANGLE_PREDICATE_EPSILON {
        1
    } else if dist < -TRIANGLE_PREDICATE_EPSILON {
        -1
    } else {
        0
    }
}

/// The (up to two) points where a triangle crosses the other plane:
/// on-plane vertices plus strict edge crossings.
fn plane_cross_span(
    tri: &RealTriangle,
    dist: &[f64; 3],
    signs: &[i32; 3],
) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(2);
    let mut push = |p: Point3<f64>| {
        if !points
            .iter()
            .any(|q| (p - q).norm_squared() < TRIANGLE_PREDICATE_EPSILON)
        {
            points.push(p);
        }
    };

    for i in 0..3 {
        if signs[i] == 0 {
            push(tri[i]);
        }
    }
    for i in 0..3 {
        let j = (i + 1) % 3;
        if signs[i] * signs[j] < 0 {
            let t = dist[i] / (dist[i] - dist[j]);
            push(tri[i] + (tri[j] - tri[i]) * t);
        }
    }

    match points.len() {
        0 => None,
        1 => Some((points[0], points[0])),
        _ => Some((points[0], points[1])),
    }
}

/// Clip the two cross spans against each other along the plane line.
fn overlap_interval(
    span_a: (Point3<f64>, Point3<f64>),
    span_b: (Point3<f64>, Point3<f64>),
    dir: &Vector3<f64>,
) -> (PairKind, Vec<Point3<f64>>) {
    let tol = TRIANGLE_PREDICATE_EPSILON * dir.norm();
    let param = |p: &Point3<f64>| dir.dot(&p.coords);

    let mut a = [(param(&span_a.0), span_a.0), (param(&span_a.1), span_a.1)];
    let mut b = [(param(&span_b.0), span_b.0), (param(&span_b.1), span_b.1)];
    if a[0].0 > a[1].0 {
        a.swap(0, 1);
    }
    if b[0].0 > b[1].0 {
        b.swap(0, 1);
    }

    let lo = if a[0].0 > b[0].0 { a[0] } else { b[0] };
    let hi = if a[1].0 < b[1].0 { a[1] } else { b[1] };

    if lo.0 > hi.0 + tol {
        (PairKind::None, Vec::new())
    } else if hi.0 - lo.0 <= tol {
        (PairKind::PointTouch, vec![lo.1])
    } else {
        (PairKind::Segment, vec![lo.1, hi.1])
    }
}

/// Coplanar case: project along the largest normal component and clip the
/// triangles as convex 2D polygons.
fn intersect_coplanar(
    tri_a: &RealTriangle,
    tri_b: &RealTriangle,
    normal_a: &Vector3<f64>,
    d_a: f64,
) -> (PairKind, Vec<Point3<f64>>) {
    let axis = dominant_axis(normal_a);
    let ring_a = ccw_ring(project(tri_a, axis));
    let ring_b = ccw_ring(project(tri_b, axis));

    let clipped = clip_convex(&ring_b, &ring_a);
    let clipped = dedup_ring(clipped);

    if clipped.is_empty() {
        return (PairKind::None, Vec::new());
    }
    let lift = |p: &Point2<f64>| lift_to_plane(p, axis, normal_a, d_a);

    match clipped.len() {
        1 => (PairKind::PointTouch, vec![lift(&clipped[0])]),
        2 => (PairKind::Segment, clipped.iter().map(|p| lift(p)).collect()),
        _ => {
            if ring_area(&clipped).abs() < EPS_AREA {
                // Sliver polygon: keep the two extreme points.
                let (i, j) = farthest_pair(&clipped);
                (PairKind::Segment, vec![lift(&clipped[i]), lift(&clipped[j])])
            } else {
                (PairKind::Coplanar, clipped.iter().map(|p| lift(p)).collect())
            }
        }
    }
}

fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let a = normal.map(|x| x.abs());
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}

fn project(tri: &RealTriangle, axis: usize) -> [Point2<f64>; 3] {
    let get = |p: &Point3<f64>| match axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    };
    [get(&tri[0]), get(&tri[1]), get(&tri[2])]
}

fn lift_to_plane(p: &Point2<f64>, axis: usize, normal: &Vector3<f64>, d: f64) -> Point3<f64> {
    match axis {
        0 => {
            let x = (d - normal.y * p.x - normal.z * p.y) / normal.x;
            Point3::new(x, p.x, p.y)
        }
        1 => {
            let y = (d - normal.z * p.x - normal.x * p.y) / normal.y;
            Point3::new(p.y, y, p.x)
        }
        _ => {
            let z = (d - normal.x * p.x - normal.y * p.y) / normal.z;
            Point3::new(p.x, p.y, z)
        }
    }
}

fn ring_area(ring: &[Point2<f64>]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    area * 0.5
}

fn ccw_ring(tri: [Point2<f64>; 3]) -> Vec<Point2<f64>> {
    let mut ring = tri.to_vec();
    if ring_area(&ring) < 0.0 {
        ring.reverse();
    }
    ring
}

/// Sutherland-Hodgman clip of `subject` against the convex CCW `clip` ring.
fn clip_convex(subject: &[Point2<f64>], clip: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut output = subject.to_vec();
    for i in 0..clip.len() {
        if output.is_empty() {
            return output;
        }
        let c0 = clip[i];
        let c1 = clip[(i + 1) % clip.len()];
        let input = std::mem::take(&mut output);

        let side = |p: &Point2<f64>| (c1.x - c0.x) * (p.y - c0.y) - (c1.y - c0.y) * (p.x - c0.x);
        for j in 0..input.len() {
            let cur = input[j];
            let prev = input[(j + input.len() - 1) % input.len()];
            let side_cur = side(&cur);
            let side_prev = side(&prev);
            if side_cur >= -TRIANGLE_PREDICATE_EPSILON {
                if side_prev < -TRIANGLE_PREDICATE_EPSILON {
                    output.push(edge_crossing(prev, cur, side_prev, side_cur));
                }
                output.push(cur);
            } else if side_prev >= -TRIANGLE_PREDICATE_EPSILON {
                output.push(edge_crossing(prev, cur, side_prev, side_cur));
            }
        }
    }
    output
}

fn edge_crossing(p: Point2<f64>, q: Point2<f64>, side_p: f64, side_q: f64) -> Point2<f64> {
    let t = side_p / (side_p - side_q);
    Point2::new(p.x + (q.x - p.x) * t, p.y + (q.y - p.y) * t)
}

fn dedup_ring(ring: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(ring.len());
    for p in ring {
        if !out
            .iter()
            .any(|q| (p - q).norm_squared() < TRIANGLE_PREDICATE_EPSILON)
        {
            out.push(p);
        }
    }
    out
}

fn farthest_pair(ring: &[Point2<f64>]) -> (usize, usize) {
    let mut best = (0, 1);
    let mut best_dist = -1.0;
    for i in 0..ring.len() {
        for j in (i + 1)..ring.len() {
            let d = (ring[i] - ring[j]).norm_squared();
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}
