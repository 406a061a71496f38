// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Pair-local intersection features
//!
//! Converts the raw S1 primitives of one pair into deduplicated vertices
//! with both-side barycentrics and pair-local segments.

use crate::config::FEATURE_WORLD_DISTANCE_EPSILON_SQUARED;
use crate::geometry::Barycentric;
use nalgebra::Point3;

use super::intersect::{IntersectionSet, PairKind};

/// One intersection vertex scoped to a single pair.
#[derive(Debug, Clone)]
pub struct PairVertex {
    /// Pair-local id; dense from zero.
    pub id: usize,
    pub world: Point3<f64>,
    /// Barycentric on the pair's triangle of A.
    pub bary_a: Barycentric,
    /// Barycentric on the pair's triangle of B.
    pub bary_b: Barycentric,
}

/// Local structure of one intersecting pair.
#[derive(Debug, Clone)]
pub struct PairFeatures {
    pub tri_a: usize,
    pub tri_b: usize,
    pub kind: PairKind,
    pub vertices: Vec<PairVertex>,
    /// Ordered pairs of pair-local vertex ids; never self-loops.
    pub segments: Vec<(usize, usize)>,
}

/// Build PairFeatures for every contact pair of the set.
pub fn build_pair_features(set: &IntersectionSet) -> Vec<PairFeatures> {
    set.pairs
        .iter()
        .map(|pair| {
            let corners_a = &set.triangles_a[pair.tri_a];
            let corners_b = &set.triangles_b[pair.tri_b];

            // Deduplicate within the pair-local world tolerance, keeping a
            // map from the raw point index to its representative id.
            let mut vertices: Vec<PairVertex> = Vec::with_capacity(pair.points.len());
            let mut local_id: Vec<usize> = Vec::with_capacity(pair.points.len());
            for point in &pair.points {
                let existing = vertices.iter().find(|v| {
                    (v.world - point).norm_squared() < FEATURE_WORLD_DISTANCE_EPSILON_SQUARED
                });
                match existing {
                    Some(v) => local_id.push(v.id),
                    None => {
                        let id = vertices.len();
                        vertices.push(PairVertex {
                            id,
                            world: *point,
                            bary_a: Barycentric::from_world(point, corners_a),
                            bary_b: Barycentric::from_world(point, corners_b),
                        });
                        local_id.push(id);
                    }
                }
            }

            let mut segments = Vec::new();
            let mut push_segment = |a: usize, b: usize| {
                if a != b && !segments.contains(&(a, b)) && !segments.contains(&(b, a)) {
                    segments.push((a, b));
                }
            };
            match pair.kind {
                PairKind::None | PairKind::PointTouch => {}
                PairKind::Segment => {
                    if local_id.len() >= 2 {
                        push_segment(local_id[0], local_id[1]);
                    }
                }
                PairKind::Coplanar => {
                    // The overlap polygon's boundary ring becomes constraint
                    // segments on both triangles.
                    let n = local_id.len();
                    for i in 0..n {
                        push_segment(local_id[i], local_id[(i + 1) % n]);
                    }
                }
            }

            PairFeatures {
                tri_a: pair.tri_a,
                tri_b: pair.tri_b,
                kind: pair.kind,
                vertices,
                segments,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::intersect::PairIntersection;
    use crate::geometry::RealTriangle;
    use approx::assert_relative_eq;

    fn simple_set(kind: PairKind, points: Vec<Point3<f64>>) -> IntersectionSet {
        let tri_a: RealTriangle = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let tri_b: RealTriangle = [
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.0, 1.0, 1.0),
        ];
        IntersectionSet {
            triangles_a: vec![tri_a],
            triangles_b: vec![tri_b],
            pairs: vec![PairIntersection {
                tri_a: 0,
                tri_b: 0,
                kind,
                points,
            }],
        }
    }

    #[test]
    fn test_segment_produces_one_segment_two_vertices() {
        let set = simple_set(
            PairKind::Segment,
            vec![Point3::new(1.0, 1.0, 0.0), Point3::new(2.0, 1.0, 0.0)],
        );
        let features = build_pair_features(&set);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].vertices.len(), 2);
        assert_eq!(features[0].segments, vec![(0, 1)]);
    }

    #[test]
    fn test_nearby_points_deduplicate_without_self_loop() {
        let set = simple_set(
            PairKind::Segment,
            vec![
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0 + 1e-9, 1.0, 0.0),
            ],
        );
        let features = build_pair_features(&set);
        assert_eq!(features[0].vertices.len(), 1);
        assert!(features[0].segments.is_empty());
    }

    #[test]
    fn test_barycentrics_computed_on_both_sides() {
        let set = simple_set(PairKind::PointTouch, vec![Point3::new(1.0, 1.0, 0.0)]);
        let features = build_pair_features(&set);
        let v = &features[0].vertices[0];
        let back = v.bary_a.to_world(&set.triangles_a[0]);
        assert_relative_eq!((back - v.world).norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(v.bary_a.u + v.bary_a.v + v.bary_a.w, 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.bary_b.u + v.bary_b.v + v.bary_b.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coplanar_ring_closes() {
        let set = simple_set(
            PairKind::Coplanar,
            vec![
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
            ],
        );
        let features = build_pair_features(&set);
        assert_eq!(features[0].segments.len(), 3);
    }
}
