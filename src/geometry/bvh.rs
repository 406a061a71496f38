// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Bounding volume hierarchy over one surface's triangles
//!
//! Nodes live in a flat arena and every leaf owns a contiguous run of a
//! permuted index list, so a query returns indices into the original
//! triangle slice without per-node allocations. Runs split at the spatial
//! median of the axis with the widest centroid spread; when all centroids
//! crowd into one half, the split falls back to the object median.

use super::bbox::BoundingBox;
use super::point::RealTriangle;
use nalgebra::Point3;

/// Runs at or below this length stay leaves.
const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Arena positions of the two children.
    Branch { left: usize, right: usize },
    /// Bounds of this leaf's run in the permuted index list.
    Leaf { start: usize, end: usize },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bbox: BoundingBox,
    kind: NodeKind,
}

/// Broadphase index over the triangles (or bare points) of one surface.
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<Node>,
    /// Item indices, permuted so each leaf owns a contiguous run.
    order: Vec<usize>,
}

impl Bvh {
    /// Build over the triangles of one input surface.
    pub fn over_triangles(triangles: &[RealTriangle]) -> Self {
        Self::build(triangles.iter().map(BoundingBox::from_triangle).collect())
    }

    /// Build over bare points (degenerate boxes); used to find the
    /// intersection vertices near a triangle.
    pub fn over_points(points: &[Point3<f64>]) -> Self {
        Self::build(
            points
                .iter()
                .map(|p| {
                    let mut bbox = BoundingBox::empty();
                    bbox.expand_to_include(p);
                    bbox
                })
                .collect(),
        )
    }

    fn build(boxes: Vec<BoundingBox>) -> Self {
        let centers: Vec<Point3<f64>> = boxes.iter().map(BoundingBox::center).collect();
        let mut bvh = Self {
            nodes: Vec::new(),
            order: (0..boxes.len()).collect(),
        };
        if !boxes.is_empty() {
            bvh.split_run(0, boxes.len(), &boxes, &centers);
        }
        bvh
    }

    /// Create the node for `order[start..end]`, splitting it when the run
    /// is long enough and its centroids actually spread out. Returns the
    /// node's arena position.
    fn split_run(
        &mut self,
        start: usize,
        end: usize,
        boxes: &[BoundingBox],
        centers: &[Point3<f64>],
    ) -> usize {
        let mut bbox = BoundingBox::empty();
        let mut center_min = [f64::INFINITY; 3];
        let mut center_max = [f64::NEG_INFINITY; 3];
        for &item in &self.order[start..end] {
            bbox.expand_to_include(&boxes[item].min);
            bbox.expand_to_include(&boxes[item].max);
            for axis in 0..3 {
                center_min[axis] = center_min[axis].min(centers[item][axis]);
                center_max[axis] = center_max[axis].max(centers[item][axis]);
            }
        }

        let slot = self.nodes.len();
        self.nodes.push(Node {
            bbox,
            kind: NodeKind::Leaf { start, end },
        });
        if end - start <= LEAF_SIZE {
            return slot;
        }

        let mut axis = 0;
        for candidate in 1..3 {
            if center_max[candidate] - center_min[candidate]
                > center_max[axis] - center_min[axis]
            {
                axis = candidate;
            }
        }
        // Coincident centroids cannot be separated; keep the oversized leaf.
        if center_max[axis] - center_min[axis] <= 0.0 {
            return slot;
        }

        // Spatial-median partition of the run.
        let pivot = (center_min[axis] + center_max[axis]) / 2.0;
        let mut mid = start;
        for i in start..end {
            if centers[self.order[i]][axis] < pivot {
                self.order.swap(i, mid);
                mid += 1;
            }
        }
        if mid == start || mid == end {
            // Everything fell on one side of the pivot; halve by count.
            mid = start + (end - start) / 2;
            self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
                centers[a][axis]
                    .partial_cmp(&centers[b][axis])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let left = self.split_run(start, mid, boxes, centers);
        let right = self.split_run(mid, end, boxes, centers);
        self.nodes[slot].kind = NodeKind::Branch { left, right };
        slot
    }

    /// Indices of items whose leaf boxes intersect the query box.
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }
        let mut stack = vec![0usize];
        while let Some(position) = stack.pop() {
            let node = &self.nodes[position];
            if !node.bbox.overlaps(bbox) {
                continue;
            }
            match node.kind {
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                NodeKind::Leaf { start, end } => {
                    hits.extend_from_slice(&self.order[start..end]);
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(n: usize) -> Vec<RealTriangle> {
        (0..n)
            .map(|i| {
                let x = i as f64 * 2.0;
                [
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.0, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_query_finds_overlapping_triangles() {
        let triangles = strip(64);
        let bvh = Bvh::over_triangles(&triangles);
        let query = BoundingBox::new(Point3::new(3.5, 0.0, -1.0), Point3::new(6.5, 1.0, 1.0));
        let hits = bvh.query(&query);
        // Triangles 2 and 3 span x in [4, 5] and [6, 7].
        assert!(hits.contains(&2));
        assert!(hits.contains(&3));
        // Leaf runs may carry near neighbors, never the far end of the strip.
        assert!(!hits.contains(&60));
    }

    #[test]
    fn test_disjoint_query_is_empty() {
        let bvh = Bvh::over_triangles(&strip(16));
        let query = BoundingBox::new(
            Point3::new(500.0, 500.0, 500.0),
            Point3::new(501.0, 501.0, 501.0),
        );
        assert!(bvh.query(&query).is_empty());
    }

    #[test]
    fn test_empty_build() {
        let bvh = Bvh::over_triangles(&[]);
        let query = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(bvh.query(&query).is_empty());
    }

    #[test]
    fn test_point_lookup() {
        let points: Vec<Point3<f64>> =
            (0..100).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let bvh = Bvh::over_points(&points);
        let query = BoundingBox::new(Point3::new(4.9, -0.1, -0.1), Point3::new(5.1, 0.1, 0.1));
        let hits = bvh.query(&query);
        assert!(hits.contains(&5));
        assert!(!hits.contains(&50));
    }

    #[test]
    fn test_coincident_centroids_stay_queryable() {
        // A stack of identical triangles cannot be split; the oversized
        // leaf must still answer queries.
        let triangles: Vec<RealTriangle> = (0..32).map(|_| strip(1)[0]).collect();
        let bvh = Bvh::over_triangles(&triangles);
        let query = BoundingBox::new(Point3::new(0.0, 0.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(bvh.query(&query).len(), 32);
    }
}
