// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Tolerance table for the boolean pipeline
//!
//! All epsilons are compile-time constants; there is no runtime
//! configuration. Changing a value here is a test-surface property.

/// Epsilon for 3D geometric predicates; its reciprocal is the spacing of the
/// quantization lattice used to deduplicate intersection-graph vertices.
pub const TRIANGLE_PREDICATE_EPSILON: f64 = 1e-9;

/// Final vertex weld distance for mesh assembly.
pub const MERGE_EPSILON: f64 = 1e-6;

/// Squared weld distance for comparisons without a square root.
pub const MERGE_EPSILON_SQUARED: f64 = MERGE_EPSILON * MERGE_EPSILON;

/// Relative tolerance for barycentric-on-edge tests and area consistency.
pub const BARYCENTRIC_INSIDE_EPSILON: f64 = 1e-6;

/// Deduplication distance for intersection points within a single pair.
pub const FEATURE_WORLD_DISTANCE_EPSILON: f64 = 1e-7;

/// Squared form of the pair-local deduplication distance.
pub const FEATURE_WORLD_DISTANCE_EPSILON_SQUARED: f64 =
    FEATURE_WORLD_DISTANCE_EPSILON * FEATURE_WORLD_DISTANCE_EPSILON;

/// PSLG snapping distance to a reference-triangle corner.
pub const EPS_CORNER: f64 = 1e-5;

/// PSLG vertex coincidence threshold.
pub const EPS_VERTEX: f64 = 1e-6;

/// Threshold on the defining barycentric component for lying on a side.
pub const EPS_SIDE: f64 = 1e-6;

/// PSLG vertex merge distance.
pub const PSLG_VERTEX_MERGE_EPSILON: f64 = 1e-6;

/// Squared PSLG vertex merge distance.
pub const PSLG_VERTEX_MERGE_EPSILON_SQUARED: f64 =
    PSLG_VERTEX_MERGE_EPSILON * PSLG_VERTEX_MERGE_EPSILON;

/// Area floor below which a triangle or face counts as degenerate.
pub const EPS_AREA: f64 = 1e-12;

/// Perpendicular tolerance for recognizing interior vertices of a
/// super-edge during chain decomposition.
pub const SUPER_EDGE_PERPENDICULAR_EPSILON: f64 = 10.0 * MERGE_EPSILON;

/// Retry bound for classification rays that graze a mesh feature.
pub const CLASSIFY_RAY_RETRIES: u32 = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_ordering() {
        assert!(MERGE_EPSILON >= TRIANGLE_PREDICATE_EPSILON);
        assert!(EPS_CORNER > EPS_VERTEX);
        assert!(EPS_VERTEX >= EPS_SIDE);
    }

    #[test]
    fn test_squared_forms() {
        assert_eq!(MERGE_EPSILON_SQUARED, MERGE_EPSILON * MERGE_EPSILON);
        assert_eq!(
            PSLG_VERTEX_MERGE_EPSILON_SQUARED,
            PSLG_VERTEX_MERGE_EPSILON * PSLG_VERTEX_MERGE_EPSILON
        );
    }
}
