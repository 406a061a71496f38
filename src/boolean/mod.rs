// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Boolean pipeline over triangular surface meshes
//!
//! A strictly layered data flow: pair intersection, feature extraction,
//! global graph, per-triangle topology, planar subdivision, classification,
//! selection and assembly. Each stage consumes an immutable input and
//! produces an immutable output; the assembly stage gates the result on
//! manifoldness.

pub mod assemble;
pub mod classify;
pub mod features;
pub mod graph;
pub mod index;
pub mod intersect;
pub mod pslg;
pub mod select;
pub mod subdivide;
pub mod topology;
pub mod triangulate;

pub use assemble::DiagnosticsSink;
pub use intersect::{IntersectionSet, PairKind};
pub use select::{BooleanOp, BooleanPatchSet};
pub use topology::{MeshTopology, Side};

use crate::error::BooleanError;
use crate::geometry::{RealMesh, RealTriangle, Triangle};
use log::debug;

/// Compute the boolean combination of two closed, orientable surfaces.
pub fn boolean(
    op: BooleanOp,
    mesh_a: &[Triangle],
    mesh_b: &[Triangle],
) -> Result<RealMesh, BooleanError> {
    boolean_with_diagnostics(op, mesh_a, mesh_b, None)
}

/// Union of the two solids.
pub fn union(mesh_a: &[Triangle], mesh_b: &[Triangle]) -> Result<RealMesh, BooleanError> {
    boolean(BooleanOp::Union, mesh_a, mesh_b)
}

/// Intersection of the two solids.
pub fn intersection(mesh_a: &[Triangle], mesh_b: &[Triangle]) -> Result<RealMesh, BooleanError> {
    boolean(BooleanOp::Intersection, mesh_a, mesh_b)
}

/// A minus B.
pub fn difference_ab(mesh_a: &[Triangle], mesh_b: &[Triangle]) -> Result<RealMesh, BooleanError> {
    boolean(BooleanOp::DifferenceAb, mesh_a, mesh_b)
}

/// B minus A.
pub fn difference_ba(mesh_a: &[Triangle], mesh_b: &[Triangle]) -> Result<RealMesh, BooleanError> {
    boolean(BooleanOp::DifferenceBa, mesh_a, mesh_b)
}

/// Symmetric difference of the two solids.
pub fn symmetric_difference(
    mesh_a: &[Triangle],
    mesh_b: &[Triangle],
) -> Result<RealMesh, BooleanError> {
    boolean(BooleanOp::SymmetricDifference, mesh_a, mesh_b)
}

/// Full entry point with an optional diagnostics sink for failure dumps.
pub fn boolean_with_diagnostics(
    op: BooleanOp,
    mesh_a: &[Triangle],
    mesh_b: &[Triangle],
    sink: Option<&DiagnosticsSink>,
) -> Result<RealMesh, BooleanError> {
    validate_input("mesh_a", mesh_a)?;
    validate_input("mesh_b", mesh_b)?;
    debug!(
        "boolean {:?}: {} x {} input triangles",
        op,
        mesh_a.len(),
        mesh_b.len()
    );

    if mesh_a.is_empty() || mesh_b.is_empty() {
        return empty_operand_result(op, mesh_a, mesh_b, sink);
    }

    let real_a: Vec<RealTriangle> = mesh_a.iter().map(Triangle::oriented_real).collect();
    let real_b: Vec<RealTriangle> = mesh_b.iter().map(Triangle::oriented_real).collect();

    let set = intersect::compute_pair_intersections(real_a, real_b);
    let pair_features = features::build_pair_features(&set);
    let graph = graph::IntersectionGraph::build(&pair_features);
    let index =
        index::TriangleIntersectionIndex::build(&set.triangles_a, &set.triangles_b, &graph);

    let topo_a = MeshTopology::build(Side::A, mesh_a, &pair_features, &graph, &index);
    let topo_b = MeshTopology::build(Side::B, mesh_b, &pair_features, &graph, &index);

    let patches_a = subdivide::subdivide_side(&set.triangles_a, &topo_a, &graph)?;
    let patches_b = subdivide::subdivide_side(&set.triangles_b, &topo_b, &graph)?;

    let class_a = classify::classify_side(&patches_a, &set.triangles_b, 0)?;
    let class_b = classify::classify_side(&patches_b, &set.triangles_a, 1)?;

    let selected = select::select_patches(op, &patches_a, &class_a, &patches_b, &class_b);
    assemble::assemble(&selected, sink)
}

fn validate_input(name: &'static str, mesh: &[Triangle]) -> Result<(), BooleanError> {
    for (idx, triangle) in mesh.iter().enumerate() {
        if triangle.is_degenerate() {
            return Err(BooleanError::InvalidArgument {
                name,
                reason: format!("degenerate triangle at index {idx}"),
            });
        }
    }
    Ok(())
}

/// Shortcuts when one operand has no triangles.
fn empty_operand_result(
    op: BooleanOp,
    mesh_a: &[Triangle],
    mesh_b: &[Triangle],
    sink: Option<&DiagnosticsSink>,
) -> Result<RealMesh, BooleanError> {
    let keep: &[Triangle] = if mesh_a.is_empty() {
        match op {
            BooleanOp::Union | BooleanOp::SymmetricDifference | BooleanOp::DifferenceBa => mesh_b,
            BooleanOp::Intersection | BooleanOp::DifferenceAb => &[],
        }
    } else {
        match op {
            BooleanOp::Union | BooleanOp::SymmetricDifference | BooleanOp::DifferenceAb => mesh_a,
            BooleanOp::Intersection | BooleanOp::DifferenceBa => &[],
        }
    };
    let selected = BooleanPatchSet {
        from_a: keep.iter().map(Triangle::oriented_real).collect(),
        from_b: Vec::new(),
    };
    assemble::assemble(&selected, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LatticePoint;

    fn lp(x: i64, y: i64, z: i64) -> LatticePoint {
        LatticePoint::new(x, y, z)
    }

    fn unit_tetrahedron() -> Vec<Triangle> {
        crate::geometry::primitives::make_tetrahedron([
            lp(0, 0, 0),
            lp(2, 0, 0),
            lp(0, 2, 0),
            lp(0, 0, 2),
        ])
    }

    #[test]
    fn test_degenerate_input_rejected() {
        let mut mesh = unit_tetrahedron();
        mesh[0].missing = lp(1, 1, 0);
        let err = boolean(BooleanOp::Union, &mesh, &unit_tetrahedron()).unwrap_err();
        assert!(err.to_string().contains("mesh_a"));
    }

    #[test]
    fn test_empty_operands() {
        let tet = unit_tetrahedron();
        let union = boolean(BooleanOp::Union, &[], &tet).unwrap();
        assert_eq!(union.triangle_count(), 4);

        let intersection = boolean(BooleanOp::Intersection, &tet, &[]).unwrap();
        assert!(intersection.is_empty());

        let diff = boolean(BooleanOp::DifferenceAb, &tet, &[]).unwrap();
        assert_eq!(diff.triangle_count(), 4);
    }

    #[test]
    fn test_self_union_is_identity() {
        let tet = unit_tetrahedron();
        let result = boolean(BooleanOp::Union, &tet, &tet).unwrap();
        assert!(result.is_manifold());
        assert_eq!(result.triangle_count(), 4);
        assert_eq!(result.vertex_count(), 4);
    }
}
