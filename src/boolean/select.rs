// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Patch selection per boolean operation (stage S6)
//!
//! A pure lookup: inside/outside patches follow the operation table;
//! boundary patches (coincident surfaces) survive on at most one side so
//! the contact plane is covered exactly once or not at all.

use crate::geometry::{flip_triangle, RealTriangle};

use super::classify::{PatchClassification, PatchLabel};
use super::subdivide::TrianglePatchSet;

/// The five supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// A minus B.
    DifferenceAb,
    /// B minus A.
    DifferenceBa,
    SymmetricDifference,
}

/// Patches retained for an operation, flattened per side.
#[derive(Debug, Clone)]
pub struct BooleanPatchSet {
    pub from_a: Vec<RealTriangle>,
    pub from_b: Vec<RealTriangle>,
}

/// Keep/flip policy for one side of one operation.
#[derive(Debug, Clone, Copy)]
struct SidePolicy {
    keep_inside: bool,
    flip: bool,
    /// Keep patches coincident with the other surface, normals aligned.
    keep_boundary_same: bool,
    /// Keep patches coincident with the other surface, normals opposed.
    keep_boundary_opposite: bool,
}

impl SidePolicy {
    fn keeps(&self, label: PatchLabel) -> bool {
        match label {
            PatchLabel::Inside => self.keep_inside,
            PatchLabel::Outside => !self.keep_inside,
            PatchLabel::BoundarySame => self.keep_boundary_same,
            PatchLabel::BoundaryOpposite => self.keep_boundary_opposite,
        }
    }
}

/// (side A, side B) policies. Aligned coincident faces survive from side A
/// only; opposed coincident faces survive only where one solid keeps
/// material against the shared plane (the minuend of a difference).
fn policies(op: BooleanOp) -> (SidePolicy, SidePolicy) {
    let policy = |keep_inside, flip, same, opposite| SidePolicy {
        keep_inside,
        flip,
        keep_boundary_same: same,
        keep_boundary_opposite: opposite,
    };
    match op {
        BooleanOp::Union => (
            policy(false, false, true, false),
            policy(false, false, false, false),
        ),
        BooleanOp::Intersection => (
            policy(true, false, true, false),
            policy(true, false, false, false),
        ),
        BooleanOp::DifferenceAb => (
            policy(false, false, false, true),
            policy(true, true, false, false),
        ),
        BooleanOp::DifferenceBa => (
            policy(true, true, false, false),
            policy(false, false, false, true),
        ),
        BooleanOp::SymmetricDifference => (
            policy(false, false, false, false),
            policy(false, false, false, false),
        ),
    }
}

/// Select patches by the operation table, reversing orientation where the
/// retained side bounds the result from within.
pub fn select_patches(
    op: BooleanOp,
    patches_a: &TrianglePatchSet,
    class_a: &PatchClassification,
    patches_b: &TrianglePatchSet,
    class_b: &PatchClassification,
) -> BooleanPatchSet {
    let (policy_a, policy_b) = policies(op);
    BooleanPatchSet {
        from_a: select_side(patches_a, class_a, policy_a),
        from_b: select_side(patches_b, class_b, policy_b),
    }
}

fn select_side(
    patches: &TrianglePatchSet,
    class: &PatchClassification,
    policy: SidePolicy,
) -> Vec<RealTriangle> {
    let mut kept = Vec::new();
    for (triangle_patches, labels) in patches.patches.iter().zip(&class.labels) {
        for (patch, &label) in triangle_patches.iter().zip(labels) {
            if !policy.keeps(label) {
                continue;
            }
            // Boundary patches keep their own orientation; the flip only
            // applies to interior patches of a flipped side.
            let flip = policy.flip && label == PatchLabel::Inside;
            kept.push(if flip { flip_triangle(patch) } else { *patch });
        }
    }
    kept
}
