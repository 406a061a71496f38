// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Patch classification against the opposite solid (stage S5)
//!
//! Parity ray casting with Möller-Trumbore: a patch is inside the other
//! mesh iff a ray from its interior crosses the surface an odd number of
//! times. Rays that graze a vertex or an edge retry with a new direction;
//! directions derive deterministically from the patch id, so results are
//! reproducible. A patch lying on the opposite surface itself gets a
//! boundary label carrying the relative orientation; selection resolves
//! those so coincident geometry survives exactly once.

use crate::config::{CLASSIFY_RAY_RETRIES, MERGE_EPSILON, TRIANGLE_PREDICATE_EPSILON};
use crate::error::BooleanError;
use crate::geometry::{triangle_centroid, triangle_normal, RealTriangle};
use log::debug;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::subdivide::TrianglePatchSet;

/// Placement of a patch relative to the opposite solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchLabel {
    Inside,
    Outside,
    /// On the opposite surface, normals aligned.
    BoundarySame,
    /// On the opposite surface, normals opposed.
    BoundaryOpposite,
}

/// Labels parallel to a TrianglePatchSet.
#[derive(Debug, Clone)]
pub struct PatchClassification {
    pub labels: Vec<Vec<PatchLabel>>,
}

/// Classify every patch of one side against the original opposite mesh.
pub fn classify_side(
    patches: &TrianglePatchSet,
    other_mesh: &[RealTriangle],
    side_seed: u64,
) -> Result<PatchClassification, BooleanError> {
    let mut labels = Vec::with_capacity(patches.patches.len());
    let mut flat_id = 0usize;
    let mut inside_count = 0usize;
    let mut boundary_count = 0usize;

    for triangle_patches in &patches.patches {
        let mut row = Vec::with_capacity(triangle_patches.len());
        for patch in triangle_patches {
            let label = classify_patch(patch, other_mesh, side_seed, flat_id)?;
            match label {
                PatchLabel::Inside => inside_count += 1,
                PatchLabel::BoundarySame | PatchLabel::BoundaryOpposite => boundary_count += 1,
                PatchLabel::Outside => {}
            }
            row.push(label);
            flat_id += 1;
        }
        labels.push(row);
    }

    debug!(
        "classification: {flat_id} patches, {inside_count} inside, {boundary_count} on boundary"
    );
    Ok(PatchClassification { labels })
}

fn classify_patch(
    patch: &RealTriangle,
    other_mesh: &[RealTriangle],
    side_seed: u64,
    patch_id: usize,
) -> Result<PatchLabel, BooleanError> {
    let sample = sample_point(patch);

    if let Some(surface_normal) = coincident_surface_normal(&sample, other_mesh) {
        return Ok(if triangle_normal(patch).dot(&surface_normal) > 0.0 {
            PatchLabel::BoundarySame
        } else {
            PatchLabel::BoundaryOpposite
        });
    }

    for attempt in 0..CLASSIFY_RAY_RETRIES {
        let direction = ray_direction(side_seed, patch_id as u64, attempt);
        match cast_parity(&sample, &direction, other_mesh) {
            Some(true) => return Ok(PatchLabel::Inside),
            Some(false) => return Ok(PatchLabel::Outside),
            None => continue,
        }
    }
    Err(BooleanError::ClassificationAmbiguity {
        patch: patch_id,
        attempts: CLASSIFY_RAY_RETRIES,
    })
}

/// Patch centroid, or a barycentric-jittered sample when the centroid sits
/// numerically on a patch edge.
fn sample_point(patch: &RealTriangle) -> Point3<f64> {
    let centroid = triangle_centroid(patch);
    let near_edge = (0..3).any(|i| {
        let a = patch[i];
        let b = patch[(i + 1) % 3];
        let edge = b - a;
        let len = edge.norm();
        if len == 0.0 {
            return true;
        }
        (centroid - a).cross(&edge).norm() / len < MERGE_EPSILON
    });
    if near_edge {
        Point3::from(patch[0].coords * 0.5 + patch[1].coords * 0.3 + patch[2].coords * 0.2)
    } else {
        centroid
    }
}

/// Reproducible pseudo-random unit direction for (side, patch, attempt).
fn ray_direction(side_seed: u64, patch_id: u64, attempt: u32) -> Vector3<f64> {
    let seed = side_seed
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(patch_id.wrapping_mul(0x2545_f491_4f6c_dd1d))
        .wrapping_add(attempt as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    loop {
        let v = Vector3::new(
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
        );
        let norm = v.norm();
        if norm > 0.1 && norm <= 1.0 {
            return v / norm;
        }
    }
}

/// Outward normal of the mesh surface at `point` when the point lies on it
/// within the weld distance, None otherwise.
fn coincident_surface_normal(
    point: &Point3<f64>,
    mesh: &[RealTriangle],
) -> Option<Vector3<f64>> {
    for tri in mesh {
        let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
        let norm = normal.norm();
        if norm == 0.0 {
            continue;
        }
        let normal = normal / norm;
        let dist = normal.dot(&(point - tri[0]));
        if dist.abs() >= MERGE_EPSILON {
            continue;
        }
        let projected = point - normal * dist;
        let bary = crate::geometry::Barycentric::from_world_unsnapped(&projected, tri);
        if (bary.to_world(tri) - projected).norm() < MERGE_EPSILON {
            return Some(normal);
        }
    }
    None
}

/// Parity of surface crossings along the ray, or None on any graze.
fn cast_parity(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    mesh: &[RealTriangle],
) -> Option<bool> {
    let mut count = 0u32;
    for tri in mesh {
        match ray_triangle(origin, direction, tri) {
            RayHit::Hit => count += 1,
            RayHit::Miss => {}
            RayHit::Graze => return None,
        }
    }
    Some(count % 2 == 1)
}

enum RayHit {
    Hit,
    Miss,
    Graze,
}

/// Möller-Trumbore with an explicit graze band around every parameter
/// boundary.
fn ray_triangle(origin: &Point3<f64>, direction: &Vector3<f64>, tri: &RealTriangle) -> RayHit {
    let eps = TRIANGLE_PREDICATE_EPSILON;
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);

    if det.abs() < 1e-12 {
        // Ray parallel to the plane; a graze only matters when the origin
        // is essentially in it.
        let normal = edge1.cross(&edge2);
        let norm = normal.norm();
        if norm == 0.0 {
            return RayHit::Miss;
        }
        if (normal / norm).dot(&(origin - tri[0])).abs() < MERGE_EPSILON {
            return RayHit::Graze;
        }
        return RayHit::Miss;
    }

    let f = 1.0 / det;
    let s = origin - tri[0];
    let u = f * s.dot(&h);
    if u < -eps || u > 1.0 + eps {
        return RayHit::Miss;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < -eps || u + v > 1.0 + eps {
        return RayHit::Miss;
    }

    // Inside the triangle's closed extent; grazing if on its boundary.
    if u < eps || v < eps || u + v > 1.0 - eps {
        return RayHit::Graze;
    }

    let t = f * edge2.dot(&q);
    if t.abs() <= eps {
        return RayHit::Graze;
    }
    if t > 0.0 {
        RayHit::Hit
    } else {
        RayHit::Miss
    }
}
