// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Mesh assembly (stage S7)
//!
//! Two welding passes turn the selected patches into an indexed mesh:
//! lattice quantization first, then voxel-neighborhood welding at the merge
//! distance. The result must be manifold; a violation is fatal and reports
//! every offending edge.

use crate::config::{EPS_AREA, MERGE_EPSILON, MERGE_EPSILON_SQUARED, TRIANGLE_PREDICATE_EPSILON};
use crate::error::{BooleanError, NonManifoldEdge};
use crate::geometry::{triangle_area, RealMesh};
use ahash::AHashMap;
use log::{debug, warn};
use nalgebra::Point3;
use std::path::PathBuf;

use super::select::BooleanPatchSet;

/// Optional sink for advisory failure dumps, injected at the entry point.
#[derive(Debug, Clone)]
pub struct DiagnosticsSink {
    pub path: PathBuf,
}

impl DiagnosticsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write the non-manifold report as JSON. Best effort only.
    fn write_non_manifold(&self, edges: &[NonManifoldEdge]) {
        let report = serde_json::json!({
            "non_manifold_edges": edges
                .iter()
                .map(|edge| {
                    serde_json::json!({
                        "endpoints": edge.endpoints,
                        "incidence": edge.incidence,
                        "triangles": edge.triangles,
                    })
                })
                .collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&report) {
            Ok(body) => {
                if let Err(err) = std::fs::write(&self.path, body) {
                    warn!("diagnostics dump to {:?} failed: {err}", self.path);
                }
            }
            Err(err) => warn!("diagnostics serialization failed: {err}"),
        }
    }
}

/// Assemble the selected patches into a manifold indexed mesh.
pub fn assemble(
    selected: &BooleanPatchSet,
    sink: Option<&DiagnosticsSink>,
) -> Result<RealMesh, BooleanError> {
    let mut mesh = quantization_pass(selected);
    let dropped = weld_pass(&mut mesh);
    debug!(
        "assembly: {} vertices, {} triangles ({} dropped in welding)",
        mesh.vertex_count(),
        mesh.triangle_count(),
        dropped
    );

    let violations = manifold_violations(&mesh);
    if violations.is_empty() {
        return Ok(mesh);
    }
    if let Some(sink) = sink {
        sink.write_non_manifold(&violations);
    }
    Err(BooleanError::NonManifold { edges: violations })
}

fn lattice_key(p: &Point3<f64>) -> (i64, i64, i64) {
    let scale = 1.0 / TRIANGLE_PREDICATE_EPSILON;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

/// Pass 1: collapse identical lattice cells to shared indices, skipping
/// patches that are degenerate before or after indexing.
fn quantization_pass(selected: &BooleanPatchSet) -> RealMesh {
    let mut mesh = RealMesh::new();
    let mut by_key: AHashMap<(i64, i64, i64), usize> = AHashMap::new();

    for patch in selected.from_a.iter().chain(&selected.from_b) {
        if triangle_area(patch) < EPS_AREA {
            continue;
        }
        let indices = patch.map(|corner| {
            *by_key.entry(lattice_key(&corner)).or_insert_with(|| {
                mesh.vertices.push(corner);
                mesh.vertices.len() - 1
            })
        });
        if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
            continue;
        }
        mesh.triangles.push(indices);
    }
    mesh
}

fn voxel(p: &Point3<f64>) -> (i64, i64, i64) {
    (
        (p.x / MERGE_EPSILON).floor() as i64,
        (p.y / MERGE_EPSILON).floor() as i64,
        (p.z / MERGE_EPSILON).floor() as i64,
    )
}

/// Pass 2: weld vertices within the merge distance using 3x3x3 voxel
/// neighborhoods; drop triangles that collapse. Returns the number of
/// dropped triangles.
fn weld_pass(mesh: &mut RealMesh) -> usize {
    let mut canonical: Vec<usize> = (0..mesh.vertices.len()).collect();
    let mut buckets: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::new();

    for idx in 0..mesh.vertices.len() {
        let position = mesh.vertices[idx];
        let (vx, vy, vz) = voxel(&position);
        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(cell) = buckets.get(&(vx + dx, vy + dy, vz + dz)) else {
                        continue;
                    };
                    for &rep in cell {
                        if (mesh.vertices[rep] - position).norm_squared() < MERGE_EPSILON_SQUARED {
                            found = Some(rep);
                            break 'search;
                        }
                    }
                }
            }
        }
        match found {
            Some(rep) => canonical[idx] = rep,
            None => buckets.entry((vx, vy, vz)).or_default().push(idx),
        }
    }

    let before = mesh.triangles.len();
    let mut triangles: Vec<[usize; 3]> = Vec::with_capacity(before);
    for tri in &mesh.triangles {
        let welded = tri.map(|idx| canonical[idx]);
        if welded[0] == welded[1] || welded[1] == welded[2] || welded[0] == welded[2] {
            continue;
        }
        triangles.push(welded);
    }

    // Compact to referenced vertices, keeping ascending index order.
    let mut used = vec![false; mesh.vertices.len()];
    for tri in &triangles {
        for &idx in tri {
            used[idx] = true;
        }
    }
    let mut remap = vec![usize::MAX; mesh.vertices.len()];
    let mut vertices = Vec::new();
    for (idx, &is_used) in used.iter().enumerate() {
        if is_used {
            remap[idx] = vertices.len();
            vertices.push(mesh.vertices[idx]);
        }
    }
    for tri in &mut triangles {
        *tri = tri.map(|idx| remap[idx]);
    }

    mesh.vertices = vertices;
    mesh.triangles = triangles;
    before - mesh.triangles.len()
}

/// Every undirected edge must be used by exactly two triangles.
fn manifold_violations(mesh: &RealMesh) -> Vec<NonManifoldEdge> {
    let mut violations: Vec<NonManifoldEdge> = mesh
        .edge_incidence()
        .into_iter()
        .filter(|(_, tris)| tris.len() != 2)
        .map(|(edge, mut tris)| {
            tris.sort_unstable();
            let p0 = mesh.vertices[edge.v0];
            let p1 = mesh.vertices[edge.v1];
            NonManifoldEdge {
                endpoints: [[p0.x, p0.y, p0.z], [p1.x, p1.y, p1.z]],
                incidence: tris.len(),
                triangles: tris,
            }
        })
        .collect();
    violations.sort_by(|a, b| {
        a.endpoints
            .partial_cmp(&b.endpoints)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RealTriangle;

    fn tetrahedron_patches() -> Vec<RealTriangle> {
        let o = Point3::new(0.0, 0.0, 0.0);
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        vec![[o, y, x], [o, x, z], [o, z, y], [x, y, z]]
    }

    #[test]
    fn test_assembles_closed_surface() {
        let selected = BooleanPatchSet {
            from_a: tetrahedron_patches(),
            from_b: Vec::new(),
        };
        let mesh = assemble(&selected, None).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_welds_nearby_corners() {
        let mut patches = tetrahedron_patches();
        // Shift one corner reference by less than the weld distance.
        patches[3][0].x += MERGE_EPSILON * 0.5;
        let selected = BooleanPatchSet {
            from_a: patches,
            from_b: Vec::new(),
        };
        let mesh = assemble(&selected, None).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_open_surface_is_rejected_with_report() {
        let mut patches = tetrahedron_patches();
        patches.pop();
        let selected = BooleanPatchSet {
            from_a: patches,
            from_b: Vec::new(),
        };
        let err = assemble(&selected, None).unwrap_err();
        match err {
            BooleanError::NonManifold { edges } => {
                assert_eq!(edges.len(), 3);
                assert!(edges.iter().all(|e| e.incidence == 1));
            }
            other => panic!("expected NonManifold, got {other}"),
        }
    }

    #[test]
    fn test_diagnostics_sink_receives_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("non_manifold.json");
        let sink = DiagnosticsSink::new(&path);

        let mut patches = tetrahedron_patches();
        patches.pop();
        let selected = BooleanPatchSet {
            from_a: patches,
            from_b: Vec::new(),
        };
        assert!(assemble(&selected, Some(&sink)).is_err());

        let body = std::fs::read_to_string(&path).unwrap();
        let report: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["non_manifold_edges"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_degenerate_patches_are_skipped() {
        let o = Point3::new(0.0, 0.0, 0.0);
        let x = Point3::new(1.0, 0.0, 0.0);
        let mut patches = tetrahedron_patches();
        patches.push([o, x, o]);
        let selected = BooleanPatchSet {
            from_a: patches,
            from_b: Vec::new(),
        };
        let mesh = assemble(&selected, None).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
    }
}
