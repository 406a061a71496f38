// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Binary STL export
//!
//! A collaborator with a fixed interface; never on the boolean hot path.

use crate::geometry::RealMesh;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Write a mesh as binary STL to any writer.
pub fn write_stl<W: Write>(mesh: &RealMesh, writer: &mut W) -> Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let corners = [
                mesh.vertices[tri[0]],
                mesh.vertices[tri[1]],
                mesh.vertices[tri[2]],
            ];
            let normal = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
            let normal = if normal.norm() > 0.0 {
                normal.normalize()
            } else {
                normal
            };
            stl_io::Triangle {
                normal: stl_io::Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: corners.map(|c| {
                    stl_io::Vertex::new([c.x as f32, c.y as f32, c.z as f32])
                }),
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.into_iter()).context("writing STL body")
}

/// Write a mesh as binary STL to a file path.
pub fn export_stl(mesh: &RealMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating STL file {}", path.display()))?;
    write_stl(mesh, &mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn tetrahedron() -> RealMesh {
        RealMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn test_export_writes_binary_stl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tetra.stl");
        export_stl(&tetrahedron(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // 80-byte header, 4-byte count, 50 bytes per triangle.
        assert_eq!(bytes.len(), 80 + 4 + 4 * 50);
        assert_eq!(u32::from_le_bytes(bytes[80..84].try_into().unwrap()), 4);
    }
}
