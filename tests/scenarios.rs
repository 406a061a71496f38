// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Concrete boolean scenarios over primitive solids

use approx::assert_relative_eq;
use solidcut::geometry::primitives::{
    make_box, make_cylinder, make_icosphere, make_tetrahedron, Axis,
};
use solidcut::geometry::LatticePoint;
use solidcut::{boolean, difference_ab, difference_ba, intersection, union, BooleanOp};

fn lp(x: i64, y: i64, z: i64) -> LatticePoint {
    LatticePoint::new(x, y, z)
}

fn small_tetrahedron() -> Vec<solidcut::Triangle> {
    make_tetrahedron([lp(0, 0, 0), lp(2, 0, 0), lp(0, 2, 0), lp(0, 0, 2)])
}

fn far_tetrahedron() -> Vec<solidcut::Triangle> {
    make_tetrahedron([
        lp(100, 100, 100),
        lp(102, 100, 100),
        lp(100, 102, 100),
        lp(100, 100, 102),
    ])
}

#[test]
fn test_disjoint_tetrahedra_intersection_is_empty() {
    let result = intersection(&small_tetrahedron(), &far_tetrahedron()).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_disjoint_tetrahedra_union_keeps_both() {
    let result = union(&small_tetrahedron(), &far_tetrahedron()).unwrap();
    assert_eq!(result.triangle_count(), 8);
    assert_eq!(result.vertex_count(), 8);
    assert!(result.is_manifold());
}

#[test]
fn test_disjoint_tetrahedra_differences_return_operands() {
    let a = small_tetrahedron();
    let b = far_tetrahedron();
    let tet_volume = 8.0 / 6.0;

    let diff_ab = difference_ab(&a, &b).unwrap();
    assert_eq!(diff_ab.triangle_count(), 4);
    assert_relative_eq!(diff_ab.signed_volume(), tet_volume, epsilon = 1e-9);

    let diff_ba = difference_ba(&a, &b).unwrap();
    assert_eq!(diff_ba.triangle_count(), 4);
    assert_relative_eq!(diff_ba.signed_volume(), tet_volume, epsilon = 1e-9);
}

#[test]
fn test_nested_tetrahedra_intersection_is_inner() {
    let inner = make_tetrahedron([lp(1, 1, 1), lp(2, 1, 1), lp(1, 2, 1), lp(1, 1, 2)]);
    let outer = make_tetrahedron([lp(0, 0, 0), lp(10, 0, 0), lp(0, 10, 0), lp(0, 0, 10)]);

    let result = intersection(&inner, &outer).unwrap();
    assert_eq!(result.triangle_count(), 4);
    assert!(result.is_manifold());
    assert_relative_eq!(result.signed_volume(), 1.0 / 6.0, epsilon = 1e-9);
}

#[test]
fn test_nested_tetrahedra_difference_has_cavity() {
    let inner = make_tetrahedron([lp(1, 1, 1), lp(2, 1, 1), lp(1, 2, 1), lp(1, 1, 2)]);
    let outer = make_tetrahedron([lp(0, 0, 0), lp(10, 0, 0), lp(0, 10, 0), lp(0, 0, 10)]);

    let result = difference_ab(&outer, &inner).unwrap();
    // Outer shell plus the flipped inner shell: disconnected but manifold.
    assert_eq!(result.triangle_count(), 8);
    assert!(result.is_manifold());
    assert_relative_eq!(
        result.signed_volume(),
        1000.0 / 6.0 - 1.0 / 6.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_box_minus_cylinder_is_manifold() {
    let cube = make_box(lp(-100, -100, -100), lp(100, 100, 100));
    let drill = make_cylinder(Axis::X, 60.0, 150, 24);

    let result = difference_ab(&cube, &drill).unwrap();
    assert!(!result.is_empty());
    assert!(result.is_manifold());

    let cube_volume = 200.0_f64.powi(3);
    let volume = result.signed_volume();
    assert!(volume > 0.0 && volume < cube_volume);
}

#[test]
fn test_cube_minus_two_perpendicular_tunnels() {
    let cube = make_box(lp(-200, -200, -200), lp(200, 200, 200));
    let tunnel_x = make_box(lp(-300, -100, -100), lp(300, 100, 100));
    let tunnel_y = make_box(lp(-100, -300, -100), lp(100, 300, 100));

    let stage_one = difference_ab(&cube, &tunnel_x).unwrap();
    assert!(stage_one.is_manifold());
    assert_relative_eq!(
        stage_one.signed_volume(),
        400.0_f64.powi(3) - 200.0 * 200.0 * 400.0,
        epsilon = 1.0
    );

    // Second stage runs against the first stage's output; the tunnel
    // roofs meet in the same plane (coplanar-roof contact).
    let stage_one_input = stage_one.to_lattice_triangles();
    let stage_two = difference_ab(&stage_one_input, &tunnel_y).unwrap();
    assert!(stage_two.is_manifold());
    assert_relative_eq!(
        stage_two.signed_volume(),
        400.0_f64.powi(3) - 2.0 * 200.0 * 200.0 * 400.0 + 200.0_f64.powi(3),
        epsilon = 1.0
    );
}

#[test]
fn test_overlapping_tetrahedra_with_shifted_bases() {
    let a = make_tetrahedron([lp(-4, -4, 0), lp(8, -4, 0), lp(-4, 8, 0), lp(0, 0, 2)]);
    let b = make_tetrahedron([lp(-4, -4, 1), lp(8, -4, 1), lp(-4, 8, 1), lp(0, 0, -1)]);

    let result = boolean(BooleanOp::Intersection, &a, &b).unwrap();
    assert!(!result.is_empty());
    assert!(result.is_manifold());
    assert!(result.signed_volume() > 0.0);
}

#[test]
fn test_sphere_union_sphere_near_contact() {
    let left = make_icosphere(lp(0, 0, 0), 200.0, 3);
    let right = make_icosphere(lp(150, 0, 0), 200.0, 3);

    let result = union(&left, &right).unwrap();
    assert!(result.is_manifold());

    // Larger than one sphere, smaller than two.
    let sphere_volume = 4.0 / 3.0 * std::f64::consts::PI * 200.0_f64.powi(3);
    let volume = result.signed_volume();
    assert!(volume > sphere_volume);
    assert!(volume < 2.0 * sphere_volume);
}
