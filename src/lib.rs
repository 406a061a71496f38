// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Solidcut mesh boolean kernel
//!
//! Exact-topology boolean operations (union, intersection, differences,
//! symmetric difference) over pairs of closed triangular surface meshes.
//! The pipeline discovers the intersection curve between the two surfaces,
//! re-triangulates every crossed triangle so the curve appears as patch
//! edges on both sides, classifies the patches against the opposite solid,
//! and stitches the selected patches back into a 2-manifold mesh.

pub mod boolean;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;

pub use boolean::{
    boolean, difference_ab, difference_ba, intersection, symmetric_difference, union, BooleanOp,
    DiagnosticsSink,
};
pub use error::BooleanError;
pub use geometry::{LatticePoint, RealMesh, Triangle};
