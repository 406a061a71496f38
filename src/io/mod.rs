// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! I/O module - mesh export collaborators

mod export_stl;

pub use export_stl::{export_stl, write_stl};
