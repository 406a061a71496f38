// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Inc.

//! Error kinds for the boolean pipeline
//!
//! Three categories: programmer errors fail fast naming the parameter,
//! geometric inconsistencies identify the stage with coordinate context,
//! and classification ambiguity is escalated only after bounded retries.

use thiserror::Error;

/// A single offending edge in a non-manifold report.
#[derive(Debug, Clone)]
pub struct NonManifoldEdge {
    /// Canonical endpoint positions of the edge.
    pub endpoints: [[f64; 3]; 2],
    /// How many triangles reference the edge.
    pub incidence: usize,
    /// Indices of the incident triangles in the assembled mesh.
    pub triangles: Vec<usize>,
}

impl std::fmt::Display for NonManifoldEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "edge ({:.6}, {:.6}, {:.6})-({:.6}, {:.6}, {:.6}) used by {} triangles",
            self.endpoints[0][0],
            self.endpoints[0][1],
            self.endpoints[0][2],
            self.endpoints[1][0],
            self.endpoints[1][1],
            self.endpoints[1][2],
            self.incidence
        )
    }
}

/// Errors produced by the boolean pipeline.
#[derive(Debug, Error)]
pub enum BooleanError {
    /// Programmer error: an argument violated the entry contract.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Geometric inconsistency detected by a pipeline stage. Not
    /// recoverable; indicates the tolerances are inadequate for the input
    /// or an upstream stage produced inconsistent data.
    #[error("invariant violation in {stage}: {detail}")]
    InvariantViolation {
        /// Pipeline stage that detected the inconsistency.
        stage: &'static str,
        /// Coordinate context sufficient to reproduce.
        detail: String,
    },

    /// The assembled mesh has edges not shared by exactly two triangles.
    #[error("non-manifold assembly with {} offending edge(s)", .edges.len())]
    NonManifold {
        /// Every offending edge with its incidence count.
        edges: Vec<NonManifoldEdge>,
    },

    /// A classification ray grazed a mesh feature on every retry.
    #[error("classification ambiguity for patch {patch} after {attempts} ray retries")]
    ClassificationAmbiguity {
        /// Flat patch index on the side being classified.
        patch: usize,
        /// Number of directions tried.
        attempts: u32,
    },
}

impl BooleanError {
    pub(crate) fn invariant(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            stage,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_stage_and_parameter() {
        let err = BooleanError::InvalidArgument {
            name: "mesh_a",
            reason: "degenerate triangle at index 3".into(),
        };
        assert!(err.to_string().contains("mesh_a"));

        let err = BooleanError::invariant("pslg", "face area sum 0.3 != 0.5");
        assert!(err.to_string().contains("pslg"));
    }

    #[test]
    fn test_non_manifold_report_lists_incidence() {
        let edge = NonManifoldEdge {
            endpoints: [[0.0; 3], [1.0, 0.0, 0.0]],
            incidence: 3,
            triangles: vec![0, 4, 7],
        };
        assert!(edge.to_string().contains("used by 3 triangles"));

        let err = BooleanError::NonManifold { edges: vec![edge] };
        assert!(err.to_string().contains("1 offending edge"));
    }
}
