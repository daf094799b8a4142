// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tree comparison.
//!
//! A [`DiffEngine`] reports node matches between two trees; [`pair_and_diff`] runs it in both
//! directions and merges the matches into each session's correlation store.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::model::{LeafAttribute, NodeId, PhyloTree};

pub mod integrate;
pub mod leafset;

pub use integrate::{pair_and_diff, MergeReport, PairSummary};
pub use leafset::LeafSetDiff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFn {
    #[default]
    Euclidean,
    /// Euclidean plus a support-value penalty.
    EuclideanSupport,
}

impl DistanceFn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::EuclideanSupport => "euclidean_support",
        }
    }
}

impl fmt::Display for DistanceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid distance function '{0}' (expected euclidean/euclidean_support)")]
pub struct ParseDistanceFnError(String);

impl FromStr for DistanceFn {
    type Err = ParseDistanceFnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclidean" => Ok(Self::Euclidean),
            "euclidean_support" => Ok(Self::EuclideanSupport),
            _ => Err(ParseDistanceFnError(s.to_owned())),
        }
    }
}

/// Engine options. `reduce_matrix` and `extended` are handed to the engine as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub support: bool,
    pub reduce_matrix: bool,
    pub extended: bool,
    pub jobs: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { support: false, reduce_matrix: false, extended: false, jobs: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffRequest {
    pub attr1: LeafAttribute,
    pub attr2: LeafAttribute,
    pub distance: DistanceFn,
    pub options: DiffOptions,
}

/// One reported match from a node of the first tree to a node of the second.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub distance: f64,
    pub side1: BTreeSet<SmolStr>,
    pub side2: BTreeSet<SmolStr>,
    pub diff: BTreeSet<SmolStr>,
    pub node_a: NodeId,
    pub node_b: NodeId,
}

pub trait DiffEngine: Send + Sync + fmt::Debug {
    /// Matches for nodes of `tree_a` against `tree_b`, in the engine's report order.
    fn diff(&self, tree_a: &PhyloTree, tree_b: &PhyloTree, request: &DiffRequest) -> Vec<MatchRecord>;
}
