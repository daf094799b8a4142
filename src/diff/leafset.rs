// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use rayon::prelude::*;
use smol_str::SmolStr;

use super::{DiffEngine, DiffRequest, DistanceFn, MatchRecord};
use crate::model::{LeafAttribute, NodeId, PhyloTree};

/// Matches every node to the partner node whose leaf-attribute set is closest.
///
/// Ties go to the lowest partner id. Nodes whose set shares nothing with any partner node are
/// not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafSetDiff;

struct Clade {
    node_id: NodeId,
    support: Option<f64>,
    leaves: BTreeSet<SmolStr>,
}

fn clades(tree: &PhyloTree, attribute: &LeafAttribute) -> Vec<Clade> {
    tree.preorder()
        .into_iter()
        .filter_map(|node_id| {
            let leaves = tree.leaf_attribute_set(node_id, attribute);
            if leaves.is_empty() {
                return None;
            }
            let support = tree.node(node_id).and_then(|node| node.support());
            Some(Clade { node_id, support, leaves })
        })
        .collect()
}

/// `None` when the sets are disjoint.
fn clade_distance(a: &Clade, b: &Clade, distance: DistanceFn, use_support: bool) -> Option<f64> {
    let shared = a.leaves.intersection(&b.leaves).count();
    if shared == 0 {
        return None;
    }
    let largest = a.leaves.len().max(b.leaves.len());
    let euclidean = 1.0 - shared as f64 / largest as f64;
    match distance {
        DistanceFn::Euclidean => Some(euclidean),
        DistanceFn::EuclideanSupport if !use_support => Some(euclidean),
        DistanceFn::EuclideanSupport => {
            let penalty = match (a.support, b.support) {
                (Some(sa), Some(sb)) => (sa - sb).abs() / 2.0,
                _ => 0.0,
            };
            Some((euclidean + penalty).min(1.0))
        }
    }
}

fn best_match(row: &Clade, columns: &[Clade], request: &DiffRequest) -> Option<MatchRecord> {
    let mut best: Option<(f64, &Clade)> = None;
    for column in columns {
        let Some(distance) =
            clade_distance(row, column, request.distance, request.options.support)
        else {
            continue;
        };
        if best.map_or(true, |(current, _)| distance < current) {
            best = Some((distance, column));
        }
    }

    let (distance, column) = best?;
    if request.options.reduce_matrix && distance == 0.0 {
        return None;
    }
    Some(MatchRecord {
        distance,
        side1: row.leaves.clone(),
        side2: column.leaves.clone(),
        diff: row.leaves.symmetric_difference(&column.leaves).cloned().collect(),
        node_a: row.node_id,
        node_b: column.node_id,
    })
}

impl DiffEngine for LeafSetDiff {
    fn diff(&self, tree_a: &PhyloTree, tree_b: &PhyloTree, request: &DiffRequest) -> Vec<MatchRecord> {
        if request.options.extended {
            tracing::debug!("extended comparison requested; leaf-set diff ignores it");
        }

        let rows = clades(tree_a, &request.attr1);
        let columns = clades(tree_b, &request.attr2);
        let jobs = request.options.jobs;

        if jobs > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => {
                    return pool.install(|| {
                        rows.par_iter()
                            .filter_map(|row| best_match(row, &columns, request))
                            .collect()
                    });
                }
                Err(err) => {
                    tracing::warn!(jobs, error = %err, "diff thread pool unavailable; running sequentially");
                }
            }
        }

        rows.iter().filter_map(|row| best_match(row, &columns, request)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::LeafSetDiff;
    use crate::diff::{DiffEngine, DiffOptions, DiffRequest, DistanceFn};
    use crate::format::{parse_newick, InternalLabels};
    use crate::model::{LeafAttribute, NodeId};

    fn names(set: &std::collections::BTreeSet<smol_str::SmolStr>) -> Vec<&str> {
        set.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn identical_leaves_match_at_zero_and_disjoint_leaves_are_unreported() {
        let a = parse_newick("(A,(B,C));", InternalLabels::Support).expect("a");
        let b = parse_newick("(A,(B,D));", InternalLabels::Support).expect("b");
        let matches = LeafSetDiff.diff(&a, &b, &DiffRequest::default());

        let leaf_a = matches.iter().find(|m| m.node_a == NodeId::new(1)).expect("A");
        assert_eq!(leaf_a.node_b, NodeId::new(1));
        assert_eq!(leaf_a.distance, 0.0);
        assert!(leaf_a.diff.is_empty());

        assert!(matches.iter().all(|m| m.node_a != NodeId::new(4)));

        let clade = matches.iter().find(|m| m.node_a == NodeId::new(2)).expect("(B,C)");
        assert_eq!(clade.node_b, NodeId::new(2));
        assert_eq!(clade.distance, 0.5);
        assert_eq!(names(&clade.diff), vec!["C", "D"]);
    }

    #[test]
    fn ties_go_to_the_lowest_partner_id() {
        let a = parse_newick("(A,B);", InternalLabels::Support).expect("a");
        let b = parse_newick("((A,C),(B,D));", InternalLabels::Support).expect("b");
        let matches = LeafSetDiff.diff(&a, &b, &DiffRequest::default());
        let root = matches.iter().find(|m| m.node_a == NodeId::ROOT).expect("root");
        // {A,B} vs root {A,B,C,D} = 0.5, vs (A,C) = 0.5, vs (B,D) = 0.5.
        assert_eq!(root.node_b, NodeId::ROOT);
    }

    #[test]
    fn reduce_matrix_drops_perfect_matches() {
        let a = parse_newick("(A,(B,C));", InternalLabels::Support).expect("a");
        let request = DiffRequest {
            options: DiffOptions { reduce_matrix: true, ..DiffOptions::default() },
            ..DiffRequest::default()
        };
        assert!(LeafSetDiff.diff(&a, &a.clone(), &request).is_empty());
    }

    #[test]
    fn support_penalty_applies_only_when_enabled() {
        let a = parse_newick("((A,B)0.9,C);", InternalLabels::Support).expect("a");
        let b = parse_newick("((A,B)0.8,C);", InternalLabels::Support).expect("b");
        let mut request = DiffRequest { distance: DistanceFn::EuclideanSupport, ..DiffRequest::default() };

        let clade = |request: &DiffRequest| {
            LeafSetDiff
                .diff(&a, &b, request)
                .into_iter()
                .find(|m| m.node_a == NodeId::new(1))
                .map(|m| (m.node_b, m.distance))
                .expect("clade match")
        };
        assert_eq!(clade(&request), (NodeId::new(1), 0.0));
        request.options.support = true;
        let (node_b, distance) = clade(&request);
        assert_eq!(node_b, NodeId::new(1));
        assert!((distance - 0.05).abs() < 1e-9);
    }

    #[test]
    fn compares_feature_attributes() {
        let a = parse_newick("(A[&&NHX:sp=x],B[&&NHX:sp=y]);", InternalLabels::Support).expect("a");
        let b = parse_newick("(P[&&NHX:sp=y],Q[&&NHX:sp=x]);", InternalLabels::Support).expect("b");
        let request = DiffRequest {
            attr1: LeafAttribute::Feature("sp".to_owned()),
            attr2: LeafAttribute::Feature("sp".to_owned()),
            ..DiffRequest::default()
        };
        let matches = LeafSetDiff.diff(&a, &b, &request);
        let leaf_a = matches.iter().find(|m| m.node_a == NodeId::new(1)).expect("A");
        assert_eq!(leaf_a.node_b, NodeId::new(2));
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn parallel_and_sequential_reports_agree(#[case] jobs: usize) {
        let a = parse_newick("((A,B),(C,(D,E)),F);", InternalLabels::Support).expect("a");
        let b = parse_newick("((A,C),(B,(D,F)),E);", InternalLabels::Support).expect("b");
        let sequential = LeafSetDiff.diff(&a, &b, &DiffRequest::default());
        let request = DiffRequest {
            options: DiffOptions { jobs, ..DiffOptions::default() },
            ..DiffRequest::default()
        };
        assert_eq!(LeafSetDiff.diff(&a, &b, &request), sequential);
    }
}
