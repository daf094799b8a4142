// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use super::{DiffEngine, DiffRequest, MatchRecord};
use crate::model::{CorrelationRecord, NodeId, PhyloTree, SessionId, TreeSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// Distinct source nodes whose record was overwritten.
    pub written: usize,
    /// Matches dropped because a node reference did not resolve.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSummary {
    pub session_a: SessionId,
    pub session_b: SessionId,
    pub a_to_b: MergeReport,
    pub b_to_a: MergeReport,
}

/// One direction of the comparison, `a` against `b`.
pub(crate) fn compute_diff(
    engine: &dyn DiffEngine,
    a: &PhyloTree,
    b: &PhyloTree,
    request: &DiffRequest,
) -> Vec<MatchRecord> {
    engine.diff(a, b, request)
}

/// Writes `matches` into the session's correlation store.
///
/// Nodes not mentioned keep their record; a node mentioned twice keeps the later match.
pub(crate) fn merge_matches(
    session: &mut TreeSession,
    partner_tree: &PhyloTree,
    matches: &[MatchRecord],
) -> MergeReport {
    let mut written = BTreeSet::<NodeId>::new();
    let mut skipped = 0;

    for record in matches {
        if session.find_node(record.node_a).is_err() || partner_tree.node(record.node_b).is_none() {
            skipped += 1;
            continue;
        }
        let correlation = CorrelationRecord::matched(
            record.node_b,
            record.distance,
            record.side1.clone(),
            record.side2.clone(),
            record.diff.clone(),
        );
        if session.correlation_mut().overwrite(record.node_a, correlation) {
            written.insert(record.node_a);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::warn!(
            session_id = %session.session_id(),
            skipped,
            "diff matches referenced unknown nodes; merged the rest"
        );
    }
    MergeReport { written: written.len(), skipped }
}

/// Diffs both directions and links the two sessions.
///
/// Each session is locked on its own, first to snapshot its tree and later to merge; the two
/// locks are never held together.
pub fn pair_and_diff(
    engine: &dyn DiffEngine,
    a: &Mutex<TreeSession>,
    b: &Mutex<TreeSession>,
    request: &DiffRequest,
) -> PairSummary {
    let (session_a, tree_a) = snapshot(a);
    let (session_b, tree_b) = snapshot(b);

    let forward = compute_diff(engine, &tree_a, &tree_b, request);
    let backward = compute_diff(engine, &tree_b, &tree_a, &reversed(request));

    let a_to_b = {
        let mut guard = a.lock().unwrap_or_else(PoisonError::into_inner);
        guard.attach_partner(session_b.clone());
        merge_matches(&mut guard, &tree_b, &forward)
    };
    let b_to_a = {
        let mut guard = b.lock().unwrap_or_else(PoisonError::into_inner);
        guard.attach_partner(session_a.clone());
        merge_matches(&mut guard, &tree_a, &backward)
    };

    tracing::info!(
        session_a = %session_a,
        session_b = %session_b,
        distance = %request.distance,
        a_to_b = a_to_b.written,
        b_to_a = b_to_a.written,
        "sessions paired"
    );
    PairSummary { session_a, session_b, a_to_b, b_to_a }
}

/// The same request seen from tree B: each selector stays with its own tree.
fn reversed(request: &DiffRequest) -> DiffRequest {
    DiffRequest { attr1: request.attr2.clone(), attr2: request.attr1.clone(), ..request.clone() }
}

fn snapshot(session: &Mutex<TreeSession>) -> (SessionId, PhyloTree) {
    let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
    (guard.session_id().clone(), guard.tree().clone())
}
