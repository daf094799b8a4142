// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::ids::NodeId;

/// Value written into overlay markup for a node without a partner match.
pub const UNMATCHED_NODE_SENTINEL: i64 = -1;

/// Link between one node and its counterpart in the partner tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationRecord {
    target_node_id: Option<NodeId>,
    distance: Option<f64>,
    side1: Option<BTreeSet<SmolStr>>,
    side2: Option<BTreeSet<SmolStr>>,
    diff: BTreeSet<SmolStr>,
}

impl CorrelationRecord {
    /// The state every node starts in: no partner, no distance, empty diff.
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn matched(
        target_node_id: NodeId,
        distance: f64,
        side1: BTreeSet<SmolStr>,
        side2: BTreeSet<SmolStr>,
        diff: BTreeSet<SmolStr>,
    ) -> Self {
        Self {
            target_node_id: Some(target_node_id),
            distance: Some(distance),
            side1: Some(side1),
            side2: Some(side2),
            diff,
        }
    }

    pub fn target_node_id(&self) -> Option<NodeId> {
        self.target_node_id
    }

    /// Partner id as emitted to the front end, `-1` when unmatched.
    pub fn target_node_id_or_sentinel(&self) -> i64 {
        self.target_node_id.map_or(UNMATCHED_NODE_SENTINEL, |id| i64::from(id.get()))
    }

    pub fn is_matched(&self) -> bool {
        self.target_node_id.is_some()
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn side1(&self) -> Option<&BTreeSet<SmolStr>> {
        self.side1.as_ref()
    }

    pub fn side2(&self) -> Option<&BTreeSet<SmolStr>> {
        self.side2.as_ref()
    }

    pub fn diff(&self) -> &BTreeSet<SmolStr> {
        &self.diff
    }
}

/// Per-tree correlation table: exactly one record per assigned node id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationStore {
    records: BTreeMap<NodeId, CorrelationRecord>,
}

impl CorrelationStore {
    /// A store with an unmatched record for each of `node_count` preorder ids.
    pub fn with_unmatched(node_count: usize) -> Self {
        let records = (0..node_count)
            .map(|index| (NodeId::new(index as u32), CorrelationRecord::unmatched()))
            .collect();
        Self { records }
    }

    pub fn get(&self, node_id: NodeId) -> Option<&CorrelationRecord> {
        self.records.get(&node_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CorrelationRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Replaces the record of `node_id` entirely. Ids outside the table are ignored so the
    /// one-record-per-node invariant cannot be broken from here; returns whether it was written.
    pub fn overwrite(&mut self, node_id: NodeId, record: CorrelationRecord) -> bool {
        match self.records.get_mut(&node_id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn matched_count(&self) -> usize {
        self.records.values().filter(|record| record.is_matched()).count()
    }
}
