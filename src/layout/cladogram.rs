// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::{NodeId, PhyloTree};

/// Pixel geometry of a rectangular cladogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CladogramGeometry {
    /// Vertical distance between two leaf rows.
    pub row_height: f64,
    /// Horizontal extent of the deepest branch tip.
    pub branch_width: f64,
    pub margin: f64,
}

impl Default for CladogramGeometry {
    fn default() -> Self {
        Self { row_height: 24.0, branch_width: 320.0, margin: 12.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    /// Branch tip (where the node marker sits).
    pub x: f64,
    pub y: f64,
    /// Where the node's branch starts; equals `x` for the root.
    pub parent_x: f64,
    /// Vertical span of the children connector; `None` for leaves.
    pub children_span: Option<(f64, f64)>,
    pub row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CladogramLayout {
    placements: BTreeMap<NodeId, NodePlacement>,
    rows: usize,
    tip_extent: f64,
}

impl CladogramLayout {
    pub fn placements(&self) -> &BTreeMap<NodeId, NodePlacement> {
        &self.placements
    }

    pub fn placement(&self, node_id: NodeId) -> Option<&NodePlacement> {
        self.placements.get(&node_id)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rightmost branch tip, in pixels.
    pub fn tip_extent(&self) -> f64 {
        self.tip_extent
    }
}

/// Lays out the attached part of `tree`.
///
/// Leaves get one row each in preorder. x follows cumulative branch length when any node carries
/// one (missing lengths count as zero), otherwise topological depth. Detached nodes get no
/// placement.
pub fn layout_cladogram(tree: &PhyloTree, geometry: &CladogramGeometry) -> CladogramLayout {
    let order = tree.preorder();
    let has_lengths = order.iter().any(|id| tree.node(*id).and_then(|n| n.dist()).is_some());

    let mut depth = BTreeMap::<NodeId, f64>::new();
    for node_id in &order {
        let Some(node) = tree.node(*node_id) else {
            continue;
        };
        let step = if has_lengths { node.dist().unwrap_or(0.0).max(0.0) } else { 1.0 };
        let value = match node.parent() {
            Some(parent) => depth.get(&parent).copied().unwrap_or(0.0) + step,
            None => 0.0,
        };
        depth.insert(*node_id, value);
    }

    let max_depth = depth.values().copied().fold(0.0_f64, f64::max);
    let scale = if max_depth > 0.0 { geometry.branch_width / max_depth } else { 0.0 };
    let to_x = |value: f64| geometry.margin + value * scale;

    let mut rows = 0usize;
    let mut leaf_rows = BTreeMap::<NodeId, usize>::new();
    for node_id in &order {
        if tree.node(*node_id).is_some_and(|node| node.is_leaf()) {
            leaf_rows.insert(*node_id, rows);
            rows += 1;
        }
    }

    let mut y = BTreeMap::<NodeId, f64>::new();
    let mut spans = BTreeMap::<NodeId, (f64, f64)>::new();
    for node_id in order.iter().rev() {
        let Some(node) = tree.node(*node_id) else {
            continue;
        };
        if let Some(row) = leaf_rows.get(node_id) {
            y.insert(*node_id, geometry.margin + (*row as f64 + 0.5) * geometry.row_height);
            continue;
        }
        let first = node.children().first().and_then(|c| y.get(c)).copied().unwrap_or(0.0);
        let last = node.children().last().and_then(|c| y.get(c)).copied().unwrap_or(first);
        spans.insert(*node_id, (first, last));
        y.insert(*node_id, (first + last) / 2.0);
    }

    let placements = order
        .iter()
        .filter_map(|node_id| {
            let node = tree.node(*node_id)?;
            let own = to_x(depth.get(node_id).copied().unwrap_or(0.0));
            let parent_x = node
                .parent()
                .and_then(|parent| depth.get(&parent))
                .map_or(own, |value| to_x(*value));
            Some((
                *node_id,
                NodePlacement {
                    x: own,
                    y: y.get(node_id).copied().unwrap_or(geometry.margin),
                    parent_x,
                    children_span: spans.get(node_id).copied(),
                    row: leaf_rows.get(node_id).copied(),
                },
            ))
        })
        .collect();

    CladogramLayout { placements, rows, tip_extent: to_x(max_depth) }
}

#[cfg(test)]
mod tests {
    use super::{layout_cladogram, CladogramGeometry};
    use crate::format::{parse_newick, InternalLabels};
    use crate::model::NodeId;

    fn geometry() -> CladogramGeometry {
        CladogramGeometry { row_height: 10.0, branch_width: 100.0, margin: 0.0 }
    }

    #[test]
    fn topology_layout_uses_depth_and_leaf_rows() {
        let tree = parse_newick("(A,(B,C));", InternalLabels::Support).expect("tree");
        let layout = layout_cladogram(&tree, &geometry());
        assert_eq!(layout.rows(), 3);

        let c = layout.placement(NodeId::new(4)).expect("C");
        assert_eq!((c.x, c.y, c.parent_x), (100.0, 25.0, 50.0));
        let inner = layout.placement(NodeId::new(2)).expect("(B,C)");
        assert_eq!(inner.y, 20.0);
        assert_eq!(inner.children_span, Some((15.0, 25.0)));
        let root = layout.placement(NodeId::ROOT).expect("root");
        assert_eq!((root.x, root.parent_x), (0.0, 0.0));
        assert_eq!(root.y, (5.0 + 20.0) / 2.0);
    }

    #[test]
    fn branch_lengths_drive_x_when_present() {
        let tree = parse_newick("(A:1,(B:1,C:3):1);", InternalLabels::Support).expect("tree");
        let layout = layout_cladogram(&tree, &geometry());
        assert_eq!(layout.placement(NodeId::new(4)).map(|p| p.x), Some(100.0));
        assert_eq!(layout.placement(NodeId::new(1)).map(|p| p.x), Some(25.0));
        assert_eq!(layout.tip_extent(), 100.0);
    }

    #[test]
    fn detached_nodes_are_not_placed() {
        let mut tree = parse_newick("(A,(B,C));", InternalLabels::Support).expect("tree");
        tree.detach(NodeId::new(2)).expect("detach");
        let layout = layout_cladogram(&tree, &geometry());
        assert_eq!(layout.placements().len(), 2);
        assert_eq!(layout.rows(), 1);
        assert!(layout.placement(NodeId::new(3)).is_none());
    }
}
