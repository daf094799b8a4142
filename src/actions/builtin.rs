// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::registry::{ActionFailure, ActionRegistry, ActionTarget, NodeAction, NodePredicate};
use crate::model::{ActionId, NodeId, PhyloTree};

/// Stock actions the comparison view ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinAction {
    ChangeStyle,
    ShowDifferences,
    ClearHighlight,
    ToggleHighlight,
    DeleteNode,
}

impl BuiltinAction {
    pub const ALL: [Self; 5] = [
        Self::ChangeStyle,
        Self::ShowDifferences,
        Self::ClearHighlight,
        Self::ToggleHighlight,
        Self::DeleteNode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChangeStyle => "change_style",
            Self::ShowDifferences => "show_differences",
            Self::ClearHighlight => "clear_highlight",
            Self::ToggleHighlight => "toggle_highlight",
            Self::DeleteNode => "delete_node",
        }
    }

    /// Menu label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ChangeStyle => "Change style",
            Self::ShowDifferences => "Show differences",
            Self::ClearHighlight => "Clear highlight",
            Self::ToggleHighlight => "Highlight node",
            Self::DeleteNode => "Delete node",
        }
    }

    pub fn default_predicate(self) -> NodePredicate {
        match self {
            Self::DeleteNode => NodePredicate::NonRoot,
            _ => NodePredicate::Always,
        }
    }

    pub fn register(self, registry: &ActionRegistry) -> ActionId {
        registry.add_action(self.display_name(), self.default_predicate(), self)
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown built-in action '{0}'")]
pub struct ParseBuiltinActionError(String);

impl FromStr for BuiltinAction {
    type Err = ParseBuiltinActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseBuiltinActionError(s.to_owned()))
    }
}

/// Registers `actions` in order and returns their ids.
pub fn register_builtins(registry: &ActionRegistry, actions: &[BuiltinAction]) -> Vec<ActionId> {
    actions.iter().map(|action| action.register(registry)).collect()
}

fn clear_leaf_highlights(tree: &mut PhyloTree) {
    for leaf in tree.leaves() {
        if let Some(node) = tree.node_mut(leaf) {
            node.style_mut().clear_highlight();
        }
    }
}

impl NodeAction for BuiltinAction {
    fn run(&self, target: ActionTarget<'_>) -> Result<(), ActionFailure> {
        let ActionTarget { tree, style, node, diff } = target;
        match self {
            Self::ChangeStyle => {
                *style = style.toggled();
                Ok(())
            }
            Self::ClearHighlight => {
                clear_leaf_highlights(tree);
                Ok(())
            }
            Self::ShowDifferences => {
                clear_leaf_highlights(tree);
                let Some(node) = node else {
                    return Ok(());
                };
                for leaf in tree.leaves_under(node) {
                    if let Some(leaf_node) = tree.node_mut(leaf) {
                        if diff.contains(leaf_node.name()) {
                            leaf_node.style_mut().apply_highlight();
                        }
                    }
                }
                Ok(())
            }
            Self::ToggleHighlight => {
                let node = node.ok_or(ActionFailure::NodeRequired)?;
                let was_highlighted = tree
                    .node(node)
                    .map(|n| n.style().highlighted())
                    .ok_or(ActionFailure::NodeRequired)?;
                for id in tree.preorder_from(node) {
                    if let Some(descendant) = tree.node_mut(id) {
                        if was_highlighted {
                            descendant.style_mut().clear_highlight();
                        } else {
                            descendant.style_mut().apply_highlight();
                        }
                    }
                }
                Ok(())
            }
            Self::DeleteNode => {
                let node = node.ok_or(ActionFailure::NodeRequired)?;
                detach_pruning_empty_parents(tree, node)?;
                Ok(())
            }
        }
    }
}

/// Detaches `node_id` and then every ancestor left without children, stopping at the root.
fn detach_pruning_empty_parents(tree: &mut PhyloTree, node_id: NodeId) -> Result<(), ActionFailure> {
    let mut current = node_id;
    loop {
        let parent = tree.detach(current)?;
        let parent_is_empty = tree.node(parent).is_some_and(|node| node.children().is_empty());
        if parent == NodeId::ROOT || !parent_is_empty {
            return Ok(());
        }
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rstest::rstest;
    use smol_str::SmolStr;

    use super::BuiltinAction;
    use crate::actions::{ActionFailure, ActionRegistry, ActionTarget, NodeAction};
    use crate::format::{parse_newick, InternalLabels};
    use crate::model::{NodeId, PhyloTree, StylePreset};

    fn tree(src: &str) -> PhyloTree {
        parse_newick(src, InternalLabels::Support).expect("tree")
    }

    fn run(
        action: BuiltinAction,
        tree: &mut PhyloTree,
        style: &mut StylePreset,
        node: Option<NodeId>,
        diff: &BTreeSet<SmolStr>,
    ) -> Result<(), ActionFailure> {
        action.run(ActionTarget { tree, style, node, diff })
    }

    #[test]
    fn change_style_flips_the_preset() {
        let mut t = tree("(A,B);");
        let mut style = StylePreset::Annotated;
        run(BuiltinAction::ChangeStyle, &mut t, &mut style, None, &BTreeSet::new()).expect("run");
        assert_eq!(style, StylePreset::Plain);
        run(BuiltinAction::ChangeStyle, &mut t, &mut style, None, &BTreeSet::new()).expect("run");
        assert_eq!(style, StylePreset::Annotated);
    }

    #[test]
    fn show_differences_highlights_only_leaves_in_diff() {
        let mut t = tree("(A,(B,C));");
        let mut style = StylePreset::default();
        let diff = BTreeSet::from([SmolStr::new("C"), SmolStr::new("D")]);
        run(BuiltinAction::ShowDifferences, &mut t, &mut style, Some(NodeId::ROOT), &diff)
            .expect("run");

        let highlighted = t
            .nodes()
            .filter(|node| node.style().highlighted())
            .map(|node| node.name().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(highlighted, vec!["C"]);
        let leaf_a = t.find_leaf_by_name("A").and_then(|id| t.node(id)).expect("A");
        assert_eq!(leaf_a.style().size(), 0);
    }

    #[test]
    fn show_differences_without_node_only_clears() {
        let mut t = tree("(A,B);");
        let mut style = StylePreset::default();
        if let Some(node) = t.node_mut(NodeId::new(1)) {
            node.style_mut().apply_highlight();
        }
        let diff = BTreeSet::from([SmolStr::new("A")]);
        run(BuiltinAction::ShowDifferences, &mut t, &mut style, None, &diff).expect("run");
        assert!(t.nodes().all(|node| !node.style().highlighted()));
    }

    #[test]
    fn toggle_highlight_flips_the_whole_subtree() {
        let mut t = tree("(A,(B,C));");
        let mut style = StylePreset::default();
        let empty = BTreeSet::new();
        run(BuiltinAction::ToggleHighlight, &mut t, &mut style, Some(NodeId::new(2)), &empty)
            .expect("run");
        let lit = t.nodes().filter(|n| n.style().highlighted()).count();
        assert_eq!(lit, 3);

        run(BuiltinAction::ToggleHighlight, &mut t, &mut style, Some(NodeId::new(2)), &empty)
            .expect("run");
        assert!(t.nodes().all(|n| !n.style().highlighted()));
    }

    #[test]
    fn delete_node_prunes_emptied_ancestors() {
        let mut t = tree("(A,((B)));");
        let mut style = StylePreset::default();
        let leaf_b = t.find_leaf_by_name("B").expect("B");
        run(BuiltinAction::DeleteNode, &mut t, &mut style, Some(leaf_b), &BTreeSet::new())
            .expect("run");
        assert_eq!(t.leaves(), vec![NodeId::new(1)]);
        assert_eq!(t.preorder(), vec![NodeId::ROOT, NodeId::new(1)]);
        assert_eq!(t.len(), 5);
    }

    #[rstest]
    #[case(BuiltinAction::ToggleHighlight, None)]
    #[case(BuiltinAction::DeleteNode, None)]
    #[case(BuiltinAction::DeleteNode, Some(NodeId::ROOT))]
    fn node_bound_actions_fail_without_a_usable_node(
        #[case] action: BuiltinAction,
        #[case] node: Option<NodeId>,
    ) {
        let mut t = tree("(A,B);");
        let mut style = StylePreset::default();
        run(action, &mut t, &mut style, node, &BTreeSet::new()).unwrap_err();
    }

    #[test]
    fn builtins_parse_from_config_names() {
        for action in BuiltinAction::ALL {
            assert_eq!(action.as_str().parse::<BuiltinAction>().expect("parse"), action);
        }
        "explode".parse::<BuiltinAction>().unwrap_err();
    }

    #[test]
    fn register_builtins_keeps_order() {
        let registry = ActionRegistry::new();
        let ids = super::register_builtins(&registry, &BuiltinAction::ALL);
        let names = registry
            .list_actions()
            .iter()
            .map(|entry| entry.name().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids.len(), 5);
        assert_eq!(names[0], "Change style");
        assert_eq!(names[4], "Delete node");
    }
}
