// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Action lookup and execution against one session.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use smol_str::SmolStr;

use crate::actions::ActionTarget;
use crate::error::CoreError;
use crate::model::{ActionId, CorrelationStore, NodeId, TreeSession};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMenuItem {
    pub action_id: ActionId,
    pub name: String,
}

/// Which tree the clicked node id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// The id is a node of the session the action runs in.
    #[default]
    Source,
    /// The id is a node of the partner session and is redirected through its correlation.
    Target,
    /// Anything else: the handler runs without a node.
    Unbound,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Unbound => "unbound",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "source" => Self::Source,
            "target" => Self::Target,
            _ => Self::Unbound,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub action_id: ActionId,
    pub side: Side,
    /// Node the handler ran against, after any redirect.
    pub resolved_node: Option<NodeId>,
}

/// Actions whose predicate accepts `node_id`, in registry order.
pub fn available_actions(
    session: &TreeSession,
    node_id: NodeId,
) -> Result<Vec<ActionMenuItem>, CoreError> {
    let node = session.find_node(node_id)?;
    Ok(session
        .actions()
        .list_actions()
        .into_iter()
        .filter(|entry| entry.is_visible_for(node))
        .map(|entry| ActionMenuItem { action_id: entry.action_id().clone(), name: entry.name().to_owned() })
        .collect())
}

/// Runs `action_id` from the session's own registry.
///
/// `partner` is the partner session's correlation store, needed only for [`Side::Target`]. An
/// unknown action id fails before anything is touched; a handler failure leaves whatever the
/// handler already changed in place.
pub fn run_action(
    session: &mut TreeSession,
    action_id: &ActionId,
    node_id: NodeId,
    side: Side,
    partner: Option<&CorrelationStore>,
) -> Result<DispatchOutcome, CoreError> {
    let entry = session.actions().get(action_id).ok_or_else(|| CoreError::ActionNotFound {
        session_id: session.session_id().clone(),
        action_id: action_id.clone(),
    })?;

    let resolved_node = match side {
        Side::Source => Some(session.find_node(node_id)?.id()),
        Side::Target => partner
            .and_then(|store| store.get(node_id))
            .and_then(|record| record.target_node_id())
            .filter(|id| session.tree().node(*id).is_some()),
        Side::Unbound => None,
    };

    let session_id = session.session_id().clone();
    let empty = BTreeSet::<SmolStr>::new();
    let (tree, style, correlation) = session.parts_mut();
    let diff = resolved_node
        .and_then(|id| correlation.get(id))
        .map_or(&empty, |record| record.diff());

    entry
        .handler()
        .run(ActionTarget { tree, style, node: resolved_node, diff })
        .map_err(|source| CoreError::ActionExecution {
            session_id: session_id.clone(),
            action_id: action_id.clone(),
            source,
        })?;

    tracing::info!(
        session_id = %session_id,
        action = %entry.name(),
        side = %side,
        node = ?resolved_node,
        "action dispatched"
    );

    Ok(DispatchOutcome { action_id: action_id.clone(), side, resolved_node })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use proptest::prelude::*;
    use rstest::{fixture, rstest};
    use smol_str::SmolStr;

    use super::{available_actions, run_action, Side};
    use crate::actions::{ActionRegistry, BuiltinAction, NodePredicate};
    use crate::error::CoreError;
    use crate::model::fixtures::{random_newick, session, LEFT_NEWICK, RIGHT_NEWICK};
    use crate::model::{ActionId, CorrelationRecord, CorrelationStore, NodeId, SessionDefaults};

    #[fixture]
    fn registry() -> Arc<ActionRegistry> {
        Arc::new(ActionRegistry::new())
    }

    #[rstest]
    fn leaf_only_action_is_hidden_on_internal_nodes(registry: Arc<ActionRegistry>) {
        registry.add_action("Leaf only", NodePredicate::Leaf, BuiltinAction::ClearHighlight);
        let s1 = session("s1", LEFT_NEWICK, &SessionDefaults::new(registry));
        assert!(available_actions(&s1, NodeId::new(2)).expect("actions").is_empty());
        assert_eq!(available_actions(&s1, NodeId::new(3)).expect("actions").len(), 1);
    }

    #[rstest]
    fn available_actions_rejects_unknown_nodes(registry: Arc<ActionRegistry>) {
        let s1 = session("s1", LEFT_NEWICK, &SessionDefaults::new(registry));
        assert!(matches!(
            available_actions(&s1, NodeId::new(42)),
            Err(CoreError::NodeNotFound { .. })
        ));
    }

    #[rstest]
    fn unknown_action_fails_without_mutation(registry: Arc<ActionRegistry>) {
        BuiltinAction::DeleteNode.register(&registry);
        let mut s1 = session("s1", LEFT_NEWICK, &SessionDefaults::new(registry));
        let before = s1.tree().clone();
        let bogus = ActionId::new("act_nope_ZZZZZZ").expect("id");

        let err = run_action(&mut s1, &bogus, NodeId::new(1), Side::Source, None).unwrap_err();
        assert!(matches!(err, CoreError::ActionNotFound { .. }));
        assert_eq!(s1.tree(), &before);
    }

    #[test]
    fn action_ids_do_not_cross_registries() {
        let r1 = Arc::new(ActionRegistry::new());
        let r2 = Arc::new(ActionRegistry::new());
        let foreign = BuiltinAction::ChangeStyle.register(&r1);
        BuiltinAction::ChangeStyle.register(&r2);

        let mut s2 = session("s2", RIGHT_NEWICK, &SessionDefaults::new(r2));
        let err = run_action(&mut s2, &foreign, NodeId::ROOT, Side::Source, None).unwrap_err();
        assert!(matches!(err, CoreError::ActionNotFound { .. }));
    }

    #[rstest]
    fn source_side_passes_the_nodes_own_diff(registry: Arc<ActionRegistry>) {
        let show = BuiltinAction::ShowDifferences.register(&registry);
        let mut s1 = session("s1", LEFT_NEWICK, &SessionDefaults::new(registry));
        let diff = BTreeSet::from([SmolStr::new("C")]);
        let record = CorrelationRecord::matched(NodeId::new(2), 0.5, BTreeSet::new(), BTreeSet::new(), diff);
        s1.correlation_mut().overwrite(NodeId::new(2), record);

        let outcome = run_action(&mut s1, &show, NodeId::new(2), Side::Source, None).expect("run");
        assert_eq!(outcome.resolved_node, Some(NodeId::new(2)));
        let lit = s1
            .tree()
            .nodes()
            .filter(|node| node.style().highlighted())
            .map(|node| node.name().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(lit, vec!["C"]);
    }

    #[rstest]
    fn target_side_redirects_through_partner_correlation(registry: Arc<ActionRegistry>) {
        let toggle = BuiltinAction::ToggleHighlight.register(&registry);
        let defaults = SessionDefaults::new(registry);
        let mut s1 = session("s1", LEFT_NEWICK, &defaults);

        // Partner node 1 (its leaf A) maps to node 1 here.
        let mut partner = CorrelationStore::with_unmatched(5);
        partner.overwrite(
            NodeId::new(1),
            CorrelationRecord::matched(NodeId::new(1), 0.0, BTreeSet::new(), BTreeSet::new(), BTreeSet::new()),
        );

        let outcome =
            run_action(&mut s1, &toggle, NodeId::new(1), Side::Target, Some(&partner)).expect("run");
        assert_eq!(outcome.resolved_node, Some(NodeId::new(1)));
        assert!(s1.find_node(NodeId::new(1)).expect("A").style().highlighted());
    }

    #[rstest]
    #[case(Side::Target, true)]
    #[case(Side::Target, false)]
    #[case(Side::Unbound, true)]
    fn unresolved_targets_run_without_a_node(
        registry: Arc<ActionRegistry>,
        #[case] side: Side,
        #[case] with_partner: bool,
    ) {
        let style = BuiltinAction::ChangeStyle.register(&registry);
        let toggle = BuiltinAction::ToggleHighlight.register(&registry);
        let mut s1 = session("s1", LEFT_NEWICK, &SessionDefaults::new(registry));
        let partner = CorrelationStore::with_unmatched(5);
        let partner = with_partner.then_some(&partner);

        let outcome = run_action(&mut s1, &style, NodeId::new(4), side, partner).expect("run");
        assert_eq!(outcome.resolved_node, None);

        let err = run_action(&mut s1, &toggle, NodeId::new(4), side, partner).unwrap_err();
        assert!(matches!(err, CoreError::ActionExecution { .. }));
    }

    #[test]
    fn side_parsing_is_permissive() {
        assert_eq!("source".parse::<Side>().ok(), Some(Side::Source));
        assert_eq!(" target ".parse::<Side>().ok(), Some(Side::Target));
        assert_eq!("".parse::<Side>().ok(), Some(Side::Unbound));
        assert_eq!("left".parse::<Side>().ok(), Some(Side::Unbound));
    }

    fn predicate_strategy() -> impl Strategy<Value = NodePredicate> {
        prop_oneof![
            Just(NodePredicate::Always),
            Just(NodePredicate::Leaf),
            Just(NodePredicate::Internal),
            Just(NodePredicate::NonRoot),
        ]
    }

    proptest! {
        #[test]
        fn visibility_filter_matches_predicates(
            newick in random_newick(),
            predicates in prop::collection::vec(predicate_strategy(), 0..6),
        ) {
            let registry = Arc::new(ActionRegistry::new());
            for (index, predicate) in predicates.iter().enumerate() {
                registry.add_action(format!("a{index}"), predicate.clone(), BuiltinAction::ClearHighlight);
            }
            let s = session("p", &newick, &SessionDefaults::new(Arc::clone(&registry)));

            for node in s.tree().nodes() {
                let offered = available_actions(&s, node.id())
                    .expect("actions")
                    .into_iter()
                    .map(|item| item.action_id)
                    .collect::<Vec<_>>();
                let expected = registry
                    .list_actions()
                    .into_iter()
                    .filter(|entry| entry.predicate().evaluate(node))
                    .map(|entry| entry.action_id().clone())
                    .collect::<Vec<_>>();
                prop_assert_eq!(&offered, &expected);

                let always = registry
                    .list_actions()
                    .into_iter()
                    .filter(|entry| matches!(entry.predicate(), NodePredicate::Always))
                    .count();
                prop_assert!(offered.len() >= always);
            }
        }
    }
}
