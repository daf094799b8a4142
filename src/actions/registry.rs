// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rand::Rng;
use smol_str::SmolStr;

use crate::model::{ActionId, DetachError, Node, NodeId, PhyloTree, StylePreset};

const ACTION_TOKEN_LEN: usize = 6;
const ACTION_TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static NEXT_REGISTRY_TAG: AtomicU64 = AtomicU64::new(1);

pub type PredicateFn = dyn Fn(&Node) -> bool + Send + Sync;

/// Decides whether an action is offered for a node.
#[derive(Clone)]
pub enum NodePredicate {
    Always,
    Leaf,
    Internal,
    NonRoot,
    Custom(Arc<PredicateFn>),
}

impl NodePredicate {
    pub fn custom(predicate: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    pub fn evaluate(&self, node: &Node) -> bool {
        match self {
            Self::Always => true,
            Self::Leaf => node.is_leaf(),
            Self::Internal => !node.is_leaf(),
            Self::NonRoot => !node.is_root(),
            Self::Custom(predicate) => predicate(node),
        }
    }
}

impl fmt::Debug for NodePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Leaf => f.write_str("Leaf"),
            Self::Internal => f.write_str("Internal"),
            Self::NonRoot => f.write_str("NonRoot"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node predicate '{0}' (expected always/leaf/internal/non_root)")]
pub struct ParseNodePredicateError(String);

impl FromStr for NodePredicate {
    type Err = ParseNodePredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "leaf" => Ok(Self::Leaf),
            "internal" => Ok(Self::Internal),
            "non_root" => Ok(Self::NonRoot),
            _ => Err(ParseNodePredicateError(s.to_owned())),
        }
    }
}

/// Everything a handler may touch: the session's tree and style, the resolved node (if any) and
/// the correlation diff set for that node.
#[derive(Debug)]
pub struct ActionTarget<'a> {
    pub tree: &'a mut PhyloTree,
    pub style: &'a mut StylePreset,
    pub node: Option<NodeId>,
    pub diff: &'a BTreeSet<SmolStr>,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    #[error("action requires a target node")]
    NodeRequired,
    #[error(transparent)]
    Detach(#[from] DetachError),
    #[error("{0}")]
    Other(String),
}

/// A node action handler. Handlers may change node-local presentation, the style preset or
/// detach nodes; they never renumber ids.
pub trait NodeAction: Send + Sync + fmt::Debug {
    fn run(&self, target: ActionTarget<'_>) -> Result<(), ActionFailure>;
}

#[derive(Debug, Clone)]
pub struct ActionEntry {
    action_id: ActionId,
    name: String,
    predicate: NodePredicate,
    handler: Arc<dyn NodeAction>,
}

impl ActionEntry {
    pub fn action_id(&self) -> &ActionId {
        &self.action_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> &NodePredicate {
        &self.predicate
    }

    pub fn handler(&self) -> &Arc<dyn NodeAction> {
        &self.handler
    }

    pub fn is_visible_for(&self, node: &Node) -> bool {
        self.predicate.evaluate(node)
    }
}

/// Named, predicate-gated node actions keyed by generated ids.
///
/// Registries are shared through `Arc`; every session holding the same instance observes
/// `add_action`/`clear` immediately. Ids embed a per-instance tag, so an id minted by one
/// registry never resolves in another.
#[derive(Debug)]
pub struct ActionRegistry {
    tag: String,
    entries: RwLock<Vec<ActionEntry>>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        let tag = NEXT_REGISTRY_TAG.fetch_add(1, Ordering::Relaxed);
        Self { tag: format!("r{tag}"), entries: RwLock::new(Vec::new()) }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn add_action(
        &self,
        name: impl Into<String>,
        predicate: NodePredicate,
        handler: impl NodeAction + 'static,
    ) -> ActionId {
        self.add_shared_action(name, predicate, Arc::new(handler))
    }

    pub fn add_shared_action(
        &self,
        name: impl Into<String>,
        predicate: NodePredicate,
        handler: Arc<dyn NodeAction>,
    ) -> ActionId {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let action_id = self.fresh_id(&entries);
        let name = name.into();
        tracing::debug!(action_id = %action_id, name = %name, registry = %self.tag, "action registered");
        entries.push(ActionEntry { action_id: action_id.clone(), name, predicate, handler });
        action_id
    }

    fn fresh_id(&self, entries: &[ActionEntry]) -> ActionId {
        let mut rng = rand::rng();
        loop {
            let token = (0..ACTION_TOKEN_LEN)
                .map(|_| {
                    let index = rng.random_range(0..ACTION_TOKEN_ALPHABET.len());
                    char::from(ACTION_TOKEN_ALPHABET[index])
                })
                .collect::<String>();
            let candidate = format!("act_{}_{token}", self.tag);
            if entries.iter().all(|entry| entry.action_id.as_str() != candidate) {
                if let Ok(action_id) = ActionId::new(candidate) {
                    return action_id;
                }
            }
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(registry = %self.tag, removed = entries.len(), "actions cleared");
        entries.clear();
    }

    /// Snapshot in registration order.
    pub fn list_actions(&self) -> Vec<ActionEntry> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get(&self, action_id: &ActionId) -> Option<ActionEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|entry| &entry.action_id == action_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A new registry with the same actions under freshly generated ids.
    pub fn fork(&self) -> Self {
        let forked = Self::new();
        for entry in self.list_actions() {
            forked.add_shared_action(entry.name, entry.predicate, entry.handler);
        }
        forked
    }
}

impl fmt::Display for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.list_actions() {
            writeln!(f, "{}: {} ({:?})", entry.action_id, entry.name, entry.predicate)?;
        }
        Ok(())
    }
}
