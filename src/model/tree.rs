// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::ids::NodeId;
use super::style::NodeStyle;

/// One node of a [`PhyloTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: SmolStr,
    support: Option<f64>,
    dist: Option<f64>,
    sequence: Option<String>,
    features: BTreeMap<String, String>,
    style: NodeStyle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn support(&self) -> Option<f64> {
        self.support
    }

    pub fn dist(&self) -> Option<f64> {
        self.dist
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn set_sequence(&mut self, sequence: Option<String>) {
        self.sequence = sequence;
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut NodeStyle {
        &mut self.style
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }
}

/// Mutable node description used while a tree is being parsed.
///
/// Drafts may be created in any order; [`TreeBuilder::build`] renumbers them in preorder.
#[derive(Debug, Clone, Default)]
pub struct NodeDraft {
    pub name: SmolStr,
    pub support: Option<f64>,
    pub dist: Option<f64>,
    pub features: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct TreeBuilder {
    drafts: Vec<NodeDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeBuildError {
    #[error("tree has no nodes")]
    Empty,
    #[error("tree has {0} nodes, more than node ids can address")]
    TooLarge(usize),
    #[error("draft {0} is not reachable from the root")]
    Unreachable(usize),
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a draft below `parent` (or as the root when `None`) and returns its draft index.
    pub fn add(&mut self, parent: Option<usize>) -> usize {
        let index = self.drafts.len();
        self.drafts.push(NodeDraft { parent, ..NodeDraft::default() });
        if let Some(parent) = parent {
            self.drafts[parent].children.push(index);
        }
        index
    }

    pub fn draft_mut(&mut self, index: usize) -> &mut NodeDraft {
        &mut self.drafts[index]
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Assigns node ids by preorder traversal from draft 0 (root = 0, children in order).
    ///
    /// Fails instead of producing a partially numbered tree.
    pub fn build(self) -> Result<PhyloTree, TreeBuildError> {
        if self.drafts.is_empty() {
            return Err(TreeBuildError::Empty);
        }
        if u32::try_from(self.drafts.len()).is_err() {
            return Err(TreeBuildError::TooLarge(self.drafts.len()));
        }

        let mut order = Vec::with_capacity(self.drafts.len());
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.drafts[index].children.iter().rev().copied());
        }
        if order.len() != self.drafts.len() {
            let mut seen = vec![false; self.drafts.len()];
            for index in &order {
                seen[*index] = true;
            }
            let missing = seen.iter().position(|seen| !seen).unwrap_or(0);
            return Err(TreeBuildError::Unreachable(missing));
        }

        let mut new_ids = vec![NodeId::ROOT; self.drafts.len()];
        for (position, draft_index) in order.iter().enumerate() {
            new_ids[*draft_index] = NodeId::new(position as u32);
        }

        let mut drafts = self.drafts.into_iter().map(Some).collect::<Vec<_>>();
        let mut nodes = Vec::with_capacity(order.len());
        for draft_index in order {
            let Some(draft) = drafts[draft_index].take() else {
                return Err(TreeBuildError::Unreachable(draft_index));
            };
            nodes.push(Node {
                id: new_ids[draft_index],
                name: draft.name,
                support: draft.support,
                dist: draft.dist,
                sequence: None,
                features: draft.features,
                style: NodeStyle::default(),
                parent: draft.parent.map(|parent| new_ids[parent]),
                children: draft.children.iter().map(|child| new_ids[*child]).collect(),
            });
        }

        Ok(PhyloTree { nodes })
    }
}

/// Arena-backed rooted tree. Node ids are indexes into the arena and are never reassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct PhyloTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetachError {
    #[error("the root node cannot be detached")]
    Root,
    #[error("node {0} is already detached")]
    AlreadyDetached(NodeId),
    #[error("node {0} does not exist")]
    Missing(NodeId),
}

impl PhyloTree {
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Number of nodes ever assigned an id, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(node_id.index())
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id.index())
    }

    /// All nodes in id order, detached ones included.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Whether `node_id` is still reachable from the root.
    pub fn is_attached(&self, node_id: NodeId) -> bool {
        let mut current = node_id;
        loop {
            if current == NodeId::ROOT {
                return true;
            }
            match self.node(current).and_then(Node::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Preorder traversal of the subtree rooted at `start`.
    pub fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(start).is_none() {
            return out;
        }
        let mut stack = vec![start];
        while let Some(node_id) = stack.pop() {
            out.push(node_id);
            if let Some(node) = self.node(node_id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Preorder traversal of the attached tree.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(NodeId::ROOT)
    }

    pub fn leaves_under(&self, node_id: NodeId) -> Vec<NodeId> {
        self.preorder_from(node_id)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(Node::is_leaf))
            .collect()
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.leaves_under(NodeId::ROOT)
    }

    /// Number of edges between the root and `node_id`.
    pub fn depth(&self, node_id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(node_id).and_then(Node::parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).and_then(Node::parent);
        }
        depth
    }

    /// Values of `attribute` over the leaves below `node_id`. Leaves lacking the attribute are
    /// skipped.
    pub fn leaf_attribute_set(
        &self,
        node_id: NodeId,
        attribute: &LeafAttribute,
    ) -> BTreeSet<SmolStr> {
        self.leaves_under(node_id)
            .into_iter()
            .filter_map(|leaf| self.node(leaf).and_then(|node| attribute.value_of(node)))
            .collect()
    }

    pub fn find_leaf_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|node| node.is_leaf() && node.name() == name).map(Node::id)
    }

    /// Cuts `node_id` (and its subtree) off its parent. Ids are left untouched; the detached
    /// nodes simply stop being reachable. Returns the former parent.
    pub fn detach(&mut self, node_id: NodeId) -> Result<NodeId, DetachError> {
        if node_id == NodeId::ROOT {
            return Err(DetachError::Root);
        }
        let node = self.node_mut(node_id).ok_or(DetachError::Missing(node_id))?;
        let parent = node.parent.take().ok_or(DetachError::AlreadyDetached(node_id))?;
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != node_id);
        }
        Ok(parent)
    }
}

/// Which per-leaf value the diff compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafAttribute {
    #[default]
    Name,
    Sequence,
    /// An NHX feature key (`[&&NHX:key=value]`).
    Feature(String),
}

impl LeafAttribute {
    pub fn value_of(&self, node: &Node) -> Option<SmolStr> {
        match self {
            Self::Name => (!node.name().is_empty()).then(|| node.name.clone()),
            Self::Sequence => node.sequence().map(SmolStr::new),
            Self::Feature(key) => node.features().get(key).map(SmolStr::new),
        }
    }
}

impl fmt::Display for LeafAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Sequence => f.write_str("sequence"),
            Self::Feature(key) => write!(f, "feature:{key}"),
        }
    }
}

impl FromStr for LeafAttribute {
    type Err = std::convert::Infallible;

    /// `name`, `sequence`, `feature:<key>`; any other string is taken as a feature key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "sequence" => Self::Sequence,
            other => Self::Feature(other.strip_prefix("feature:").unwrap_or(other).to_owned()),
        })
    }
}
