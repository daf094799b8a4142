// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::Arc;

use super::correlation::CorrelationStore;
use super::ids::{NodeId, SessionId};
use super::style::StylePreset;
use super::tree::{Node, PhyloTree};
use crate::actions::ActionRegistry;
use crate::error::CoreError;
use crate::format::{TreeParseError, TreeParser};

/// Raw text a session is created from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeSource {
    pub tree_text: String,
    pub alignment: Option<String>,
}

impl TreeSource {
    pub fn new(tree_text: impl Into<String>) -> Self {
        Self { tree_text: tree_text.into(), alignment: None }
    }

    pub fn with_alignment(mut self, alignment: impl Into<String>) -> Self {
        self.alignment = Some(alignment.into());
        self
    }
}

/// Hook run once on a freshly parsed tree, before ids are handed out to callers.
pub type Predraw = Arc<dyn Fn(&mut PhyloTree) + Send + Sync>;

/// Registry, style and hook every new session starts with.
#[derive(Clone)]
pub struct SessionDefaults {
    pub actions: Arc<ActionRegistry>,
    pub style: StylePreset,
    pub predraw: Option<Predraw>,
}

impl SessionDefaults {
    pub fn new(actions: Arc<ActionRegistry>) -> Self {
        Self { actions, style: StylePreset::default(), predraw: None }
    }

    pub fn with_style(mut self, style: StylePreset) -> Self {
        self.style = style;
        self
    }

    pub fn with_predraw(mut self, predraw: impl Fn(&mut PhyloTree) + Send + Sync + 'static) -> Self {
        self.predraw = Some(Arc::new(predraw));
        self
    }
}

impl fmt::Debug for SessionDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDefaults")
            .field("actions", &self.actions.tag())
            .field("style", &self.style)
            .field("predraw", &self.predraw.is_some())
            .finish()
    }
}

/// One loaded tree plus its correlation state, style and action registry.
#[derive(Debug, Clone)]
pub struct TreeSession {
    session_id: SessionId,
    tree: PhyloTree,
    style: StylePreset,
    actions: Arc<ActionRegistry>,
    partner: Option<SessionId>,
    correlation: CorrelationStore,
}

impl TreeSession {
    /// Parses `source` (primary format first, plain topology second) and starts every node
    /// unmatched.
    pub fn create(
        source: &TreeSource,
        session_id: SessionId,
        defaults: &SessionDefaults,
        parser: &dyn TreeParser,
    ) -> Result<Self, CoreError> {
        let mut tree = match parser.parse_primary(&source.tree_text, source.alignment.as_deref()) {
            Ok(tree) => tree,
            Err(primary) => {
                tracing::debug!(session_id = %session_id, error = %primary, "primary parse failed; retrying as plain topology");
                parser.parse_topology(&source.tree_text).map_err(|fallback| CoreError::Parse {
                    session_id: session_id.clone(),
                    source: TreeParseError { primary, fallback },
                })?
            }
        };

        if let Some(predraw) = &defaults.predraw {
            predraw(&mut tree);
        }

        let correlation = CorrelationStore::with_unmatched(tree.len());
        tracing::info!(
            session_id = %session_id,
            nodes = tree.len(),
            leaves = tree.leaves().len(),
            registry = %defaults.actions.tag(),
            "session created"
        );

        Ok(Self {
            session_id,
            tree,
            style: defaults.style,
            actions: Arc::clone(&defaults.actions),
            partner: None,
            correlation,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn tree(&self) -> &PhyloTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PhyloTree {
        &mut self.tree
    }

    pub fn find_node(&self, node_id: NodeId) -> Result<&Node, CoreError> {
        self.tree.node(node_id).ok_or_else(|| CoreError::NodeNotFound {
            session_id: self.session_id.clone(),
            node_id,
        })
    }

    pub fn style(&self) -> StylePreset {
        self.style
    }

    pub fn set_style(&mut self, style: StylePreset) {
        self.style = style;
    }

    pub fn actions(&self) -> &Arc<ActionRegistry> {
        &self.actions
    }

    pub fn partner(&self) -> Option<&SessionId> {
        self.partner.as_ref()
    }

    pub fn attach_partner(&mut self, partner: SessionId) {
        self.partner = Some(partner);
    }

    pub fn correlation(&self) -> &CorrelationStore {
        &self.correlation
    }

    pub fn correlation_mut(&mut self) -> &mut CorrelationStore {
        &mut self.correlation
    }

    /// Split borrow used by dispatch: the tree and style are mutated while the correlation
    /// store is read.
    pub(crate) fn parts_mut(&mut self) -> (&mut PhyloTree, &mut StylePreset, &CorrelationStore) {
        (&mut self.tree, &mut self.style, &self.correlation)
    }
}
