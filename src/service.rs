// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The operations the transport exposes, composed from sessions, dispatch, diff and rendering.

use std::sync::{Arc, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::diff::{pair_and_diff, DiffEngine, DiffRequest, LeafSetDiff, PairSummary};
use crate::dispatch::{self, Side};
use crate::error::CoreError;
use crate::format::{NewickParser, TreeParser};
use crate::model::{
    ActionId, CorrelationStore, NodeId, SessionDefaults, SessionId, TreeSession, TreeSource,
};
use crate::overlay::{build_overlay, render_action_menu, render_distance, render_page};
use crate::render::{RenderOutput, Renderer, SvgRenderer};
use crate::store::{SessionStore, SharedSession};

/// Whether loaded sessions share the default action registry or get their own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryScope {
    /// Every session holds the default registry; changes to it show up everywhere.
    #[default]
    Shared,
    /// Each session gets a fork of the default registry with its own action ids.
    PerSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub session_id: SessionId,
    pub source: TreeSource,
}

#[derive(Debug)]
pub struct CompareService {
    store: SessionStore,
    defaults: SessionDefaults,
    scope: RegistryScope,
    diff_request: DiffRequest,
    parser: Arc<dyn TreeParser>,
    renderer: Arc<dyn Renderer>,
    engine: Arc<dyn DiffEngine>,
}

impl CompareService {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            store: SessionStore::default(),
            defaults,
            scope: RegistryScope::default(),
            diff_request: DiffRequest::default(),
            parser: Arc::new(NewickParser),
            renderer: Arc::new(SvgRenderer::default()),
            engine: Arc::new(LeafSetDiff),
        }
    }

    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_scope(mut self, scope: RegistryScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_diff_request(mut self, request: DiffRequest) -> Self {
        self.diff_request = request;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn TreeParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn DiffEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    pub fn scope(&self) -> RegistryScope {
        self.scope
    }

    fn defaults_for(&self, scope: RegistryScope) -> SessionDefaults {
        match scope {
            RegistryScope::Shared => self.defaults.clone(),
            RegistryScope::PerSession => SessionDefaults {
                actions: Arc::new(self.defaults.actions.fork()),
                ..self.defaults.clone()
            },
        }
    }

    /// Creates both sessions, replaces any sessions with the same ids and diffs them in both
    /// directions. Nothing is stored unless both trees parse.
    pub fn load_pair(
        &self,
        left: &LoadRequest,
        right: &LoadRequest,
        scope: Option<RegistryScope>,
    ) -> Result<PairSummary, CoreError> {
        let scope = scope.unwrap_or(self.scope);
        let left_session = TreeSession::create(
            &left.source,
            left.session_id.clone(),
            &self.defaults_for(scope),
            self.parser.as_ref(),
        )?;
        let right_session = TreeSession::create(
            &right.source,
            right.session_id.clone(),
            &self.defaults_for(scope),
            self.parser.as_ref(),
        )?;

        let left_handle = self.store.insert(left_session);
        let right_handle = self.store.insert(right_session);
        Ok(pair_and_diff(self.engine.as_ref(), &left_handle, &right_handle, &self.diff_request))
    }

    fn session(&self, session_id: &SessionId) -> Result<SharedSession, CoreError> {
        self.store.get(session_id)
    }

    /// The partner handle, provided the partner still names `own_id` as its own partner.
    ///
    /// Reloading one side of a pair under a new partner leaves the other side pointing at a
    /// session that has moved on; that side is treated as unpaired.
    fn mutual_partner(&self, own_id: &SessionId, partner_id: Option<&SessionId>) -> Option<SharedSession> {
        let partner_id = partner_id?;
        let Ok(handle) = self.store.get(partner_id) else {
            tracing::debug!(partner = %partner_id, "partner session no longer loaded");
            return None;
        };
        let mutual = handle.lock().unwrap_or_else(PoisonError::into_inner).partner() == Some(own_id);
        if !mutual {
            tracing::debug!(
                session_id = %own_id,
                partner = %partner_id,
                "partner was re-paired; treating session as unpaired"
            );
            return None;
        }
        Some(handle)
    }

    fn render_partner(
        &self,
        own_id: &SessionId,
        partner_id: Option<&SessionId>,
    ) -> Result<Option<RenderOutput>, CoreError> {
        let Some(partner) = self.mutual_partner(own_id, partner_id) else {
            return Ok(None);
        };
        let partner = partner.lock().unwrap_or_else(PoisonError::into_inner);
        self.renderer
            .render(partner.tree(), partner.style())
            .map(Some)
            .map_err(|source| CoreError::Render { session_id: partner.session_id().clone(), source })
    }

    /// Image plus image map for one session.
    pub fn draw(&self, session_id: &SessionId) -> Result<String, CoreError> {
        let handle = self.session(session_id)?;
        let partner_id = handle.lock().unwrap_or_else(PoisonError::into_inner).partner().cloned();
        let partner_render = self.render_partner(session_id, partner_id.as_ref())?;

        let session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let own = self
            .renderer
            .render(session.tree(), session.style())
            .map_err(|source| CoreError::Render { session_id: session_id.clone(), source })?;
        let overlay = build_overlay(&session, &own, partner_render.as_ref());
        Ok(render_page(&session, &own, &overlay))
    }

    /// Menu of actions visible on `node_id`.
    pub fn actions_menu(&self, session_id: &SessionId, node_id: NodeId) -> Result<String, CoreError> {
        let handle = self.session(session_id)?;
        let session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let items = dispatch::available_actions(&session, node_id)?;
        let target = session
            .correlation()
            .get(node_id)
            .map_or(crate::model::UNMATCHED_NODE_SENTINEL, |record| record.target_node_id_or_sentinel());
        Ok(render_action_menu(session.session_id(), session.partner(), node_id, target, &items))
    }

    /// Runs an action and returns the re-rendered page.
    pub fn run_action(
        &self,
        session_id: &SessionId,
        node_id: NodeId,
        action_id: &ActionId,
        side: Side,
    ) -> Result<String, CoreError> {
        let handle = self.session(session_id)?;

        let partner_correlation = if side == Side::Target {
            let partner_id = handle.lock().unwrap_or_else(PoisonError::into_inner).partner().cloned();
            self.partner_correlation(session_id, partner_id.as_ref())
        } else {
            None
        };

        {
            let mut session = handle.lock().unwrap_or_else(PoisonError::into_inner);
            dispatch::run_action(&mut session, action_id, node_id, side, partner_correlation.as_ref())?;
        }
        self.draw(session_id)
    }

    fn partner_correlation(
        &self,
        own_id: &SessionId,
        partner_id: Option<&SessionId>,
    ) -> Option<CorrelationStore> {
        let partner = self.mutual_partner(own_id, partner_id)?;
        let partner = partner.lock().unwrap_or_else(PoisonError::into_inner);
        Some(partner.correlation().clone())
    }

    /// Distance popup for a node's correlation.
    pub fn distance(&self, session_id: &SessionId, node_id: NodeId) -> Result<String, CoreError> {
        let handle = self.session(session_id)?;
        let session = handle.lock().unwrap_or_else(PoisonError::into_inner);
        session.find_node(node_id)?;
        let distance = session.correlation().get(node_id).and_then(|record| record.distance());
        Ok(render_distance(distance))
    }

    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired(Instant::now())
    }
}
