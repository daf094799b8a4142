// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::error::CoreError;
use crate::model::{SessionId, TreeSession};

/// A session handle; lock it for any read or mutation.
pub type SharedSession = Arc<Mutex<TreeSession>>;

#[derive(Debug)]
struct Slot {
    session: SharedSession,
    last_access: Mutex<Instant>,
}

/// Process-wide table of loaded sessions.
///
/// The table has its own lock and every session its own mutex, so work on one session never
/// blocks lookups of another. With a TTL configured, [`SessionStore::evict_expired`] drops
/// sessions nobody touched for that long; handles already handed out stay usable.
#[derive(Debug, Default)]
pub struct SessionStore {
    ttl: Option<Duration>,
    slots: RwLock<HashMap<SessionId, Slot>>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { ttl, slots: RwLock::new(HashMap::new()) }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Stores `session` under its own id, replacing any previous session with that id.
    pub fn insert(&self, session: TreeSession) -> SharedSession {
        self.insert_at(session, Instant::now())
    }

    pub fn insert_at(&self, session: TreeSession, now: Instant) -> SharedSession {
        let session_id = session.session_id().clone();
        let shared = Arc::new(Mutex::new(session));
        let slot = Slot { session: Arc::clone(&shared), last_access: Mutex::new(now) };
        let replaced = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), slot)
            .is_some();
        if replaced {
            tracing::debug!(session_id = %session_id, "session replaced");
        }
        shared
    }

    pub fn get(&self, session_id: &SessionId) -> Result<SharedSession, CoreError> {
        self.get_at(session_id, Instant::now())
    }

    /// Looks up a session and marks it as used at `now`.
    pub fn get_at(&self, session_id: &SessionId, now: Instant) -> Result<SharedSession, CoreError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let slot = slots
            .get(session_id)
            .ok_or_else(|| CoreError::SessionNotFound(session_id.clone()))?;
        *slot.last_access.lock().unwrap_or_else(PoisonError::into_inner) = now;
        Ok(Arc::clone(&slot.session))
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).contains_key(session_id)
    }

    pub fn remove(&self, session_id: &SessionId) -> Option<SharedSession> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .map(|slot| slot.session)
    }

    /// Drops sessions idle for longer than the TTL. Returns how many were removed; always zero
    /// without a TTL.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|session_id, slot| {
            let last = *slot.last_access.lock().unwrap_or_else(PoisonError::into_inner);
            let keep = now.saturating_duration_since(last) <= ttl;
            if !keep {
                tracing::info!(session_id = %session_id, "session evicted after idle timeout");
            }
            keep
        });
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loaded session ids, sorted.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }
}
