// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::actions::ActionFailure;
use crate::format::TreeParseError;
use crate::model::{ActionId, NodeId, SessionId};
use crate::render::RenderError;

/// Whether a failure was caused by the request or by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Caller,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("cannot create session {session_id}: {source}")]
    Parse {
        session_id: SessionId,
        #[source]
        source: TreeParseError,
    },
    #[error("node {node_id} not found in session {session_id}")]
    NodeNotFound { session_id: SessionId, node_id: NodeId },
    #[error("action {action_id} is not registered for session {session_id}")]
    ActionNotFound { session_id: SessionId, action_id: ActionId },
    #[error("action {action_id} failed in session {session_id}: {source}")]
    ActionExecution {
        session_id: SessionId,
        action_id: ActionId,
        #[source]
        source: ActionFailure,
    },
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("cannot render session {session_id}: {source}")]
    Render {
        session_id: SessionId,
        #[source]
        source: RenderError,
    },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. }
            | Self::NodeNotFound { .. }
            | Self::ActionNotFound { .. }
            | Self::SessionNotFound(_) => ErrorKind::Caller,
            Self::ActionExecution { .. } | Self::Render { .. } => ErrorKind::Internal,
        }
    }
}
