// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session owns one tree plus the correlation records that link its nodes to a partner tree.

pub mod correlation;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod session;
pub mod style;
pub mod tree;

pub use correlation::{CorrelationRecord, CorrelationStore, UNMATCHED_NODE_SENTINEL};
pub use ids::{ActionId, Id, IdError, NodeId, ParseNodeIdError, SessionId};
pub use session::{Predraw, SessionDefaults, TreeSession, TreeSource};
pub use style::{MarkerShape, NodeStyle, StylePreset};
pub use tree::{DetachError, LeafAttribute, Node, NodeDraft, PhyloTree, TreeBuildError, TreeBuilder};
