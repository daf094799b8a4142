// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use proptest::prelude::*;

use super::ids::SessionId;
use super::session::{SessionDefaults, TreeSession, TreeSource};
use crate::actions::ActionRegistry;
use crate::format::NewickParser;

pub(crate) const LEFT_NEWICK: &str = "(A,(B,C));";
pub(crate) const RIGHT_NEWICK: &str = "(A,(B,D));";

pub(crate) fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

pub(crate) fn defaults() -> SessionDefaults {
    SessionDefaults::new(Arc::new(ActionRegistry::new()))
}

pub(crate) fn session(id: &str, newick: &str, defaults: &SessionDefaults) -> TreeSession {
    TreeSession::create(&TreeSource::new(newick), sid(id), defaults, &NewickParser)
        .expect("fixture session")
}

/// Newick strings of up to four levels with one to three children per internal node.
pub(crate) fn random_newick() -> impl Strategy<Value = String> {
    let leaf = "[A-Z][a-z0-9_]{0,5}";
    leaf.prop_recursive(4, 48, 3, |inner| {
        prop::collection::vec(inner, 1..4).prop_map(|children| format!("({})", children.join(",")))
    })
    .prop_map(|body| format!("{body};"))
}
