// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node actions: a shared registry of named, predicate-gated handlers plus the stock set.

pub mod builtin;
pub mod registry;

pub use builtin::{register_builtins, BuiltinAction, ParseBuiltinActionError};
pub use registry::{
    ActionEntry, ActionFailure, ActionRegistry, ActionTarget, NodeAction, NodePredicate,
    ParseNodePredicateError, PredicateFn,
};
