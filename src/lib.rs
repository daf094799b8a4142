// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Phylodiff: side-by-side phylogenetic tree comparison.
//!
//! Two trees are loaded as sessions, diffed against each other, and served as images with a
//! clickable overlay. Clicking a node lists the actions registered for it; running one mutates
//! the session (or, on the target side, the correlated node) and returns a fresh render.

pub mod actions;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod http;
pub mod layout;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod render;
pub mod service;
pub mod store;

pub use error::{CoreError, ErrorKind};
pub use service::{CompareService, LoadRequest, RegistryScope};
