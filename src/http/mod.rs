// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTTP surface for the comparison page.
//!
//! Routes accept JSON or urlencoded bodies and answer with HTML fragments. Every response
//! carries permissive CORS headers so the page can be served from anywhere.

mod server;
mod types;

pub use server::{router, ApiError, FormOrJson};
pub use types::{DrawTreeParams, LoadTreesParams, NodeParams, RunActionParams, Scalar};
