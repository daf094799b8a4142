// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Coordinate-only tree layout consumed by the renderer.

pub mod cladogram;

pub use cladogram::{layout_cladogram, CladogramGeometry, CladogramLayout, NodePlacement};
