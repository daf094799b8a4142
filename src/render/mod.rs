// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tree rendering.
//!
//! A [`Renderer`] turns a tree into an encoded image plus the clickable geometry the overlay
//! builder needs: node and face hotspots in emission order and one bounding box per drawn node.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, PhyloTree, StylePreset};

pub mod svg;

pub use svg::SvgRenderer;

/// Axis-aligned pixel box, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub const ZERO: Self = Self { x1: 0, y1: 0, x2: 0, y2: 0 };

    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1: x1.min(x2), y1: y1.min(y2), x2: x1.max(x2), y2: y1.max(y2) }
    }

    pub(crate) fn from_f64(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1.floor() as i32, y1.floor() as i32, x2.ceil() as i32, y2.ceil() as i32)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

/// A clickable region tied to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    pub area: BoundingBox,
    pub node_id: NodeId,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime: String,
    pub base64: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub image: EncodedImage,
    /// Marker hotspots, one per drawn node.
    pub nodes: Vec<Hotspot>,
    /// Label hotspots (names, support values).
    pub faces: Vec<Hotspot>,
    pub node_areas: BTreeMap<NodeId, BoundingBox>,
    pub width: i32,
    pub height: i32,
}

impl RenderOutput {
    pub fn node_area(&self, node_id: NodeId) -> Option<&BoundingBox> {
        self.node_areas.get(&node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("image of {width}x{height} px exceeds the {limit} px limit")]
    TooLarge { width: i32, height: i32, limit: i32 },
}

pub trait Renderer: Send + Sync + fmt::Debug {
    fn render(&self, tree: &PhyloTree, style: StylePreset) -> Result<RenderOutput, RenderError>;
}

/// Sizes the built-in renderer works with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub row_height: f64,
    pub branch_width: f64,
    pub margin: f64,
    pub font_size: f64,
    /// Average glyph advance used to size label hotspots.
    pub char_width: f64,
    pub max_dimension: i32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            row_height: 24.0,
            branch_width: 320.0,
            margin: 12.0,
            font_size: 12.0,
            char_width: 7.0,
            max_dimension: 32_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingBox;

    #[test]
    fn bounding_box_normalises_corners() {
        let area = BoundingBox::new(10, 20, 4, 2);
        assert_eq!(area, BoundingBox { x1: 4, y1: 2, x2: 10, y2: 20 });
        assert_eq!((area.width(), area.height()), (6, 18));
        assert_eq!(BoundingBox::ZERO.width(), 0);
    }

    #[test]
    fn union_covers_both() {
        let a = BoundingBox::new(0, 0, 5, 5);
        let b = BoundingBox::new(3, -2, 9, 4);
        assert_eq!(a.union(&b), BoundingBox::new(0, -2, 9, 5));
    }

    #[test]
    fn from_f64_rounds_outwards() {
        assert_eq!(BoundingBox::from_f64(1.4, 2.6, 3.2, 4.0), BoundingBox::new(1, 2, 4, 4));
    }
}
