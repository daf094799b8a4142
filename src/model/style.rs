// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKGROUND: &str = "white";
pub const HIGHLIGHT_BACKGROUND: &str = "pink";

/// Tree-wide drawing preset.
///
/// Stored on the session so actions flip an explicit field instead of comparing style objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    /// Coloured leaf-name faces, internal names and support values.
    #[default]
    Annotated,
    /// Topology with bare leaf names.
    Plain,
}

impl StylePreset {
    pub fn toggled(self) -> Self {
        match self {
            Self::Annotated => Self::Plain,
            Self::Plain => Self::Annotated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Annotated => "annotated",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid style preset '{0}' (expected annotated/plain)")]
pub struct ParseStylePresetError(String);

impl FromStr for StylePreset {
    type Err = ParseStylePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annotated" => Ok(Self::Annotated),
            "plain" => Ok(Self::Plain),
            _ => Err(ParseStylePresetError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
}

/// Node-local presentation state. Actions mutate this; the renderer reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    bgcolor: String,
    size: u32,
    hz_line_width: u32,
    shape: MarkerShape,
    highlighted: bool,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            bgcolor: DEFAULT_BACKGROUND.to_owned(),
            size: 3,
            hz_line_width: 1,
            shape: MarkerShape::Circle,
            highlighted: false,
        }
    }
}

impl NodeStyle {
    pub fn bgcolor(&self) -> &str {
        &self.bgcolor
    }

    pub fn set_bgcolor(&mut self, bgcolor: impl Into<String>) {
        self.bgcolor = bgcolor.into();
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn hz_line_width(&self) -> u32 {
        self.hz_line_width
    }

    pub fn set_hz_line_width(&mut self, width: u32) {
        self.hz_line_width = width;
    }

    pub fn shape(&self) -> MarkerShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: MarkerShape) {
        self.shape = shape;
    }

    pub fn highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn has_background(&self) -> bool {
        self.bgcolor != DEFAULT_BACKGROUND
    }

    /// Pink background, enlarged marker, thick branch.
    pub fn apply_highlight(&mut self) {
        self.bgcolor = HIGHLIGHT_BACKGROUND.to_owned();
        self.size = 8;
        self.hz_line_width = 4;
        self.highlighted = true;
    }

    /// Plain background with the marker and branch hidden, as the highlight reset leaves leaves.
    pub fn clear_highlight(&mut self) {
        self.bgcolor = DEFAULT_BACKGROUND.to_owned();
        self.size = 0;
        self.hz_line_width = 0;
        self.highlighted = false;
    }
}
