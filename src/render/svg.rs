// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{BoundingBox, EncodedImage, Hotspot, RenderError, RenderOutput, RenderSettings, Renderer};
use crate::layout::{layout_cladogram, CladogramGeometry, NodePlacement};
use crate::model::{MarkerShape, Node, NodeId, PhyloTree, StylePreset};

pub const SVG_MIME: &str = "image/svg+xml";

const LABEL_GAP: f64 = 4.0;
const MIN_HOTSPOT: f64 = 6.0;

/// Rectangular cladogram drawn as SVG.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    settings: RenderSettings,
}

impl SvgRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.settings.char_width
    }
}

struct Palette {
    branch: &'static str,
    marker: &'static str,
    leaf_name: &'static str,
    internal_name: &'static str,
    support: &'static str,
}

fn palette(style: StylePreset) -> Palette {
    match style {
        StylePreset::Annotated => Palette {
            branch: "#333333",
            marker: "#1f77b4",
            leaf_name: "#1f4e79",
            internal_name: "#8c2d04",
            support: "#7f7f7f",
        },
        StylePreset::Plain => Palette {
            branch: "#000000",
            marker: "#000000",
            leaf_name: "#000000",
            internal_name: "#000000",
            support: "#000000",
        },
    }
}

struct Face {
    node_id: NodeId,
    text: String,
    x: f64,
    baseline: f64,
    color: &'static str,
    font_size: f64,
    area: BoundingBox,
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_support(support: f64) -> String {
    if support.fract() == 0.0 {
        format!("{support:.0}")
    } else {
        format!("{support:.2}")
    }
}

impl SvgRenderer {
    fn faces_for(&self, node: &Node, placement: &NodePlacement, palette: &Palette, style: StylePreset) -> Vec<Face> {
        let font = self.settings.font_size;
        let mut faces = Vec::new();
        let marker_half = f64::from(node.style().size()) / 2.0;

        if node.is_leaf() {
            if !node.name().is_empty() {
                let x = placement.x + marker_half + LABEL_GAP;
                let width = self.text_width(node.name());
                faces.push(Face {
                    node_id: node.id(),
                    text: node.name().to_owned(),
                    x,
                    baseline: placement.y + font / 3.0,
                    color: palette.leaf_name,
                    font_size: font,
                    area: BoundingBox::from_f64(x, placement.y - font / 2.0, x + width, placement.y + font / 2.0),
                });
            }
            return faces;
        }

        if style == StylePreset::Plain {
            return faces;
        }

        if !node.name().is_empty() {
            let x = placement.x + LABEL_GAP;
            let width = self.text_width(node.name());
            let baseline = placement.y - LABEL_GAP;
            faces.push(Face {
                node_id: node.id(),
                text: node.name().to_owned(),
                x,
                baseline,
                color: palette.internal_name,
                font_size: font,
                area: BoundingBox::from_f64(x, baseline - font, x + width, baseline),
            });
        }
        if let Some(support) = node.support() {
            let text = format_support(support);
            let small = font * 0.8;
            let x = placement.parent_x + 2.0;
            let baseline = placement.y - 2.0;
            let width = text.chars().count() as f64 * self.settings.char_width * 0.8;
            faces.push(Face {
                node_id: node.id(),
                text,
                x,
                baseline,
                color: palette.support,
                font_size: small,
                area: BoundingBox::from_f64(x, baseline - small, x + width, baseline),
            });
        }
        faces
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, tree: &PhyloTree, style: StylePreset) -> Result<RenderOutput, RenderError> {
        let settings = &self.settings;
        let geometry = CladogramGeometry {
            row_height: settings.row_height,
            branch_width: settings.branch_width,
            margin: settings.margin,
        };
        let layout = layout_cladogram(tree, &geometry);
        let palette = palette(style);
        let half_row = settings.row_height / 2.0;

        let mut node_hotspots = Vec::new();
        let mut faces = Vec::new();
        let mut own_extent = BTreeMap::<NodeId, BoundingBox>::new();

        for (node_id, placement) in layout.placements() {
            let Some(node) = tree.node(*node_id) else {
                continue;
            };
            let half = (f64::from(node.style().size()) / 2.0).max(MIN_HOTSPOT / 2.0);
            let marker = BoundingBox::from_f64(placement.x - half, placement.y - half, placement.x + half, placement.y + half);
            node_hotspots.push(Hotspot {
                area: marker,
                node_id: *node_id,
                label: (!node.name().is_empty()).then(|| node.name().to_owned()),
            });

            let mut extent = BoundingBox::from_f64(
                placement.parent_x,
                placement.y - half_row,
                placement.x + half,
                placement.y + half_row,
            );
            for face in self.faces_for(node, placement, &palette, style) {
                extent = extent.union(&face.area);
                faces.push(face);
            }
            own_extent.insert(*node_id, extent);
        }

        // Children come after their parent in preorder, so a reverse walk folds subtrees upward.
        let mut node_areas = own_extent;
        for node_id in tree.preorder().into_iter().rev() {
            let Some(node) = tree.node(node_id) else {
                continue;
            };
            let Some(mut area) = node_areas.get(&node_id).copied() else {
                continue;
            };
            for child in node.children() {
                if let Some(child_area) = node_areas.get(child) {
                    area = area.union(child_area);
                }
            }
            node_areas.insert(node_id, area);
        }

        let content = node_areas.values().fold(BoundingBox::ZERO, |acc, area| acc.union(area));
        let width = content.x2 + settings.margin.ceil() as i32;
        let height = ((layout.rows() as f64) * settings.row_height + 2.0 * settings.margin).ceil() as i32;
        let limit = settings.max_dimension;
        if width > limit || height > limit {
            return Err(RenderError::TooLarge { width, height, limit });
        }

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        );
        let _ = write!(svg, r#"<rect width="{width}" height="{height}" fill="white"/>"#);

        for node_id in layout.placements().keys() {
            let Some(node) = tree.node(*node_id) else {
                continue;
            };
            if node.style().has_background() {
                if let Some(area) = node_areas.get(node_id) {
                    let _ = write!(
                        svg,
                        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="0.6"/>"#,
                        area.x1,
                        area.y1,
                        area.width(),
                        area.height(),
                        xml_escape(node.style().bgcolor())
                    );
                }
            }
        }

        for (node_id, placement) in layout.placements() {
            let Some(node) = tree.node(*node_id) else {
                continue;
            };
            let stroke = node.style().hz_line_width().max(1);
            if placement.parent_x != placement.x {
                let _ = write!(
                    svg,
                    r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{stroke}"/>"#,
                    placement.parent_x, placement.y, placement.x, placement.y, palette.branch
                );
            }
            if let Some((top, bottom)) = placement.children_span {
                let _ = write!(
                    svg,
                    r#"<line x1="{:.1}" y1="{top:.1}" x2="{:.1}" y2="{bottom:.1}" stroke="{}" stroke-width="1"/>"#,
                    placement.x, placement.x, palette.branch
                );
            }

            let size = f64::from(node.style().size());
            if size > 0.0 {
                match node.style().shape() {
                    MarkerShape::Circle => {
                        let _ = write!(
                            svg,
                            r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
                            placement.x,
                            placement.y,
                            size / 2.0,
                            palette.marker
                        );
                    }
                    MarkerShape::Square => {
                        let _ = write!(
                            svg,
                            r#"<rect x="{:.1}" y="{:.1}" width="{size:.1}" height="{size:.1}" fill="{}"/>"#,
                            placement.x - size / 2.0,
                            placement.y - size / 2.0,
                            palette.marker
                        );
                    }
                }
            }
        }

        for face in &faces {
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}">{}</text>"#,
                face.x,
                face.baseline,
                face.font_size,
                face.color,
                xml_escape(&face.text)
            );
        }
        svg.push_str("</svg>");

        Ok(RenderOutput {
            image: EncodedImage { mime: SVG_MIME.to_owned(), base64: STANDARD.encode(svg.as_bytes()) },
            nodes: node_hotspots,
            faces: faces
                .into_iter()
                .map(|face| Hotspot { area: face.area, node_id: face.node_id, label: Some(face.text) })
                .collect(),
            node_areas,
            width,
            height,
        })
    }
}
