// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTML fragments served to the comparison page: the clickable image map over a rendered tree,
//! the page block around it, the action menu and the distance popup.

use std::fmt::Write as _;

use crate::dispatch::ActionMenuItem;
use crate::model::{CorrelationRecord, NodeId, SessionId, TreeSession};
use crate::render::{BoundingBox, Hotspot, RenderOutput};

/// Escapes text for an HTML attribute or element body.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes text for a quoted JavaScript string literal.
fn escape_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3C"),
            _ => out.push(ch),
        }
    }
    out
}

/// A JS string argument inside an HTML attribute.
fn js_arg(text: &str) -> String {
    escape_html(&escape_js(text))
}

fn format_distance(distance: Option<f64>) -> String {
    distance.map_or_else(|| "null".to_owned(), |value| format!("{value:.2}"))
}

fn write_area(
    out: &mut String,
    session_id: &str,
    partner_id: &str,
    hotspot: &Hotspot,
    record: &CorrelationRecord,
    own_box: &BoundingBox,
    partner_box: &BoundingBox,
) {
    let node_id = hotspot.node_id.to_string();
    let label = js_arg(hotspot.label.as_deref().unwrap_or(""));
    let sid = js_arg(session_id);
    let area = &hotspot.area;
    let _ = write!(
        out,
        concat!(
            r#"<AREA SHAPE="rect" COORDS="{},{},{},{}" "#,
            r#"onMouseLeave='hide_diff();' "#,
            r#"onMouseEnter='highlight_node("{}", "{}", "{}", "{}", "{}", {}, {}, {}, {}, {}, {}, {}, {}, {});' "#,
            r#"onClick='show_actions("{}", "{}", "{}");' "#,
            r#"href='javascript:void("{}");'>"#
        ),
        area.x1,
        area.y1,
        area.x2,
        area.y2,
        sid,
        js_arg(partner_id),
        node_id,
        record.target_node_id_or_sentinel(),
        label,
        own_box.x1,
        own_box.y1,
        own_box.width(),
        own_box.height(),
        partner_box.x1,
        partner_box.y1,
        partner_box.width(),
        partner_box.height(),
        format_distance(record.distance()),
        sid,
        node_id,
        label,
        node_id,
    );
}

/// Image map with one region per hotspot: node hotspots first, then faces, each in the order
/// the renderer emitted them.
///
/// `partner` is the partner tree's render, used to report where the correlated node sits on
/// the other side. Boxes that cannot be found are reported as zero-sized.
pub fn build_overlay(session: &TreeSession, own: &RenderOutput, partner: Option<&RenderOutput>) -> String {
    let session_id = session.session_id().as_str();
    let partner_id = session.partner().map_or("", SessionId::as_str);
    let unmatched = CorrelationRecord::unmatched();

    let mut out = format!(r#"<MAP NAME="map_{}" class="ete_tree_img">"#, escape_html(session_id));
    for hotspot in own.nodes.iter().chain(own.faces.iter()) {
        let record = session.correlation().get(hotspot.node_id).unwrap_or(&unmatched);
        let own_box = own.node_area(hotspot.node_id).copied().unwrap_or(BoundingBox::ZERO);
        let partner_box = record
            .target_node_id()
            .zip(partner)
            .and_then(|(target, render)| render.node_area(target).copied())
            .unwrap_or(BoundingBox::ZERO);
        write_area(&mut out, session_id, partner_id, hotspot, record, &own_box, &partner_box);
    }
    out.push_str("</MAP>");
    out
}

/// The overlay followed by the tree image inside the session's box.
pub fn render_page(session: &TreeSession, own: &RenderOutput, overlay: &str) -> String {
    let sid = escape_html(session.session_id().as_str());
    format!(
        concat!(
            r#"{overlay}<div id="box_{sid}">"#,
            r##"<img id="img_{sid}" class="ete_tree_img" USEMAP="#map_{sid}" onLoad="javascript:bind_popup();" src="{src}">"##,
            "</div>"
        ),
        overlay = overlay,
        sid = sid,
        src = escape_html(&own.image.data_url()),
    )
}

/// `run_action` links for every visible action on a node.
pub fn render_action_menu(
    session_id: &SessionId,
    partner_id: Option<&SessionId>,
    node_id: NodeId,
    target_node: i64,
    items: &[ActionMenuItem],
) -> String {
    let mut out = String::from("<ul class='ete_action_list'>");
    for item in items {
        let _ = write!(
            out,
            r#"<li><a onClick="run_action('{}', '{}', '{}', '{}', '', '{}');">{}</a></li>"#,
            js_arg(session_id.as_str()),
            js_arg(partner_id.map_or("", SessionId::as_str)),
            node_id,
            target_node,
            js_arg(item.action_id.as_str()),
            escape_html(&item.name),
        );
    }
    out.push_str("</ul>");
    out
}

pub fn render_distance(distance: Option<f64>) -> String {
    let text = distance.map_or_else(|| "none".to_owned(), |value| value.to_string());
    format!("<ul class='ete_action_list'><li><a>Distance: {text}</a></li></ul>")
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rstest::rstest;

    use super::{build_overlay, escape_html, render_action_menu, render_distance, render_page};
    use crate::dispatch::ActionMenuItem;
    use crate::model::fixtures::{defaults, session, sid, LEFT_NEWICK};
    use crate::model::{ActionId, CorrelationRecord, NodeId};
    use crate::render::{BoundingBox, EncodedImage, Hotspot, RenderOutput};

    fn hotspot(node_id: u32, label: &str) -> Hotspot {
        Hotspot {
            area: BoundingBox::new(0, 0, 10, 10),
            node_id: NodeId::new(node_id),
            label: (!label.is_empty()).then(|| label.to_owned()),
        }
    }

    fn output(nodes: Vec<Hotspot>, faces: Vec<Hotspot>, areas: &[(u32, BoundingBox)]) -> RenderOutput {
        RenderOutput {
            image: EncodedImage { mime: "image/svg+xml".to_owned(), base64: "PHN2Zy8+".to_owned() },
            nodes,
            faces,
            node_areas: areas.iter().map(|(id, area)| (NodeId::new(*id), *area)).collect::<BTreeMap<_, _>>(),
            width: 100,
            height: 100,
        }
    }

    fn enter_args(region: &str) -> Vec<String> {
        let start = region.find("highlight_node(").expect("highlight_node") + "highlight_node(".len();
        let end = region[start..].find(");").expect("close") + start;
        region[start..end].split(", ").map(|arg| arg.trim_matches('"').to_owned()).collect()
    }

    fn regions(html: &str) -> Vec<&str> {
        html.split("<AREA").skip(1).collect()
    }

    #[test]
    fn one_region_per_hotspot_in_emission_order() {
        let defaults = defaults();
        let mut s1 = session("s1", LEFT_NEWICK, &defaults);
        s1.attach_partner(sid("s2"));
        s1.correlation_mut().overwrite(
            NodeId::new(1),
            CorrelationRecord::matched(NodeId::new(1), 0.0, BTreeSet::new(), BTreeSet::new(), BTreeSet::new()),
        );

        let own = output(
            vec![hotspot(3, "B"), hotspot(1, "A"), hotspot(0, "")],
            vec![hotspot(1, "A"), hotspot(4, "C")],
            &[(1, BoundingBox::new(2, 4, 12, 24))],
        );
        let partner = output(vec![], vec![], &[(1, BoundingBox::new(5, 5, 15, 25))]);
        let html = build_overlay(&s1, &own, Some(&partner));

        assert!(html.starts_with(r#"<MAP NAME="map_s1" class="ete_tree_img">"#));
        assert!(html.ends_with("</MAP>"));
        let regions = regions(&html);
        assert_eq!(regions.len(), 5);
        let node_ids = regions.iter().map(|r| enter_args(r)[2].clone()).collect::<Vec<_>>();
        assert_eq!(node_ids, vec!["3", "1", "0", "1", "4"]);

        let a = enter_args(regions[1]);
        assert_eq!(a[0..5], ["s1", "s2", "1", "1", "A"]);
        assert_eq!(a[5..9], ["2", "4", "10", "20"]);
        assert_eq!(a[9..13], ["5", "5", "10", "20"]);
        assert_eq!(a[13], "0.00");

        let c = enter_args(regions[4]);
        assert_eq!(c[3], "-1");
        assert_eq!(c[5..13], ["0", "0", "0", "0", "0", "0", "0", "0"]);
        assert_eq!(c[13], "null");
    }

    #[test]
    fn labels_are_escaped_for_js_inside_html() {
        let defaults = defaults();
        let s1 = session("s1", LEFT_NEWICK, &defaults);
        let own = output(vec![hotspot(1, r#"x'y"z<b>"#)], vec![], &[]);
        let html = build_overlay(&s1, &own, None);
        assert!(html.contains(r#"x\&#39;y\&quot;z\x3Cb&gt;"#));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn page_wraps_image_in_the_session_box() {
        let defaults = defaults();
        let s1 = session("s1", LEFT_NEWICK, &defaults);
        let own = output(vec![], vec![], &[]);
        let page = render_page(&s1, &own, "<MAP></MAP>");
        assert!(page.starts_with("<MAP></MAP><div id=\"box_s1\">"));
        assert!(page.contains(r##"USEMAP="#map_s1""##));
        assert!(page.contains(r#"id="img_s1""#));
        assert!(page.contains("src=\"data:image/svg+xml;base64,PHN2Zy8+\""));
    }

    #[test]
    fn action_menu_links_every_item() {
        let items = vec![
            ActionMenuItem { action_id: ActionId::new("act_r1_AAAAAA").expect("id"), name: "Highlight".to_owned() },
            ActionMenuItem { action_id: ActionId::new("act_r1_BBBBBB").expect("id"), name: "A & B".to_owned() },
        ];
        let html = render_action_menu(&sid("t1"), Some(&sid("t2")), NodeId::new(3), -1, &items);
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains(r#"run_action('t1', 't2', '3', '-1', '', 'act_r1_AAAAAA');"#));
        assert!(html.contains(">A &amp; B</a>"));
        assert_eq!(render_action_menu(&sid("t1"), None, NodeId::ROOT, 0, &[]), "<ul class='ete_action_list'></ul>");
    }

    #[rstest]
    #[case(Some(0.5), "Distance: 0.5")]
    #[case(None, "Distance: none")]
    fn distance_popup(#[case] distance: Option<f64>, #[case] expected: &str) {
        assert!(render_distance(distance).contains(expected));
    }

    #[test]
    fn escape_html_covers_quotes() {
        assert_eq!(escape_html(r#"<a href="x">'"#), "&lt;a href=&quot;x&quot;&gt;&#39;");
    }
}
