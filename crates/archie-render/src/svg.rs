//! Scene tree → standalone SVG document.
//!
//! The drawing lives in one `<g id="archie-content">` holding exactly three
//! layer groups (containers, links, nodes), so an export collaborator can
//! clone that element, inline styles and rasterize it. Handles and the
//! marquee go into a separate overlay group.

use crate::scene::{ContainerVisual, HANDLE_RADIUS_PX, LinkVisual, NodeVisual, SceneTree};
use archie_core::{Color, LinkStyle, NodeShape, Viewport};
use std::collections::BTreeSet;

pub const CONTENT_GROUP_ID: &str = "archie-content";

pub fn render_svg(scene: &SceneTree, viewport: Viewport) -> String {
    let width = viewport.width;
    let height = viewport.height;
    let t = scene.transform;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("</style>\n");

    // One arrow marker per distinct link color.
    let colors: BTreeSet<String> = scene.links.iter().map(|l| hex_key(l.color)).collect();
    svg.push_str("<defs>\n");
    for key in &colors {
        svg.push_str(&format!(
            "  <marker id=\"archie-arrow-{key}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"10\" markerHeight=\"10\" markerUnits=\"userSpaceOnUse\" orient=\"auto-start-reverse\"><path d=\"M0,1 L10,5 L0,9 z\" fill=\"#{key}\"/></marker>\n"
        ));
    }
    svg.push_str("</defs>\n");

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        svg_color(scene.background)
    ));

    svg.push_str(&format!(
        "<g id=\"{CONTENT_GROUP_ID}\" transform=\"matrix({s} 0 0 {s} {tx} {ty})\">\n",
        s = t.scale,
        tx = t.translate_x,
        ty = t.translate_y
    ));

    svg.push_str("<g class=\"layer-containers\">\n");
    for c in &scene.containers {
        render_container(&mut svg, c);
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"layer-links\">\n");
    for l in &scene.links {
        render_link(&mut svg, l, scene.background);
    }
    svg.push_str("</g>\n");

    svg.push_str("<g class=\"layer-nodes\">\n");
    for n in &scene.nodes {
        render_node(&mut svg, n);
    }
    svg.push_str("</g>\n");
    svg.push_str("</g>\n");

    render_overlay(&mut svg, scene);
    svg.push_str("</svg>");
    svg
}

fn render_container(out: &mut String, c: &ContainerVisual) {
    out.push_str(&format!(
        "<g data-id=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        escape(c.id.as_str()),
        c.rect.x0,
        c.rect.y0,
        c.rect.width(),
        c.rect.height(),
        crate::scene::CONTAINER_RADIUS,
        svg_color(c.fill),
        svg_color(c.stroke),
        c.stroke_width
    ));
    if !c.label.is_empty() {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" font-weight=\"600\" fill=\"{}\">{}</text>",
            c.rect.x0 + 12.0,
            c.rect.y0 + 20.0,
            svg_color(c.text),
            escape(&c.label)
        ));
    }
    out.push_str("</g>\n");
}

fn render_link(out: &mut String, l: &LinkVisual, background: Color) {
    let d = l
        .route
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}{} {}", if i == 0 { "M" } else { "L" }, p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    let color = svg_color(l.color);
    let marker = format!("url(#archie-arrow-{})", hex_key(l.color));

    out.push_str(&format!("<g data-id=\"{}\">", escape(l.id.as_str())));
    out.push_str(&format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"transparent\" stroke-width=\"{}\" pointer-events=\"stroke\"/>",
        l.hit_width
    ));

    let dash = if l.dashes().is_empty() {
        String::new()
    } else {
        let pattern: Vec<String> = l.dashes().iter().map(|v| v.to_string()).collect();
        format!(" stroke-dasharray=\"{}\"", pattern.join(" "))
    };
    let start = if l.start_arrow.is_some() {
        format!(" marker-start=\"{marker}\"")
    } else {
        String::new()
    };

    if l.style == LinkStyle::Double {
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{}\"/>",
            l.width * 3.0
        ));
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" marker-end=\"{marker}\"{start}/>",
            svg_color(background),
            l.width
        ));
    } else {
        out.push_str(&format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{}\"{dash} marker-end=\"{marker}\"{start}/>",
            l.width
        ));
    }

    if let Some(chip) = &l.label {
        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\" fill=\"{}\"/>",
            chip.rect.x0,
            chip.rect.y0,
            chip.rect.width(),
            chip.rect.height(),
            svg_color(chip.fill)
        ));
        let c = chip.rect.center();
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"{}\">{}</text>",
            c.x,
            c.y,
            svg_color(chip.color),
            escape(&chip.text)
        ));
    }
    out.push_str("</g>\n");
}

fn render_node(out: &mut String, n: &NodeVisual) {
    let style = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        svg_color(n.fill),
        svg_color(n.stroke),
        n.stroke_width
    );
    let c = n.rect.center();
    out.push_str(&format!("<g data-id=\"{}\"", escape(n.id.as_str())));
    if !n.type_tag.is_empty() {
        out.push_str(&format!(" data-type=\"{}\"", escape(&n.type_tag)));
    }
    out.push('>');
    match n.shape {
        NodeShape::Rectangle => out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" {style}/>",
            n.rect.x0,
            n.rect.y0,
            n.rect.width(),
            n.rect.height(),
            crate::scene::NODE_RADIUS
        )),
        NodeShape::Ellipse => out.push_str(&format!(
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {style}/>",
            c.x,
            c.y,
            n.rect.width() / 2.0,
            n.rect.height() / 2.0
        )),
        NodeShape::Diamond => out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" transform=\"rotate({} {} {})\" {style}/>",
            n.rect.x0,
            n.rect.y0,
            n.rect.width(),
            n.rect.height(),
            n.rotation(),
            c.x,
            c.y
        )),
    }
    if !n.label.is_empty() {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"13\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"{}\">{}</text>",
            c.x,
            c.y,
            svg_color(n.text),
            escape(&n.label)
        ));
    }
    out.push_str("</g>\n");
}

fn render_overlay(out: &mut String, scene: &SceneTree) {
    if scene.handles.is_empty() && scene.marquee.is_none() {
        return;
    }
    let t = scene.transform;
    out.push_str("<g id=\"archie-overlay\">\n");
    for h in &scene.handles {
        let (sx, sy) = t.to_screen(h.center.x as f32, h.center.y as f32);
        out.push_str(&format!(
            "<circle cx=\"{sx}\" cy=\"{sy}\" r=\"{HANDLE_RADIUS_PX}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            svg_color(scene.handle_fill),
            svg_color(scene.selection_color)
        ));
    }
    if let Some((rect, fill)) = scene.marquee {
        let (x, y) = t.to_screen(rect.x0 as f32, rect.y0 as f32);
        let s = t.scale as f64;
        out.push_str(&format!(
            "<rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            rect.width() * s,
            rect.height() * s,
            svg_color(fill),
            svg_color(scene.selection_color)
        ));
    }
    out.push_str("</g>\n");
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn svg_color(c: Color) -> String {
    let [r, g, b, a] = c.to_rgba8();
    if a == 255 {
        format!("#{r:02X}{g:02X}{b:02X}")
    } else {
        format!("rgba({r}, {g}, {b}, {:.3})", c.a.clamp(0.0, 1.0))
    }
}

/// Marker id suffix for a color (`RRGGBB`).
fn hex_key(c: Color) -> String {
    let [r, g, b, _] = c.to_rgba8();
    format!("{r:02X}{g:02X}{b:02X}")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneInput, build_scene};
    use crate::theme::Theme;
    use archie_core::{Document, EntityId, Link, Node};

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn svg_for(doc: &Document) -> String {
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(doc, &theme));
        render_svg(&tree, Viewport::default())
    }

    #[test]
    fn content_group_has_three_layers() {
        let mut doc = Document::new("svg");
        doc.nodes.push(Node::new(id("v_a"), "A", 0.0, 0.0, 100.0, 60.0));
        let svg = svg_for(&doc);
        assert_eq!(svg.matches("id=\"archie-content\"").count(), 1);
        let layers = ["layer-containers", "layer-links", "layer-nodes"];
        let positions: Vec<usize> = layers.iter().map(|l| svg.find(l).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn labels_are_escaped() {
        let mut doc = Document::new("svg");
        doc.nodes.push(Node::new(id("v_x"), "<script>&", 0.0, 0.0, 100.0, 60.0));
        let svg = svg_for(&doc);
        assert!(svg.contains("&lt;script&gt;&amp;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn bidirectional_links_get_both_markers() {
        let mut doc = Document::new("svg");
        doc.nodes.push(Node::new(id("v_p"), "P", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(id("v_q"), "Q", 300.0, 0.0, 100.0, 60.0));
        let mut l = Link::new(id("v_pq"), id("v_p"), id("v_q"));
        l.bidirectional = true;
        doc.links.push(l);
        let svg = svg_for(&doc);
        assert!(svg.contains("marker-start="));
        assert!(svg.contains("marker-end="));
        assert!(svg.contains("<marker id=\"archie-arrow-"));
    }
}
