//! Scene tree → Vello drawing commands.
//!
//! Paints the same three layers as the SVG export. The host owns the
//! wgpu surface and presents the scene.

use crate::scene::{ContainerVisual, HANDLE_RADIUS_PX, LinkVisual, NodeVisual, SceneTree};
use archie_core::{Color as DocColor, LinkStyle};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Paint the whole tree into `scene`.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_scene(scene: &mut Scene, tree: &SceneTree, viewport: Rect) {
    scene.fill(Fill::NonZero, Affine::IDENTITY, to_color(tree.background), None, &viewport);

    let view = view_affine(tree);
    for c in &tree.containers {
        paint_container(scene, view, c);
    }
    for l in &tree.links {
        paint_link(scene, view, l, tree.background);
    }
    for n in &tree.nodes {
        paint_node(scene, view, n);
    }
    paint_overlay(scene, view, tree);
}

fn view_affine(tree: &SceneTree) -> Affine {
    let t = tree.transform;
    Affine::new([
        t.scale as f64,
        0.0,
        0.0,
        t.scale as f64,
        t.translate_x as f64,
        t.translate_y as f64,
    ])
}

// ─── Layer painters ──────────────────────────────────────────────────────────

fn paint_container(scene: &mut Scene, view: Affine, c: &ContainerVisual) {
    let shape = c.outline();
    scene.fill(Fill::NonZero, view, to_color(c.fill), None, &shape);
    scene.stroke(&KurboStroke::new(c.stroke_width), view, to_color(c.stroke), None, &shape);
    // Labels are drawn by the SVG backend; glyph runs need a host font context.
    if !c.label.is_empty() {
        log::trace!("container label {:?} at ({}, {})", c.label, c.rect.x0, c.rect.y0);
    }
}

fn paint_link(scene: &mut Scene, view: Affine, l: &LinkVisual, background: DocColor) {
    let path = l.route.to_path();
    let color = to_color(l.color);

    if l.style == LinkStyle::Double {
        scene.stroke(&KurboStroke::new(l.width * 3.0), view, color, None, &path);
        scene.stroke(&KurboStroke::new(l.width), view, to_color(background), None, &path);
    } else {
        let stroke = KurboStroke::new(l.width).with_dashes(0.0, l.dashes().iter().copied());
        scene.stroke(&stroke, view, color, None, &path);
    }

    scene.fill(Fill::NonZero, view, color, None, &triangle(l.end_arrow));
    if let Some(arrow) = l.start_arrow {
        scene.fill(Fill::NonZero, view, color, None, &triangle(arrow));
    }

    if let Some(chip) = &l.label {
        let shape = chip.rect.to_rounded_rect(4.0);
        scene.fill(Fill::NonZero, view, to_color(chip.fill), None, &shape);
        // Chip text is drawn by the SVG backend only.
        log::trace!("link label {:?} at {:?}", chip.text, chip.rect.center());
    }
}

fn paint_node(scene: &mut Scene, view: Affine, n: &NodeVisual) {
    let shape = n.outline();
    scene.fill(Fill::NonZero, view, to_color(n.fill), None, &shape);
    scene.stroke(&KurboStroke::new(n.stroke_width), view, to_color(n.stroke), None, &shape);
    // Node labels: SVG backend only.
}

fn paint_overlay(scene: &mut Scene, view: Affine, tree: &SceneTree) {
    let outline = to_color(tree.selection_color);
    for h in &tree.handles {
        let center = view * h.center;
        let dot = Circle::new(center, HANDLE_RADIUS_PX);
        scene.fill(Fill::NonZero, Affine::IDENTITY, to_color(tree.handle_fill), None, &dot);
        scene.stroke(&KurboStroke::new(1.5), Affine::IDENTITY, outline, None, &dot);
    }
    if let Some((rect, fill)) = tree.marquee {
        scene.fill(Fill::NonZero, view, to_color(fill), None, &rect);
        scene.stroke(&KurboStroke::new(1.0 / view.as_coeffs()[0]), view, outline, None, &rect);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn triangle([a, b, c]: [Point; 3]) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    path.line_to(b);
    path.line_to(c);
    path.close_path();
    path
}

fn to_color(c: DocColor) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}
