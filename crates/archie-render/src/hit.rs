//! Hit testing: document point → entity lookup.
//!
//! Walks the scene tree front-to-back (nodes, then link hit-paths, then
//! containers) so the topmost painted entity wins.

use crate::scene::{Corner, HANDLE_RADIUS_PX, SceneTree};
use archie_core::{Bounds, EntityId, EntityRef};
use kurbo::{Point, Shape};

/// Find the topmost entity at document point `p`. `tolerance` widens link
/// hit-paths, in document units.
pub fn hit_test(scene: &SceneTree, p: Point, tolerance: f64) -> Option<EntityRef> {
    if let Some(n) = scene.nodes.iter().rev().find(|n| n.outline().contains(p)) {
        return Some(EntityRef::node(n.id));
    }
    if let Some(l) = scene.links.iter().rev().find(|l| {
        l.route.distance_to(p) <= l.hit_width / 2.0 + tolerance
            || l.label.as_ref().is_some_and(|chip| chip.rect.contains(p))
    }) {
        return Some(EntityRef::link(l.id));
    }
    scene
        .containers
        .iter()
        .rev()
        .find(|c| c.rect.contains(p))
        .map(|c| EntityRef::container(c.id))
}

/// Resize handle under document point `p`. The grab radius is fixed in
/// screen pixels, so it shrinks in document units as the view zooms in.
pub fn hit_test_handle(scene: &SceneTree, p: Point) -> Option<(EntityId, Corner)> {
    let radius = HANDLE_RADIUS_PX / scene.transform.scale as f64;
    scene
        .handles
        .iter()
        .find(|h| h.center.distance(p) <= radius)
        .map(|h| (h.node, h.corner))
}

/// Every node and container whose bounds intersect `rect`, in paint order.
/// Used for marquee selection.
pub fn hit_test_rect(scene: &SceneTree, rect: Bounds) -> Vec<EntityRef> {
    let mut out: Vec<EntityRef> = scene
        .containers
        .iter()
        .filter(|c| crate::scene::to_bounds(c.rect).intersects(&rect))
        .map(|c| EntityRef::container(c.id))
        .collect();
    out.extend(
        scene
            .nodes
            .iter()
            .filter(|n| crate::scene::to_bounds(n.rect).intersects(&rect))
            .map(|n| EntityRef::node(n.id)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneInput, build_scene};
    use crate::theme::Theme;
    use archie_core::{Container, ContainerKind, Document, Link, Node, ViewTransform};

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn doc() -> Document {
        let mut doc = Document::new("hit");
        doc.containers.push(Container::new(
            id("h_c"),
            "VPC",
            ContainerKind::Region,
            Bounds::new(-100.0, -100.0, 600.0, 300.0),
        ));
        doc.nodes.push(Node::new(id("h_a"), "A", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(id("h_b"), "B", 300.0, 0.0, 100.0, 60.0));
        doc.links.push(Link::new(id("h_ab"), id("h_a"), id("h_b")));
        doc
    }

    #[test]
    fn nodes_beat_links_beat_containers() {
        let doc = doc();
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));

        assert_eq!(hit_test(&tree, Point::new(10.0, 10.0), 0.0), Some(EntityRef::node(id("h_a"))));
        assert_eq!(hit_test(&tree, Point::new(150.0, 2.0), 0.0), Some(EntityRef::link(id("h_ab"))));
        assert_eq!(
            hit_test(&tree, Point::new(150.0, 120.0), 0.0),
            Some(EntityRef::container(id("h_c")))
        );
        assert_eq!(hit_test(&tree, Point::new(900.0, 900.0), 0.0), None);
    }

    #[test]
    fn handle_radius_is_screen_space() {
        let doc = doc();
        let theme = Theme::light();
        let selection = [id("h_a")];
        let mut input = SceneInput {
            selection: &selection,
            resizing: Some(id("h_a")),
            ..SceneInput::new(&doc, &theme)
        };
        let corner = Point::new(50.0, 30.0);

        let tree = build_scene(&input);
        assert_eq!(
            hit_test_handle(&tree, Point::new(54.0, 30.0)),
            Some((id("h_a"), Corner::BottomRight))
        );

        input.transform = ViewTransform::new(0.0, 0.0, 4.0);
        let zoomed = build_scene(&input);
        assert_eq!(hit_test_handle(&zoomed, Point::new(54.0, 30.0)), None);
        assert!(hit_test_handle(&zoomed, corner).is_some());
    }

    #[test]
    fn marquee_collects_intersections() {
        let doc = doc();
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));
        let hits = hit_test_rect(&tree, Bounds::new(240.0, -10.0, 20.0, 20.0));
        assert_eq!(hits, vec![EntityRef::container(id("h_c")), EntityRef::node(id("h_b"))]);
    }
}
