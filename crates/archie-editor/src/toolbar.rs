//! Contextual toolbar placement.

use crate::selection::Selection;
use archie_core::{Bounds, Document, ViewTransform};

/// Screen position of the contextual toolbar: the projected top-left
/// corner of the selected nodes' bounds, raised by `offset_px`. Falls back
/// to selected containers when no node is selected; `None` otherwise.
pub fn toolbar_anchor(
    selection: &Selection,
    doc: &Document,
    transform: &ViewTransform,
    offset_px: f32,
) -> Option<(f32, f32)> {
    let from_nodes = top_left(selection.nodes().filter_map(|id| doc.node(id)).map(|n| n.bounds()));
    let (x, y) = match from_nodes {
        Some(c) => c,
        None => top_left(
            selection
                .containers()
                .filter_map(|id| doc.container(id))
                .map(|c| c.bounds()),
        )?,
    };
    let (sx, sy) = transform.to_screen(x, y);
    Some((sx, sy - offset_px))
}

fn top_left(bounds: impl Iterator<Item = Bounds>) -> Option<(f32, f32)> {
    bounds
        .map(|b| (b.x, b.y))
        .reduce(|(ax, ay), (bx, by)| (ax.min(bx), ay.min(by)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archie_core::{Container, ContainerKind, EntityId, EntityRef, Link, Node};

    fn doc() -> Document {
        let mut doc = Document::new("toolbar");
        doc.nodes.push(Node::new(EntityId::intern("tb_a"), "A", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(EntityId::intern("tb_b"), "B", 300.0, -100.0, 100.0, 60.0));
        doc.links.push(Link::new(
            EntityId::intern("tb_ab"),
            EntityId::intern("tb_a"),
            EntityId::intern("tb_b"),
        ));
        doc.containers.push(Container::new(
            EntityId::intern("tb_c"),
            "C",
            ContainerKind::Region,
            Bounds::new(500.0, 500.0, 200.0, 100.0),
        ));
        doc
    }

    #[test]
    fn anchors_above_top_left_corner() {
        let doc = doc();
        let mut sel = Selection::new();
        sel.extend([
            EntityRef::node(EntityId::intern("tb_a")),
            EntityRef::node(EntityId::intern("tb_b")),
        ]);
        let t = ViewTransform::new(10.0, 20.0, 2.0);
        // min x = -50 (A), min y = -130 (B)
        assert_eq!(toolbar_anchor(&sel, &doc, &t, 48.0), Some((-90.0, -288.0)));
    }

    #[test]
    fn container_fallback_and_link_only() {
        let doc = doc();
        let mut sel = Selection::new();
        sel.replace(EntityRef::container(EntityId::intern("tb_c")));
        assert_eq!(
            toolbar_anchor(&sel, &doc, &ViewTransform::IDENTITY, 48.0),
            Some((500.0, 452.0))
        );
        sel.replace(EntityRef::link(EntityId::intern("tb_ab")));
        assert_eq!(toolbar_anchor(&sel, &doc, &ViewTransform::IDENTITY, 48.0), None);
    }
}
