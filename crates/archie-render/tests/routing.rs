//! Integration tests: document → scene → routed links.
//!
//! Exercises parallel-edge offsetting and arrowhead direction through the
//! full `build_scene` path.

use archie_core::{Document, EntityId};
use archie_render::kurbo::Point;
use archie_render::{LINK_SPACING, SceneInput, Theme, build_scene, render_svg};
use pretty_assertions::assert_eq;

fn id(s: &str) -> EntityId {
    EntityId::intern(s)
}

fn load(json: &str) -> Document {
    Document::from_json(json).unwrap()
}

// ─── Reciprocal pair ─────────────────────────────────────────────────────

#[test]
fn reciprocal_links_do_not_overlap() {
    let doc = load(include_str!("fixtures/reciprocal.json"));
    let theme = Theme::light();
    let tree = build_scene(&SceneInput::new(&doc, &theme));

    let ab = tree.link(id("a_to_b")).unwrap();
    let ba = tree.link(id("b_to_a")).unwrap();
    assert_ne!(ab.route.mid_x(), ba.route.mid_x());
    assert_eq!((ab.route.mid_x() - ba.route.mid_x()).abs(), LINK_SPACING);

    // Forward A→B ranks first, so it sits left of center.
    assert_eq!(ab.route.mid_x(), 150.0 - LINK_SPACING / 2.0);
    assert_eq!(ba.route.mid_x(), 150.0 + LINK_SPACING / 2.0);
}

#[test]
fn arrowheads_point_at_targets() {
    let doc = load(include_str!("fixtures/reciprocal.json"));
    let theme = Theme::light();
    let tree = build_scene(&SceneInput::new(&doc, &theme));

    let ab = tree.link(id("a_to_b")).unwrap();
    let [tip, left, right] = ab.end_arrow;
    assert_eq!(tip, Point::new(250.0, 0.0), "A→B ends on B's left edge");
    assert!(left.x < tip.x && right.x < tip.x, "points in +x");

    let ba = tree.link(id("b_to_a")).unwrap();
    let [tip, left, right] = ba.end_arrow;
    assert_eq!(tip, Point::new(50.0, 0.0), "B→A ends on A's right edge");
    assert!(left.x > tip.x && right.x > tip.x, "points in -x");

    assert!(ab.start_arrow.is_none() && ba.start_arrow.is_none());
}

// ─── Larger groups ───────────────────────────────────────────────────────

#[test]
fn parallel_group_spreads_by_spacing() {
    let doc = load(include_str!("fixtures/fan.json"));
    let theme = Theme::light();
    let tree = build_scene(&SceneInput::new(&doc, &theme));

    // Forward links in document order, then the backward one.
    let order = ["q1", "q2", "q4", "q3"];
    let mids: Vec<f64> = order.iter().map(|n| tree.link(id(n)).unwrap().route.mid_x()).collect();
    for pair in mids.windows(2) {
        assert!((pair[1] - pair[0] - LINK_SPACING).abs() < 1e-9, "{mids:?}");
    }
    let center: f64 = mids.iter().sum::<f64>() / mids.len() as f64;
    assert!((center - 200.0).abs() < 1e-9, "group is centered on the gap midpoint");
}

#[test]
fn routes_follow_moved_nodes() {
    let mut doc = load(include_str!("fixtures/reciprocal.json"));
    let theme = Theme::light();
    let before = build_scene(&SceneInput::new(&doc, &theme));
    doc.node_mut(id("B")).unwrap().y = 200.0;
    let after = build_scene(&SceneInput::new(&doc, &theme));

    let b = before.link(id("a_to_b")).unwrap();
    let a = after.link(id("a_to_b")).unwrap();
    assert_eq!(b.route.start(), a.route.start());
    assert_eq!(a.route.end(), Point::new(250.0, 200.0));
    assert_eq!(a.route.mid_x(), b.route.mid_x());
}

#[test]
fn svg_export_contains_every_entity() {
    let doc = load(include_str!("fixtures/fan.json"));
    let theme = Theme::light();
    let tree = build_scene(&SceneInput::new(&doc, &theme));
    let svg = render_svg(&tree, archie_core::Viewport::default());
    for name in ["api", "db", "q1", "q2", "q3", "q4"] {
        assert!(svg.contains(&format!("data-id=\"{name}\"")), "missing {name}");
    }
    assert!(svg.contains("stroke-dasharray"));
}
