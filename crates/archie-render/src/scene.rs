//! Document → backend-agnostic visual tree.
//!
//! `build_scene` is a pure function of its input: the same document, view
//! and selection always produce the same tree, so preview frames can be
//! dropped or coalesced freely. The tree has three back-to-front layers
//! (containers, links, nodes) plus the resize handles and marquee overlay.
//! Geometry stays in document space; backends apply `transform`.

use crate::route::{ARROW_SIZE, LinkRoute, ParallelIndex, route_link};
use crate::theme::{Theme, resolve_color};
use archie_core::{
    Bounds, Color, ContainerKind, Document, EntityId, InteractionMode, LinkStyle, NodeShape, ViewTransform,
};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape};
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_4;

pub const CONTAINER_RADIUS: f64 = 12.0;
pub const NODE_RADIUS: f64 = 8.0;
pub const NODE_STROKE: f64 = 1.5;
pub const SELECTED_STROKE: f64 = 3.0;
/// Extra width of the invisible link hit-path over the visible stroke.
pub const LINK_HIT_SLOP: f64 = 10.0;
/// Approximate advance of one label character at the chip font size.
pub const LABEL_CHAR_WIDTH: f64 = 7.0;
pub const LABEL_PADDING: f64 = 6.0;
pub const LABEL_HEIGHT: f64 = 18.0;
/// Resize handle radius in screen pixels.
pub const HANDLE_RADIUS_PX: f64 = 6.0;

// ─── Visual tree ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerVisual {
    pub id: EntityId,
    pub rect: Rect,
    pub label: String,
    pub kind: ContainerKind,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    pub text: Color,
    pub selected: bool,
}

impl ContainerVisual {
    pub fn outline(&self) -> BezPath {
        self.rect.to_rounded_rect(CONTAINER_RADIUS).to_path(0.1)
    }
}

/// Opaque background chip behind a link label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelChip {
    pub text: String,
    pub rect: Rect,
    pub fill: Color,
    pub color: Color,
}

impl LabelChip {
    /// Chip centered on `anchor`, sized by character count.
    pub fn new(text: &str, anchor: Point, fill: Color, color: Color) -> Self {
        let width = text.chars().count() as f64 * LABEL_CHAR_WIDTH + LABEL_PADDING * 2.0;
        Self {
            text: text.to_string(),
            rect: Rect::from_center_size(anchor, (width, LABEL_HEIGHT)),
            fill,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkVisual {
    pub id: EntityId,
    pub source: EntityId,
    pub target: EntityId,
    pub route: LinkRoute,
    pub color: Color,
    pub width: f64,
    pub style: LinkStyle,
    /// Stroke width of the invisible hit-path.
    pub hit_width: f64,
    pub end_arrow: [Point; 3],
    pub start_arrow: Option<[Point; 3]>,
    pub label: Option<LabelChip>,
    pub selected: bool,
}

impl LinkVisual {
    /// Dash pattern for the visible stroke, empty for solid lines.
    pub fn dashes(&self) -> &'static [f64] {
        match self.style {
            LinkStyle::Solid | LinkStyle::Double => &[],
            LinkStyle::Dashed => &[8.0, 5.0],
            LinkStyle::Dotted => &[2.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeVisual {
    pub id: EntityId,
    pub rect: Rect,
    pub shape: NodeShape,
    pub label: String,
    /// Open type tag, used by hosts for icon lookup.
    pub type_tag: String,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    pub text: Color,
    pub selected: bool,
    pub locked: bool,
    pub pending_source: bool,
}

impl NodeVisual {
    /// Outline in document space. Diamonds are the node box rotated 45°
    /// about its center.
    pub fn outline(&self) -> BezPath {
        match self.shape {
            NodeShape::Rectangle => self.rect.to_rounded_rect(NODE_RADIUS).to_path(0.1),
            NodeShape::Ellipse => Ellipse::from_rect(self.rect).to_path(0.1),
            NodeShape::Diamond => {
                Affine::rotate_about(FRAC_PI_4, self.rect.center()) * self.rect.to_path(0.1)
            }
        }
    }

    /// Rotation applied to the node box when painting.
    pub fn rotation(&self) -> f64 {
        match self.shape {
            NodeShape::Diamond => 45.0,
            _ => 0.0,
        }
    }
}

/// A node corner that can be dragged to resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// `(sx, sy)`: +1 where dragging outward along the axis grows the box.
    pub fn sign(self) -> (f32, f32) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }

    fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub node: EntityId,
    pub corner: Corner,
    pub center: Point,
}

/// The complete frame, back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTree {
    pub transform: ViewTransform,
    /// CSS cursor hint for the host.
    pub cursor: &'static str,
    pub background: Color,
    pub containers: Vec<ContainerVisual>,
    pub links: Vec<LinkVisual>,
    pub nodes: Vec<NodeVisual>,
    pub handles: Vec<Handle>,
    pub marquee: Option<(Rect, Color)>,
    pub selection_color: Color,
    pub handle_fill: Color,
}

impl SceneTree {
    /// Union of every drawn container, node and label chip.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.containers
            .iter()
            .map(|c| c.rect)
            .chain(self.nodes.iter().map(|n| n.outline().bounding_box()))
            .chain(self.links.iter().filter_map(|l| l.label.as_ref().map(|c| c.rect)))
            .reduce(|acc, r| acc.union(r))
            .map(to_bounds)
    }

    pub fn node(&self, id: EntityId) -> Option<&NodeVisual> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, id: EntityId) -> Option<&LinkVisual> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn container(&self, id: EntityId) -> Option<&ContainerVisual> {
        self.containers.iter().find(|c| c.id == id)
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────

/// Everything the scene depends on.
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub document: &'a Document,
    pub transform: ViewTransform,
    pub selection: &'a [EntityId],
    pub mode: InteractionMode,
    /// Node showing resize handles; only honoured while it is the sole selection.
    pub resizing: Option<EntityId>,
    /// First click of a pending connect gesture.
    pub connect_source: Option<EntityId>,
    /// Marquee rectangle in document space.
    pub marquee: Option<Bounds>,
    pub link_spacing: f64,
    pub theme: &'a Theme,
}

impl<'a> SceneInput<'a> {
    pub fn new(document: &'a Document, theme: &'a Theme) -> Self {
        Self {
            document,
            transform: ViewTransform::IDENTITY,
            selection: &[],
            mode: InteractionMode::Select,
            resizing: None,
            connect_source: None,
            marquee: None,
            link_spacing: crate::route::LINK_SPACING,
            theme,
        }
    }
}

/// Build the frame for `input`.
pub fn build_scene(input: &SceneInput<'_>) -> SceneTree {
    let doc = input.document;
    let theme = input.theme;
    let selected: HashSet<EntityId> = input.selection.iter().copied().collect();

    let containers = build_containers(doc, theme, &selected);
    let links = build_links(doc, theme, &selected, input.link_spacing);

    let nodes: Vec<NodeVisual> = doc
        .nodes
        .iter()
        .map(|n| {
            let is_selected = selected.contains(&n.id);
            let pending = input.connect_source == Some(n.id);
            let (stroke, stroke_width) = if pending {
                (theme.pending_source, SELECTED_STROKE)
            } else if is_selected {
                (theme.selection, SELECTED_STROKE)
            } else if n.locked {
                (theme.locked_stroke, NODE_STROKE)
            } else {
                (theme.node_stroke, NODE_STROKE)
            };
            NodeVisual {
                id: n.id,
                rect: to_rect(n.bounds()),
                shape: n.shape,
                label: n.label.clone(),
                type_tag: n.kind.clone(),
                fill: resolve_color(n.color.as_deref(), theme.node_fill),
                stroke,
                stroke_width,
                text: theme.node_text,
                selected: is_selected,
                locked: n.locked,
                pending_source: pending,
            }
        })
        .collect();

    let mut handles = Vec::new();
    if let (Some(id), [only]) = (input.resizing, input.selection)
        && id == *only
        && let Some(node) = nodes.iter().find(|n| n.id == id)
    {
        handles.extend(Corner::ALL.iter().map(|&corner| Handle {
            node: id,
            corner,
            center: corner.of(node.rect),
        }));
    }

    log::trace!(
        "scene: {} containers, {} links, {} nodes",
        containers.len(),
        links.len(),
        nodes.len()
    );

    SceneTree {
        transform: input.transform,
        cursor: input.mode.cursor(),
        background: theme.background,
        containers,
        links,
        nodes,
        handles,
        marquee: input.marquee.map(|b| (to_rect(b), theme.marquee)),
        selection_color: theme.selection,
        handle_fill: theme.handle_fill,
    }
}

fn build_containers(doc: &Document, theme: &Theme, selected: &HashSet<EntityId>) -> Vec<ContainerVisual> {
    // Tier rank: top to bottom, document order breaking ties.
    let mut tiers: Vec<(usize, f32)> = doc
        .containers
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ContainerKind::Tier)
        .map(|(i, c)| (i, c.y))
        .collect();
    tiers.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let mut tier_rank = vec![0usize; doc.containers.len()];
    for (rank, (i, _)) in tiers.into_iter().enumerate() {
        tier_rank[i] = rank;
    }

    doc.containers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let default_fill = match c.kind {
                ContainerKind::Tier => theme.tier_color(tier_rank[i]),
                kind => theme.container_fill(kind),
            };
            let is_selected = selected.contains(&c.id);
            ContainerVisual {
                id: c.id,
                rect: to_rect(c.bounds()),
                label: c.label.clone(),
                kind: c.kind,
                fill: resolve_color(c.color.as_deref(), default_fill),
                stroke: if is_selected {
                    theme.selection
                } else {
                    theme.container_stroke
                },
                stroke_width: if is_selected { SELECTED_STROKE } else { 1.0 },
                text: theme.container_text,
                selected: is_selected,
            }
        })
        .collect()
}

fn build_links(doc: &Document, theme: &Theme, selected: &HashSet<EntityId>, spacing: f64) -> Vec<LinkVisual> {
    let parallel = ParallelIndex::build(&doc.links);
    let index = doc.node_index();

    doc.links
        .iter()
        .filter_map(|l| {
            let (Some(&si), Some(&ti)) = (index.get(&l.source), index.get(&l.target)) else {
                log::trace!("link {} has a missing endpoint, not drawn", l.id);
                return None;
            };
            let route = route_link(
                doc.nodes[si].bounds(),
                doc.nodes[ti].bounds(),
                parallel.slot(l.id),
                spacing,
            );
            let is_selected = selected.contains(&l.id);
            let base = resolve_color(l.color.as_deref(), theme.link);
            let width = l.thickness.stroke_width() as f64;
            Some(LinkVisual {
                id: l.id,
                source: l.source,
                target: l.target,
                route,
                color: if is_selected { theme.selection } else { base },
                width,
                style: l.style,
                hit_width: width + LINK_HIT_SLOP,
                end_arrow: route.end_arrow(ARROW_SIZE),
                start_arrow: l.bidirectional.then(|| route.start_arrow(ARROW_SIZE)),
                label: l
                    .label
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(|s| LabelChip::new(s, route.label_anchor, theme.link_label_bg, theme.link_label_text)),
                selected: is_selected,
            })
        })
        .collect()
}

pub fn to_rect(b: Bounds) -> Rect {
    Rect::new(b.x as f64, b.y as f64, b.right() as f64, b.bottom() as f64)
}

pub fn to_bounds(r: Rect) -> Bounds {
    Bounds::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archie_core::{Container, Link, Node};

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn doc() -> Document {
        let mut doc = Document::new("scene");
        doc.nodes.push(Node::new(id("s_a"), "A", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(id("s_b"), "B", 300.0, 0.0, 100.0, 60.0));
        let mut l = Link::new(id("s_ab"), id("s_a"), id("s_b"));
        l.label = Some("HTTPS".into());
        doc.links.push(l);
        for (name, y) in [("s_t_low", 300.0), ("s_t_high", 100.0)] {
            doc.containers.push(Container::new(
                id(name),
                name,
                ContainerKind::Tier,
                Bounds::new(-100.0, y, 500.0, 100.0),
            ));
        }
        doc
    }

    #[test]
    fn layers_follow_document() {
        let doc = doc();
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));
        assert_eq!(tree.containers.len(), 2);
        assert_eq!(tree.links.len(), 1);
        assert_eq!(tree.nodes.len(), 2);
        assert!(tree.handles.is_empty());
        assert_eq!(tree.cursor, "default");
    }

    #[test]
    fn tiers_colored_top_to_bottom() {
        let doc = doc();
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));
        assert_eq!(tree.container(id("s_t_high")).unwrap().fill, theme.tier_color(0));
        assert_eq!(tree.container(id("s_t_low")).unwrap().fill, theme.tier_color(1));
    }

    #[test]
    fn label_chip_scales_with_text() {
        let doc = doc();
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));
        let chip = tree.link(id("s_ab")).unwrap().label.as_ref().unwrap();
        assert_eq!(chip.rect.width(), 5.0 * LABEL_CHAR_WIDTH + 2.0 * LABEL_PADDING);
        assert_eq!(chip.rect.center(), Point::new(150.0, 0.0));
    }

    #[test]
    fn selection_thickens_outline() {
        let doc = doc();
        let theme = Theme::light();
        let selection = [id("s_a")];
        let input = SceneInput {
            selection: &selection,
            ..SceneInput::new(&doc, &theme)
        };
        let tree = build_scene(&input);
        let a = tree.node(id("s_a")).unwrap();
        let b = tree.node(id("s_b")).unwrap();
        assert!(a.selected && a.stroke_width > b.stroke_width);
        assert_eq!(a.stroke, theme.selection);
    }

    #[test]
    fn handles_only_for_single_resizing_node() {
        let doc = doc();
        let theme = Theme::light();
        let one = [id("s_a")];
        let two = [id("s_a"), id("s_b")];
        let single = SceneInput {
            selection: &one,
            resizing: Some(id("s_a")),
            ..SceneInput::new(&doc, &theme)
        };
        let tree = build_scene(&single);
        assert_eq!(tree.handles.len(), 4);
        assert!(tree.handles.iter().any(|h| h.center == Point::new(-50.0, -30.0)));

        let bulk = SceneInput {
            selection: &two,
            ..single
        };
        assert!(build_scene(&bulk).handles.is_empty());
    }

    #[test]
    fn diamond_is_rotated_box() {
        let mut doc = doc();
        doc.nodes[0].shape = NodeShape::Diamond;
        let theme = Theme::light();
        let tree = build_scene(&SceneInput::new(&doc, &theme));
        let bbox = tree.node(id("s_a")).unwrap().outline().bounding_box();
        // A 100×60 box rotated 45° spans (100+60)/√2 on both axes.
        let span = 160.0 / std::f64::consts::SQRT_2;
        assert!((bbox.width() - span).abs() < 1e-6);
        assert!((bbox.height() - span).abs() < 1e-6);
        assert!(bbox.center().distance(Point::ZERO) < 1e-6);
    }

    #[test]
    fn build_is_deterministic() {
        let doc = doc();
        let theme = Theme::light();
        let input = SceneInput::new(&doc, &theme);
        assert_eq!(build_scene(&input), build_scene(&input));
    }
}
