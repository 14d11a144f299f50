//! Diagram document model.
//!
//! A `Document` is a directed graph of typed `Node`s joined by `Link`s, with
//! optional `Container`s (regions, availability zones, tiers) that list the
//! nodes logically inside them. Node geometry is center-based, container
//! geometry is top-left based. The document is plain data: editing lives in
//! `archie-editor`, drawing in `archie-render`.

use crate::id::EntityId;
use crate::ingest::{blank_id, lenient_bool, lenient_f32, lenient_tag};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi << 4 | lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Same color with alpha multiplied by `factor`.
    pub fn faded(self, factor: f32) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned box in document units, top-left anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box of the given size centered on `(cx, cy)`.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// AABB overlap test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Normalize a drag rectangle from two corner points.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Bounds {
        Bounds::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }
}

// ─── Enumerated tags ─────────────────────────────────────────────────────

/// Enum tags read leniently at the ingestion boundary: unknown strings fall
/// back to `Default` instead of failing the whole document.
pub trait TagEnum: Default + Sized {
    fn from_tag(tag: &str) -> Option<Self>;
}

/// Node outline shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Ellipse,
    /// Drawn as the node box rotated 45° about its center.
    Diamond,
}

impl TagEnum for NodeShape {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "box" => Some(Self::Rectangle),
            "ellipse" | "circle" | "oval" => Some(Self::Ellipse),
            "diamond" | "rhombus" => Some(Self::Diamond),
            _ => None,
        }
    }
}

/// Line pattern of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
}

impl TagEnum for LinkStyle {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "solid" => Some(Self::Solid),
            "dashed" => Some(Self::Dashed),
            "dotted" => Some(Self::Dotted),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

/// Stroke weight of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkThickness {
    Thin,
    #[default]
    Medium,
    Thick,
}

impl LinkThickness {
    /// Stroke width in document units.
    pub fn stroke_width(self) -> f32 {
        match self {
            Self::Thin => 1.0,
            Self::Medium => 2.0,
            Self::Thick => 3.5,
        }
    }
}

impl TagEnum for LinkThickness {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "thin" => Some(Self::Thin),
            "medium" => Some(Self::Medium),
            "thick" => Some(Self::Thick),
            _ => None,
        }
    }
}

/// Logical grouping a container represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    #[default]
    Region,
    AvailabilityZone,
    Tier,
}

impl TagEnum for ContainerKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().replace('_', "-").as_str() {
            "region" => Some(Self::Region),
            "availability-zone" | "az" | "zone" => Some(Self::AvailabilityZone),
            "tier" => Some(Self::Tier),
            _ => None,
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// A typed box on the canvas. `x`/`y` is the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default = "blank_id")]
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
    /// Open tag used by hosts for icon and shape lookup (e.g. `"database"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub y: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub width: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub shape: NodeShape,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub locked: bool,
}

impl Node {
    pub fn new(id: EntityId, label: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            label: label.into(),
            kind: String::new(),
            x,
            y,
            width,
            height,
            description: None,
            color: None,
            shape: NodeShape::default(),
            locked: false,
        }
    }

    /// Top-left bounds of the node box.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(self.x, self.y, self.width, self.height)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default = "blank_id")]
    pub id: EntityId,
    #[serde(default = "blank_id")]
    pub source: EntityId,
    #[serde(default = "blank_id")]
    pub target: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub style: LinkStyle,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub thickness: LinkThickness,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub bidirectional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Link {
    /// A link with default styling.
    pub fn new(id: EntityId, source: EntityId, target: EntityId) -> Self {
        Self {
            id,
            source,
            target,
            label: None,
            style: LinkStyle::default(),
            thickness: LinkThickness::default(),
            bidirectional: false,
            color: None,
        }
    }

    pub fn touches(&self, node: EntityId) -> bool {
        self.source == node || self.target == node
    }
}

/// A labelled region grouping nodes. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default = "blank_id")]
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_tag")]
    pub kind: ContainerKind,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub y: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub width: f32,
    #[serde(default = "f32_nan", deserialize_with = "lenient_f32")]
    pub height: f32,
    #[serde(default)]
    pub child_node_ids: SmallVec<[EntityId; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Container {
    pub fn new(id: EntityId, label: impl Into<String>, kind: ContainerKind, bounds: Bounds) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            child_node_ids: SmallVec::new(),
            description: None,
            color: None,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

fn f32_nan() -> f32 {
    f32::NAN
}

// ─── Tagged entity handles ───────────────────────────────────────────────

/// Discriminant shared by the selection, delete and duplicate paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Link,
    Container,
}

/// An entity ID tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn node(id: EntityId) -> Self {
        Self {
            kind: EntityKind::Node,
            id,
        }
    }

    pub fn link(id: EntityId) -> Self {
        Self {
            kind: EntityKind::Link,
            id,
        }
    }

    pub fn container(id: EntityId) -> Self {
        Self {
            kind: EntityKind::Container,
            id,
        }
    }
}

/// A borrowed entity of any kind.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Node(&'a Node),
    Link(&'a Link),
    Container(&'a Container),
}

impl Entity<'_> {
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            Entity::Node(n) => EntityRef::node(n.id),
            Entity::Link(l) => EntityRef::link(l.id),
            Entity::Container(c) => EntityRef::container(c.id),
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete diagram being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: EntityId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn link(&self, id: EntityId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn link_mut(&mut self, id: EntityId) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.id == id)
    }

    pub fn container(&self, id: EntityId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn container_mut(&mut self, id: EntityId) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id == id)
    }

    /// Look up any entity by ID. Nodes shadow links shadow containers if
    /// IDs collide (ingestion prevents that).
    pub fn entity(&self, id: EntityId) -> Option<Entity<'_>> {
        if let Some(n) = self.node(id) {
            return Some(Entity::Node(n));
        }
        if let Some(l) = self.link(id) {
            return Some(Entity::Link(l));
        }
        self.container(id).map(Entity::Container)
    }

    pub fn entity_kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entity(id).map(|e| e.entity_ref().kind)
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity.kind {
            EntityKind::Node => self.node(entity.id).is_some(),
            EntityKind::Link => self.link(entity.id).is_some(),
            EntityKind::Container => self.container(entity.id).is_some(),
        }
    }

    /// Whether any entity of any kind already uses `id`.
    pub fn id_in_use(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    /// A prefixed ID no entity in this document uses.
    pub fn fresh_id(&self, prefix: &str) -> EntityId {
        loop {
            let id = EntityId::with_prefix(prefix);
            if !self.id_in_use(id) {
                return id;
            }
        }
    }

    /// Containers listing `node` among their children.
    pub fn containers_of(&self, node: EntityId) -> impl Iterator<Item = &Container> {
        self.containers
            .iter()
            .filter(move |c| c.child_node_ids.contains(&node))
    }

    /// Position of every node in `nodes`, for O(1) lookups during a frame.
    pub fn node_index(&self) -> HashMap<EntityId, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect()
    }

    /// Bounding box of every node and container, or `None` if empty.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.nodes
            .iter()
            .map(Node::bounds)
            .chain(self.containers.iter().map(Container::bounds))
            .reduce(|acc, b| acc.union(&b))
    }

    /// Every link's endpoints exist and no container lists a missing node.
    pub fn references_are_valid(&self) -> bool {
        let index = self.node_index();
        self.links
            .iter()
            .all(|l| index.contains_key(&l.source) && index.contains_key(&l.target))
            && self
                .containers
                .iter()
                .all(|c| c.child_node_ids.iter().all(|id| index.contains_key(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("sample");
        doc.nodes.push(Node::new(EntityId::intern("m_a"), "A", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(EntityId::intern("m_b"), "B", 300.0, 0.0, 100.0, 60.0));
        doc.links.push(Link::new(
            EntityId::intern("m_ab"),
            EntityId::intern("m_a"),
            EntityId::intern("m_b"),
        ));
        let mut c = Container::new(
            EntityId::intern("m_c"),
            "VPC",
            ContainerKind::Region,
            Bounds::new(-80.0, -60.0, 200.0, 120.0),
        );
        c.child_node_ids.push(EntityId::intern("m_a"));
        doc.containers.push(c);
        doc
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        let short = Color::from_hex("fff").unwrap();
        assert_eq!(short.to_hex(), "#FFFFFF");
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
    }

    #[test]
    fn node_bounds_are_center_based() {
        let n = Node::new(EntityId::intern("nb"), "n", 10.0, 20.0, 100.0, 60.0);
        assert_eq!(n.bounds(), Bounds::new(-40.0, -10.0, 100.0, 60.0));
    }

    #[test]
    fn entity_lookup_is_tagged() {
        let doc = sample();
        assert_eq!(doc.entity_kind(EntityId::intern("m_a")), Some(EntityKind::Node));
        assert_eq!(doc.entity_kind(EntityId::intern("m_ab")), Some(EntityKind::Link));
        assert_eq!(
            doc.entity_kind(EntityId::intern("m_c")),
            Some(EntityKind::Container)
        );
        assert_eq!(doc.entity_kind(EntityId::intern("m_missing")), None);
    }

    #[test]
    fn containers_of_finds_parents() {
        let doc = sample();
        let parents: Vec<_> = doc.containers_of(EntityId::intern("m_a")).map(|c| c.id).collect();
        assert_eq!(parents, vec![EntityId::intern("m_c")]);
        assert_eq!(doc.containers_of(EntityId::intern("m_b")).count(), 0);
    }

    #[test]
    fn content_bounds_unions_everything() {
        let doc = sample();
        let b = doc.content_bounds().unwrap();
        assert_eq!(b.x, -80.0);
        assert_eq!(b.right(), 350.0);
        assert_eq!(b.y, -60.0);
        assert_eq!(b.bottom(), 60.0);
        assert!(Document::new("empty").content_bounds().is_none());
    }

    #[test]
    fn fresh_id_avoids_collisions() {
        let doc = sample();
        let id = doc.fresh_id("node");
        assert!(!doc.id_in_use(id));
    }

    #[test]
    fn bounds_from_corners_normalizes() {
        let b = Bounds::from_corners(10.0, 50.0, -10.0, 20.0);
        assert_eq!(b, Bounds::new(-10.0, 20.0, 20.0, 30.0));
    }
}
