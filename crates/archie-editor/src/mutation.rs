//! Document mutations.
//!
//! Every edit the session makes is expressed as a `DocMutation` applied to
//! a document value. Mutations never leave dangling references: removals
//! cascade to incident links and container child lists in the same call.

use archie_core::{
    Container, ContainerKind, Document, EntityId, EntityKind, EntityRef, Link, LinkStyle, LinkThickness, Node,
    NodeShape, prune_dangling,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Partial node update from the properties panel. Absent fields are left
/// alone; an empty string clears an optional text field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub shape: Option<NodeShape>,
    pub locked: Option<bool>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkPatch {
    pub label: Option<String>,
    pub style: Option<LinkStyle>,
    pub thickness: Option<LinkThickness>,
    pub bidirectional: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerPatch {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ContainerKind>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocMutation {
    /// Move nodes, and containers together with their children. Locked
    /// nodes stay put; each node moves at most once.
    Translate {
        targets: Vec<EntityRef>,
        dx: f32,
        dy: f32,
    },
    SetNodeGeometry {
        id: EntityId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    AddNode(Box<Node>),
    AddLink(Box<Link>),
    /// Add a container; it adopts nodes whose centers fall inside it.
    AddContainer(Box<Container>),
    /// Delete entities, cascading to incident links.
    Remove {
        targets: Vec<EntityRef>,
    },
    UpdateNode {
        id: EntityId,
        patch: NodePatch,
    },
    UpdateLink {
        id: EntityId,
        patch: LinkPatch,
    },
    UpdateContainer {
        id: EntityId,
        patch: ContainerPatch,
    },
    SetLocked {
        ids: Vec<EntityId>,
        locked: bool,
    },
}

impl DocMutation {
    /// Apply to `doc`. Returns `false` when nothing changed.
    pub fn apply(self, doc: &mut Document) -> bool {
        match self {
            DocMutation::Translate { targets, dx, dy } => translate(doc, &targets, dx, dy),
            DocMutation::SetNodeGeometry {
                id,
                x,
                y,
                width,
                height,
            } => {
                let Some(n) = doc.node_mut(id) else {
                    return false;
                };
                let next = (x, y, width, height);
                if (n.x, n.y, n.width, n.height) == next {
                    return false;
                }
                (n.x, n.y, n.width, n.height) = next;
                true
            }
            DocMutation::AddNode(node) => {
                if doc.id_in_use(node.id) {
                    log::warn!("refusing to add node {}: id in use", node.id);
                    return false;
                }
                doc.nodes.push(*node);
                true
            }
            DocMutation::AddLink(link) => {
                let valid = link.source != link.target
                    && doc.node(link.source).is_some()
                    && doc.node(link.target).is_some()
                    && !doc.id_in_use(link.id);
                if valid {
                    doc.links.push(*link);
                }
                valid
            }
            DocMutation::AddContainer(container) => {
                if doc.id_in_use(container.id) {
                    log::warn!("refusing to add container {}: id in use", container.id);
                    return false;
                }
                let mut container = *container;
                let bounds = container.bounds();
                for n in &doc.nodes {
                    if bounds.contains(n.x, n.y) && !container.child_node_ids.contains(&n.id) {
                        container.child_node_ids.push(n.id);
                    }
                }
                doc.containers.push(container);
                true
            }
            DocMutation::Remove { targets } => remove(doc, &targets),
            DocMutation::UpdateNode { id, patch } => doc.node_mut(id).is_some_and(|n| patch_node(n, patch)),
            DocMutation::UpdateLink { id, patch } => doc.link_mut(id).is_some_and(|l| patch_link(l, patch)),
            DocMutation::UpdateContainer { id, patch } => {
                doc.container_mut(id).is_some_and(|c| patch_container(c, patch))
            }
            DocMutation::SetLocked { ids, locked } => {
                let mut changed = false;
                for id in ids {
                    if let Some(n) = doc.node_mut(id)
                        && n.locked != locked
                    {
                        n.locked = locked;
                        changed = true;
                    }
                }
                changed
            }
        }
    }
}

/// Move `targets` by `(dx, dy)`. Containers carry their children; locked
/// nodes stay put.
pub fn translate(doc: &mut Document, targets: &[EntityRef], dx: f32, dy: f32) -> bool {
    if dx == 0.0 && dy == 0.0 {
        return false;
    }
    let mut nodes: HashSet<EntityId> = HashSet::new();
    let mut containers: HashSet<EntityId> = HashSet::new();
    for t in targets {
        match t.kind {
            EntityKind::Node => {
                nodes.insert(t.id);
            }
            EntityKind::Container => {
                containers.insert(t.id);
                if let Some(c) = doc.container(t.id) {
                    nodes.extend(c.child_node_ids.iter().copied());
                }
            }
            EntityKind::Link => {}
        }
    }

    let mut changed = false;
    for c in doc.containers.iter_mut().filter(|c| containers.contains(&c.id)) {
        c.x += dx;
        c.y += dy;
        changed = true;
    }
    for n in doc.nodes.iter_mut().filter(|n| nodes.contains(&n.id) && !n.locked) {
        n.x += dx;
        n.y += dy;
        changed = true;
    }
    changed
}

fn remove(doc: &mut Document, targets: &[EntityRef]) -> bool {
    let doomed: HashSet<EntityRef> = targets.iter().copied().collect();
    let before = (doc.nodes.len(), doc.links.len(), doc.containers.len());
    doc.nodes.retain(|n| !doomed.contains(&EntityRef::node(n.id)));
    doc.links.retain(|l| !doomed.contains(&EntityRef::link(l.id)));
    doc.containers.retain(|c| !doomed.contains(&EntityRef::container(c.id)));
    let cascaded = prune_dangling(doc);
    let after = (doc.nodes.len(), doc.links.len(), doc.containers.len());
    if cascaded > 0 {
        log::debug!("delete cascaded to {cascaded} reference(s)");
    }
    before != after || cascaded > 0
}

/// `Some("")` clears, `Some(s)` sets, `None` leaves alone.
fn set_optional(field: &mut Option<String>, value: Option<String>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let next = if value.is_empty() { None } else { Some(value) };
    if *field == next {
        return false;
    }
    *field = next;
    true
}

fn set<T: PartialEq>(field: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *field != v => {
            *field = v;
            true
        }
        _ => false,
    }
}

fn patch_node(n: &mut Node, p: NodePatch) -> bool {
    let finite = |v: Option<f32>| v.filter(|v| v.is_finite());
    let positive = |v: Option<f32>| v.filter(|v| v.is_finite() && *v > 0.0);
    // Non-short-circuiting: every field is applied.
    set(&mut n.label, p.label)
        | set(&mut n.kind, p.kind)
        | set_optional(&mut n.description, p.description)
        | set_optional(&mut n.color, p.color)
        | set(&mut n.shape, p.shape)
        | set(&mut n.locked, p.locked)
        | set(&mut n.x, finite(p.x))
        | set(&mut n.y, finite(p.y))
        | set(&mut n.width, positive(p.width))
        | set(&mut n.height, positive(p.height))
}

fn patch_link(l: &mut Link, p: LinkPatch) -> bool {
    set_optional(&mut l.label, p.label)
        | set(&mut l.style, p.style)
        | set(&mut l.thickness, p.thickness)
        | set(&mut l.bidirectional, p.bidirectional)
        | set_optional(&mut l.color, p.color)
}

fn patch_container(c: &mut Container, p: ContainerPatch) -> bool {
    set(&mut c.label, p.label)
        | set(&mut c.kind, p.kind)
        | set_optional(&mut c.description, p.description)
        | set_optional(&mut c.color, p.color)
}

// ─── Duplicate ───────────────────────────────────────────────────────────

/// Clone `targets` into `doc` with fresh ids, shifted by `(offset, offset)`.
///
/// A duplicated container brings its children. Links are cloned when both
/// endpoints were cloned, or when the link itself is a target; endpoints
/// that were cloned are remapped. Returns handles to the clones of
/// `targets`, in order.
pub fn duplicate(doc: &mut Document, targets: &[EntityRef], offset: f32) -> Vec<EntityRef> {
    let mut node_ids: Vec<EntityId> = Vec::new();
    for t in targets {
        match t.kind {
            EntityKind::Node => node_ids.push(t.id),
            EntityKind::Container => {
                if let Some(c) = doc.container(t.id) {
                    node_ids.extend(c.child_node_ids.iter().copied());
                }
            }
            EntityKind::Link => {}
        }
    }

    let mut remap: HashMap<EntityId, EntityId> = HashMap::new();
    for id in node_ids {
        if remap.contains_key(&id) {
            continue;
        }
        let Some(original) = doc.node(id) else {
            continue;
        };
        let mut clone = original.clone();
        clone.id = doc.fresh_id("node");
        clone.x += offset;
        clone.y += offset;
        remap.insert(id, clone.id);
        doc.nodes.push(clone);
    }

    let mut out = Vec::with_capacity(targets.len());
    for t in targets {
        match t.kind {
            EntityKind::Node => {
                if let Some(&new) = remap.get(&t.id) {
                    out.push(EntityRef::node(new));
                }
            }
            EntityKind::Container => {
                let Some(original) = doc.container(t.id) else {
                    continue;
                };
                let mut clone = original.clone();
                clone.id = doc.fresh_id("container");
                clone.x += offset;
                clone.y += offset;
                clone.child_node_ids = clone
                    .child_node_ids
                    .iter()
                    .filter_map(|id| remap.get(id).copied())
                    .collect();
                out.push(EntityRef::container(clone.id));
                doc.containers.push(clone);
            }
            EntityKind::Link => {}
        }
    }

    let selected_links: HashSet<EntityId> = targets
        .iter()
        .filter(|t| t.kind == EntityKind::Link)
        .map(|t| t.id)
        .collect();
    let mut link_clones: HashMap<EntityId, EntityId> = HashMap::new();
    let originals: Vec<Link> = doc
        .links
        .iter()
        .filter(|l| {
            (remap.contains_key(&l.source) && remap.contains_key(&l.target)) || selected_links.contains(&l.id)
        })
        .cloned()
        .collect();
    for original in originals {
        let mut clone = original.clone();
        clone.id = doc.fresh_id("link");
        clone.source = remap.get(&original.source).copied().unwrap_or(original.source);
        clone.target = remap.get(&original.target).copied().unwrap_or(original.target);
        link_clones.insert(original.id, clone.id);
        doc.links.push(clone);
    }
    for t in targets.iter().filter(|t| t.kind == EntityKind::Link) {
        if let Some(&new) = link_clones.get(&t.id) {
            out.push(EntityRef::link(new));
        }
    }

    log::debug!(
        "duplicated {} target(s): {} node(s), {} link(s)",
        targets.len(),
        remap.len(),
        link_clones.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use archie_core::Bounds;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> EntityId {
        EntityId::intern(s)
    }

    fn doc() -> Document {
        let mut doc = Document::new("mut");
        doc.nodes.push(Node::new(id("mu_a"), "A", 0.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(id("mu_b"), "B", 300.0, 0.0, 100.0, 60.0));
        doc.nodes.push(Node::new(id("mu_c"), "C", 0.0, 200.0, 100.0, 60.0));
        doc.links.push(Link::new(id("mu_ab"), id("mu_a"), id("mu_b")));
        doc.links.push(Link::new(id("mu_bc"), id("mu_b"), id("mu_c")));
        let mut vpc = Container::new(id("mu_vpc"), "VPC", ContainerKind::Region, Bounds::new(-80.0, -60.0, 500.0, 120.0));
        vpc.child_node_ids.extend([id("mu_a"), id("mu_b")]);
        doc.containers.push(vpc);
        doc
    }

    #[test]
    fn removing_node_cascades_to_links_and_children() {
        let mut doc = doc();
        assert!(DocMutation::Remove { targets: vec![EntityRef::node(id("mu_b"))] }.apply(&mut doc));
        assert!(doc.links.is_empty());
        assert_eq!(doc.containers[0].child_node_ids.as_slice(), &[id("mu_a")]);
        assert!(doc.references_are_valid());
    }

    #[test]
    fn removing_container_keeps_children() {
        let mut doc = doc();
        assert!(DocMutation::Remove { targets: vec![EntityRef::container(id("mu_vpc"))] }.apply(&mut doc));
        assert!(doc.containers.is_empty());
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.links.len(), 2);
    }

    #[test]
    fn translate_moves_container_children_once() {
        let mut doc = doc();
        let targets = vec![EntityRef::container(id("mu_vpc")), EntityRef::node(id("mu_a"))];
        assert!(DocMutation::Translate { targets, dx: 10.0, dy: 5.0 }.apply(&mut doc));
        assert_eq!((doc.nodes[0].x, doc.nodes[0].y), (10.0, 5.0));
        assert_eq!((doc.nodes[1].x, doc.nodes[1].y), (310.0, 5.0));
        assert_eq!((doc.nodes[2].x, doc.nodes[2].y), (0.0, 200.0));
        assert_eq!((doc.containers[0].x, doc.containers[0].y), (-70.0, -55.0));
    }

    #[test]
    fn translate_skips_locked() {
        let mut doc = doc();
        doc.nodes[1].locked = true;
        let targets = vec![EntityRef::container(id("mu_vpc"))];
        DocMutation::Translate { targets, dx: 10.0, dy: 0.0 }.apply(&mut doc);
        assert_eq!(doc.nodes[0].x, 10.0);
        assert_eq!(doc.nodes[1].x, 300.0);
    }

    #[test]
    fn patch_clears_and_sets() {
        let mut doc = doc();
        let patch: NodePatch =
            serde_json::from_str(r##"{ "label": "Gateway", "color": "#FF0000", "shape": "ellipse", "width": -4 }"##)
                .unwrap();
        assert!(DocMutation::UpdateNode { id: id("mu_a"), patch }.apply(&mut doc));
        let a = doc.node(id("mu_a")).unwrap();
        assert_eq!(a.label, "Gateway");
        assert_eq!(a.color.as_deref(), Some("#FF0000"));
        assert_eq!(a.shape, NodeShape::Ellipse);
        assert_eq!(a.width, 100.0);

        let clear = NodePatch {
            color: Some(String::new()),
            ..Default::default()
        };
        assert!(DocMutation::UpdateNode { id: id("mu_a"), patch: clear.clone() }.apply(&mut doc));
        assert!(doc.node(id("mu_a")).unwrap().color.is_none());
        assert!(!DocMutation::UpdateNode { id: id("mu_a"), patch: clear }.apply(&mut doc));
    }

    #[test]
    fn add_link_rejects_self_loops_and_missing_nodes() {
        let mut doc = doc();
        assert!(!DocMutation::AddLink(Box::new(Link::new(id("mu_aa"), id("mu_a"), id("mu_a")))).apply(&mut doc));
        assert!(!DocMutation::AddLink(Box::new(Link::new(id("mu_ax"), id("mu_a"), id("mu_x")))).apply(&mut doc));
        assert!(DocMutation::AddLink(Box::new(Link::new(id("mu_ca"), id("mu_c"), id("mu_a")))).apply(&mut doc));
    }

    #[test]
    fn new_container_adopts_enclosed_nodes() {
        let mut doc = doc();
        let c = Container::new(id("mu_new"), "new", ContainerKind::Tier, Bounds::new(-100.0, 150.0, 300.0, 120.0));
        assert!(DocMutation::AddContainer(Box::new(c)).apply(&mut doc));
        assert_eq!(doc.container(id("mu_new")).unwrap().child_node_ids.as_slice(), &[id("mu_c")]);
    }

    #[test]
    fn duplicate_container_brings_children_and_inner_links() {
        let mut doc = doc();
        let clones = duplicate(&mut doc, &[EntityRef::container(id("mu_vpc"))], 24.0);
        assert_eq!(clones.len(), 1);
        assert_eq!(doc.nodes.len(), 5);
        assert_eq!(doc.containers.len(), 2);
        // A→B is internal to the container and is cloned; B→C is not.
        assert_eq!(doc.links.len(), 3);

        let copy = doc.container(clones[0].id).unwrap();
        assert_eq!((copy.x, copy.y), (-56.0, -36.0));
        assert_eq!(copy.child_node_ids.len(), 2);
        for child in &copy.child_node_ids {
            assert!(!["mu_a", "mu_b"].contains(&child.as_str()));
        }
        assert!(doc.references_are_valid());
    }

    #[test]
    fn duplicate_selected_link_keeps_endpoints() {
        let mut doc = doc();
        let clones = duplicate(&mut doc, &[EntityRef::link(id("mu_bc"))], 24.0);
        assert_eq!(clones.len(), 1);
        let copy = doc.link(clones[0].id).unwrap();
        assert_eq!((copy.source, copy.target), (id("mu_b"), id("mu_c")));
    }
}
