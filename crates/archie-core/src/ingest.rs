//! Ingestion boundary: lenient decoding plus normalization.
//!
//! Documents arrive from a generator that does not always produce clean
//! data. Nothing here rejects a document for its shape; bad geometry is
//! clamped, dangling references are dropped, and missing IDs are minted.
//! Only syntactically invalid JSON is an error.

use crate::error::{DocumentError, Result};
use crate::id::EntityId;
use crate::model::{Bounds, Document, TagEnum};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;

/// Smallest node size the editor will display.
pub const MIN_NODE_SIZE: (f32, f32) = (120.0, 60.0);

/// Smallest container size the editor will display.
pub const MIN_CONTAINER_SIZE: (f32, f32) = (200.0, 120.0);

// ─── Lenient field decoders ──────────────────────────────────────────────

pub(crate) fn blank_id() -> EntityId {
    EntityId::intern("")
}

/// Number, numeric string, or anything else (→ NaN, fixed up by `normalize`).
pub(crate) fn lenient_f32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f32, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32).unwrap_or(f32::NAN),
        Value::String(s) => s.trim().parse::<f32>().unwrap_or(f32::NAN),
        _ => f32::NAN,
    })
}

pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

pub(crate) fn lenient_tag<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TagEnum,
{
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::String(s) => T::from_tag(&s).unwrap_or_else(|| {
            log::warn!("unknown tag {s:?}, using default");
            T::default()
        }),
        _ => T::default(),
    })
}

// ─── Document entry points ───────────────────────────────────────────────

impl Document {
    /// Decode and normalize a document produced outside the editor.
    pub fn from_json(json: &str) -> Result<Document> {
        let value: Value = serde_json::from_str(json)?;
        let found = match &value {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
            Value::Array(_) => Some("an array"),
        };
        if let Some(found) = found {
            return Err(DocumentError::NotAnObject { found });
        }
        let doc: Document = serde_json::from_value(value)?;
        Ok(doc.normalized())
    }

    /// Serialize for the export collaborator. Round-trips through `from_json`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Consume and return the normalized document.
    #[must_use]
    pub fn normalized(mut self) -> Document {
        let repairs = normalize(&mut self);
        if repairs > 0 {
            log::debug!("normalized document {:?}: {repairs} repair(s)", self.title);
        }
        self
    }
}

/// Repair `doc` in place so every editor invariant holds. Returns the number
/// of repairs made.
pub fn normalize(doc: &mut Document) -> usize {
    let mut repairs = 0;
    let (cx, cy) = finite_center(doc);

    // IDs: every entity gets a non-empty ID unique across all kinds.
    let mut seen: HashSet<EntityId> = HashSet::new();
    let mut minted: Vec<(usize, usize)> = Vec::new();
    for (i, n) in doc.nodes.iter().enumerate() {
        if n.id.as_str().is_empty() || !seen.insert(n.id) {
            minted.push((0, i));
        }
    }
    for (i, l) in doc.links.iter().enumerate() {
        if l.id.as_str().is_empty() || !seen.insert(l.id) {
            minted.push((1, i));
        }
    }
    for (i, c) in doc.containers.iter().enumerate() {
        if c.id.as_str().is_empty() || !seen.insert(c.id) {
            minted.push((2, i));
        }
    }
    for (kind, i) in minted {
        let prefix = ["node", "link", "container"][kind];
        let mut id = EntityId::with_prefix(prefix);
        while seen.contains(&id) || doc.id_in_use(id) {
            id = EntityId::with_prefix(prefix);
        }
        seen.insert(id);
        match kind {
            0 => {
                log::warn!("node #{i} had a missing or duplicate id, assigned {id}");
                doc.nodes[i].id = id;
            }
            1 => {
                log::warn!("link #{i} had a missing or duplicate id, assigned {id}");
                doc.links[i].id = id;
            }
            _ => {
                log::warn!("container #{i} had a missing or duplicate id, assigned {id}");
                doc.containers[i].id = id;
            }
        }
        repairs += 1;
    }

    // Geometry.
    for n in &mut doc.nodes {
        if !n.x.is_finite() || !n.y.is_finite() {
            log::warn!("node {} has non-finite position, moved to document center", n.id);
            n.x = cx;
            n.y = cy;
            repairs += 1;
        }
        if !valid_extent(n.width) || !valid_extent(n.height) {
            log::warn!("node {} has invalid size {}x{}", n.id, n.width, n.height);
            n.width = if valid_extent(n.width) { n.width } else { MIN_NODE_SIZE.0 };
            n.height = if valid_extent(n.height) { n.height } else { MIN_NODE_SIZE.1 };
            repairs += 1;
        }
    }
    for c in &mut doc.containers {
        if !valid_extent(c.width) || !valid_extent(c.height) {
            log::warn!("container {} has invalid size {}x{}", c.id, c.width, c.height);
            c.width = if valid_extent(c.width) { c.width } else { MIN_CONTAINER_SIZE.0 };
            c.height = if valid_extent(c.height) { c.height } else { MIN_CONTAINER_SIZE.1 };
            repairs += 1;
        }
        if !c.x.is_finite() || !c.y.is_finite() {
            log::warn!("container {} has non-finite position, moved to document center", c.id);
            c.x = cx - c.width / 2.0;
            c.y = cy - c.height / 2.0;
            repairs += 1;
        }
    }

    repairs + prune_dangling(doc)
}

/// Drop links whose endpoints are missing (or equal) and container children
/// that no longer exist. Returns the number of references removed.
pub fn prune_dangling(doc: &mut Document) -> usize {
    let live: HashSet<EntityId> = doc.nodes.iter().map(|n| n.id).collect();
    let before = doc.links.len();
    doc.links.retain(|l| {
        let keep = live.contains(&l.source) && live.contains(&l.target) && l.source != l.target;
        if !keep {
            log::debug!("dropping link {} ({} -> {})", l.id, l.source, l.target);
        }
        keep
    });
    let mut removed = before - doc.links.len();

    for c in &mut doc.containers {
        let before = c.child_node_ids.len();
        let mut kept: HashSet<EntityId> = HashSet::new();
        c.child_node_ids
            .retain(|id| live.contains(&*id) && kept.insert(*id));
        removed += before - c.child_node_ids.len();
    }
    removed
}

fn valid_extent(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Center of the finite part of the document, or the origin.
fn finite_center(doc: &Document) -> (f32, f32) {
    doc.nodes
        .iter()
        .filter(|n| [n.x, n.y, n.width, n.height].iter().all(|v| v.is_finite()))
        .map(|n| n.bounds())
        .chain(
            doc.containers
                .iter()
                .filter(|c| [c.x, c.y, c.width, c.height].iter().all(|v| v.is_finite()))
                .map(|c| c.bounds()),
        )
        .reduce(|acc, b: Bounds| acc.union(&b))
        .map(|b| b.center())
        .unwrap_or((0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerKind, LinkStyle, NodeShape};

    #[test]
    fn non_finite_geometry_is_clamped() {
        let json = r#"{
            "title": "t",
            "nodes": [
                {"id": "ok", "label": "ok", "type": "server", "x": 100, "y": 100, "width": 100, "height": 50},
                {"id": "bad", "label": "bad", "type": "server", "x": null, "y": "NaN", "width": -5, "height": "40"}
            ],
            "links": []
        }"#;
        let doc = Document::from_json(json).unwrap();
        let bad = doc.node(EntityId::intern("bad")).unwrap();
        assert_eq!((bad.x, bad.y), (100.0, 100.0));
        assert_eq!(bad.width, MIN_NODE_SIZE.0);
        assert_eq!(bad.height, 40.0);
    }

    #[test]
    fn dangling_links_and_children_are_dropped() {
        let json = r#"{
            "title": "t",
            "nodes": [
                {"id": "a", "x": 0, "y": 0, "width": 10, "height": 10},
                {"id": "b", "x": 50, "y": 0, "width": 10, "height": 10}
            ],
            "links": [
                {"id": "ab", "source": "a", "target": "b"},
                {"id": "ax", "source": "a", "target": "ghost"},
                {"id": "aa", "source": "a", "target": "a"}
            ],
            "containers": [
                {"id": "c", "label": "c", "type": "tier", "x": 0, "y": 0, "width": 100, "height": 100,
                 "childNodeIds": ["a", "ghost", "a"]}
            ]
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].id, EntityId::intern("ab"));
        assert_eq!(doc.containers[0].child_node_ids.as_slice(), &[EntityId::intern("a")]);
        assert!(doc.references_are_valid());
    }

    #[test]
    fn missing_and_duplicate_ids_are_minted() {
        let json = r#"{
            "nodes": [
                {"label": "anon", "x": 0, "y": 0, "width": 10, "height": 10},
                {"id": "dup", "x": 0, "y": 0, "width": 10, "height": 10},
                {"id": "dup", "x": 5, "y": 5, "width": 10, "height": 10}
            ],
            "links": []
        }"#;
        let doc = Document::from_json(json).unwrap();
        let ids: HashSet<_> = doc.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(doc.nodes.iter().all(|n| !n.id.as_str().is_empty()));
    }

    #[test]
    fn unknown_tags_fall_back_to_defaults() {
        let json = r#"{
            "nodes": [
                {"id": "s1", "x": 0, "y": 0, "width": 10, "height": 10, "shape": "hexagon"},
                {"id": "s2", "x": 0, "y": 0, "width": 10, "height": 10, "shape": "circle", "locked": "true"}
            ],
            "links": [{"id": "l", "source": "s1", "target": "s2", "style": "wavy"}],
            "containers": [{"id": "c1", "type": "availability-zone", "x": 0, "y": 0, "width": 10, "height": 10}]
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.nodes[0].shape, NodeShape::Rectangle);
        assert_eq!(doc.nodes[1].shape, NodeShape::Ellipse);
        assert!(doc.nodes[1].locked);
        assert_eq!(doc.links[0].style, LinkStyle::Solid);
        assert_eq!(doc.containers[0].kind, ContainerKind::AvailabilityZone);
    }

    #[test]
    fn non_object_root_is_an_error() {
        assert!(matches!(
            Document::from_json("[1, 2]"),
            Err(DocumentError::NotAnObject { found: "an array" })
        ));
        assert!(matches!(Document::from_json("{"), Err(DocumentError::Json(_))));
    }

    #[test]
    fn empty_document_normalizes_to_itself() {
        let doc = Document::from_json(r#"{"title": "blank"}"#).unwrap();
        assert_eq!(doc, Document::new("blank"));
    }
}
