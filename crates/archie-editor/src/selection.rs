//! Selection state: an ordered set of entity handles spanning nodes, links
//! and containers.

use archie_core::{Document, EntityId, EntityKind, EntityRef};
use serde::Serialize;
use smallvec::SmallVec;

/// How the editing surfaces should present the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    Empty,
    /// Full property editing.
    Single,
    /// Reduced UI: only delete and duplicate.
    Bulk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: SmallVec<[EntityRef; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn mode(&self) -> SelectionMode {
        match self.items.len() {
            0 => SelectionMode::Empty,
            1 => SelectionMode::Single,
            _ => SelectionMode::Bulk,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.items.iter().any(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[EntityRef] {
        &self.items
    }

    /// The only selected entity, if exactly one.
    pub fn single(&self) -> Option<EntityRef> {
        match self.items.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|r| r.id).collect()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.items.iter().filter(move |r| r.kind == kind).map(|r| r.id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.of_kind(EntityKind::Node)
    }

    pub fn containers(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.of_kind(EntityKind::Container)
    }

    /// Plain click: the selection becomes exactly `entity`.
    pub fn replace(&mut self, entity: EntityRef) {
        self.items.clear();
        self.items.push(entity);
    }

    pub fn replace_all(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        self.items.clear();
        self.extend(entities);
    }

    pub fn add(&mut self, entity: EntityRef) {
        if !self.items.contains(&entity) {
            self.items.push(entity);
        }
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = EntityRef>) {
        for e in entities {
            self.add(e);
        }
    }

    /// Shift-click: add if absent, remove if present. Returns whether
    /// `entity` is selected afterwards.
    pub fn toggle(&mut self, entity: EntityRef) -> bool {
        if let Some(pos) = self.items.iter().position(|r| *r == entity) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(entity);
            true
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop entries whose entity no longer exists.
    pub fn retain_existing(&mut self, doc: &Document) {
        self.items.retain(|r| doc.contains(*r));
    }
}

/// Contextual actions offered for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Edit,
    Lock,
    Unlock,
    Resize,
    Duplicate,
    Delete,
}

pub fn available_actions(selection: &Selection, doc: &Document) -> Vec<Action> {
    match selection.mode() {
        SelectionMode::Empty => Vec::new(),
        SelectionMode::Bulk => vec![Action::Duplicate, Action::Delete],
        SelectionMode::Single => {
            let Some(entity) = selection.single() else {
                return Vec::new();
            };
            match entity.kind {
                EntityKind::Node => {
                    let locked = doc.node(entity.id).is_some_and(|n| n.locked);
                    vec![
                        Action::Edit,
                        if locked { Action::Unlock } else { Action::Lock },
                        Action::Resize,
                        Action::Duplicate,
                        Action::Delete,
                    ]
                }
                EntityKind::Link | EntityKind::Container => {
                    vec![Action::Edit, Action::Duplicate, Action::Delete]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archie_core::Node;

    fn node(s: &str) -> EntityRef {
        EntityRef::node(EntityId::intern(s))
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = Selection::new();
        assert!(sel.toggle(node("sel_a")));
        assert!(sel.toggle(node("sel_b")));
        assert_eq!(sel.mode(), SelectionMode::Bulk);
        assert!(!sel.toggle(node("sel_a")));
        assert_eq!(sel.single(), Some(node("sel_b")));
    }

    #[test]
    fn replace_collapses() {
        let mut sel = Selection::new();
        sel.extend([node("sel_a"), node("sel_b")]);
        sel.replace(node("sel_c"));
        assert_eq!(sel.ids(), vec![EntityId::intern("sel_c")]);
    }

    #[test]
    fn retain_existing_drops_deleted() {
        let mut doc = Document::new("sel");
        doc.nodes.push(Node::new(EntityId::intern("sel_live"), "", 0.0, 0.0, 10.0, 10.0));
        let mut sel = Selection::new();
        sel.extend([node("sel_live"), node("sel_gone")]);
        sel.retain_existing(&doc);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn actions_depend_on_mode() {
        let mut doc = Document::new("sel");
        let mut n = Node::new(EntityId::intern("sel_locked"), "", 0.0, 0.0, 10.0, 10.0);
        n.locked = true;
        doc.nodes.push(n);

        let mut sel = Selection::new();
        assert!(available_actions(&sel, &doc).is_empty());
        sel.replace(node("sel_locked"));
        assert!(available_actions(&sel, &doc).contains(&Action::Unlock));
        sel.add(EntityRef::link(EntityId::intern("sel_l")));
        assert_eq!(available_actions(&sel, &doc), vec![Action::Duplicate, Action::Delete]);
    }
}
