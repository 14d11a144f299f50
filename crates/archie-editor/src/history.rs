//! Linear undo/redo history of whole-document snapshots.
//!
//! Entries before the cursor are undoable, entries after it redoable.
//! Gestures write *previews* that replace the current entry in place; the
//! pre-gesture document is kept aside so the gesture collapses into a
//! single entry on commit, or vanishes on discard.

use archie_core::Document;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Document>,
    cursor: usize,
    max_depth: usize,
    /// Current entry as it was before the first preview write.
    preview_base: Option<Document>,
}

impl History {
    pub fn new(initial: Document, max_depth: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            max_depth: max_depth.max(1),
            preview_base: None,
        }
    }

    /// The document the renderer should show, preview or committed.
    pub fn current(&self) -> &Document {
        &self.entries[self.cursor]
    }

    /// Truncate the redo tail and append `doc` as the new current entry.
    pub fn push(&mut self, doc: Document) {
        if self.preview_base.is_some() {
            log::debug!("push during preview, discarding preview first");
            self.discard_preview();
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(doc);
        self.cursor += 1;
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
            self.cursor -= excess;
        }
        log::debug!("history push: {} entries, cursor {}", self.entries.len(), self.cursor);
    }

    /// Replace the current entry in place with a gesture frame.
    pub fn preview(&mut self, doc: Document) {
        if self.preview_base.is_none() {
            self.preview_base = Some(self.current().clone());
        }
        self.entries[self.cursor] = doc;
    }

    pub fn in_preview(&self) -> bool {
        self.preview_base.is_some()
    }

    /// Turn the current preview into one committed entry. Returns `false`
    /// (and records nothing) when no preview is active or it changed nothing.
    pub fn commit_preview(&mut self) -> bool {
        let Some(base) = self.preview_base.take() else {
            return false;
        };
        let last = std::mem::replace(&mut self.entries[self.cursor], base);
        if last == *self.current() {
            log::debug!("preview committed without changes");
            return false;
        }
        self.push(last);
        true
    }

    /// Restore the pre-gesture document. Returns whether a preview was active.
    pub fn discard_preview(&mut self) -> bool {
        match self.preview_base.take() {
            Some(base) => {
                self.entries[self.cursor] = base;
                true
            }
            None => false,
        }
    }

    /// Single entry point: `preview` frames replace in place, anything else
    /// commits. A commit while a preview is active lands as one entry on
    /// top of the pre-gesture base.
    pub fn apply(&mut self, doc: Document, preview: bool) -> bool {
        if preview {
            self.preview(doc);
            return true;
        }
        if self.preview_base.is_some() {
            self.preview(doc);
            return self.commit_preview();
        }
        if doc == *self.current() {
            return false;
        }
        self.push(doc);
        true
    }

    pub fn undo(&mut self) -> bool {
        self.discard_preview();
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        self.discard_preview();
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(t: &str) -> Document {
        Document::new(t)
    }

    #[test]
    fn push_truncates_redo_tail() {
        let mut h = History::new(titled("0"), 10);
        h.push(titled("1"));
        h.push(titled("2"));
        assert!(h.undo());
        assert!(h.undo());
        h.push(titled("x"));
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(h.current().title, "x");
    }

    #[test]
    fn preview_collapses_to_one_entry() {
        let mut h = History::new(titled("base"), 10);
        for i in 0..50 {
            h.apply(titled(&format!("frame {i}")), true);
        }
        assert_eq!(h.len(), 1);
        assert_eq!(h.current().title, "frame 49");
        assert!(h.commit_preview());
        assert_eq!(h.len(), 2);
        assert!(h.undo());
        assert_eq!(h.current().title, "base");
    }

    #[test]
    fn discard_restores_base() {
        let mut h = History::new(titled("base"), 10);
        h.preview(titled("moving"));
        assert!(h.discard_preview());
        assert_eq!(h.current().title, "base");
        assert!(!h.discard_preview());
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn unchanged_preview_records_nothing() {
        let mut h = History::new(titled("base"), 10);
        h.preview(titled("base"));
        assert!(!h.commit_preview());
        assert_eq!(h.len(), 1);
        assert!(!h.in_preview());
    }

    #[test]
    fn undo_discards_active_preview() {
        let mut h = History::new(titled("0"), 10);
        h.push(titled("1"));
        h.preview(titled("1 moving"));
        assert!(h.undo());
        assert_eq!(h.current().title, "0");
        assert!(h.redo());
        assert_eq!(h.current().title, "1");
    }

    #[test]
    fn depth_is_bounded() {
        let mut h = History::new(titled("0"), 3);
        for i in 1..=5 {
            h.push(titled(&i.to_string()));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.current().title, "5");
        assert!(h.undo() && h.undo());
        assert!(!h.undo());
        assert_eq!(h.current().title, "3");
    }

    #[test]
    fn apply_commit_skips_identical_documents() {
        let mut h = History::new(titled("0"), 10);
        assert!(!h.apply(titled("0"), false));
        assert!(h.apply(titled("1"), false));
        assert_eq!(h.len(), 2);
    }
}
