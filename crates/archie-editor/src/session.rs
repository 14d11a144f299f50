//! The editor session: one value owning the document history, selection,
//! view and interaction state. Every editor operation is a method here, so
//! components never reach for shared globals.

use crate::camera::ViewAnimation;
use crate::config::EditorConfig;
use crate::gesture::Gesture;
use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::mutation::{ContainerPatch, DocMutation, LinkPatch, NodePatch, duplicate};
use crate::selection::{Action, Selection, available_actions};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::toolbar::toolbar_anchor;
use archie_core::{
    Document, EntityId, EntityRef, FitOptions, InteractionMode, ViewTransform, Viewport, fit_transform,
};
use archie_render::{SceneInput, SceneTree, Theme, build_scene};

/// Zoom factor per keyboard zoom step.
pub const ZOOM_STEP: f32 = 1.2;

pub struct EditorSession {
    pub(crate) history: History,
    pub(crate) selection: Selection,
    pub(crate) transform: ViewTransform,
    pub(crate) mode: InteractionMode,
    /// Node whose resize handles are showing.
    pub(crate) resizing: Option<EntityId>,
    /// First node picked in connect mode.
    pub(crate) connect_source: Option<EntityId>,
    pub(crate) animation: Option<ViewAnimation>,
    pub(crate) viewport: Viewport,
    pub(crate) config: EditorConfig,
    pub(crate) theme: Theme,
    /// The in-flight pointer gesture, at most one.
    pub(crate) gesture: Option<Gesture>,
}

impl EditorSession {
    pub fn new(doc: Document, config: EditorConfig) -> Self {
        Self {
            history: History::new(doc.normalized(), config.max_history),
            selection: Selection::new(),
            transform: ViewTransform::IDENTITY,
            mode: InteractionMode::Select,
            resizing: None,
            connect_source: None,
            animation: None,
            viewport: Viewport::default(),
            config,
            theme: Theme::light(),
            gesture: None,
        }
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Swap in a new configuration. History depth changes apply from the
    /// next load.
    pub fn set_config(&mut self, config: EditorConfig) {
        self.config = config;
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the working document (e.g. with freshly generated output).
    /// History and transient state start over.
    pub fn load_document(&mut self, doc: Document) {
        self.abort_gesture();
        self.history = History::new(doc.normalized(), self.config.max_history);
        self.selection.clear();
        self.resizing = None;
        self.connect_source = None;
        log::debug!("loaded document {:?}", self.document().title);
    }

    pub fn load_json(&mut self, json: &str) -> archie_core::Result<()> {
        let doc = Document::from_json(json)?;
        self.load_document(doc);
        Ok(())
    }

    /// The document to render: the live preview during a gesture, the
    /// committed state otherwise.
    pub fn document(&self) -> &Document {
        self.history.current()
    }

    pub fn to_json(&self) -> archie_core::Result<String> {
        self.document().to_json()
    }

    /// Single entry point for document writes. `preview` frames replace the
    /// current history entry in place; anything else commits, ending any
    /// active gesture first.
    pub fn apply_document(&mut self, doc: Document, preview: bool) -> bool {
        if !preview {
            self.abort_gesture();
        }
        let changed = self.history.apply(doc, preview);
        if !preview {
            self.after_commit();
        }
        changed
    }

    pub(crate) fn commit(&mut self, mutation: DocMutation) -> bool {
        self.abort_gesture();
        let mut doc = self.document().clone();
        if !mutation.apply(&mut doc) {
            return false;
        }
        self.apply_document(doc, false)
    }

    /// Drop transient state that refers to entities no longer present.
    pub(crate) fn after_commit(&mut self) {
        let doc = self.history.current();
        self.selection.retain_existing(doc);
        if self.resizing.is_some_and(|id| doc.node(id).is_none()) {
            self.resizing = None;
        }
        if self.connect_source.is_some_and(|id| doc.node(id).is_none()) {
            self.connect_source = None;
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Set the view directly. Cancels any running animation.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.animation = None;
        self.transform = ViewTransform::new(transform.translate_x, transform.translate_y, transform.scale);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn resizing(&self) -> Option<EntityId> {
        self.resizing
    }

    pub fn connect_source(&self) -> Option<EntityId> {
        self.connect_source
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select exactly the given ids; unknown ids are skipped.
    pub fn set_selection(&mut self, ids: &[EntityId]) {
        let doc = self.history.current();
        let refs: Vec<EntityRef> = ids
            .iter()
            .filter_map(|&id| doc.entity(id).map(|e| e.entity_ref()))
            .collect();
        self.selection.replace_all(refs);
        self.sync_resizing();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.resizing = None;
    }

    /// Resize handles belong to the sole selected node only.
    pub(crate) fn sync_resizing(&mut self) {
        if let Some(id) = self.resizing
            && self.selection.single() != Some(EntityRef::node(id))
        {
            self.resizing = None;
        }
    }

    pub fn available_actions(&self) -> Vec<Action> {
        available_actions(&self.selection, self.document())
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Delete the selection. Incident links go with deleted nodes.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let targets = self.selection.as_slice().to_vec();
        let changed = self.commit(DocMutation::Remove { targets });
        self.selection.clear();
        self.resizing = None;
        changed
    }

    /// Clone the selection; the clones become the selection.
    pub fn duplicate_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.abort_gesture();
        let mut doc = self.document().clone();
        let clones = duplicate(&mut doc, self.selection.as_slice(), self.config.duplicate_offset);
        if clones.is_empty() {
            return false;
        }
        self.apply_document(doc, false);
        self.selection.replace_all(clones);
        self.resizing = None;
        true
    }

    pub fn update_node(&mut self, id: EntityId, patch: NodePatch) -> bool {
        self.commit(DocMutation::UpdateNode { id, patch })
    }

    pub fn update_link(&mut self, id: EntityId, patch: LinkPatch) -> bool {
        self.commit(DocMutation::UpdateLink { id, patch })
    }

    pub fn update_container(&mut self, id: EntityId, patch: ContainerPatch) -> bool {
        self.commit(DocMutation::UpdateContainer { id, patch })
    }

    /// Lock every selected node, or unlock them all if all are locked.
    pub fn toggle_lock(&mut self) -> bool {
        let ids: Vec<EntityId> = self.selection.nodes().collect();
        if ids.is_empty() {
            return false;
        }
        let doc = self.document();
        let all_locked = ids.iter().all(|&id| doc.node(id).is_some_and(|n| n.locked));
        self.commit(DocMutation::SetLocked {
            ids,
            locked: !all_locked,
        })
    }

    /// Show or hide resize handles on the sole selected node.
    pub fn toggle_resizing(&mut self) -> bool {
        let Some(EntityRef { id, .. }) = self.selection.single().filter(|r| r.kind == archie_core::EntityKind::Node)
        else {
            return false;
        };
        self.resizing = if self.resizing == Some(id) { None } else { Some(id) };
        true
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.finish_gesture();
        if mode != InteractionMode::Connect {
            self.connect_source = None;
        }
        if self.mode != mode {
            log::debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn undo(&mut self) -> bool {
        self.abort_gesture();
        if !self.history.undo() {
            return false;
        }
        self.clear_transient();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.abort_gesture();
        if !self.history.redo() {
            return false;
        }
        self.clear_transient();
        true
    }

    fn clear_transient(&mut self) {
        self.selection.clear();
        self.resizing = None;
        self.connect_source = None;
    }

    /// Escape: cancel whatever is in flight and deselect.
    pub fn escape(&mut self) {
        self.abort_gesture();
        self.clear_transient();
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Start animating toward the transform that frames all content.
    /// Returns `false` (and does nothing) when there is nothing to frame.
    pub fn fit_to_screen(&mut self, now_ms: f64) -> bool {
        let Some(content) = self.scene().content_bounds() else {
            return false;
        };
        let options = FitOptions {
            margin: self.config.fit_margin,
            max_scale: self.config.fit_max_scale,
        };
        let Some(target) = fit_transform(content, self.viewport, options) else {
            return false;
        };
        if self.config.fit_duration_ms <= 0.0 {
            self.animation = None;
            self.transform = target;
        } else {
            self.animation = Some(ViewAnimation::new(
                self.transform,
                target,
                now_ms,
                self.config.fit_duration_ms,
            ));
        }
        true
    }

    /// Advance the view animation. Returns whether the transform changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let (transform, done) = animation.sample(now_ms);
        self.transform = transform;
        if done {
            self.animation = None;
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Zoom about the viewport center.
    pub fn zoom_by(&mut self, factor: f32) {
        self.animation = None;
        self.transform = self
            .transform
            .zoomed_at(self.viewport.width / 2.0, self.viewport.height / 2.0, factor);
    }

    // ─── Output ──────────────────────────────────────────────────────────

    pub fn scene(&self) -> SceneTree {
        let selection = self.selection.ids();
        let input = SceneInput {
            document: self.document(),
            transform: self.transform,
            selection: &selection,
            mode: self.mode,
            resizing: self.resizing,
            connect_source: self.connect_source,
            marquee: self.gesture.as_ref().and_then(Gesture::marquee_rect),
            link_spacing: self.config.link_spacing as f64,
            theme: &self.theme,
        };
        build_scene(&input)
    }

    /// Screen anchor for the contextual toolbar, tracking pan and zoom.
    pub fn toolbar_anchor(&self) -> Option<(f32, f32)> {
        toolbar_anchor(
            &self.selection,
            self.document(),
            &self.transform,
            self.config.toolbar_offset_px,
        )
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Run a keyboard shortcut. Returns whether the key was bound. Nothing
    /// fires while a text field has focus.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers, text_focus: bool, now_ms: f64) -> bool {
        if text_focus {
            return false;
        }
        let Some(action) = ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta)
        else {
            return false;
        };
        log::trace!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Mode(mode) => self.set_mode(mode),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Delete => {
                self.delete_selection();
            }
            ShortcutAction::Duplicate => {
                self.duplicate_selection();
            }
            ShortcutAction::ZoomIn => self.zoom_by(ZOOM_STEP),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / ZOOM_STEP),
            ShortcutAction::ZoomToFit => {
                self.fit_to_screen(now_ms);
            }
            ShortcutAction::Deselect => self.escape(),
        }
        true
    }

    /// Dispatch one host event. Returns whether a redraw is needed.
    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.pointer_down(*x, *y, *modifiers),
            InputEvent::PointerMove { x, y, modifiers } => self.pointer_move(*x, *y, *modifiers),
            InputEvent::PointerUp { x, y, modifiers } => self.pointer_up(*x, *y, *modifiers),
            InputEvent::PointerCancel => self.pointer_cancel(),
            InputEvent::Scroll { x, y, dx, dy, zoom } => self.wheel(*x, *y, *dx, *dy, *zoom),
            InputEvent::Key {
                key,
                modifiers,
                text_focus,
            } => self.handle_key(key, *modifiers, *text_focus, now_ms),
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Document::default(), EditorConfig::default())
    }
}
