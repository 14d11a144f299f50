//! WASM bridge for Archie: exposes the editor session to the browser host.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the DOM,
//! forwards pointer, wheel and keyboard events here, and paints the SVG
//! (or Vello scene) this crate hands back.

use archie_core::{Document, EntityId, InteractionMode, Viewport};
use archie_editor::{
    ContainerPatch, EditorConfig, EditorSession, InputEvent, LinkPatch, Modifiers, NodePatch,
};
use archie_render::{Theme, render_svg};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Wraps one `EditorSession`; every interaction from the host goes
/// through this struct.
#[wasm_bindgen]
pub struct ArchieCanvas {
    session: EditorSession,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl ArchieCanvas {
    /// Create a controller for a canvas of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Self {
        console_error_panic_hook_setup();
        console_logger_setup();

        let mut session = EditorSession::new(Document::default(), EditorConfig::default());
        session.set_viewport(Viewport { width, height });
        Self {
            session,
            dark_mode: false,
        }
    }

    /// Apply a partial JSON config. Returns `false` if it does not parse.
    pub fn configure(&mut self, json: &str) -> bool {
        match EditorConfig::from_json(json) {
            Ok(config) => {
                self.session.set_config(config);
                true
            }
            Err(e) => {
                log::warn!("ignoring editor config: {e}");
                false
            }
        }
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Load a generated document. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"..."}`.
    pub fn set_document(&mut self, json: &str) -> String {
        match self.session.load_json(json) {
            Ok(()) => r#"{"ok":true}"#.to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// The current document as JSON, in the same shape it was loaded.
    pub fn get_document(&self) -> String {
        self.session.to_json().unwrap_or_else(|e| {
            log::error!("document serialization failed: {e}");
            String::new()
        })
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Render the current frame as a standalone SVG string.
    pub fn render_svg(&self) -> String {
        render_svg(&self.session.scene(), self.session.viewport())
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
        self.session
            .set_theme(if is_dark { Theme::dark() } else { Theme::light() });
    }

    pub fn is_dark(&self) -> bool {
        self.dark_mode
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.session.set_viewport(Viewport { width, height });
    }

    // ─── Pointer / wheel ─────────────────────────────────────────────────

    /// Handle pointer down. Returns true if a redraw is needed.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.session.pointer_down(x, y, modifiers(shift, ctrl, alt, meta))
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.session.pointer_move(x, y, modifiers(shift, ctrl, alt, meta))
    }

    /// Handle pointer up. Returns a JSON string:
    /// `{"changed":bool,"mode":"<mode>","canUndo":bool}`
    pub fn handle_pointer_up(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let changed = self.session.pointer_up(x, y, modifiers(shift, ctrl, alt, meta));
        serde_json::json!({
            "changed": changed,
            "mode": self.session.mode(),
            "canUndo": self.session.history().can_undo(),
        })
        .to_string()
    }

    /// The pointer left the canvas or the gesture was interrupted.
    pub fn handle_pointer_cancel(&mut self) -> bool {
        self.session.pointer_cancel()
    }

    /// Wheel or trackpad. `zoom` is 1 for a plain scroll.
    pub fn handle_wheel(&mut self, x: f32, y: f32, dx: f32, dy: f32, zoom: f32) -> bool {
        self.session.wheel(x, y, dx, dy, zoom)
    }

    /// Dispatch a JSON-encoded `InputEvent`. Returns false for malformed
    /// events.
    pub fn handle_event(&mut self, json: &str) -> bool {
        match parse::<InputEvent>(json) {
            Some(event) => self.session.handle_input(&event, js_sys::Date::now()),
            None => false,
        }
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"handled":bool,"mode":"<mode>"}`. Nothing is bound while a text
    /// field has focus.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        text_focus: bool,
    ) -> String {
        let handled = self.session.handle_key(
            key,
            modifiers(shift, ctrl, alt, meta),
            text_focus,
            js_sys::Date::now(),
        );
        serde_json::json!({ "handled": handled, "mode": self.session.mode() }).to_string()
    }

    // ─── Mode ────────────────────────────────────────────────────────────

    /// Switch interaction mode by name. Unknown names fall back to select.
    pub fn set_mode(&mut self, name: &str) {
        let mode = InteractionMode::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown mode {name:?}, using select");
            InteractionMode::Select
        });
        self.session.set_mode(mode);
    }

    /// Current mode name, e.g. `"addNode"`.
    pub fn get_mode(&self) -> String {
        serde_json::to_value(self.session.mode())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// CSS cursor for the current mode.
    pub fn get_cursor(&self) -> String {
        self.session.mode().cursor().to_string()
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Start the zoom-to-fit animation. Drive it with `tick`.
    pub fn fit_to_screen(&mut self) -> bool {
        self.session.fit_to_screen(js_sys::Date::now())
    }

    /// Advance view animations. Returns true while the view is moving.
    pub fn tick(&mut self) -> bool {
        self.session.tick(js_sys::Date::now())
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.session.zoom_by(factor);
    }

    /// `{"translateX":..,"translateY":..,"scale":..}`
    pub fn get_transform(&self) -> String {
        to_json(&self.session.transform(), "null")
    }

    /// Screen position for the contextual toolbar: `{"x":..,"y":..}` or
    /// `null` when nothing is selected.
    pub fn get_toolbar_anchor(&self) -> String {
        match self.session.toolbar_anchor() {
            Some((x, y)) => serde_json::json!({ "x": x, "y": y }).to_string(),
            None => "null".to_string(),
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// All selected entity IDs as a JSON array.
    pub fn get_selected_ids(&self) -> String {
        let ids: Vec<&str> = self.session.selection().iter().map(|e| e.id.as_str()).collect();
        to_json(&ids, "[]")
    }

    /// `{"mode":"empty|single|bulk","actions":[...]}`
    pub fn get_selection_info(&self) -> String {
        serde_json::json!({
            "mode": self.session.selection().mode(),
            "actions": self.session.available_actions(),
        })
        .to_string()
    }

    /// Select entities by ID (e.g. from a properties list). An empty
    /// string clears the selection.
    pub fn select_by_id(&mut self, entity_id: &str) -> bool {
        if entity_id.is_empty() {
            self.session.clear_selection();
            return true;
        }
        let id = EntityId::intern(entity_id);
        if self.session.document().entity(id).is_none() {
            return false;
        }
        self.session.set_selection(&[id]);
        true
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    pub fn update_node(&mut self, node_id: &str, patch_json: &str) -> bool {
        parse::<NodePatch>(patch_json).is_some_and(|p| self.session.update_node(EntityId::intern(node_id), p))
    }

    pub fn update_link(&mut self, link_id: &str, patch_json: &str) -> bool {
        parse::<LinkPatch>(patch_json).is_some_and(|p| self.session.update_link(EntityId::intern(link_id), p))
    }

    pub fn update_container(&mut self, container_id: &str, patch_json: &str) -> bool {
        parse::<ContainerPatch>(patch_json)
            .is_some_and(|p| self.session.update_container(EntityId::intern(container_id), p))
    }

    pub fn delete_selection(&mut self) -> bool {
        self.session.delete_selection()
    }

    pub fn duplicate_selection(&mut self) -> bool {
        self.session.duplicate_selection()
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.session.toggle_lock()
    }

    pub fn toggle_resizing(&mut self) -> bool {
        self.session.toggle_resizing()
    }

    /// Undo the last committed edit.
    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.history().can_redo()
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Check a generated document. Returns `{"ok":true,"nodes":N,"links":N,
/// "containers":N}` or `{"ok":false,"error":"..."}`. Repairs made by
/// normalization do not count as errors.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match Document::from_json(json) {
        Ok(doc) => serde_json::json!({
            "ok": true,
            "nodes": doc.nodes.len(),
            "links": doc.links.len(),
            "containers": doc.containers.len(),
        })
        .to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn parse<T: DeserializeOwned>(json: &str) -> Option<T> {
    serde_json::from_str(json)
        .map_err(|e| log::warn!("rejected host payload: {e}"))
        .ok()
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "ok": false, "error": message }).to_string()
}

// ─── Console plumbing ────────────────────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Archie WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Routes `log` records to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[{}] {}", record.target(), record.args());
        #[cfg(target_arch = "wasm32")]
        {
            match record.level() {
                log::Level::Error => web_sys::console::error_1(&msg.into()),
                log::Level::Warn => web_sys::console::warn_1(&msg.into()),
                log::Level::Info => web_sys::console::info_1(&msg.into()),
                log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg.into()),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            eprintln!("{} {msg}", record.level());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_logger_setup() {
    // A second canvas on the page finds the logger already installed.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validate_reports_counts() {
        let out = validate(r#"{"nodes":[{"id":"a","x":0,"y":0,"width":100,"height":60}]}"#);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["nodes"], 1);
        assert_eq!(v["links"], 0);
    }

    #[test]
    fn validate_reports_syntax_errors() {
        let v: serde_json::Value = serde_json::from_str(&validate("{nodes")).unwrap();
        assert_eq!(v["ok"], false);
        assert!(v["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn malformed_patch_is_rejected() {
        assert!(parse::<NodePatch>("{\"x\": ").is_none());
        assert_eq!(
            parse::<NodePatch>(r#"{"label":"db"}"#).and_then(|p| p.label),
            Some("db".to_string())
        );
    }
}
