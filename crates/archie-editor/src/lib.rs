//! Editing engine: `EditorSession` owns the document history, selection,
//! interaction mode and view, and turns pointer and keyboard input into
//! preview frames and commits.

pub mod camera;
pub mod config;
pub mod gesture;
pub mod history;
pub mod input;
pub mod mutation;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod toolbar;

pub use camera::ViewAnimation;
pub use config::EditorConfig;
pub use gesture::{HIT_TOLERANCE_PX, constrain_to_axis, resize_geometry};
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use mutation::{ContainerPatch, DocMutation, LinkPatch, NodePatch};
pub use selection::{Action, Selection, SelectionMode};
pub use session::{EditorSession, ZOOM_STEP};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use toolbar::toolbar_anchor;
