//! Scene construction for Archie documents: link routing, hit testing,
//! SVG export and Vello painting.

pub mod hit;
pub mod paint;
pub mod route;
pub mod scene;
pub mod svg;
pub mod theme;

pub use hit::{hit_test, hit_test_handle, hit_test_rect};
pub use paint::paint_scene;
pub use route::{LINK_SPACING, LinkRoute, ParallelIndex, ParallelSlot, route_link};
pub use scene::{
    ContainerVisual, Corner, Handle, LabelChip, LinkVisual, NodeVisual, SceneInput, SceneTree, build_scene,
};
pub use svg::render_svg;
pub use theme::Theme;

// Re-export kurbo so downstream crates don't need a direct dependency
pub use kurbo;
