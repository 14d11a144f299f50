//! Archie document model: nodes, links and containers, boundary
//! normalization of incoming JSON, and the document-to-screen transform.

pub mod error;
pub mod id;
pub mod ingest;
pub mod mode;
pub mod model;
pub mod viewport;

pub use error::{DocumentError, Result};
pub use id::EntityId;
pub use ingest::{MIN_CONTAINER_SIZE, MIN_NODE_SIZE, normalize, prune_dangling};
pub use mode::InteractionMode;
pub use model::*;
pub use viewport::{FitOptions, ViewTransform, Viewport, fit_transform};
