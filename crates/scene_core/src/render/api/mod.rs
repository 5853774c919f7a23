//! Public rendering API
//!
//! The capability set materials and meshes drive. Nothing above this layer
//! talks to a graphics API directly.

pub mod render_backend;

// Re-export commonly used types
pub use render_backend::RenderBackend;
