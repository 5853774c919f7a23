//! Scene objects built on shared resources
//!
//! ## Architecture
//!
//! ```text
//! ResourceProvider (bytes)
//!      ↓
//! Loaders (PMD, shader, texture)
//!      ↓
//! SharedResources caches  ←  SceneContext
//!      ↓
//! Mesh instances (proxy + per-instance material overrides)
//!      ↓
//! RenderBackend
//! ```
//!
//! Geometry is loaded once per name and shared; each [`Mesh`] instance adds
//! its own transform and copy-on-write material overrides.

pub mod context;
pub mod material;
pub mod mesh;

#[cfg(test)]
mod tests;

pub use context::SceneContext;
pub use material::{Material, Param, ParamArray, ParamArrayProxy, ParamProxy, ShaderProxy, TextureProxy};
pub use mesh::{Mesh, MeshData, MeshGroup, MeshProxy, SurfaceDesc};
