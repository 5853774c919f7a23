//! # Scene Core
//!
//! Shared GPU resources, materials and mesh instancing for a real-time 3D
//! renderer.
//!
//! ## Features
//!
//! - **Shared Resources**: name-keyed, reference-counted caches handing out proxies
//! - **Materials**: shader parameters, textures and render state applied around each draw
//! - **Mesh Instancing**: shared geometry with per-instance copy-on-write material overrides
//! - **PMD Loading**: bounds-checked binary parsing into a backend-ready vertex layout
//! - **Backend Agnostic**: every draw is expressed through the [`RenderBackend`](render::RenderBackend) trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = FileResourceProvider::new(["resources"]);
//!     let context = SceneContext::new(&ResourceConfig::default(), Rc::new(provider));
//!
//!     let mut mesh = context.load_mesh("models/miku.pmd")?;
//!     if let Some(material) = mesh.modify_material(0) {
//!         material.set_blend(true, BlendMode::SrcAlpha, BlendMode::InvSrcAlpha);
//!     }
//!
//!     let mut backend = RecordingBackend::new();
//!     mesh.draw(&mut backend, None);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;
pub mod resources;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, FileResourceProvider, MemoryResourceProvider, ResourceProvider},
        config::{CacheConfig, Config, ResourceConfig},
        foundation::math::{Mat4, Transform, Vec3, Vec4},
        render::{BlendMode, CullOrder, RecordingBackend, RenderBackend, ShaderData, TextureData},
        resources::{Proxy, ResourceError, ResourceLoader, SharedResources},
        scene::{Material, Mesh, MeshData, Param, ParamArray, SceneContext},
    };
}
