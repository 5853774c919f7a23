//! # Rendering layer
//!
//! Backend-facing data and the capability set the scene layer drives:
//! - **Render Backend**: the primitive operations a draw is expressed in
//! - **Payloads**: shader reflection, texture pixels, interleaved vertex buffers, skeletons
//! - **State**: blend factors, face winding, material state flags
//!
//! GPU API bindings are not part of this crate; [`backends::RecordingBackend`]
//! stands in for them in headless runs and tests.

pub mod api;
pub mod backends;

pub mod shader;
pub mod skeleton;
pub mod state;
pub mod texture;
pub mod vertex_buffer;

pub use api::RenderBackend;
pub use backends::{RecordingBackend, RenderCommand, TrackedState};
pub use shader::{SamplerDecl, ShaderData, UniformDecl};
pub use skeleton::{Bone, Skeleton};
pub use state::{BlendMode, CullOrder, StateFlags};
pub use texture::{ColorFormat, TextureData};
pub use vertex_buffer::{IndexData, VertexAttribute, VertexBuffer, VertexLayout};
