//! Backend abstraction trait for the rendering system
//!
//! Materials and mesh instances express a draw purely as a sequence of these
//! primitive operations. A backend may cache GPU objects for the payloads it
//! is handed (keyed by address or name); the core never owns GPU handles.

use crate::render::shader::ShaderData;
use crate::render::state::{BlendMode, CullOrder};
use crate::render::texture::TextureData;
use crate::render::vertex_buffer::VertexBuffer;

/// Main rendering backend trait
///
/// Calls arrive in the order a draw needs them; the backend applies each one
/// immediately. Failures are the backend's to report; the core keeps going.
pub trait RenderBackend {
    /// Make `shader` the active program
    fn bind_shader(&mut self, shader: &ShaderData);

    /// Deactivate the current program
    fn unbind_shader(&mut self);

    /// Upload a vec4 uniform of the active program
    fn set_uniform(&mut self, index: usize, value: [f32; 4]);

    /// Upload a vec4 array uniform of the active program
    fn set_uniform_array(&mut self, index: usize, values: &[[f32; 4]]);

    /// Enable blending with the given factors
    fn enable_blend(&mut self, src: BlendMode, dst: BlendMode);

    /// Disable blending
    fn disable_blend(&mut self);

    /// Enable or disable colour buffer writes
    fn set_color_write(&mut self, enabled: bool);

    /// Enable or disable depth buffer writes
    fn set_depth_write(&mut self, enabled: bool);

    /// Enable face culling; `order` names the front face winding
    fn enable_cull_face(&mut self, order: CullOrder);

    /// Disable face culling
    fn disable_cull_face(&mut self);

    /// Bind `texture` to texture unit `slot`
    fn bind_texture(&mut self, texture: &TextureData, slot: u32);

    /// Clear texture unit `slot`
    fn unbind_texture(&mut self, slot: u32);

    /// Set the model matrix (column major) for subsequent draws
    fn set_model_matrix(&mut self, model: [[f32; 4]; 4]);

    /// Bind a vertex/index buffer pair
    fn bind_vertex_buffer(&mut self, buffer: &VertexBuffer);

    /// Unbind the current vertex/index buffer pair
    fn unbind_vertex_buffer(&mut self);

    /// Draw `count` indices starting at index `offset` of the bound buffer
    fn draw_indexed(&mut self, offset: u32, count: u32);
}
