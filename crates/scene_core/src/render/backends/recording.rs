//! Command-recording backend
//!
//! Stores every [`RenderBackend`] call in order and mirrors the resulting
//! pipeline state, so callers can assert both the exact command stream of a
//! draw and the state it leaves behind.

use crate::render::api::RenderBackend;
use crate::render::shader::ShaderData;
use crate::render::state::{BlendMode, CullOrder};
use crate::render::texture::TextureData;
use crate::render::vertex_buffer::VertexBuffer;
use std::collections::BTreeMap;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Shader activated, by name
    BindShader(String),
    /// Shader deactivated
    UnbindShader,
    /// Scalar vec4 uniform upload
    SetUniform {
        /// Uniform index
        index: usize,
        /// Uploaded value
        value: [f32; 4],
    },
    /// Array uniform upload
    SetUniformArray {
        /// Uniform index
        index: usize,
        /// Uploaded elements
        values: Vec<[f32; 4]>,
    },
    /// Blending enabled
    EnableBlend {
        /// Source factor
        src: BlendMode,
        /// Destination factor
        dst: BlendMode,
    },
    /// Blending disabled
    DisableBlend,
    /// Colour write switched
    ColorWrite(bool),
    /// Depth write switched
    DepthWrite(bool),
    /// Culling enabled with front face winding
    EnableCullFace(CullOrder),
    /// Culling disabled
    DisableCullFace,
    /// Texture bound, by name
    BindTexture {
        /// Texture unit
        slot: u32,
        /// Texture name
        texture: String,
    },
    /// Texture unit cleared
    UnbindTexture {
        /// Texture unit
        slot: u32,
    },
    /// Model matrix set
    SetModelMatrix([[f32; 4]; 4]),
    /// Vertex buffer bound
    BindVertexBuffer {
        /// Bytes per vertex
        stride: usize,
        /// Number of vertices
        vertex_count: usize,
        /// Number of indices
        index_count: usize,
    },
    /// Vertex buffer unbound
    UnbindVertexBuffer,
    /// Indexed draw, with the indices it resolved to
    DrawIndexed {
        /// First index
        offset: u32,
        /// Index count
        count: u32,
        /// Indices read from the bound buffer; empty if the range was invalid
        indices: Vec<u32>,
    },
}

/// Pipeline state mirrored from the recorded calls
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedState {
    /// Active shader name
    pub shader: Option<String>,
    /// Blend factors while blending is on
    pub blend: Option<(BlendMode, BlendMode)>,
    /// Colour writes on
    pub color_write: bool,
    /// Depth writes on
    pub depth_write: bool,
    /// Front face winding while culling is on
    pub cull_face: Option<CullOrder>,
    /// Bound textures by unit
    pub textures: BTreeMap<u32, String>,
    /// A vertex buffer is bound
    pub vertex_buffer_bound: bool,
}

impl Default for TrackedState {
    fn default() -> Self {
        Self {
            shader: None,
            blend: None,
            color_write: true,
            depth_write: true,
            cull_face: None,
            textures: BTreeMap::new(),
            vertex_buffer_bound: false,
        }
    }
}

/// Backend that records calls instead of rendering
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
    state: TrackedState,
    bound_vertices: Option<VertexBuffer>,
}

impl RecordingBackend {
    /// Create an empty recorder with default pipeline state
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls, oldest first
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Take the recorded calls, leaving the state untouched
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current mirrored pipeline state
    pub fn state(&self) -> &TrackedState {
        &self.state
    }

    /// Buffer currently bound, if any
    pub fn bound_vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.bound_vertices.as_ref()
    }

    /// Recorded draw calls as `(offset, count, indices)`
    pub fn draw_calls(&self) -> impl Iterator<Item = (u32, u32, &[u32])> + '_ {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::DrawIndexed { offset, count, indices } => Some((*offset, *count, indices.as_slice())),
            _ => None,
        })
    }

    fn record(&mut self, command: RenderCommand) {
        log::trace!("{:?}", command);
        self.commands.push(command);
    }
}

impl RenderBackend for RecordingBackend {
    fn bind_shader(&mut self, shader: &ShaderData) {
        self.state.shader = Some(shader.name.clone());
        self.record(RenderCommand::BindShader(shader.name.clone()));
    }

    fn unbind_shader(&mut self) {
        self.state.shader = None;
        self.record(RenderCommand::UnbindShader);
    }

    fn set_uniform(&mut self, index: usize, value: [f32; 4]) {
        self.record(RenderCommand::SetUniform { index, value });
    }

    fn set_uniform_array(&mut self, index: usize, values: &[[f32; 4]]) {
        self.record(RenderCommand::SetUniformArray {
            index,
            values: values.to_vec(),
        });
    }

    fn enable_blend(&mut self, src: BlendMode, dst: BlendMode) {
        self.state.blend = Some((src, dst));
        self.record(RenderCommand::EnableBlend { src, dst });
    }

    fn disable_blend(&mut self) {
        self.state.blend = None;
        self.record(RenderCommand::DisableBlend);
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.state.color_write = enabled;
        self.record(RenderCommand::ColorWrite(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
        self.record(RenderCommand::DepthWrite(enabled));
    }

    fn enable_cull_face(&mut self, order: CullOrder) {
        self.state.cull_face = Some(order);
        self.record(RenderCommand::EnableCullFace(order));
    }

    fn disable_cull_face(&mut self) {
        self.state.cull_face = None;
        self.record(RenderCommand::DisableCullFace);
    }

    fn bind_texture(&mut self, texture: &TextureData, slot: u32) {
        self.state.textures.insert(slot, texture.name.clone());
        self.record(RenderCommand::BindTexture {
            slot,
            texture: texture.name.clone(),
        });
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.state.textures.remove(&slot);
        self.record(RenderCommand::UnbindTexture { slot });
    }

    fn set_model_matrix(&mut self, model: [[f32; 4]; 4]) {
        self.record(RenderCommand::SetModelMatrix(model));
    }

    fn bind_vertex_buffer(&mut self, buffer: &VertexBuffer) {
        self.state.vertex_buffer_bound = true;
        self.bound_vertices = Some(buffer.clone());
        self.record(RenderCommand::BindVertexBuffer {
            stride: buffer.stride(),
            vertex_count: buffer.vertex_count(),
            index_count: buffer.index_count(),
        });
    }

    fn unbind_vertex_buffer(&mut self) {
        self.state.vertex_buffer_bound = false;
        self.bound_vertices = None;
        self.record(RenderCommand::UnbindVertexBuffer);
    }

    fn draw_indexed(&mut self, offset: u32, count: u32) {
        let indices = self
            .bound_vertices
            .as_ref()
            .and_then(|buffer| buffer.indices().range(offset as usize, count as usize))
            .unwrap_or_default();

        if indices.is_empty() && count > 0 {
            log::warn!("Draw of {} indices at {} outside the bound buffer", count, offset);
        }
        self.record(RenderCommand::DrawIndexed { offset, count, indices });
    }
}
