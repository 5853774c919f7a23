//! Material: shader, parameters, textures and fixed-function state
//!
//! A material is applied around a draw with [`Material::set`] and reverted
//! with [`Material::unset`]. The pair restores the pipeline baseline (no
//! blending, colour and depth writes on, no textures), so consecutive
//! materials compose without the caller tracking state. Calls must be paired
//! and do not nest.
//!
//! Parameter slots line up with the shader's uniform declarations. A slot
//! holds a value, a value with a component-wise multiplier, or an array; the
//! setters keep these exclusive.

use crate::foundation::math::Vec4;
use crate::render::api::RenderBackend;
use crate::render::shader::ShaderData;
use crate::render::state::{BlendMode, CullOrder, StateFlags};
use crate::render::texture::TextureData;
use crate::resources::Proxy;

/// A vec4 shader parameter
pub type Param = Vec4;

/// Handle to a shader
pub type ShaderProxy = Proxy<ShaderData>;
/// Handle to a texture
pub type TextureProxy = Proxy<TextureData>;
/// Handle to a parameter value, shareable between materials
pub type ParamProxy = Proxy<Param>;
/// Handle to a parameter array
pub type ParamArrayProxy = Proxy<ParamArray>;

/// Array of vec4 values uploaded to one uniform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamArray {
    values: Vec<[f32; 4]>,
}

impl ParamArray {
    /// `count` zero vectors
    pub fn new(count: usize) -> Self {
        Self {
            values: vec![[0.0; 4]; count],
        }
    }

    /// Array holding `values`
    pub fn from_values<I: IntoIterator<Item = Param>>(values: I) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of elements
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrite element `idx`; out of range is ignored
    pub fn set(&mut self, idx: usize, value: Param) {
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = value.into();
        }
    }

    /// Element `idx`
    pub fn get(&self, idx: usize) -> Option<Param> {
        self.values.get(idx).map(|&v| Param::from(v))
    }

    /// Elements in upload form
    pub fn as_slice(&self) -> &[[f32; 4]] {
        &self.values
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ParamSlot {
    value: ParamProxy,
    multiplier: ParamProxy,
    array: ParamArrayProxy,
}

impl ParamSlot {
    /// Vector uploaded for this slot when it holds no array
    fn effective_value(&self) -> [f32; 4] {
        match (self.value.get(), self.multiplier.get()) {
            (Some(value), Some(multiplier)) => value.component_mul(multiplier).into(),
            (Some(value), None) => (*value).into(),
            (None, _) => [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TextureBinding {
    semantics: String,
    proxy: TextureProxy,
    slot: Option<u32>,
}

/// Shader plus everything a draw needs to configure around it
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    shader: ShaderProxy,
    params: Vec<ParamSlot>,
    textures: Vec<TextureBinding>,
    flags: StateFlags,
    blend_src: BlendMode,
    blend_dst: BlendMode,
    cull_order: CullOrder,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shader: ShaderProxy::invalid(),
            params: Vec::new(),
            textures: Vec::new(),
            flags: StateFlags::default(),
            blend_src: BlendMode::SrcAlpha,
            blend_dst: BlendMode::InvSrcAlpha,
            cull_order: CullOrder::Ccw,
        }
    }
}

impl Material {
    /// Empty opaque material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the material
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Apply the material to `backend`
    pub fn set(&self, backend: &mut dyn RenderBackend) {
        if let Some(shader) = self.shader.get() {
            backend.bind_shader(shader);
        }

        for (idx, slot) in self.params.iter().enumerate() {
            // Array wins over scalar
            match slot.array.get().filter(|array| !array.is_empty()) {
                Some(array) => backend.set_uniform_array(idx, array.as_slice()),
                None => backend.set_uniform(idx, slot.effective_value()),
            }
        }

        if self.flags.contains(StateFlags::BLEND) {
            backend.enable_blend(self.blend_src, self.blend_dst);
        } else {
            backend.disable_blend();
        }

        backend.set_color_write(self.flags.contains(StateFlags::COLOR_WRITE));
        backend.set_depth_write(self.flags.contains(StateFlags::DEPTH_WRITE));

        if self.flags.contains(StateFlags::CULL_FACE) {
            backend.enable_cull_face(self.cull_order);
        } else {
            backend.disable_cull_face();
        }

        for binding in &self.textures {
            let Some(slot) = binding.slot else {
                continue;
            };

            match binding.proxy.get() {
                Some(texture) => backend.bind_texture(texture, slot),
                // Clear whatever the previous material left in the unit
                None => backend.unbind_texture(slot),
            }
        }
    }

    /// Revert what [`Self::set`] changed
    pub fn unset(&self, backend: &mut dyn RenderBackend) {
        if self.shader.is_valid() {
            backend.unbind_shader();
        }

        if self.flags.contains(StateFlags::BLEND) {
            backend.disable_blend();
        }

        if !self.flags.contains(StateFlags::DEPTH_WRITE) {
            backend.set_depth_write(true);
        }

        if !self.flags.contains(StateFlags::COLOR_WRITE) {
            backend.set_color_write(true);
        }

        for binding in &self.textures {
            if let Some(slot) = binding.slot.filter(|_| binding.proxy.is_valid()) {
                backend.unbind_texture(slot);
            }
        }
    }

    /// Replace the shader
    ///
    /// Texture slots are resolved again against the new shader and the
    /// parameter table is reset to its uniform count.
    pub fn set_shader(&mut self, shader: ShaderProxy) {
        self.shader = shader;
        let shader = self.shader.get();

        for binding in &mut self.textures {
            binding.slot = shader.and_then(|s| s.texture_slot(&binding.semantics));
        }

        let count = shader.map_or(0, ShaderData::uniforms_count);
        self.params.clear();
        self.params.resize_with(count, ParamSlot::default);
    }

    /// Attached shader
    pub fn shader(&self) -> &ShaderProxy {
        &self.shader
    }

    /// Bind `texture` under `semantics`, replacing an existing binding
    pub fn set_texture(&mut self, semantics: &str, texture: impl Into<TextureProxy>) {
        if semantics.is_empty() {
            log::debug!("Material '{}': ignoring texture with empty semantics", self.name);
            return;
        }

        let slot = self.shader.get().and_then(|s| s.texture_slot(semantics));
        let proxy = texture.into();

        if let Some(binding) = self.textures.iter_mut().find(|b| b.semantics == semantics) {
            binding.proxy = proxy;
            binding.slot = slot;
            return;
        }

        self.textures.push(TextureBinding {
            semantics: semantics.to_string(),
            proxy,
            slot,
        });
    }

    /// Number of texture bindings
    pub fn textures_count(&self) -> usize {
        self.textures.len()
    }

    /// Texture bound at `idx`
    pub fn texture(&self, idx: usize) -> Option<&TextureProxy> {
        self.textures.get(idx).map(|b| &b.proxy)
    }

    /// Semantics of the texture binding at `idx`
    pub fn texture_semantics(&self, idx: usize) -> Option<&str> {
        self.textures.get(idx).map(|b| b.semantics.as_str())
    }

    /// Resolved unit of the texture binding at `idx`
    pub fn texture_slot(&self, idx: usize) -> Option<u32> {
        self.textures.get(idx).and_then(|b| b.slot)
    }

    /// Index of the shader uniform called `name`
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.shader.get()?.uniform_idx(name)
    }

    /// Number of parameter slots, always the shader's uniform count
    pub fn params_count(&self) -> usize {
        self.params.len()
    }

    /// Name of the uniform behind slot `idx`
    pub fn param_name(&self, idx: usize) -> Option<&str> {
        if idx >= self.params.len() {
            return None;
        }
        self.shader.get()?.uniform(idx).map(|u| u.name.as_str())
    }

    /// Bind a plain value to slot `idx`
    pub fn set_param(&mut self, idx: usize, value: impl Into<ParamProxy>) {
        self.set_param_with_multiplier(idx, value, ParamProxy::invalid());
    }

    /// Bind `value * multiplier`, component-wise, to slot `idx`
    pub fn set_param_with_multiplier(
        &mut self,
        idx: usize,
        value: impl Into<ParamProxy>,
        multiplier: impl Into<ParamProxy>,
    ) {
        let Some(slot) = self.param_slot_mut(idx) else {
            return;
        };

        slot.value = value.into();
        slot.multiplier = multiplier.into();
        slot.array.free();
    }

    /// Bind an array to slot `idx`
    pub fn set_param_array(&mut self, idx: usize, array: impl Into<ParamArrayProxy>) {
        let Some(slot) = self.param_slot_mut(idx) else {
            return;
        };

        slot.value.free();
        slot.multiplier.free();
        slot.array = array.into();
    }

    /// Value bound to slot `idx`
    pub fn param(&self, idx: usize) -> Option<&Param> {
        self.params.get(idx)?.value.get()
    }

    /// Multiplier bound to slot `idx`
    pub fn param_multiplier(&self, idx: usize) -> Option<&Param> {
        self.params.get(idx)?.multiplier.get()
    }

    /// Array bound to slot `idx`
    pub fn param_array(&self, idx: usize) -> Option<&ParamArray> {
        self.params.get(idx)?.array.get()
    }

    fn param_slot_mut(&mut self, idx: usize) -> Option<&mut ParamSlot> {
        let slot = self.params.get_mut(idx);
        if slot.is_none() {
            log::debug!("Material '{}': parameter {} out of range", self.name, idx);
        }
        slot
    }

    /// Enable blending with the given factors, or disable it
    pub fn set_blend(&mut self, enabled: bool, src: BlendMode, dst: BlendMode) {
        self.flags.set(StateFlags::BLEND, enabled);
        self.blend_src = src;
        self.blend_dst = dst;
    }

    /// Blend factors, `None` while blending is off
    pub fn blend(&self) -> Option<(BlendMode, BlendMode)> {
        self.flags
            .contains(StateFlags::BLEND)
            .then_some((self.blend_src, self.blend_dst))
    }

    /// Enable culling with front face `order`, or disable it
    pub fn set_cull_face(&mut self, enabled: bool, order: CullOrder) {
        self.flags.set(StateFlags::CULL_FACE, enabled);
        self.cull_order = order;
    }

    /// Front face winding, `None` while culling is off
    pub fn cull_face(&self) -> Option<CullOrder> {
        self.flags.contains(StateFlags::CULL_FACE).then_some(self.cull_order)
    }

    /// Switch depth writes
    pub fn set_zwrite(&mut self, enabled: bool) {
        self.flags.set(StateFlags::DEPTH_WRITE, enabled);
    }

    /// Whether depth writes are on
    pub fn zwrite(&self) -> bool {
        self.flags.contains(StateFlags::DEPTH_WRITE)
    }

    /// Switch colour writes
    pub fn set_color_write(&mut self, enabled: bool) {
        self.flags.set(StateFlags::COLOR_WRITE, enabled);
    }

    /// Whether colour writes are on
    pub fn color_write(&self) -> bool {
        self.flags.contains(StateFlags::COLOR_WRITE)
    }

    /// Current state switches
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Drop every resource reference and the name
    pub fn release(&mut self) {
        for binding in &mut self.textures {
            binding.proxy.free();
        }
        self.textures.clear();
        self.params.clear();
        self.shader.free();
        self.name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{RecordingBackend, RenderCommand};
    use crate::render::shader::{SamplerDecl, UniformDecl};
    use approx::assert_relative_eq;

    fn shader(name: &str, uniforms: &[&str], samplers: &[(&str, u32)]) -> ShaderProxy {
        Proxy::new(ShaderData {
            name: name.to_string(),
            uniforms: uniforms
                .iter()
                .map(|n| UniformDecl { name: n.to_string(), count: 1 })
                .collect(),
            samplers: samplers
                .iter()
                .map(|&(s, slot)| SamplerDecl { semantics: s.to_string(), slot })
                .collect(),
            ..ShaderData::default()
        })
    }

    #[test]
    fn test_params_follow_shader_uniforms() {
        let mut material = Material::new("skin");
        assert_eq!(material.params_count(), 0);

        material.set_shader(shader("a", &["diffuse", "specular", "light"], &[]));
        assert_eq!(material.params_count(), 3);
        material.set_param(1, Param::new(1.0, 1.0, 1.0, 1.0));

        material.set_shader(shader("b", &["diffuse"], &[]));
        assert_eq!(material.params_count(), 1);
        assert!(material.param(0).is_none());
        assert_eq!(material.param_index("specular"), None);
        assert_eq!(material.param_index("diffuse"), Some(0));
        assert_eq!(material.param_name(0), Some("diffuse"));
        assert_eq!(material.param_name(1), None);
    }

    #[test]
    fn test_multiplier_applies_component_wise() {
        let mut material = Material::new("tint");
        material.set_shader(shader("s", &["color"], &[]));
        material.set_param_with_multiplier(0, Param::new(2.0, 3.0, 4.0, 5.0), Param::new(1.0, 0.0, 1.0, 0.5));

        let mut backend = RecordingBackend::new();
        material.set(&mut backend);

        assert!(backend
            .commands()
            .contains(&RenderCommand::SetUniform { index: 0, value: [2.0, 0.0, 4.0, 2.5] }));
    }

    #[test]
    fn test_array_replaces_scalar_and_empty_slots_upload_zero() {
        let mut material = Material::new("bones");
        material.set_shader(shader("s", &["unset", "bones"], &[]));
        material.set_param(1, Param::new(9.0, 9.0, 9.0, 9.0));
        material.set_param_array(
            1,
            ParamArray::from_values([Param::x(), Param::y(), Param::z()]),
        );

        assert!(material.param(1).is_none());
        assert_eq!(material.param_array(1).map(ParamArray::count), Some(3));

        let mut backend = RecordingBackend::new();
        material.set(&mut backend);

        let uploads: Vec<_> = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetUniform { .. } | RenderCommand::SetUniformArray { .. }))
            .cloned()
            .collect();
        assert_eq!(
            uploads,
            vec![
                RenderCommand::SetUniform { index: 0, value: [0.0; 4] },
                RenderCommand::SetUniformArray {
                    index: 1,
                    values: vec![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]],
                },
            ]
        );
    }

    #[test]
    fn test_set_param_out_of_range_is_ignored() {
        let mut material = Material::new("m");
        material.set_shader(shader("s", &["a"], &[]));
        material.set_param(3, Param::zeros());
        material.set_param_array(3, ParamArray::new(2));

        assert_eq!(material.params_count(), 1);
        assert!(material.param(3).is_none());
    }

    #[test]
    fn test_shared_param_value() {
        let shared = ParamProxy::new(Param::new(0.5, 0.5, 0.5, 1.0));
        let mut a = Material::new("a");
        let mut b = Material::new("b");
        a.set_shader(shader("s", &["c"], &[]));
        b.set_shader(shader("s", &["c"], &[]));
        a.set_param(0, shared.clone());
        b.set_param(0, shared.clone());

        assert_eq!(shared.ref_count(), 3);
        assert_relative_eq!(*b.param(0).unwrap(), Param::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_texture_slots_resolve_by_semantics() {
        let mut material = Material::new("m");
        material.set_texture("diffuse", TextureData::solid("d.png", [255; 4]));
        material.set_texture("Diffuse", TextureData::solid("upper.png", [0; 4]));
        material.set_texture("", TextureData::solid("ignored.png", [0; 4]));
        assert_eq!(material.textures_count(), 2);
        assert_eq!(material.texture_slot(0), None);

        material.set_shader(shader("s", &[], &[("diffuse", 2)]));
        assert_eq!(material.texture_slot(0), Some(2));
        assert_eq!(material.texture_slot(1), None);

        // Replaced in place, slot kept
        material.set_texture("diffuse", TextureData::solid("e.png", [1; 4]));
        assert_eq!(material.textures_count(), 2);
        assert_eq!(material.texture_semantics(0), Some("diffuse"));
        assert_eq!(material.texture(0).and_then(Proxy::get).map(|t| t.name.as_str()), Some("e.png"));
        assert_eq!(material.texture_slot(0), Some(2));
    }

    #[test]
    fn test_set_unset_sequence() {
        let mut material = Material::new("glass");
        material.set_shader(shader("glass", &[], &[("diffuse", 0), ("normal", 1), ("env", 4)]));
        material.set_texture("diffuse", TextureData::solid("glass.png", [9; 4]));
        material.set_texture("normal", TextureProxy::invalid());
        material.set_texture("gloss", TextureData::solid("gloss.png", [9; 4]));
        material.set_blend(true, BlendMode::SrcAlpha, BlendMode::InvSrcAlpha);
        material.set_zwrite(false);
        material.set_cull_face(true, CullOrder::Cw);

        let mut backend = RecordingBackend::new();
        material.set(&mut backend);
        assert_eq!(
            backend.take_commands(),
            vec![
                RenderCommand::BindShader("glass".to_string()),
                RenderCommand::EnableBlend { src: BlendMode::SrcAlpha, dst: BlendMode::InvSrcAlpha },
                RenderCommand::ColorWrite(true),
                RenderCommand::DepthWrite(false),
                RenderCommand::EnableCullFace(CullOrder::Cw),
                RenderCommand::BindTexture { slot: 0, texture: "glass.png".to_string() },
                RenderCommand::UnbindTexture { slot: 1 },
            ]
        );

        material.unset(&mut backend);
        assert_eq!(
            backend.take_commands(),
            vec![
                RenderCommand::UnbindShader,
                RenderCommand::DisableBlend,
                RenderCommand::DepthWrite(true),
                RenderCommand::UnbindTexture { slot: 0 },
            ]
        );

        let state = backend.state();
        assert!(state.shader.is_none());
        assert!(state.blend.is_none());
        assert!(state.depth_write);
        assert!(state.color_write);
        assert!(state.textures.is_empty());
    }

    #[test]
    fn test_state_accessors() {
        let mut material = Material::default();
        assert_eq!(material.flags(), StateFlags::COLOR_WRITE | StateFlags::DEPTH_WRITE);
        assert_eq!(material.blend(), None);
        assert_eq!(material.cull_face(), None);

        material.set_blend(true, BlendMode::One, BlendMode::One);
        material.set_cull_face(true, CullOrder::Ccw);
        material.set_color_write(false);

        assert_eq!(material.blend(), Some((BlendMode::One, BlendMode::One)));
        assert_eq!(material.cull_face(), Some(CullOrder::Ccw));
        assert!(!material.color_write());
        assert!(material.zwrite());
    }

    #[test]
    fn test_release_drops_references() {
        let texture = TextureProxy::new(TextureData::solid("t.png", [0; 4]));
        let mut material = Material::new("m");
        material.set_shader(shader("s", &["a"], &[("diffuse", 0)]));
        material.set_texture("diffuse", texture.clone());
        assert_eq!(texture.ref_count(), 2);

        material.release();

        assert_eq!(texture.ref_count(), 1);
        assert_eq!(material.name(), "");
        assert_eq!(material.textures_count(), 0);
        assert_eq!(material.params_count(), 0);
        assert!(!material.shader().is_valid());
    }
}
