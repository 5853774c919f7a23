//! Shader programs and their reflection data
//!
//! The engine only needs the declaration order of uniforms (material
//! parameter slots line up with it) and the sampler semantics that map
//! texture bindings to numeric slots.

use serde::{Deserialize, Serialize};

fn one() -> u32 {
    1
}

/// A uniform declared by a shader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformDecl {
    /// Name materials look the uniform up by
    pub name: String,

    /// Number of vec4 elements (1 for a scalar vec4)
    #[serde(default = "one")]
    pub count: u32,
}

/// A texture sampler declared by a shader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerDecl {
    /// Semantic name, such as `diffuse`
    pub semantics: String,

    /// Texture unit the sampler reads from
    pub slot: u32,
}

/// Shader program payload held by the shader cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderData {
    /// Resource name
    pub name: String,

    /// Vertex stage source
    pub vertex: String,

    /// Fragment stage source
    pub fragment: String,

    /// Uniforms in declaration order
    pub uniforms: Vec<UniformDecl>,

    /// Samplers
    pub samplers: Vec<SamplerDecl>,
}

impl ShaderData {
    /// Number of declared uniforms
    pub fn uniforms_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Uniform declaration at `idx`
    pub fn uniform(&self, idx: usize) -> Option<&UniformDecl> {
        self.uniforms.get(idx)
    }

    /// Index of the uniform called `name`
    pub fn uniform_idx(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|uniform| uniform.name == name)
    }

    /// Texture unit bound to `semantics`, exact case-sensitive match
    pub fn texture_slot(&self, semantics: &str) -> Option<u32> {
        self.samplers
            .iter()
            .find(|sampler| sampler.semantics == semantics)
            .map(|sampler| sampler.slot)
    }
}
