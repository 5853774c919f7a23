//! The caches a scene loads its resources through

use std::rc::Rc;

use crate::assets::{PmdLoader, ResourceProvider, ShaderLoader, TextureLoader};
use crate::config::ResourceConfig;
use crate::render::shader::ShaderData;
use crate::render::texture::TextureData;
use crate::resources::{ResourceError, SharedResources};
use crate::scene::material::{ShaderProxy, TextureProxy};
use crate::scene::mesh::{Mesh, MeshData};

/// Mesh, shader and texture caches sharing one resource provider
///
/// Meshes are declared first so they are dropped, and release their texture
/// and shader references, before the caches they point into.
#[derive(Debug)]
pub struct SceneContext {
    meshes: SharedResources<MeshData>,
    shaders: Rc<SharedResources<ShaderData>>,
    textures: Rc<SharedResources<TextureData>>,
}

impl SceneContext {
    /// Caches sized by `config`; PMD groups get their textures bound but no
    /// shader
    pub fn new(config: &ResourceConfig, provider: Rc<dyn ResourceProvider>) -> Self {
        Self::build(config, provider, None)
    }

    /// Like [`Self::new`], also attaching shader `shader` to every PMD group
    pub fn with_mesh_shader(config: &ResourceConfig, provider: Rc<dyn ResourceProvider>, shader: &str) -> Self {
        Self::build(config, provider, Some(shader))
    }

    fn build(config: &ResourceConfig, provider: Rc<dyn ResourceProvider>, shader: Option<&str>) -> Self {
        let shaders = Rc::new(SharedResources::new(config.shaders, ShaderLoader::new(Rc::clone(&provider))));
        let textures = Rc::new(SharedResources::new(config.textures, TextureLoader::new(Rc::clone(&provider))));

        let mut pmd = PmdLoader::new(provider).with_textures(Rc::clone(&textures));
        if let Some(shader) = shader {
            pmd = pmd.with_shader(Rc::clone(&shaders), shader);
        }

        Self {
            meshes: SharedResources::new(config.meshes, pmd),
            shaders,
            textures,
        }
    }

    /// Mesh cache
    pub fn meshes(&self) -> &SharedResources<MeshData> {
        &self.meshes
    }

    /// Shader cache
    pub fn shaders(&self) -> &SharedResources<ShaderData> {
        &self.shaders
    }

    /// Texture cache
    pub fn textures(&self) -> &SharedResources<TextureData> {
        &self.textures
    }

    /// New instance of mesh `name`
    pub fn load_mesh(&self, name: &str) -> Result<Mesh, ResourceError> {
        let mut mesh = Mesh::new();
        mesh.load(&self.meshes, name)?;
        Ok(mesh)
    }

    /// Shader `name`, invalid if it cannot be loaded
    pub fn shader(&self, name: &str) -> ShaderProxy {
        self.shaders.acquire(name)
    }

    /// Texture `name`, invalid if it cannot be loaded
    pub fn texture(&self, name: &str) -> TextureProxy {
        self.textures.acquire(name)
    }
}
