//! PMD model loader
//!
//! Layout (little endian):
//!
//! | field        | size                                              |
//! |--------------|---------------------------------------------------|
//! | magic        | `"Pmd"`                                           |
//! | version      | f32, must be 1.0                                  |
//! | name/comment | 20 + 256 bytes, skipped                           |
//! | vertices     | u32 count, 38 bytes each                          |
//! | indices      | u32 count, u16 each                               |
//! | materials    | optional, u32 count, 70 bytes each                |
//! | bones        | optional, u16 count, 39 bytes each                |
//!
//! A vertex is 8 floats (position, normal, texcoord), two u16 bone indices,
//! a u8 weight and a pad byte. Sections after the indices may be absent, but
//! a section that is present must be complete. A load either produces the
//! whole model or fails; nothing partial reaches the cache. An index that
//! does not name a loaded vertex is rejected as well, so every draw range of
//! a loaded model resolves to real vertices.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::assets::binary_reader::{MemoryReader, ReadError};
use crate::assets::{AssetError, ResourceProvider};
use crate::foundation::math::{Vec3, Vec4};
use crate::render::shader::ShaderData;
use crate::render::skeleton::{Bone, Skeleton};
use crate::render::texture::TextureData;
use crate::render::vertex_buffer::{IndexData, VertexBuffer, VertexLayout};
use crate::resources::{ResourceLoader, SharedResources};
use crate::scene::material::Material;
use crate::scene::mesh::{MeshData, MeshGroup, SurfaceDesc};

const MAGIC: &[u8] = b"Pmd";
const VERSION: f32 = 1.0;
const NAME_SIZE: usize = 20;
const COMMENT_SIZE: usize = 256;
const VERTEX_SIZE: usize = 8 * 4 + 2 * 2 + 1 + 1;
const MATERIAL_SIZE: usize = 4 * 4 + 4 + 3 * 4 + 3 * 4 + 1 + 1 + 4 + 20;
const BONE_SIZE: usize = 20 + 2 + 2 + 1 + 2 + 3 * 4;
const NO_BONE: u16 = 0xFFFF;

/// Texture semantics PMD materials bind their texture under
pub const DIFFUSE_SEMANTICS: &str = "diffuse";

/// PMD parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PmdError {
    /// The buffer does not start with `"Pmd"`
    #[error("missing 'Pmd' signature")]
    BadMagic,

    /// Only version 1.0 exists
    #[error("unsupported PMD version {0}, expected 1.0")]
    UnsupportedVersion(f32),

    /// A section declares more entries than the buffer holds
    #[error("{section} section truncated: {count} entries need {needed} bytes, {remaining} remain")]
    Truncated {
        /// Section name
        section: &'static str,
        /// Declared entry count
        count: usize,
        /// Bytes the entries need
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// A fixed field could not be read
    #[error(transparent)]
    Read(#[from] ReadError),

    /// An index points past the vertex list
    #[error("index {index} references a vertex past the {vertex_count} loaded")]
    IndexOutOfRange {
        /// Offending index
        index: u16,
        /// Number of vertices
        vertex_count: usize,
    },

    /// Material index ranges run past the index buffer
    #[error("materials cover {covered} indices but the model has {available}")]
    MaterialOverrun {
        /// Indices claimed by the materials
        covered: usize,
        /// Indices in the model
        available: usize,
    },

    /// Vertex data does not match the published layout
    #[error("vertex data does not fit the PMD vertex layout")]
    InvalidLayout,
}

/// Vertex as published to the render backend: 11 floats
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PmdVertex {
    /// Model space position
    pub position: [f32; 3],
    /// Vertex normal
    pub normal: [f32; 3],
    /// Primary texture coordinate
    pub tex_coord: [f32; 2],
    /// Bone 0 index, bone 1 index and the weight of bone 0 in `[0, 1]`
    pub skin: [f32; 3],
}

/// Attribute layout of [`PmdVertex`] buffers
///
/// Skinning data rides in texture coordinate channel 1.
pub fn vertex_layout() -> VertexLayout {
    VertexLayout::new(std::mem::size_of::<PmdVertex>())
        .with_normal(std::mem::offset_of!(PmdVertex, normal))
        .with_tex_coord(0, std::mem::offset_of!(PmdVertex, tex_coord), 2)
        .with_tex_coord(1, std::mem::offset_of!(PmdVertex, skin), 3)
}

/// Surface description of one material section entry
#[derive(Debug, Clone, PartialEq)]
pub struct PmdMaterial {
    /// Diffuse colour with alpha
    pub diffuse: [f32; 4],
    /// Specular exponent
    pub shininess: f32,
    /// Specular colour
    pub specular: [f32; 3],
    /// Ambient colour
    pub ambient: [f32; 3],
    /// Toon ramp index
    pub toon: u8,
    /// Outline flag
    pub edge: bool,
    /// Indices drawn with this material
    pub index_count: u32,
    /// Texture file, sphere map suffix stripped
    pub texture: Option<String>,
}

/// One bone section entry
#[derive(Debug, Clone, PartialEq)]
pub struct PmdBone {
    /// Bone name
    pub name: String,
    /// Parent bone, `None` for roots
    pub parent: Option<u16>,
    /// Bone the tail points at
    pub tail: Option<u16>,
    /// Bone type
    pub kind: u8,
    /// IK parent bone
    pub ik_parent: u16,
    /// Head position in model space
    pub head: [f32; 3],
}

/// Parsed PMD contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PmdModel {
    /// Vertices
    pub vertices: Vec<PmdVertex>,
    /// Triangle list indices
    pub indices: Vec<u16>,
    /// Materials, in index buffer order
    pub materials: Vec<PmdMaterial>,
    /// Bones
    pub bones: Vec<PmdBone>,
}

impl PmdModel {
    /// Parse a complete PMD buffer
    pub fn parse(data: &[u8]) -> Result<Self, PmdError> {
        let mut reader = MemoryReader::new(data);

        if !reader.test(MAGIC) {
            return Err(PmdError::BadMagic);
        }

        let version: f32 = reader.read()?;
        if version.to_bits() != VERSION.to_bits() {
            return Err(PmdError::UnsupportedVersion(version));
        }

        reader.skip(NAME_SIZE + COMMENT_SIZE)?;

        let vertices = read_vertices(&mut reader)?;
        let indices = read_indices(&mut reader, vertices.len())?;

        let materials = if reader.remaining() > 0 {
            read_materials(&mut reader)?
        } else {
            Vec::new()
        };

        let bones = if reader.remaining() > 0 {
            read_bones(&mut reader)?
        } else {
            Vec::new()
        };

        if reader.remaining() > 0 {
            log::trace!("Ignoring {} trailing PMD bytes", reader.remaining());
        }

        Ok(Self {
            vertices,
            indices,
            materials,
            bones,
        })
    }

    /// Convert into shared mesh data
    ///
    /// Each material becomes a group over the next `index_count` indices; a
    /// model without materials gets one group covering every index.
    pub fn into_mesh_data(self, name: &str) -> Result<MeshData, PmdError> {
        let available = self.indices.len();

        let groups = if self.materials.is_empty() {
            vec![MeshGroup::new("default", 0, available as u32, Material::new("default"), SurfaceDesc::default())]
        } else {
            let mut groups = Vec::with_capacity(self.materials.len());
            let mut offset = 0usize;
            for (idx, material) in self.materials.into_iter().enumerate() {
                let count = material.index_count as usize;
                let end = offset.saturating_add(count);
                if end > available {
                    return Err(PmdError::MaterialOverrun { covered: end, available });
                }

                let group_name = format!("material{idx}");
                groups.push(MeshGroup::new(
                    group_name.clone(),
                    offset as u32,
                    count as u32,
                    Material::new(group_name),
                    surface_of(material),
                ));
                offset = end;
            }
            groups
        };

        let bones = self
            .bones
            .into_iter()
            .map(|bone| Bone {
                name: bone.name,
                parent: bone.parent.map(usize::from),
                position: Vec3::from(bone.head),
            })
            .collect();

        let vertices = bytemuck::cast_slice::<PmdVertex, f32>(&self.vertices).to_vec();
        let vertex_buffer = VertexBuffer::new(vertices, vertex_layout(), IndexData::U16(self.indices))
            .ok_or(PmdError::InvalidLayout)?;

        Ok(MeshData {
            name: name.to_string(),
            vertex_buffer,
            skeleton: Skeleton::from_bones(bones),
            groups,
        })
    }
}

fn surface_of(material: PmdMaterial) -> SurfaceDesc {
    SurfaceDesc {
        diffuse: Vec4::from(material.diffuse),
        specular: Vec3::from(material.specular),
        shininess: material.shininess,
        ambient: Vec3::from(material.ambient),
        texture: material.texture,
        edge: material.edge,
    }
}

fn reserve(reader: &MemoryReader<'_>, section: &'static str, count: usize, size: usize) -> Result<(), PmdError> {
    let needed = count.checked_mul(size).unwrap_or(usize::MAX);
    if reader.check_remained(needed) {
        Ok(())
    } else {
        Err(PmdError::Truncated {
            section,
            count,
            needed,
            remaining: reader.remaining(),
        })
    }
}

fn read_floats<const N: usize>(reader: &mut MemoryReader<'_>) -> Result<[f32; N], ReadError> {
    let mut out = [0.0; N];
    for value in &mut out {
        *value = reader.read()?;
    }
    Ok(out)
}

fn read_vertices(reader: &mut MemoryReader<'_>) -> Result<Vec<PmdVertex>, PmdError> {
    let count = reader.read::<u32>()? as usize;
    reserve(reader, "vertex", count, VERTEX_SIZE)?;

    let mut vertices = Vec::with_capacity(count);
    for _ in 0..count {
        let position = read_floats::<3>(reader)?;
        let normal = read_floats::<3>(reader)?;
        let tex_coord = read_floats::<2>(reader)?;
        let bone0: u16 = reader.read()?;
        let bone1: u16 = reader.read()?;
        let weight: u8 = reader.read()?;
        reader.skip(1)?;

        vertices.push(PmdVertex {
            position,
            normal,
            tex_coord,
            skin: [f32::from(bone0), f32::from(bone1), f32::from(weight) / 255.0],
        });
    }

    Ok(vertices)
}

fn read_indices(reader: &mut MemoryReader<'_>, vertex_count: usize) -> Result<Vec<u16>, PmdError> {
    let count = reader.read::<u32>()? as usize;
    reserve(reader, "index", count, std::mem::size_of::<u16>())?;

    let mut indices = Vec::with_capacity(count);
    for _ in 0..count {
        let index: u16 = reader.read()?;
        if usize::from(index) >= vertex_count {
            return Err(PmdError::IndexOutOfRange { index, vertex_count });
        }
        indices.push(index);
    }

    Ok(indices)
}

fn read_materials(reader: &mut MemoryReader<'_>) -> Result<Vec<PmdMaterial>, PmdError> {
    let count = reader.read::<u32>()? as usize;
    reserve(reader, "material", count, MATERIAL_SIZE)?;

    let mut materials = Vec::with_capacity(count);
    for _ in 0..count {
        let diffuse = read_floats::<4>(reader)?;
        let shininess: f32 = reader.read()?;
        let specular = read_floats::<3>(reader)?;
        let ambient = read_floats::<3>(reader)?;
        let toon: u8 = reader.read()?;
        let edge: u8 = reader.read()?;
        let index_count: u32 = reader.read()?;
        let texture = reader.read_fixed_str(20)?;

        // "color.bmp*sphere.sph": only the colour texture is used
        let texture = texture.split('*').next().unwrap_or_default().trim().to_string();

        materials.push(PmdMaterial {
            diffuse,
            shininess,
            specular,
            ambient,
            toon,
            edge: edge != 0,
            index_count,
            texture: (!texture.is_empty()).then_some(texture),
        });
    }

    Ok(materials)
}

fn read_bones(reader: &mut MemoryReader<'_>) -> Result<Vec<PmdBone>, PmdError> {
    let count = usize::from(reader.read::<u16>()?);
    reserve(reader, "bone", count, BONE_SIZE)?;

    let mut bones = Vec::with_capacity(count);
    for _ in 0..count {
        let name = reader.read_fixed_str(20)?;
        let parent: u16 = reader.read()?;
        let tail: u16 = reader.read()?;
        let kind: u8 = reader.read()?;
        let ik_parent: u16 = reader.read()?;
        let head = read_floats::<3>(reader)?;

        bones.push(PmdBone {
            name,
            parent: (parent != NO_BONE).then_some(parent),
            tail: (tail != NO_BONE).then_some(tail),
            kind,
            ik_parent,
            head,
        });
    }

    Ok(bones)
}

/// Parse a PMD buffer straight into mesh data
pub fn load_pmd(data: &[u8], name: &str) -> Result<MeshData, PmdError> {
    PmdModel::parse(data)?.into_mesh_data(name)
}

/// Fills the mesh cache with PMD models
///
/// Optionally binds each group's texture through a texture cache and gives
/// every group a shader whose `diffuse`, `specular` and `ambient` uniforms
/// are seeded from the material section.
pub struct PmdLoader {
    provider: Rc<dyn ResourceProvider>,
    textures: Option<Rc<SharedResources<TextureData>>>,
    shader: Option<(Rc<SharedResources<ShaderData>>, String)>,
}

impl PmdLoader {
    /// Loader reading models through `provider`
    pub fn new(provider: Rc<dyn ResourceProvider>) -> Self {
        Self {
            provider,
            textures: None,
            shader: None,
        }
    }

    /// Resolve material textures through `textures`
    #[must_use]
    pub fn with_textures(mut self, textures: Rc<SharedResources<TextureData>>) -> Self {
        self.textures = Some(textures);
        self
    }

    /// Attach shader `name` from `shaders` to every group
    #[must_use]
    pub fn with_shader(mut self, shaders: Rc<SharedResources<ShaderData>>, name: impl Into<String>) -> Self {
        self.shader = Some((shaders, name.into()));
        self
    }

    fn bind_surfaces(&self, mesh_name: &str, data: &mut MeshData) {
        let shader = self
            .shader
            .as_ref()
            .map(|(shaders, name)| shaders.acquire(name))
            .filter(|shader| shader.is_valid());

        for group in &mut data.groups {
            if let Some(shader) = &shader {
                let surface = &group.surface;
                let params = [
                    ("diffuse", surface.diffuse),
                    ("specular", surface.specular.push(surface.shininess)),
                    ("ambient", surface.ambient.push(1.0)),
                ];

                group.material.set_shader(shader.clone());
                for (uniform, value) in params {
                    if let Some(idx) = group.material.param_index(uniform) {
                        group.material.set_param(idx, value);
                    }
                }
            }

            if let (Some(textures), Some(file)) = (&self.textures, &group.surface.texture) {
                let texture = textures.acquire(&sibling_path(mesh_name, file));
                group.material.set_texture(DIFFUSE_SEMANTICS, texture);
            }
        }
    }
}

/// Resource name of `file` next to the resource `base`
fn sibling_path(base: &str, file: &str) -> String {
    match base.rfind('/') {
        Some(pos) => format!("{}/{}", &base[..pos], file),
        None => file.to_string(),
    }
}

impl ResourceLoader<MeshData> for PmdLoader {
    fn fill(&mut self, name: &str) -> Result<MeshData, AssetError> {
        let bytes = self.provider.read(name)?;
        let mut data = load_pmd(&bytes, name)?;
        self.bind_surfaces(name, &mut data);

        log::debug!(
            "Loaded PMD '{}': {} vertices, {} indices, {} groups, {} bones",
            name,
            data.vertex_buffer.vertex_count(),
            data.vertex_buffer.index_count(),
            data.groups.len(),
            data.skeleton.bones_count()
        );
        Ok(data)
    }

    fn release(&mut self, name: &str, mesh: MeshData) {
        log::debug!("Released mesh '{}' ({} groups)", name, mesh.groups.len());
    }
}
