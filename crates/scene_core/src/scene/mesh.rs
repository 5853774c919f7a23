//! Shared mesh data and per-instance mesh state
//!
//! [`MeshData`] is loaded once per name and shared read-only through the mesh
//! cache. A [`Mesh`] instance points at it and keeps a sparse table of
//! material overrides: a dense list of locally owned materials plus one
//! optional index per group. A group's default material is copied into the
//! table the first time the instance modifies it, never before.

use crate::foundation::math::{Transform, Vec3, Vec4};
use crate::render::api::RenderBackend;
use crate::render::skeleton::Skeleton;
use crate::render::vertex_buffer::VertexBuffer;
use crate::resources::{Proxy, ResourceError, SharedResources};
use crate::scene::material::Material;

/// Surface properties a group was authored with
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDesc {
    /// Diffuse colour with alpha
    pub diffuse: Vec4,
    /// Specular colour
    pub specular: Vec3,
    /// Specular exponent
    pub shininess: f32,
    /// Ambient colour
    pub ambient: Vec3,
    /// Colour texture resource, relative to the mesh
    pub texture: Option<String>,
    /// Outline flag
    pub edge: bool,
}

impl Default for SurfaceDesc {
    fn default() -> Self {
        Self {
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vec3::zeros(),
            shininess: 0.0,
            ambient: Vec3::zeros(),
            texture: None,
            edge: false,
        }
    }
}

/// A submesh: an index range drawn with one default material
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    /// Group name
    pub name: String,
    /// First index
    pub offset: u32,
    /// Number of indices
    pub count: u32,
    /// Material used unless an instance overrides it
    pub material: Material,
    /// Authored surface properties
    pub surface: SurfaceDesc,
}

impl MeshGroup {
    /// Group over `count` indices starting at `offset`
    pub fn new(name: impl Into<String>, offset: u32, count: u32, material: Material, surface: SurfaceDesc) -> Self {
        Self {
            name: name.into(),
            offset,
            count,
            material,
            surface,
        }
    }
}

/// Geometry shared by every instance of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Resource name
    pub name: String,
    /// Vertices and indices
    pub vertex_buffer: VertexBuffer,
    /// Bone hierarchy, empty for static meshes
    pub skeleton: Skeleton,
    /// Submeshes in draw order
    pub groups: Vec<MeshGroup>,
}

impl MeshData {
    /// Number of groups
    pub fn groups_count(&self) -> usize {
        self.groups.len()
    }

    /// Group at `idx`
    pub fn group(&self, idx: usize) -> Option<&MeshGroup> {
        self.groups.get(idx)
    }
}

/// Handle to shared mesh data
pub type MeshProxy = Proxy<MeshData>;

/// One placed instance of a mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    shared: MeshProxy,
    transform: Transform,
    overrides: Vec<Material>,
    override_idx: Vec<Option<usize>>,
}

impl Mesh {
    /// Instance with no geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance of already acquired shared data
    pub fn from_proxy(shared: MeshProxy) -> Self {
        Self {
            shared,
            transform: Transform::default(),
            overrides: Vec::new(),
            override_idx: Vec::new(),
        }
    }

    /// Drop the current geometry and acquire `name` from `cache`
    pub fn load(&mut self, cache: &SharedResources<MeshData>, name: &str) -> Result<(), ResourceError> {
        self.unload();
        self.shared = cache.try_acquire(name)?;
        Ok(())
    }

    /// Whether the instance has live shared data
    pub fn is_loaded(&self) -> bool {
        self.shared.is_valid()
    }

    /// Shared data handle
    pub fn shared(&self) -> &MeshProxy {
        &self.shared
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replace the local transform
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Skeleton of the shared data
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.shared.get().map(|data| &data.skeleton)
    }

    /// Number of groups, and so of materials
    pub fn materials_count(&self) -> usize {
        self.shared.get().map_or(0, MeshData::groups_count)
    }

    /// Number of groups this instance overrides
    pub fn overrides_count(&self) -> usize {
        self.overrides.len()
    }

    /// Draw every group, or only `group`
    ///
    /// The vertex buffer is bound once for the whole call; each group is
    /// bracketed by its material's `set`/`unset`.
    pub fn draw(&self, backend: &mut dyn RenderBackend, group: Option<usize>) {
        let Some(shared) = self.shared.get() else {
            return;
        };

        let range = match group {
            None => 0..shared.groups.len(),
            Some(idx) if idx < shared.groups.len() => idx..idx + 1,
            Some(idx) => {
                log::debug!("Mesh '{}' has no group {}", shared.name, idx);
                return;
            }
        };

        backend.set_model_matrix(self.transform.to_matrix().into());
        backend.bind_vertex_buffer(&shared.vertex_buffer);

        for idx in range {
            let group = &shared.groups[idx];
            let material = self.override_for(idx).unwrap_or(&group.material);

            material.set(backend);
            backend.draw_indexed(group.offset, group.count);
            material.unset(backend);
        }

        backend.unbind_vertex_buffer();
    }

    fn override_for(&self, idx: usize) -> Option<&Material> {
        let slot = (*self.override_idx.get(idx)?)?;
        self.overrides.get(slot)
    }

    /// Material of group `idx`: the override if any, else the shared default
    pub fn material(&self, idx: usize) -> Option<&Material> {
        let group = self.shared.get()?.groups.get(idx)?;
        Some(self.override_for(idx).unwrap_or(&group.material))
    }

    /// Mutable override of group `idx`, copied from the shared default on
    /// first access
    pub fn modify_material(&mut self, idx: usize) -> Option<&mut Material> {
        let shared = self.shared.get()?;
        let group = shared.groups.get(idx)?;

        if self.override_idx.is_empty() {
            self.override_idx = vec![None; shared.groups.len()];
        }

        let slot = match self.override_idx[idx] {
            Some(slot) => slot,
            None => {
                let slot = self.overrides.len();
                self.overrides.push(group.material.clone());
                self.override_idx[idx] = Some(slot);
                slot
            }
        };

        self.overrides.get_mut(slot)
    }

    /// Replace the material of group `idx` for this instance only
    pub fn set_material(&mut self, idx: usize, material: Material) {
        let Some(shared) = self.shared.get() else {
            return;
        };
        let groups = shared.groups.len();
        if idx >= groups {
            log::debug!("Mesh '{}' has no group {}", shared.name, idx);
            return;
        }

        if self.override_idx.is_empty() {
            self.override_idx = vec![None; groups];
        }

        match self.override_idx[idx] {
            Some(slot) => self.overrides[slot] = material,
            None => {
                self.override_idx[idx] = Some(self.overrides.len());
                self.overrides.push(material);
            }
        }
    }

    /// Release the overrides and the shared data
    pub fn unload(&mut self) {
        for material in &mut self.overrides {
            material.release();
        }
        self.overrides.clear();
        self.override_idx.clear();
        self.shared.free();
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{RecordingBackend, RenderCommand};
    use crate::render::state::BlendMode;
    use crate::render::vertex_buffer::{IndexData, VertexLayout};

    fn two_group_mesh() -> MeshProxy {
        let vertex_buffer = VertexBuffer::new(
            vec![0.0; 3 * 3],
            VertexLayout::new(12),
            IndexData::U16(vec![0, 1, 2, 2, 1, 0]),
        )
        .unwrap();

        Proxy::new(MeshData {
            name: "pair".to_string(),
            vertex_buffer,
            skeleton: Skeleton::new(),
            groups: vec![
                MeshGroup::new("front", 0, 3, Material::new("front"), SurfaceDesc::default()),
                MeshGroup::new("back", 3, 3, Material::new("back"), SurfaceDesc::default()),
            ],
        })
    }

    #[test]
    fn test_unloaded_instance_is_inert() {
        let mut mesh = Mesh::new();
        let mut backend = RecordingBackend::new();

        mesh.draw(&mut backend, None);
        mesh.set_material(0, Material::new("x"));

        assert!(backend.commands().is_empty());
        assert!(mesh.material(0).is_none());
        assert!(mesh.modify_material(0).is_none());
        assert_eq!(mesh.materials_count(), 0);
        assert!(mesh.skeleton().is_none());
    }

    #[test]
    fn test_draw_binds_geometry_once() {
        let mesh = Mesh::from_proxy(two_group_mesh());
        let mut backend = RecordingBackend::new();
        mesh.draw(&mut backend, None);

        let commands = backend.commands();
        let binds = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::BindVertexBuffer { .. }))
            .count();
        assert_eq!(binds, 1);
        assert!(matches!(commands.first(), Some(RenderCommand::SetModelMatrix(_))));
        assert_eq!(commands.last(), Some(&RenderCommand::UnbindVertexBuffer));

        let draws: Vec<_> = backend.draw_calls().map(|(o, c, i)| (o, c, i.to_vec())).collect();
        assert_eq!(draws, vec![(0, 3, vec![0, 1, 2]), (3, 3, vec![2, 1, 0])]);
    }

    #[test]
    fn test_draw_single_group_and_out_of_range() {
        let mesh = Mesh::from_proxy(two_group_mesh());
        let mut backend = RecordingBackend::new();

        mesh.draw(&mut backend, Some(5));
        assert!(backend.commands().is_empty());

        mesh.draw(&mut backend, Some(1));
        let draws: Vec<_> = backend.draw_calls().map(|(o, c, _)| (o, c)).collect();
        assert_eq!(draws, vec![(3, 3)]);
    }

    #[test]
    fn test_modify_material_copies_once() {
        let shared = two_group_mesh();
        let mut a = Mesh::from_proxy(shared.clone());
        let b = Mesh::from_proxy(shared.clone());

        assert_eq!(a.material(1), b.material(1));

        a.modify_material(1).unwrap().set_blend(true, BlendMode::One, BlendMode::One);
        a.modify_material(1).unwrap().set_name("tinted");

        assert_eq!(a.overrides_count(), 1);
        assert_eq!(a.material(1).map(Material::name), Some("tinted"));
        assert_eq!(a.material(1).and_then(Material::blend), Some((BlendMode::One, BlendMode::One)));
        assert_eq!(b.material(1).map(Material::name), Some("back"));
        assert_eq!(shared.get().unwrap().groups[1].material.blend(), None);
        assert_eq!(a.material(0), b.material(0));
    }

    #[test]
    fn test_set_material_replaces_override() {
        let mut mesh = Mesh::from_proxy(two_group_mesh());

        mesh.set_material(0, Material::new("first"));
        mesh.set_material(0, Material::new("second"));
        mesh.set_material(7, Material::new("ignored"));

        assert_eq!(mesh.overrides_count(), 1);
        assert_eq!(mesh.material(0), Some(&Material::new("second")));
        assert_eq!(mesh.material(1).map(Material::name), Some("back"));
        assert!(mesh.material(2).is_none());
    }

    #[test]
    fn test_unload_releases_shared_reference() {
        let shared = two_group_mesh();
        let mut mesh = Mesh::from_proxy(shared.clone());
        mesh.modify_material(0);
        assert_eq!(shared.ref_count(), 2);

        mesh.unload();

        assert_eq!(shared.ref_count(), 1);
        assert!(!mesh.is_loaded());
        assert_eq!(mesh.overrides_count(), 0);
    }
}
