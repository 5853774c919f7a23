//! PMD files through the mesh cache to backend draw calls

use std::rc::Rc;

use super::{png, single_vertex_pmd, textured_pmd, PMD_SHADER};
use crate::assets::{AssetError, MemoryResourceProvider, PmdError};
use crate::config::ResourceConfig;
use crate::foundation::logging;
use crate::foundation::math::{Transform, Vec3};
use crate::render::backends::{RecordingBackend, RenderCommand, TrackedState};
use crate::resources::ResourceError;
use crate::scene::SceneContext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_vertex_model_draws_once() {
        logging::try_init();
        let provider = MemoryResourceProvider::new().with("models/point.pmd", single_vertex_pmd());
        let context = SceneContext::new(&ResourceConfig::default(), Rc::new(provider));
        let mesh = context.load_mesh("models/point.pmd").unwrap();

        let mut backend = RecordingBackend::new();
        mesh.draw(&mut backend, None);

        let draws: Vec<_> = backend.draw_calls().map(|(o, c, i)| (o, c, i.to_vec())).collect();
        assert_eq!(draws, vec![(0, 3, vec![0, 0, 0])]);
        assert!(backend.commands().contains(&RenderCommand::BindVertexBuffer {
            stride: 44,
            vertex_count: 1,
            index_count: 3,
        }));

        let shared = mesh.shared().get().unwrap();
        let vertex = shared.vertex_buffer.vertex(0).unwrap();
        let expected = [0.5, -1.25, 3.0, 0.0, 0.0, 1.0, 0.125, 0.875, 3.0, 9.0, 51.0 / 255.0];
        let bits: Vec<u32> = vertex.iter().map(|v| v.to_bits()).collect();
        let expected_bits: Vec<u32> = expected.iter().map(|v: &f32| v.to_bits()).collect();
        assert_eq!(bits, expected_bits);
        assert_eq!(mesh.materials_count(), 1);
        assert!(mesh.skeleton().is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn test_truncated_model_installs_nothing() {
        let mut bytes = single_vertex_pmd();
        // Declare two vertices where one is present
        bytes[283] = 2;
        let provider = MemoryResourceProvider::new().with("broken.pmd", bytes);
        let context = SceneContext::new(&ResourceConfig::default(), Rc::new(provider));

        let err = context.load_mesh("broken.pmd").unwrap_err();
        assert!(matches!(
            err,
            ResourceError::LoadFailed {
                source: AssetError::Geometry(PmdError::Truncated { section: "vertex", count: 2, .. }),
                ..
            }
        ));
        assert!(context.meshes().is_empty());
        assert!(!context.meshes().contains("broken.pmd"));
        assert!(!context.meshes().acquire("broken.pmd").is_valid());
    }

    #[test]
    fn test_groups_get_shader_params_and_textures() {
        let provider = MemoryResourceProvider::new()
            .with("models/girl.pmd", textured_pmd("skin.png*skin.sph", "missing.png"))
            .with("models/skin.png", png([200, 150, 100, 255]))
            .with("shaders/pmd.toml", PMD_SHADER.as_bytes().to_vec());
        let context = SceneContext::with_mesh_shader(&ResourceConfig::default(), Rc::new(provider), "shaders/pmd.toml");

        let mesh = context.load_mesh("models/girl.pmd").unwrap();
        assert_eq!(context.shaders().ref_count("shaders/pmd.toml"), 2);
        assert_eq!(context.textures().ref_count("models/skin.png"), 1);
        assert!(!context.textures().contains("models/missing.png"));

        let mut backend = RecordingBackend::new();
        mesh.draw(&mut backend, Some(0));
        let uploads: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::SetUniform { index, value } => Some((*index, *value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            uploads,
            vec![
                (0, [1.0, 0.5, 0.25, 1.0]),
                (1, [0.1, 0.2, 0.3, 1.0]),
                (2, [0.0; 4]),
            ]
        );
        assert_eq!(backend.state(), &TrackedState::default());

        let mut backend = RecordingBackend::new();
        mesh.draw(&mut backend, None);
        let textures: Vec<_> = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::BindTexture { .. } | RenderCommand::UnbindTexture { .. }))
            .cloned()
            .collect();
        assert_eq!(
            textures,
            vec![
                RenderCommand::BindTexture { slot: 0, texture: "models/skin.png".to_string() },
                RenderCommand::UnbindTexture { slot: 0 },
                // Group 1 texture failed to load: the unit is cleared
                RenderCommand::UnbindTexture { slot: 0 },
            ]
        );

        drop(mesh);
        assert!(context.meshes().is_empty());
        assert!(context.shaders().is_empty());
        assert!(context.textures().is_empty());
    }

    #[test]
    fn test_instance_transform_reaches_backend() {
        let provider = MemoryResourceProvider::new().with("point.pmd", single_vertex_pmd());
        let context = SceneContext::new(&ResourceConfig::default(), Rc::new(provider));
        let mut mesh = context.load_mesh("point.pmd").unwrap();
        mesh.set_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));

        let mut backend = RecordingBackend::new();
        mesh.draw(&mut backend, None);

        let Some(RenderCommand::SetModelMatrix(model)) = backend.commands().first() else {
            panic!("model matrix must be set before binding geometry");
        };
        assert_eq!(model[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
