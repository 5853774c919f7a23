//! Shader descriptions for the shader cache
//!
//! A shader file is a TOML document holding both stage sources plus the
//! uniform and sampler declarations materials resolve against:
//!
//! ```toml
//! vertex = "..."
//! fragment = "..."
//!
//! [[uniforms]]
//! name = "diffuse"
//!
//! [[uniforms]]
//! name = "bones"
//! count = 64
//!
//! [[samplers]]
//! semantics = "diffuse"
//! slot = 0
//! ```

use std::collections::HashSet;
use std::rc::Rc;

use crate::assets::{AssetError, ResourceProvider};
use crate::render::shader::ShaderData;
use crate::resources::ResourceLoader;

/// Fills the shader cache from a [`ResourceProvider`]
pub struct ShaderLoader {
    provider: Rc<dyn ResourceProvider>,
}

impl ShaderLoader {
    /// Loader reading shader descriptions through `provider`
    pub fn new(provider: Rc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Parse a shader description
    pub fn parse(name: &str, text: &str) -> Result<ShaderData, AssetError> {
        let mut shader: ShaderData = toml::from_str(text)
            .map_err(|e| AssetError::InvalidData(format!("Shader '{}': {}", name, e)))?;
        shader.name = name.to_string();

        let mut seen = HashSet::new();
        if let Some(dup) = shader.uniforms.iter().find(|u| !seen.insert(u.name.as_str())) {
            return Err(AssetError::InvalidData(format!(
                "Shader '{}' declares uniform '{}' twice",
                name, dup.name
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = shader.samplers.iter().find(|s| !seen.insert(s.semantics.as_str())) {
            return Err(AssetError::InvalidData(format!(
                "Shader '{}' declares sampler '{}' twice",
                name, dup.semantics
            )));
        }

        log::debug!(
            "Parsed shader '{}': {} uniforms, {} samplers",
            name,
            shader.uniforms.len(),
            shader.samplers.len()
        );
        Ok(shader)
    }
}

impl ResourceLoader<ShaderData> for ShaderLoader {
    fn fill(&mut self, name: &str) -> Result<ShaderData, AssetError> {
        let bytes = self.provider.read(name)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| AssetError::InvalidData(format!("Shader '{}' is not UTF-8: {}", name, e)))?;
        Self::parse(name, text)
    }

    fn release(&mut self, name: &str, _shader: ShaderData) {
        log::debug!("Released shader '{}'", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryResourceProvider;

    const LIT: &str = r#"
        vertex = "void main() {}"
        fragment = "void main() {}"

        [[uniforms]]
        name = "diffuse"

        [[uniforms]]
        name = "bones"
        count = 32

        [[samplers]]
        semantics = "diffuse"
        slot = 0

        [[samplers]]
        semantics = "toon"
        slot = 3
    "#;

    #[test]
    fn test_parse_declarations_in_order() {
        let shader = ShaderLoader::parse("lit.shader", LIT).unwrap();

        assert_eq!(shader.name, "lit.shader");
        assert_eq!(shader.uniforms_count(), 2);
        assert_eq!(shader.uniform(0).map(|u| u.count), Some(1));
        assert_eq!(shader.uniform_idx("bones"), Some(1));
        assert_eq!(shader.uniform(1).map(|u| u.count), Some(32));
        assert_eq!(shader.texture_slot("toon"), Some(3));
        assert_eq!(shader.texture_slot("Toon"), None);
    }

    #[test]
    fn test_duplicate_uniform_rejected() {
        let text = r#"
            [[uniforms]]
            name = "color"
            [[uniforms]]
            name = "color"
        "#;
        assert!(matches!(
            ShaderLoader::parse("dup.shader", text),
            Err(AssetError::InvalidData(_))
        ));
    }

    #[test]
    fn test_fill_through_provider() {
        let provider = MemoryResourceProvider::new()
            .with("lit.shader", LIT.as_bytes().to_vec())
            .with("bad.shader", vec![0xFF, 0xFE]);
        let mut loader = ShaderLoader::new(Rc::new(provider));

        assert_eq!(loader.fill("lit.shader").unwrap().samplers.len(), 2);
        assert!(loader.fill("bad.shader").is_err());
        assert!(matches!(loader.fill("none.shader"), Err(AssetError::NotFound(_))));
    }
}
