//! Image decoding for the texture cache
//!
//! Any format the `image` crate is built with (PNG, BMP and TGA here) is
//! decoded to RGBA8. PMD models usually reference BMP or TGA files.

use std::rc::Rc;

use crate::assets::{AssetError, ResourceProvider};
use crate::render::texture::{ColorFormat, TextureData};
use crate::resources::ResourceLoader;

/// Fills the texture cache from a [`ResourceProvider`]
pub struct TextureLoader {
    provider: Rc<dyn ResourceProvider>,
}

impl TextureLoader {
    /// Loader reading image files through `provider`
    pub fn new(provider: Rc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Decode an encoded image held in memory
    pub fn decode(name: &str, bytes: &[u8]) -> Result<TextureData, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::InvalidData(format!("Failed to decode image '{}': {}", name, e)))?;

        // RGBA8 is what every backend uploads
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::debug!("Decoded texture '{}' {}x{}", name, width, height);

        TextureData::new(name, width, height, ColorFormat::Rgba, rgba.into_raw())
            .ok_or_else(|| AssetError::InvalidData(format!("Image '{}' has an inconsistent pixel buffer", name)))
    }
}

impl ResourceLoader<TextureData> for TextureLoader {
    fn fill(&mut self, name: &str) -> Result<TextureData, AssetError> {
        let bytes = self.provider.read(name)?;
        Self::decode(name, &bytes)
    }

    fn release(&mut self, name: &str, texture: TextureData) {
        log::debug!("Released texture '{}' ({} bytes)", name, texture.pixels.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryResourceProvider;
    use std::io::Cursor;

    fn encode(width: u32, height: u32, pixels: Vec<u8>, format: image::ImageFormat) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, pixels).unwrap();
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn encode_png(width: u32, height: u32, pixels: Vec<u8>) -> Vec<u8> {
        encode(width, height, pixels, image::ImageFormat::Png)
    }

    #[test]
    fn test_decode_png_to_rgba() {
        let png = encode_png(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]);
        let texture = TextureLoader::decode("red_blue.png", &png).unwrap();

        assert_eq!(texture.name, "red_blue.png");
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(texture.format, ColorFormat::Rgba);
        assert_eq!(texture.pixels, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn test_fill_decodes_bmp_and_tga() {
        let pixels = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let provider = MemoryResourceProvider::new()
            .with("skin.bmp", encode(2, 1, pixels.clone(), image::ImageFormat::Bmp))
            .with("hair.tga", encode(2, 1, pixels.clone(), image::ImageFormat::Tga));
        let mut loader = TextureLoader::new(Rc::new(provider));

        for name in ["skin.bmp", "hair.tga"] {
            let texture = loader.fill(name).unwrap();
            assert_eq!((texture.width, texture.height), (2, 1));
            assert_eq!(texture.pixels, pixels);
        }
    }

    #[test]
    fn test_fill_reports_missing_and_corrupt_files() {
        let provider = MemoryResourceProvider::new().with("broken.png", b"not an image".to_vec());
        let mut loader = TextureLoader::new(Rc::new(provider));

        assert!(matches!(loader.fill("absent.png"), Err(AssetError::NotFound(_))));
        assert!(matches!(loader.fill("broken.png"), Err(AssetError::InvalidData(_))));
    }
}
