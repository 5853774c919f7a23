//! Texture payloads

/// Pixel layout of texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 8-bit red, green, blue
    Rgb,
    /// 8-bit blue, green, red
    Bgr,
    /// 8-bit red, green, blue, alpha
    Rgba,
    /// 8-bit blue, green, red, alpha
    Bgra,
}

impl ColorFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Rgb | ColorFormat::Bgr => 3,
            ColorFormat::Rgba | ColorFormat::Bgra => 4,
        }
    }
}

/// Texture payload held by the texture cache, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Resource name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: ColorFormat,
    /// Tightly packed rows
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Build a texture, checking the pixel buffer matches the dimensions
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: ColorFormat,
        pixels: Vec<u8>,
    ) -> Option<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected {
            log::warn!("Texture pixel buffer is {} bytes, expected {}", pixels.len(), expected);
            return None;
        }

        Some(Self {
            name: name.into(),
            width,
            height,
            format,
            pixels,
        })
    }

    /// Single-pixel RGBA texture
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            format: ColorFormat::Rgba,
            pixels: rgba.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_buffer_size_checked() {
        assert!(TextureData::new("a", 2, 2, ColorFormat::Rgb, vec![0; 12]).is_some());
        assert!(TextureData::new("a", 2, 2, ColorFormat::Rgba, vec![0; 12]).is_none());
        assert_eq!(TextureData::solid("white", [255; 4]).pixels.len(), 4);
    }
}
