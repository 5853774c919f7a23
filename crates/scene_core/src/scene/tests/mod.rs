//! Scene scenarios: PMD files loaded through a context and drawn on the
//! recording backend

mod pmd_pipeline;

use std::io::Cursor;

use crate::assets::pmd_loader::tests::PmdWriter;

/// One vertex drawn three times, no optional sections
pub(super) fn single_vertex_pmd() -> Vec<u8> {
    let mut writer = PmdWriter::header();
    writer
        .u32(1)
        .vertex([0.5, -1.25, 3.0, 0.0, 0.0, 1.0, 0.125, 0.875], [3, 9], 51)
        .u32(3)
        .u16(0)
        .u16(0)
        .u16(0);
    writer.bytes
}

/// Two triangles, one group each, with the given textures
pub(super) fn textured_pmd(first: &str, second: &str) -> Vec<u8> {
    let mut writer = PmdWriter::header();
    writer
        .u32(2)
        .vertex([0.0; 8], [0, 0], 255)
        .vertex([1.0; 8], [0, 1], 128)
        .u32(6);
    for index in [0, 1, 1, 1, 0, 0] {
        writer.u16(index);
    }
    writer
        .u32(2)
        .material([1.0, 0.5, 0.25, 1.0], 3, first)
        .material([0.0, 0.0, 1.0, 0.5], 3, second);
    writer.bytes
}

pub(super) fn png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub(super) const PMD_SHADER: &str = r#"
vertex = "pmd.vert"
fragment = "pmd.frag"

[[uniforms]]
name = "diffuse"

[[uniforms]]
name = "ambient"

[[uniforms]]
name = "bones"
count = 2

[[samplers]]
semantics = "diffuse"
slot = 0
"#;
