//! Fixed-function render state
//!
//! Blend factors, face winding and the flag set a material toggles around
//! each draw.

use bitflags::bitflags;

/// Blend factor applied to the source or destination colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// 0
    Zero,
    /// 1
    One,
    /// Source colour
    SrcColor,
    /// 1 - source colour
    InvSrcColor,
    /// Source alpha
    #[default]
    SrcAlpha,
    /// 1 - source alpha
    InvSrcAlpha,
    /// Destination colour
    DstColor,
    /// 1 - destination colour
    InvDstColor,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    InvDstAlpha,
}

/// Winding order of front faces when culling is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullOrder {
    /// Counter-clockwise triangles face the viewer
    #[default]
    Ccw,
    /// Clockwise triangles face the viewer
    Cw,
}

bitflags! {
    /// Render state switches owned by a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// Alpha blending
        const BLEND = 1 << 0;
        /// Face culling
        const CULL_FACE = 1 << 1;
        /// Colour buffer writes
        const COLOR_WRITE = 1 << 2;
        /// Depth buffer writes
        const DEPTH_WRITE = 1 << 3;
    }
}

impl Default for StateFlags {
    /// Opaque baseline: no blending, no culling, colour and depth writes on
    fn default() -> Self {
        Self::COLOR_WRITE | Self::DEPTH_WRITE
    }
}
