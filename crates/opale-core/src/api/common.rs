// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Enumerations shared by every backend: formats, fixed-function values,
//! vertex attribute types and the resolve mask.

/// Primitive topology used by draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Independent triangles, 3 vertices each.
    #[default]
    Triangles,
    /// Independent points.
    Points,
    /// Independent lines, 2 vertices each.
    Lines,
}

/// Comparison used by depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes when the incoming value is lower.
    #[default]
    Less,
    /// Passes when the incoming value is lower or equal.
    LessEqual,
    /// Passes on equality.
    Equal,
    /// Passes when the incoming value is greater or equal.
    GreaterEqual,
    /// Passes when the incoming value is greater.
    Greater,
    /// Passes on inequality.
    NotEqual,
    /// Always passes.
    Always,
}

/// Source and destination factors of the blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFunction {
    /// Factor 0.
    Zero,
    /// Factor 1.
    #[default]
    One,
    /// Source color.
    SrcColor,
    /// 1 - source color.
    OneMinusSrcColor,
    /// Destination color.
    DstColor,
    /// 1 - destination color.
    OneMinusDstColor,
    /// Source alpha.
    SrcAlpha,
    /// 1 - source alpha.
    OneMinusSrcAlpha,
    /// Destination alpha.
    DstAlpha,
    /// 1 - destination alpha.
    OneMinusDstAlpha,
    /// The constant blend factor.
    Factor,
    /// 1 - the constant blend factor.
    OneMinusFactor,
}

/// How blended source and destination terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendEquation {
    /// `src * src_factor + dst * dst_factor`
    #[default]
    Add,
    /// `src * src_factor - dst * dst_factor`
    Subtract,
    /// `dst * dst_factor - src * src_factor`
    ReverseSubtract,
    /// `min(src, dst)`
    Min,
    /// `max(src, dst)`
    Max,
}

/// Action applied to the stencil buffer on test outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Write zero.
    Zero,
    /// Write the reference value.
    Replace,
    /// Increment with saturation.
    Increment,
    /// Increment with wrap.
    IncrementWrap,
    /// Decrement with saturation.
    Decrement,
    /// Decrement with wrap.
    DecrementWrap,
    /// Bitwise invert.
    Invert,
}

/// Texel filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filtering {
    /// No filtering. For mip filtering this disables mipmap selection.
    None,
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// How texture coordinates outside `[0, 1]` resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAddressing {
    /// Clamp to the edge texel.
    Clamp,
    /// Repeat the texture.
    #[default]
    Repeat,
    /// Repeat, mirrored on every second tile.
    Mirror,
    /// Sample the border color.
    Border,
    /// Mirror once then clamp.
    MirrorOnce,
}

/// Texel storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
    /// 4 x 32-bit float channels.
    Bgra32Float,
    /// 4 x 16-bit float channels.
    Bgra16Float,
    /// 3 x 32-bit float channels.
    Rgb32Float,
    /// 8 bits per channel, BGRA order.
    #[default]
    Bgra8Unorm,
    /// 5-5-5-1 packed.
    Bgr5A1Unorm,
    /// 4-4-4-4 packed.
    Bgra4Unorm,
    /// 5-6-5 packed, no alpha.
    B5G6R5Unorm,
    /// Two 8-bit channels.
    Rg8Unorm,
    /// One 8-bit channel.
    R8Unorm,
    /// BC1 block compression, opaque.
    Bc1Rgb,
    /// BC1 block compression with 1-bit alpha.
    Bc1Rgba,
    /// BC2 block compression.
    Bc2Rgba,
    /// BC3 block compression.
    Bc3Rgba,
}

impl PixelFormat {
    /// Returns `true` for the block-compressed formats.
    pub const fn is_compressed(&self) -> bool {
        matches!(
            self,
            PixelFormat::Bc1Rgb | PixelFormat::Bc1Rgba | PixelFormat::Bc2Rgba | PixelFormat::Bc3Rgba
        )
    }

    /// Bytes per texel for uncompressed formats, 0 for compressed ones.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Depth24Stencil8 => 4,
            PixelFormat::Bgra32Float => 16,
            PixelFormat::Bgra16Float => 8,
            PixelFormat::Rgb32Float => 12,
            PixelFormat::Bgra8Unorm => 4,
            PixelFormat::Bgr5A1Unorm => 2,
            PixelFormat::Bgra4Unorm => 2,
            PixelFormat::B5G6R5Unorm => 2,
            PixelFormat::Rg8Unorm => 2,
            PixelFormat::R8Unorm => 1,
            _ => 0,
        }
    }

    /// Bytes per 4x4 block for compressed formats, 0 otherwise.
    pub const fn block_bytes(&self) -> u32 {
        match self {
            PixelFormat::Bc1Rgb | PixelFormat::Bc1Rgba => 8,
            PixelFormat::Bc2Rgba | PixelFormat::Bc3Rgba => 16,
            _ => 0,
        }
    }

    /// Size in bytes of one `width x height` image in this format.
    pub const fn surface_size(&self, width: u32, height: u32) -> u32 {
        if self.is_compressed() {
            width.div_ceil(4) * height.div_ceil(4) * self.block_bytes()
        } else {
            width * height * self.bytes_per_pixel()
        }
    }
}

/// Per-vertex attribute component layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum AttributeType {
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R32G32B32Float,
    R32G32B32Uint,
    R32G32B32Sint,
    R32G32Float,
    R32G32Uint,
    R32G32Sint,
    R32Float,
    R32Uint,
    R32Sint,
    R16G16B16A16Float,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R16G16B16A16Uint,
    R16G16B16A16Sint,
    R16G16Float,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Uint,
    R16G16Sint,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8Uint,
    R8G8Sint,
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    /// The attribute slot is unused.
    #[default]
    Disabled,
}

/// Width of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexKind {
    /// 16-bit indices.
    #[default]
    U16,
    /// 32-bit indices.
    U32,
}

impl IndexKind {
    /// Size of one index in bytes.
    pub const fn size(&self) -> u32 {
        match self {
            IndexKind::U16 => 2,
            IndexKind::U32 => 4,
        }
    }
}

/// Pipeline stage a shader runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderStage {
    /// Vertex stage.
    #[default]
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Geometry stage.
    Geometry,
}

/// Shape of a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// Single 2D image chain.
    #[default]
    D2,
    /// Multisampled 2D image.
    D2Multisample,
    /// Array of 2D image chains.
    D2Array,
    /// Array of multisampled 2D images.
    D2ArrayMultisample,
    /// Volume texture.
    D3,
}

impl TextureKind {
    /// Returns `true` for the multisampled kinds.
    pub const fn is_multisampled(&self) -> bool {
        matches!(
            self,
            TextureKind::D2Multisample | TextureKind::D2ArrayMultisample
        )
    }
}

/// Polygon raster mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Rasterize vertices as points.
    Point,
    /// Rasterize edges as lines.
    Line,
    /// Fill polygons.
    #[default]
    Solid,
}

/// Which polygon faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Cull nothing.
    #[default]
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    Back,
}

/// Winding order that defines the front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Clockwise.
    #[default]
    Clockwise,
    /// Counter-clockwise.
    CounterClockwise,
}

/// An attachment point of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// The combined depth-stencil attachment.
    DepthStencil,
    /// Color attachment `n` (0..8).
    Color(u8),
}

/// Which planes a resolve operation copies.
///
/// Multiple planes can be combined with bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResolveMask {
    bits: u32,
}

impl ResolveMask {
    /// No planes.
    pub const NONE: Self = Self { bits: 0 };
    /// Color planes.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// The depth plane.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// The stencil plane.
    pub const STENCIL: Self = Self { bits: 1 << 2 };

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every plane of `other` is present in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether no plane is selected.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ResolveMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ResolveMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mask_ops() {
        let mask = ResolveMask::DEPTH | ResolveMask::STENCIL;
        assert!(mask.contains(ResolveMask::DEPTH));
        assert!(mask.contains(ResolveMask::STENCIL));
        assert!(!mask.contains(ResolveMask::COLOR));
        assert!(!mask.is_empty());
        assert!(ResolveMask::NONE.is_empty());
    }

    #[test]
    fn test_compressed_surface_size() {
        // BC1: 8 bytes per 4x4 block, dimensions round up to whole blocks.
        assert_eq!(PixelFormat::Bc1Rgba.surface_size(4, 4), 8);
        assert_eq!(PixelFormat::Bc1Rgba.surface_size(8, 4), 16);
        assert_eq!(PixelFormat::Bc1Rgba.surface_size(5, 5), 32);
        // BC3: 16 bytes per block.
        assert_eq!(PixelFormat::Bc3Rgba.surface_size(4, 4), 16);
    }

    #[test]
    fn test_uncompressed_surface_size() {
        assert_eq!(PixelFormat::Bgra8Unorm.surface_size(16, 16), 1024);
        assert_eq!(PixelFormat::R8Unorm.surface_size(3, 3), 9);
    }
}
